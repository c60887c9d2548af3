//! Conversion between unsigned C integers and wider signed values.
//!
//! Unsigned data arrives in signed storage of the same width. Widening moves
//! each value into the next larger signed type so it is numerically correct;
//! narrowing truncates back to the storage width before a write.

use super::DataBuffer;
use crate::error::{ObjectError, Result};

/// Widen unsigned 8-bit storage to `i16`.
pub fn widen_u8(values: &[i8]) -> Vec<i16> {
    values.iter().map(|&v| i16::from(v) & 0xFF).collect()
}

/// Widen unsigned 16-bit storage to `i32`.
pub fn widen_u16(values: &[i16]) -> Vec<i32> {
    values.iter().map(|&v| i32::from(v) & 0xFFFF).collect()
}

/// Widen unsigned 32-bit storage to `i64`.
pub fn widen_u32(values: &[i32]) -> Vec<i64> {
    values.iter().map(|&v| i64::from(v) & 0xFFFF_FFFF).collect()
}

/// Truncate `i16` values to their low 8 bits.
pub fn narrow_to_u8(values: &[i16]) -> Vec<i8> {
    values.iter().map(|&v| v as i8).collect()
}

/// Truncate `i32` values to their low 16 bits.
pub fn narrow_to_u16(values: &[i32]) -> Vec<i16> {
    values.iter().map(|&v| v as i16).collect()
}

/// Truncate `i64` values to their low 32 bits.
pub fn narrow_to_u32(values: &[i64]) -> Vec<i32> {
    values.iter().map(|&v| v as i32).collect()
}

/// Reuse `slot` when it already has the right length, otherwise allocate.
fn fill<S: Copy, T>(slot: Option<Vec<T>>, src: &[S], f: impl Fn(S) -> T) -> Vec<T> {
    match slot {
        Some(mut out) if out.len() == src.len() => {
            for (o, &s) in out.iter_mut().zip(src) {
                *o = f(s);
            }
            out
        }
        _ => src.iter().map(|&s| f(s)).collect(),
    }
}

/// Widen an unsigned buffer into the next larger signed type.
///
/// `output` is reused when it has the destination width and the same length;
/// any other buffer is discarded. 64-bit input has no wider signed type and
/// is returned unchanged.
pub fn convert_from_unsigned(input: &DataBuffer, output: Option<DataBuffer>) -> Result<DataBuffer> {
    let out = match input {
        DataBuffer::I8(src) => {
            let slot = match output {
                Some(DataBuffer::I16(v)) => Some(v),
                _ => None,
            };
            DataBuffer::I16(fill(slot, src.as_slice(), |v| i16::from(v) & 0xFF))
        }
        DataBuffer::I16(src) => {
            let slot = match output {
                Some(DataBuffer::I32(v)) => Some(v),
                _ => None,
            };
            DataBuffer::I32(fill(slot, src.as_slice(), |v| i32::from(v) & 0xFFFF))
        }
        DataBuffer::I32(src) => {
            let slot = match output {
                Some(DataBuffer::I64(v)) => Some(v),
                _ => None,
            };
            DataBuffer::I64(fill(slot, src.as_slice(), |v| i64::from(v) & 0xFFFF_FFFF))
        }
        DataBuffer::I64(_) => {
            tracing::debug!("convert_from_unsigned: no signed type wider than 64 bits, values above i64::MAX stay negative");
            input.clone()
        }
        other => {
            return Err(ObjectError::conversion(format!(
                "cannot widen {} buffer as unsigned",
                other.kind_name()
            )))
        }
    };
    tracing::trace!("convert_from_unsigned: {} -> {}", input.kind_name(), out.kind_name());
    Ok(out)
}

/// Narrow a widened buffer back to unsigned storage width.
///
/// Truncation keeps the low bits regardless of sign. 8-bit and 64-bit input
/// is returned unchanged.
pub fn convert_to_unsigned(input: &DataBuffer, output: Option<DataBuffer>) -> Result<DataBuffer> {
    let out = match input {
        DataBuffer::I16(src) => {
            let slot = match output {
                Some(DataBuffer::I8(v)) => Some(v),
                _ => None,
            };
            DataBuffer::I8(fill(slot, src.as_slice(), |v| v as i8))
        }
        DataBuffer::I32(src) => {
            let slot = match output {
                Some(DataBuffer::I16(v)) => Some(v),
                _ => None,
            };
            DataBuffer::I16(fill(slot, src.as_slice(), |v| v as i16))
        }
        DataBuffer::I64(src) => {
            let slot = match output {
                Some(DataBuffer::I32(v)) => Some(v),
                _ => None,
            };
            DataBuffer::I32(fill(slot, src.as_slice(), |v| v as i32))
        }
        DataBuffer::I8(_) => input.clone(),
        other => {
            return Err(ObjectError::conversion(format!(
                "cannot narrow {} buffer to unsigned storage",
                other.kind_name()
            )))
        }
    };
    tracing::trace!("convert_to_unsigned: {} -> {}", input.kind_name(), out.kind_name());
    Ok(out)
}

/// Narrow `input` for unsigned storage of `storage_size` bytes per element.
///
/// Buffers that already fit the storage width are passed through, so 64-bit
/// data, which is never widened on read, is written back unchanged.
pub fn narrow_to_storage(input: &DataBuffer, storage_size: usize) -> Result<DataBuffer> {
    match input.integer_width() {
        Some(width) if width > storage_size => convert_to_unsigned(input, None),
        Some(_) => Ok(input.clone()),
        None => Err(ObjectError::conversion(format!(
            "cannot narrow {} buffer to unsigned storage",
            input.kind_name()
        ))),
    }
}

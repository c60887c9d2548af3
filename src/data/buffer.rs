//! Typed value buffers exchanged with backends.

/// One-dimensional buffer of values in storage representation.
///
/// Unsigned data is carried in the signed variant of the same width until it
/// is widened by [`crate::data::unsigned`].
#[derive(Debug, Clone, PartialEq)]
pub enum DataBuffer {
    /// 8-bit integers.
    I8(Vec<i8>),
    /// 16-bit integers.
    I16(Vec<i16>),
    /// 32-bit integers.
    I32(Vec<i32>),
    /// 64-bit integers.
    I64(Vec<i64>),
    /// Single precision floats.
    F32(Vec<f32>),
    /// Double precision floats.
    F64(Vec<f64>),
    /// Raw bytes (fixed-length strings, opaque data).
    Bytes(Vec<u8>),
    /// Text values; `None` is an absent element.
    Text(Vec<Option<String>>),
    /// One buffer per selected compound member, in member order.
    Compound(Vec<DataBuffer>),
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$t>> for DataBuffer {
                fn from(values: Vec<$t>) -> Self {
                    DataBuffer::$variant(values)
                }
            }
        )*
    };
}

impl_from_vec!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    u8 => Bytes,
    Option<String> => Text,
);

impl From<Vec<String>> for DataBuffer {
    fn from(values: Vec<String>) -> Self {
        DataBuffer::Text(values.into_iter().map(Some).collect())
    }
}

impl DataBuffer {
    /// Number of elements (member buffers for compound data).
    pub fn len(&self) -> usize {
        match self {
            DataBuffer::I8(v) => v.len(),
            DataBuffer::I16(v) => v.len(),
            DataBuffer::I32(v) => v.len(),
            DataBuffer::I64(v) => v.len(),
            DataBuffer::F32(v) => v.len(),
            DataBuffer::F64(v) => v.len(),
            DataBuffer::Bytes(v) => v.len(),
            DataBuffer::Text(v) => v.len(),
            DataBuffer::Compound(v) => v.len(),
        }
    }

    /// Check if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the element type.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DataBuffer::I8(_) => "i8",
            DataBuffer::I16(_) => "i16",
            DataBuffer::I32(_) => "i32",
            DataBuffer::I64(_) => "i64",
            DataBuffer::F32(_) => "f32",
            DataBuffer::F64(_) => "f64",
            DataBuffer::Bytes(_) => "bytes",
            DataBuffer::Text(_) => "text",
            DataBuffer::Compound(_) => "compound",
        }
    }

    /// Width in bytes of an integer element, `None` for other buffers.
    pub fn integer_width(&self) -> Option<usize> {
        match self {
            DataBuffer::I8(_) => Some(1),
            DataBuffer::I16(_) => Some(2),
            DataBuffer::I32(_) => Some(4),
            DataBuffer::I64(_) => Some(8),
            _ => None,
        }
    }

    /// Integer element `i` widened to `i64` without any unsigned fix-up.
    pub fn integer_at(&self, i: usize) -> Option<i64> {
        match self {
            DataBuffer::I8(v) => v.get(i).map(|&x| i64::from(x)),
            DataBuffer::I16(v) => v.get(i).map(|&x| i64::from(x)),
            DataBuffer::I32(v) => v.get(i).map(|&x| i64::from(x)),
            DataBuffer::I64(v) => v.get(i).copied(),
            _ => None,
        }
    }

    /// Default textual form of element `i`; absent text renders as `null`.
    pub fn display_at(&self, i: usize) -> Option<String> {
        match self {
            DataBuffer::I8(v) => v.get(i).map(|x| x.to_string()),
            DataBuffer::I16(v) => v.get(i).map(|x| x.to_string()),
            DataBuffer::I32(v) => v.get(i).map(|x| x.to_string()),
            DataBuffer::I64(v) => v.get(i).map(|x| x.to_string()),
            DataBuffer::F32(v) => v.get(i).map(|x| x.to_string()),
            DataBuffer::F64(v) => v.get(i).map(|x| x.to_string()),
            DataBuffer::Bytes(v) => v.get(i).map(|x| x.to_string()),
            DataBuffer::Text(v) => v
                .get(i)
                .map(|x| x.clone().unwrap_or_else(|| "null".to_string())),
            DataBuffer::Compound(_) => None,
        }
    }
}

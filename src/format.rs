//! Rendering of value buffers as delimited text.

use crate::data::DataBuffer;
use crate::datatype::{DatatypeArena, DatatypeClass, TypeId};
use crate::util::RenderConfig;
use std::collections::HashMap;

/// How integer codes in a buffer are read.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interpretation {
    /// Codes are mapped to enum names; unknown codes render as numbers.
    Enum {
        /// Code to name mapping.
        names: HashMap<i64, String>,
        /// Codes are unsigned and decoded from their storage width.
        unsigned: bool,
    },
    /// Negative storage values are shown as their unsigned equivalent.
    Unsigned,
    /// Default textual representation.
    #[default]
    Plain,
}

impl Interpretation {
    /// Pick the interpretation for values of datatype `id`.
    ///
    /// Arrays and variable-length sequences are read by their element type.
    /// Enums win over unsignedness, since an unsigned enum is still shown by
    /// name.
    pub fn for_type(arena: &DatatypeArena, id: TypeId) -> Self {
        match arena.element(id) {
            Some(dt) if dt.class == DatatypeClass::Enum => Interpretation::Enum {
                names: dt.enum_names(),
                unsigned: dt.is_unsigned(),
            },
            Some(dt) if dt.is_unsigned() => Interpretation::Unsigned,
            _ => Interpretation::Plain,
        }
    }
}

/// Render element `i` of `buffer`.
pub fn render_item(buffer: &DataBuffer, i: usize, interpretation: &Interpretation) -> Option<String> {
    match interpretation {
        Interpretation::Enum { names, unsigned } => match enum_code(buffer, i, *unsigned) {
            Some(code) => Some(names.get(&code).cloned().unwrap_or_else(|| code.to_string())),
            None => buffer.display_at(i),
        },
        Interpretation::Unsigned => unsigned_item(buffer, i).or_else(|| buffer.display_at(i)),
        Interpretation::Plain => buffer.display_at(i),
    }
}

/// Enum code at `i`; unsigned codes are masked to the width they are stored in.
fn enum_code(buffer: &DataBuffer, i: usize, unsigned: bool) -> Option<i64> {
    if !unsigned {
        return buffer.integer_at(i);
    }
    match buffer {
        DataBuffer::I8(v) => v.get(i).map(|&x| i64::from(x) & 0xFF),
        DataBuffer::I16(v) => v.get(i).map(|&x| i64::from(x) & 0xFFFF),
        DataBuffer::I32(v) => v.get(i).map(|&x| i64::from(x) & 0xFFFF_FFFF),
        _ => buffer.integer_at(i),
    }
}

fn unsigned_item(buffer: &DataBuffer, i: usize) -> Option<String> {
    let text = match buffer {
        DataBuffer::I8(v) => {
            let x = i16::from(*v.get(i)?);
            (if x < 0 { x + 256 } else { x }).to_string()
        }
        DataBuffer::I16(v) => {
            let x = i32::from(*v.get(i)?);
            (if x < 0 { x + 65_536 } else { x }).to_string()
        }
        DataBuffer::I32(v) => {
            let x = i64::from(*v.get(i)?);
            (if x < 0 { x + 4_294_967_296 } else { x }).to_string()
        }
        DataBuffer::I64(v) => {
            let x = *v.get(i)?;
            if x < 0 {
                let magnitude = (x & i64::MAX) as u128;
                (magnitude + (1u128 << 63)).to_string()
            } else {
                x.to_string()
            }
        }
        _ => return None,
    };
    Some(text)
}

/// Render a buffer as one delimited string.
///
/// At most `config.max_items` elements are rendered. Compound buffers render
/// each member as a `{...}` group, with every member read as plain values.
pub fn render(buffer: &DataBuffer, interpretation: &Interpretation, config: &RenderConfig) -> String {
    if let DataBuffer::Compound(members) = buffer {
        let plain = vec![Interpretation::Plain; members.len()];
        return render_members(members, &plain, config);
    }
    let n = config.max_items.map_or(buffer.len(), |max| buffer.len().min(max));
    (0..n)
        .filter_map(|i| render_item(buffer, i, interpretation))
        .collect::<Vec<_>>()
        .join(&config.delimiter)
}

/// Render member buffers as `{...}` groups, each read with its own interpretation.
///
/// Members without an interpretation are read as plain values.
pub fn render_members(members: &[DataBuffer], interpretations: &[Interpretation], config: &RenderConfig) -> String {
    let plain = Interpretation::Plain;
    members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let interpretation = interpretations.get(i).unwrap_or(&plain);
            format!("{{{}}}", render(member, interpretation, config))
        })
        .collect::<Vec<_>>()
        .join(&config.delimiter)
}

/// Render a scalar text value, truncated to `config.max_items` characters.
pub fn render_text(value: &str, config: &RenderConfig) -> String {
    match config.max_items {
        Some(max) => value.chars().take(max).collect(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::parse_type;

    fn comma() -> RenderConfig {
        RenderConfig::with_delimiter(",")
    }

    #[test]
    fn test_enum_names() {
        let (arena, id) = parse_type("enum<i8>(LOW=0,HIGH=1)").unwrap();
        let interpretation = Interpretation::for_type(&arena, id);
        let buffer = DataBuffer::I8(vec![0, 1, 0, 7]);
        assert_eq!(render(&buffer, &interpretation, &comma()), "LOW,HIGH,LOW,7");
    }

    #[test]
    fn test_unsigned_enum_still_uses_names() {
        let (arena, id) = parse_type("enum<u8>(A=1)").unwrap();
        assert!(matches!(
            Interpretation::for_type(&arena, id),
            Interpretation::Enum { unsigned: true, .. }
        ));
    }

    #[test]
    fn test_enum_codes_of_every_width() {
        let cases = [
            ("enum<i8>(OFF=0,ON=1)", DataBuffer::I8(vec![1, 0])),
            ("enum<i16>(OFF=0,ON=1)", DataBuffer::I16(vec![1, 0])),
            ("enum<i32>(OFF=0,ON=1)", DataBuffer::I32(vec![1, 0])),
            ("enum<i64>(OFF=0,ON=1)", DataBuffer::I64(vec![1, 0])),
        ];
        for (expr, buffer) in cases {
            let (arena, id) = parse_type(expr).unwrap();
            let interpretation = Interpretation::for_type(&arena, id);
            assert_eq!(render(&buffer, &interpretation, &comma()), "ON,OFF", "{}", expr);
        }
    }

    #[test]
    fn test_unsigned_enum_codes_above_signed_range() {
        let (arena, id) = parse_type("enum<u8>(LOW=0,HI=200)").unwrap();
        let interpretation = Interpretation::for_type(&arena, id);
        assert_eq!(render(&DataBuffer::I8(vec![0, -56]), &interpretation, &comma()), "LOW,HI");
        assert_eq!(render(&DataBuffer::I16(vec![200]), &interpretation, &comma()), "HI");

        let (arena, id) = parse_type("enum<u16>(TOP=65535)").unwrap();
        let interpretation = Interpretation::for_type(&arena, id);
        assert_eq!(render(&DataBuffer::I16(vec![-1]), &interpretation, &comma()), "TOP");

        let (arena, id) = parse_type("enum<u32>(TOP=4294967295)").unwrap();
        let interpretation = Interpretation::for_type(&arena, id);
        assert_eq!(render(&DataBuffer::I32(vec![-1]), &interpretation, &comma()), "TOP");

        let (arena, id) = parse_type("enum<u64>(TOP=18446744073709551615)").unwrap();
        let interpretation = Interpretation::for_type(&arena, id);
        assert_eq!(render(&DataBuffer::I64(vec![-1]), &interpretation, &comma()), "TOP");
    }

    #[test]
    fn test_signed_enum_codes_are_not_masked() {
        let (arena, id) = parse_type("enum<i8>(NEG=-1)").unwrap();
        let interpretation = Interpretation::for_type(&arena, id);
        assert_eq!(render(&DataBuffer::I8(vec![-1, -56]), &interpretation, &comma()), "NEG,-56");
    }

    #[test]
    fn test_unsigned_values() {
        let buffer = DataBuffer::I8(vec![-1, 100]);
        assert_eq!(render(&buffer, &Interpretation::Unsigned, &comma()), "255,100");
        let buffer = DataBuffer::I16(vec![-2]);
        assert_eq!(render(&buffer, &Interpretation::Unsigned, &comma()), "65534");
        let buffer = DataBuffer::I32(vec![-1]);
        assert_eq!(render(&buffer, &Interpretation::Unsigned, &comma()), "4294967295");
    }

    #[test]
    fn test_unsigned_64_bit() {
        let buffer = DataBuffer::I64(vec![-1, i64::MIN, 5]);
        assert_eq!(
            render(&buffer, &Interpretation::Unsigned, &comma()),
            "18446744073709551615,9223372036854775808,5"
        );
    }

    #[test]
    fn test_interpretation_from_type() {
        let (arena, id) = parse_type("u16").unwrap();
        assert_eq!(Interpretation::for_type(&arena, id), Interpretation::Unsigned);
        let (arena, id) = parse_type("f32").unwrap();
        assert_eq!(Interpretation::for_type(&arena, id), Interpretation::Plain);
        let (arena, id) = parse_type("u8[4]").unwrap();
        assert_eq!(Interpretation::for_type(&arena, id), Interpretation::Unsigned);
        let (arena, id) = parse_type("vlen<u16>").unwrap();
        assert_eq!(Interpretation::for_type(&arena, id), Interpretation::Unsigned);
    }

    #[test]
    fn test_max_items_and_delimiters() {
        let buffer = DataBuffer::F64(vec![1.5, 2.0, 3.25]);
        let config = RenderConfig::with_delimiter(" | ").max_items(2);
        assert_eq!(render(&buffer, &Interpretation::Plain, &config), "1.5 | 2");
        assert_eq!(render(&DataBuffer::I32(vec![]), &Interpretation::Plain, &config), "");
    }

    #[test]
    fn test_absent_text_is_null() {
        let buffer = DataBuffer::Text(vec![Some("a".into()), None]);
        assert_eq!(render(&buffer, &Interpretation::Plain, &comma()), "a,null");
    }

    #[test]
    fn test_scalar_text_truncated_by_length() {
        let config = RenderConfig::default().max_items(3);
        assert_eq!(render_text("abcdef", &config), "abc");
        assert_eq!(render_text("ab", &config), "ab");
    }

    #[test]
    fn test_compound_groups() {
        let buffer = DataBuffer::Compound(vec![DataBuffer::I8(vec![-1, 2]), DataBuffer::from(vec!["x".to_string()])]);
        assert_eq!(render(&buffer, &Interpretation::Plain, &comma()), "{-1,2},{x}");
        let members = [DataBuffer::I8(vec![-1])];
        assert_eq!(render_members(&members, &[Interpretation::Unsigned], &comma()), "{255}");
    }
}

//! Textual datatype expressions.
//!
//! ```text
//! {time:f64, pos:{x:f32, y:f32}, flags:u8[4]}
//! enum<u8>(LOW=0,HIGH=1)
//! vlen<i32>
//! ```

use super::{ByteOrder, Datatype, DatatypeArena, DatatypeClass, Sign, TypeId};
use crate::error::{ObjectError, Result};

/// Parse an expression into a fresh arena, returning it with the root id.
pub fn parse_type(expr: &str) -> Result<(DatatypeArena, TypeId)> {
    let mut arena = DatatypeArena::new();
    let root = parse_into(expr, &mut arena)?;
    Ok((arena, root))
}

/// Parse an expression, adding its nodes to `arena`.
pub fn parse_into(expr: &str, arena: &mut DatatypeArena) -> Result<TypeId> {
    let mut parser = Parser { src: expr, pos: 0, arena };
    let id = parser.parse_type()?;
    parser.skip_ws();
    if parser.pos < parser.src.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(id)
}

struct Parser<'s, 'a> {
    src: &'s str,
    pos: usize,
    arena: &'a mut DatatypeArena,
}

impl<'s, 'a> Parser<'s, 'a> {
    fn error(&self, message: impl Into<String>) -> ObjectError {
        ObjectError::syntax(self.pos, message)
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn ident(&mut self) -> Result<&'s str> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    /// A bare identifier or a double-quoted name.
    fn name(&mut self) -> Result<String> {
        if self.eat('"') {
            let rest = self.rest();
            let end = rest
                .find('"')
                .ok_or_else(|| self.error("unterminated quoted name"))?;
            self.pos += end + 1;
            return Ok(rest[..end].to_string());
        }
        self.ident().map(str::to_string)
    }

    fn uint(&mut self) -> Result<usize> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let value = rest[..len]
            .parse::<usize>()
            .map_err(|_| self.error("expected an unsigned integer"))?;
        self.pos += len;
        Ok(value)
    }

    fn int(&mut self) -> Result<i64> {
        self.skip_ws();
        let negative = self.rest().starts_with('-');
        if negative {
            self.pos += 1;
        }
        let start = self.pos;
        let value = self.uint()? as i64;
        if negative {
            value
                .checked_neg()
                .ok_or_else(|| ObjectError::syntax(start, "integer out of range"))
        } else {
            Ok(value)
        }
    }

    fn parse_type(&mut self) -> Result<TypeId> {
        let base = self.parse_base()?;
        if !self.eat('[') {
            return Ok(base);
        }
        let mut dims = vec![self.uint()?];
        while self.eat(',') {
            dims.push(self.uint()?);
        }
        self.expect(']')?;
        Ok(self.arena.array(base, dims))
    }

    fn parse_base(&mut self) -> Result<TypeId> {
        if self.eat('{') {
            return self.parse_compound();
        }
        self.skip_ws();
        let start = self.pos;
        let word = self.ident()?;
        match word {
            "vlen" => {
                self.expect('<')?;
                let base = self.parse_type()?;
                self.expect('>')?;
                Ok(self.arena.vlen(base))
            }
            "enum" => self.parse_enum(),
            "string" => {
                let size = if self.eat('(') {
                    let n = self.uint()?;
                    self.expect(')')?;
                    n
                } else {
                    0
                };
                Ok(self.arena.add(Datatype::string(size)))
            }
            "opaque" => {
                self.expect('(')?;
                let size = self.uint()?;
                self.expect(')')?;
                Ok(self.arena.add(Datatype::atomic(
                    DatatypeClass::Opaque,
                    size,
                    ByteOrder::None,
                    Sign::Native,
                )))
            }
            other => match primitive(other) {
                Some(dt) => Ok(self.arena.add(dt)),
                None => Err(ObjectError::syntax(start, format!("unknown type '{}'", other))),
            },
        }
    }

    fn parse_compound(&mut self) -> Result<TypeId> {
        let mut members = Vec::new();
        loop {
            let name = self.name()?;
            self.expect(':')?;
            let ty = self.parse_type()?;
            members.push((name, ty));
            if !self.eat(',') {
                break;
            }
        }
        self.expect('}')?;
        Ok(self.arena.compound(members))
    }

    fn parse_enum(&mut self) -> Result<TypeId> {
        self.expect('<')?;
        self.skip_ws();
        let start = self.pos;
        let word = self.ident()?;
        let base = match primitive(word) {
            Some(dt) if dt.class == DatatypeClass::Integer => self.arena.add(dt),
            _ => {
                return Err(ObjectError::syntax(
                    start,
                    format!("enum base must be an integer type, got '{}'", word),
                ))
            }
        };
        self.expect('>')?;
        self.expect('(')?;
        let mut entries = Vec::new();
        loop {
            let name = self.ident()?;
            self.expect('=')?;
            let value = self.int()?;
            entries.push(format!("{}={}", name, value));
            if !self.eat(',') {
                break;
            }
        }
        self.expect(')')?;
        Ok(self.arena.enumeration(base, entries.join(",")))
    }
}

fn primitive(word: &str) -> Option<Datatype> {
    let dt = match word {
        "i8" => Datatype::integer(1, true),
        "i16" => Datatype::integer(2, true),
        "i32" => Datatype::integer(4, true),
        "i64" => Datatype::integer(8, true),
        "u8" => Datatype::integer(1, false),
        "u16" => Datatype::integer(2, false),
        "u32" => Datatype::integer(4, false),
        "u64" => Datatype::integer(8, false),
        "f32" => Datatype::float(4),
        "f64" => Datatype::float(8),
        "char" => Datatype::atomic(DatatypeClass::Char, 1, ByteOrder::None, Sign::TwosComplement),
        "uchar" => Datatype::atomic(DatatypeClass::Char, 1, ByteOrder::None, Sign::Unsigned),
        "bitfield" => Datatype::atomic(DatatypeClass::Bitfield, 1, ByteOrder::Native, Sign::Native),
        "ref" => Datatype::atomic(DatatypeClass::Reference, 8, ByteOrder::None, Sign::Native),
        "time" => Datatype::atomic(DatatypeClass::Time, 8, ByteOrder::Native, Sign::Native),
        _ => return None,
    };
    Some(dt)
}

//! Flattening of nested compound datatypes into member rows.
//!
//! A compound `{a:i32, nest:{b:f32, c:f64}}` becomes the rows `a`,
//! `nest<SEP>b` and `nest<SEP>c`. Array members occupy one row whose order is
//! the element count of the array.

use super::{DatatypeArena, DatatypeClass, TypeId};
use crate::error::{ObjectError, Result};
use crate::util::DISPLAY_SEPARATOR;

/// Flattened members of a compound datatype with their selection mask.
///
/// All per-member sequences have the same length. A member whose datatype
/// could not be resolved has no type and an order of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundMembers {
    names: Vec<String>,
    types: Vec<Option<TypeId>>,
    orders: Vec<usize>,
    dims: Vec<Option<Vec<usize>>>,
    selected: Vec<bool>,
    separator: char,
}

enum Leaf {
    Nested(TypeId),
    Value {
        ty: TypeId,
        order: usize,
        dims: Option<Vec<usize>>,
    },
}

/// Flatten the compound at `root` depth-first in declaration order.
///
/// An array or variable-length root is classified by its base type. Roots
/// that are not compound yield no members.
pub fn flatten(arena: &DatatypeArena, root: TypeId, separator: char) -> CompoundMembers {
    let mut members = CompoundMembers {
        separator,
        ..CompoundMembers::default()
    };
    let Some(mut dt) = arena.get(root) else {
        tracing::debug!("flatten: unknown root datatype {}", root.index());
        return members;
    };
    let mut compound = root;
    if matches!(dt.class, DatatypeClass::Array | DatatypeClass::VarLen) {
        match dt.base.and_then(|b| arena.get(b).map(|d| (b, d))) {
            Some((base, base_dt)) => {
                compound = base;
                dt = base_dt;
            }
            None => return members,
        }
    }
    if dt.is_compound() {
        members.walk(arena, compound, "");
    }
    members
}

fn classify(arena: &DatatypeArena, id: TypeId) -> Result<Leaf> {
    let dt = arena.resolve(id)?;
    match dt.class {
        DatatypeClass::NoClass => Err(ObjectError::Datatype("unresolved member type".to_string())),
        DatatypeClass::Compound => Ok(Leaf::Nested(id)),
        DatatypeClass::Array => {
            let base = dt
                .base
                .ok_or_else(|| ObjectError::Datatype("array without a base type".to_string()))?;
            let base_dt = arena.resolve(base)?;
            match base_dt.class {
                DatatypeClass::Array => {
                    return Err(ObjectError::Datatype("arrays of arrays are not supported".to_string()))
                }
                DatatypeClass::NoClass => {
                    return Err(ObjectError::Datatype("unresolved array base type".to_string()))
                }
                _ => {}
            }
            let dims = dt
                .array_dims
                .clone()
                .ok_or_else(|| ObjectError::Datatype("array without dimensions".to_string()))?;
            Ok(Leaf::Value {
                ty: id,
                order: dims.iter().product(),
                dims: Some(dims),
            })
        }
        _ => Ok(Leaf::Value {
            ty: id,
            order: 1,
            dims: None,
        }),
    }
}

impl CompoundMembers {
    fn walk(&mut self, arena: &DatatypeArena, compound: TypeId, prefix: &str) {
        let Some(dt) = arena.get(compound) else {
            return;
        };
        for member in &dt.members {
            let qualified = format!("{}{}", prefix, member.name);
            match classify(arena, member.datatype) {
                Ok(Leaf::Nested(id)) => {
                    let prefix = format!("{}{}", qualified, self.separator);
                    self.walk(arena, id, &prefix);
                }
                Ok(Leaf::Value { ty, order, dims }) => self.push(qualified, Some(ty), order, dims),
                Err(e) => {
                    tracing::debug!("flatten: member '{}' skipped: {}", qualified, e);
                    self.push(qualified, None, 0, None);
                }
            }
        }
    }

    fn push(&mut self, name: String, ty: Option<TypeId>, order: usize, dims: Option<Vec<usize>>) {
        self.names.push(name);
        self.types.push(ty);
        self.orders.push(order);
        self.dims.push(dims);
        self.selected.push(true);
    }

    /// Number of flattened members.
    pub fn member_count(&self) -> usize {
        self.names.len()
    }

    /// Number of selected members.
    pub fn selected_member_count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }

    /// Qualified member names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Leaf datatypes; `None` for unresolved members.
    pub fn types(&self) -> &[Option<TypeId>] {
        &self.types
    }

    /// Element counts.
    pub fn orders(&self) -> &[usize] {
        &self.orders
    }

    /// Array shape of member `i`, if it is an array member.
    pub fn member_dims(&self, i: usize) -> Option<&[usize]> {
        self.dims.get(i).and_then(|d| d.as_deref())
    }

    /// Member name with the internal separator shown as `.`.
    pub fn display_name(&self, i: usize) -> Option<String> {
        self.names
            .get(i)
            .map(|n| n.replace(self.separator, &DISPLAY_SEPARATOR.to_string()))
    }

    /// Select member `i`; out of range indices are ignored.
    pub fn select_member(&mut self, i: usize) {
        self.set_member_selected(i, true);
    }

    /// Set the selection flag of member `i`; out of range indices are ignored.
    pub fn set_member_selected(&mut self, i: usize, selected: bool) {
        if let Some(flag) = self.selected.get_mut(i) {
            *flag = selected;
        }
    }

    /// Select or deselect every member.
    pub fn set_all_selected(&mut self, selected: bool) {
        self.selected.iter_mut().for_each(|s| *s = selected);
    }

    /// Check if member `i` is selected; false when out of range.
    pub fn is_member_selected(&self, i: usize) -> bool {
        self.selected.get(i).copied().unwrap_or(false)
    }

    /// Names of the selected members.
    pub fn selected_names(&self) -> Vec<&str> {
        self.selected_iter().map(|i| self.names[i].as_str()).collect()
    }

    /// Datatypes of the selected members.
    pub fn selected_types(&self) -> Vec<Option<TypeId>> {
        self.selected_iter().map(|i| self.types[i]).collect()
    }

    /// Element counts of the selected members.
    pub fn selected_orders(&self) -> Vec<usize> {
        self.selected_iter().map(|i| self.orders[i]).collect()
    }

    fn selected_iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.selected.len()).filter(move |&i| self.selected[i])
    }

    /// Drop every member.
    pub fn clear(&mut self) {
        let separator = self.separator;
        *self = Self {
            separator,
            ..Self::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{parse_type, Datatype};
    use crate::util::MEMBER_SEPARATOR;

    fn flat(expr: &str) -> CompoundMembers {
        let (arena, root) = parse_type(expr).unwrap();
        flatten(&arena, root, MEMBER_SEPARATOR)
    }

    #[test]
    fn test_nested_members_are_qualified() {
        let m = flat("{A:i32, nest:{B:f32, C:f64}}");
        let expected: Vec<String> = vec![
            "A".to_string(),
            format!("nest{}B", MEMBER_SEPARATOR),
            format!("nest{}C", MEMBER_SEPARATOR),
        ];
        assert_eq!(m.names(), expected.as_slice());
        assert_eq!(m.orders(), &[1, 1, 1]);
        assert_eq!(m.display_name(2).as_deref(), Some("nest.C"));
        assert_eq!(m.selected_member_count(), 3);
    }

    #[test]
    fn test_array_member_is_one_row() {
        let m = flat("{A:i32, B:f32[5]}");
        assert_eq!(m.member_count(), 2);
        assert_eq!(m.orders(), &[1, 5]);
        assert_eq!(m.member_dims(1), Some(&[5][..]));
        assert_eq!(m.member_dims(0), None);
    }

    #[test]
    fn test_array_of_compound_root_is_unwrapped() {
        let m = flat("{x:i16, y:i16}[4]");
        assert_eq!(m.member_count(), 2);
    }

    #[test]
    fn test_array_of_compound_member_is_a_leaf() {
        let m = flat("{p:{x:i16}[2]}");
        assert_eq!(m.names(), &["p".to_string()]);
        assert_eq!(m.orders(), &[2]);
    }

    #[test]
    fn test_non_compound_root_has_no_members() {
        assert_eq!(flat("f64").member_count(), 0);
        assert_eq!(flat("vlen<i32>").member_count(), 0);
    }

    #[test]
    fn test_unresolved_member_is_recorded() {
        let mut arena = DatatypeArena::new();
        let a = arena.add(Datatype::integer(4, true));
        let bad = arena.add(Datatype::no_class());
        let inner = arena.add(Datatype::float(4));
        let nested = arena.array(inner, vec![2]);
        let deep = arena.array(nested, vec![3]);
        let root = arena.compound(vec![
            ("a".into(), a),
            ("bad".into(), bad),
            ("deep".into(), deep),
        ]);
        let m = flatten(&arena, root, MEMBER_SEPARATOR);
        assert_eq!(m.member_count(), 3);
        assert_eq!(m.types()[1], None);
        assert_eq!(m.orders(), &[1, 0, 0]);
        assert_eq!(m.types()[2], None);
    }

    #[test]
    fn test_member_selection() {
        let mut m = flat("{a:i8, b:i8, c:i8}");
        m.set_all_selected(false);
        m.select_member(2);
        m.set_member_selected(99, true);
        assert_eq!(m.selected_names(), vec!["c"]);
        assert_eq!(m.selected_orders(), vec![1]);
        assert!(!m.is_member_selected(0));
        assert!(!m.is_member_selected(99));
        m.clear();
        assert_eq!(m.member_count(), 0);
    }
}

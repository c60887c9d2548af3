//! Building arena datatypes from backend type handles.

use super::{CompoundMember, Datatype, DatatypeArena, DatatypeClass, TypeId};
use crate::backend::{Backend, Handle, HandleGuard};
use crate::error::Result;

/// Describe the type behind `datatype` and everything it references.
///
/// The caller keeps ownership of `datatype`; every handle opened on the way
/// is closed before returning. A compound member that cannot be described is
/// stored as a [`DatatypeClass::NoClass`] node and the import carries on.
pub fn import_type<B: Backend + ?Sized>(
    backend: &mut B,
    datatype: Handle,
    arena: &mut DatatypeArena,
) -> Result<TypeId> {
    let info = backend.type_info(datatype)?;
    let mut dt = Datatype::atomic(info.class, info.size, info.order, info.sign);
    dt.array_dims = info.array_dims;
    dt.enum_members = info.enum_members;

    match dt.class {
        DatatypeClass::Array | DatatypeClass::VarLen | DatatypeClass::Enum => {
            let base = backend.base_type(datatype)?;
            let mut guard = HandleGuard::adopt(&mut *backend, base);
            dt.base = Some(import_type(&mut *guard, base, arena)?);
        }
        DatatypeClass::Compound => {
            for (field_id, member) in backend.compound_members(datatype)?.into_iter().enumerate() {
                let mut guard = HandleGuard::adopt(&mut *backend, member.datatype);
                let ty = match import_type(&mut *guard, member.datatype, arena) {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::debug!("import_type: member '{}' unresolved: {}", member.name, e);
                        arena.add(Datatype::no_class())
                    }
                };
                dt.members.push(CompoundMember {
                    name: member.name,
                    datatype: ty,
                    offset: member.offset,
                    field_id: field_id as u64,
                });
            }
        }
        _ => {}
    }
    Ok(arena.add(dt))
}

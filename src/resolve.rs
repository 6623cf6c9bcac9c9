//! Type Compatibility and Value Equality
//!
//! Both resolvers share one aliasing rule: a raw asset (a texture) may be
//! referenced through a wrapped asset (a sprite) that refers into it.

use crate::model::{ObjectModel, ObjectRef, TypeId, TypeKind, TypeRegistry, TypeToken};

/// Can a field declared as `declared` hold a value of runtime type `candidate`?
///
/// First match wins:
/// 1. `candidate` is assignable to a single-valued `declared`
/// 2. `declared` is a container whose element accepts `candidate`
/// 3. `candidate` is a raw asset and `declared` is a wrapped asset, or a
///    container of one
///
/// The aliasing in rule 3 is one way: a wrapped value never fits a raw field.
pub fn is_compatible(types: &TypeRegistry, declared: TypeToken, candidate: TypeId) -> bool {
    match declared {
        TypeToken::Single(ty) if types.is_assignable(ty, candidate) => return true,
        TypeToken::ArrayOf(elem) if types.is_assignable(elem, candidate) => return true,
        _ => {}
    }

    types.kind(candidate) == Some(TypeKind::RawAsset)
        && types.kind(declared.element()) == Some(TypeKind::WrappedAsset)
}

/// Do `a` and `b` denote the same asset for reporting purposes?
///
/// Absent handles never match. Otherwise identical handles match, and a raw
/// asset matches a wrapped asset whose payload is exactly that raw asset, in
/// either argument order.
pub fn are_equal<M: ObjectModel + ?Sized>(
    model: &M,
    a: Option<ObjectRef>,
    b: Option<ObjectRef>,
) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    if a == b {
        return true;
    }
    wraps(model, b, a) || wraps(model, a, b)
}

/// `wrapped` is a wrapped asset whose payload is the raw asset `raw`
fn wraps<M: ObjectModel + ?Sized>(model: &M, wrapped: ObjectRef, raw: ObjectRef) -> bool {
    model.type_kind(raw) == Some(TypeKind::RawAsset)
        && model.type_kind(wrapped) == Some(TypeKind::WrappedAsset)
        && model.wrapped_payload(wrapped) == Some(raw)
}

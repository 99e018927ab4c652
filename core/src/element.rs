//! Element type resolution for enumerable shapes.
//!
//! Given a collection-shaped type, answers "what does iterating it yield".
//! Keyed sequences can resolve either to their pair element or broken into
//! key and value types, selected by flag. Legacy loosely typed sequences
//! erase their element statically, so resolution probes a sample instance
//! when one is available and degrades to `any` otherwise.

use bitflags::bitflags;
use smallvec::{smallvec, SmallVec};

use crate::error::MapError;
use crate::ty::{Ty, TyKind};
use crate::values::Value;

bitflags! {
    /// Resolution options for [`element_types`].
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ElementTypeFlags: u8 {
        /// Resolve a keyed sequence to its key and value types instead of
        /// its pair element.
        const BREAK_KEY_VALUE_PAIR = 1;
    }
}

/// Resolves the element type(s) of `ty`.
///
/// `sample` feeds the legacy-sequence probe; it is ignored for shapes that
/// carry their element type statically. Non-enumerable types are an error.
pub fn element_types(
    ty: &Ty,
    sample: Option<&Value>,
    flags: ElementTypeFlags,
) -> Result<SmallVec<[Ty; 2]>, MapError> {
    if let TyKind::Map(key, value) = ty.kind() {
        if flags.contains(ElementTypeFlags::BREAK_KEY_VALUE_PAIR) {
            return Ok(smallvec![key.clone(), value.clone()]);
        }
    }
    enumerable_element_types(ty, sample)
}

fn enumerable_element_types(
    ty: &Ty,
    sample: Option<&Value>,
) -> Result<SmallVec<[Ty; 2]>, MapError> {
    match ty.kind() {
        TyKind::Array(elem) | TyKind::Seq(elem) => Ok(smallvec![elem.clone()]),
        TyKind::Map(key, value) => Ok(smallvec![Ty::pair(key.clone(), value.clone())]),
        TyKind::DynSeq => Ok(smallvec![probe_element_type(sample)]),
        _ => Err(MapError::ElementTypeResolution { ty: ty.clone() }),
    }
}

/// The single element type of `ty`, for callers that know the shape is not
/// keyed.
pub fn element_type(ty: &Ty) -> Result<Ty, MapError> {
    enumerable_element_types(ty, None).map(|mut types| types.remove(0))
}

/// Runtime probe for element types the static shape erases: the type of
/// the first element, or `any` when the sample is absent or empty.
fn probe_element_type(sample: Option<&Value>) -> Ty {
    let first = sample.and_then(first_element);
    match first {
        Some(value) => {
            let ty = value.ty();
            tracing::debug!(elem = %ty, "probed legacy sequence element type");
            ty
        }
        None => Ty::any(),
    }
}

fn first_element(value: &Value) -> Option<Value> {
    match value {
        Value::Array(items) => items.get(0),
        Value::Seq(items) | Value::Dyn(items) => items.first().cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn static_shapes_resolve_directly() {
        assert_eq!(element_type(&Ty::array(Ty::i32())), Ok(Ty::i32()));
        assert_eq!(element_type(&Ty::seq(Ty::str())), Ok(Ty::str()));
        assert_eq!(
            element_type(&Ty::map(Ty::str(), Ty::i64())),
            Ok(Ty::pair(Ty::str(), Ty::i64()))
        );
    }

    #[test]
    fn keyed_sequences_break_on_request() {
        let map = Ty::map(Ty::str(), Ty::i64());
        assert_eq!(
            element_types(&map, None, ElementTypeFlags::BREAK_KEY_VALUE_PAIR),
            Ok(smallvec![Ty::str(), Ty::i64()])
        );
        assert_eq!(
            element_types(&map, None, ElementTypeFlags::empty()),
            Ok(smallvec![Ty::pair(Ty::str(), Ty::i64())])
        );
    }

    #[test]
    fn legacy_sequences_probe_the_sample() {
        let sample = Value::dyn_seq(vec![Value::i32(1)]);
        assert_eq!(
            element_types(&Ty::dyn_seq(), Some(&sample), ElementTypeFlags::empty()),
            Ok(smallvec![Ty::i32()])
        );

        let empty = Value::dyn_seq(vec![]);
        assert_eq!(
            element_types(&Ty::dyn_seq(), Some(&empty), ElementTypeFlags::empty()),
            Ok(smallvec![Ty::any()])
        );
        assert_eq!(
            element_types(&Ty::dyn_seq(), None, ElementTypeFlags::empty()),
            Ok(smallvec![Ty::any()])
        );
    }

    #[test]
    fn non_enumerables_are_an_error() {
        let err = element_type(&Ty::i32()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to find the element type for type `i32`"
        );
    }
}

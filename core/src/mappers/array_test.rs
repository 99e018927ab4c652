//! Tests for the general array mapping strategy.

use pretty_assertions::assert_eq;

use crate::config::{MapCatalog, ProfileMap, TypeMap, TypePair};
use crate::expr::{factory, Param};
use crate::ty::Ty;
use crate::values::Value;

use super::{ArrayMapper, ObjectMapper};

#[test]
fn claims_any_array_pair() {
    let mapper = ArrayMapper;
    assert!(mapper.is_match(&TypePair::new(Ty::array(Ty::i32()), Ty::array(Ty::i64()))));
    assert!(mapper.is_match(&TypePair::new(Ty::array(Ty::str()), Ty::array(Ty::str()))));
    assert!(!mapper.is_match(&TypePair::new(Ty::seq(Ty::i32()), Ty::array(Ty::i32()))));
    assert!(!mapper.is_match(&TypePair::new(Ty::array(Ty::i32()), Ty::seq(Ty::i32()))));
}

#[test]
fn widens_elements_without_a_registered_conversion() {
    let catalog = MapCatalog::new(ProfileMap::default());
    let pair = TypePair::new(Ty::array(Ty::i32()), Ty::array(Ty::i64()));
    let plan = catalog.compile(&pair).unwrap();

    let source = Value::array(Ty::i32(), vec![Value::i32(1), Value::i32(2)]);
    let result = plan.execute(source).unwrap();
    let Value::Array(dest) = result else {
        panic!("expected array");
    };
    assert_eq!(dest.elem_ty(), Ty::i64());
    assert_eq!(dest.items(), vec![Value::i64(1), Value::i64(2)]);
}

#[test]
fn applies_the_registered_element_conversion() {
    let mut catalog = MapCatalog::new(ProfileMap::default());
    let x = Param::new("x", Ty::i32());
    let shift = factory::lambda(
        vec![x.clone()],
        factory::add(
            &factory::convert(&x.expr(), &Ty::i64()),
            &factory::i64_const(10),
        ),
    );
    catalog.register_type_map(TypeMap::new(
        TypePair::new(Ty::i32(), Ty::i64()),
        Some(shift),
    ));

    let pair = TypePair::new(Ty::array(Ty::i32()), Ty::array(Ty::i64()));
    let plan = catalog.compile(&pair).unwrap();
    let source = Value::array(Ty::i32(), vec![Value::i32(1), Value::i32(2)]);
    let result = plan.execute(source).unwrap();
    let Value::Array(dest) = result else {
        panic!("expected array");
    };
    assert_eq!(dest.items(), vec![Value::i64(11), Value::i64(12)]);
}

#[test]
fn honors_the_null_collection_policy() {
    let pair = TypePair::new(Ty::array(Ty::i32()), Ty::array(Ty::i64()));

    let catalog = MapCatalog::new(ProfileMap::default());
    let result = catalog.compile(&pair).unwrap().execute(Value::Null).unwrap();
    let Value::Array(dest) = result else {
        panic!("expected array");
    };
    assert!(dest.is_empty());

    let catalog = MapCatalog::new(ProfileMap {
        allow_null_collections: true,
    });
    assert_eq!(
        catalog.compile(&pair).unwrap().execute(Value::Null),
        Ok(Value::Null)
    );
}

#[test]
fn unmatched_pairs_report_a_missing_strategy() {
    let catalog = MapCatalog::new(ProfileMap::default());
    let err = catalog
        .compile(&TypePair::new(Ty::i32(), Ty::str()))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "no mapping strategy matches `i32` -> `str`"
    );
}

#[test]
fn compiled_plans_are_cached_per_pair() {
    let catalog = MapCatalog::new(ProfileMap::default());
    let pair = TypePair::new(Ty::array(Ty::i32()), Ty::array(Ty::i64()));
    let a = catalog.compile(&pair).unwrap();
    let b = catalog.compile(&pair).unwrap();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
}

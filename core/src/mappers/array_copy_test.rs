//! Tests for the primitive-array bulk-copy strategy.

use pretty_assertions::assert_eq;

use crate::config::{MapCatalog, MemberMap, ProfileMap, TypeMap, TypePair};
use crate::expr::rewrite::rewrite;
use crate::expr::{Expr, ExprKind};
use crate::test_utils::init_test_logging;
use crate::ty::{Intrinsic, Ty};
use crate::values::Value;

use super::{ArrayCopyMapper, ObjectMapper};

fn pair(source: Ty, dest: Ty) -> TypePair {
    TypePair::new(source, dest)
}

fn count_intrinsic(tree: &Expr, intrinsic: Intrinsic) -> usize {
    let mut count = 0;
    rewrite(tree, &mut |e| {
        if matches!(e.kind(), ExprKind::Call { callee, .. } if callee.intrinsic == Some(intrinsic))
        {
            count += 1;
        }
        None
    });
    count
}

#[test]
fn claims_same_element_primitive_arrays_only() {
    let mapper = ArrayCopyMapper;
    assert!(mapper.is_match(&pair(Ty::array(Ty::i32()), Ty::array(Ty::i32()))));
    assert!(mapper.is_match(&pair(Ty::array(Ty::f64()), Ty::array(Ty::f64()))));

    // Differing element types, non-primitive elements, and non-arrays all
    // fall through.
    assert!(!mapper.is_match(&pair(Ty::array(Ty::i32()), Ty::array(Ty::i64()))));
    assert!(!mapper.is_match(&pair(Ty::array(Ty::str()), Ty::array(Ty::str()))));
    assert!(!mapper.is_match(&pair(Ty::seq(Ty::i32()), Ty::array(Ty::i32()))));
}

#[test]
fn copies_into_fresh_storage() {
    init_test_logging();
    let catalog = MapCatalog::new(ProfileMap::default());
    let pair = pair(Ty::array(Ty::i32()), Ty::array(Ty::i32()));
    let plan = catalog.compile(&pair).unwrap();
    assert_eq!(count_intrinsic(plan.expression(), Intrinsic::ArrayCopy), 1);

    let source = Value::array(
        Ty::i32(),
        vec![Value::i32(1), Value::i32(2), Value::i32(3)],
    );
    let result = plan.execute(source.clone()).unwrap();

    let (Value::Array(source), Value::Array(dest)) = (&source, &result) else {
        panic!("expected arrays");
    };
    assert_eq!(source.items(), dest.items());
    assert!(!source.ptr_eq(dest));
}

#[test]
fn null_source_yields_empty_array_by_default() {
    let catalog = MapCatalog::new(ProfileMap::default());
    let pair = pair(Ty::array(Ty::i32()), Ty::array(Ty::i32()));
    let plan = catalog.compile(&pair).unwrap();

    let result = plan.execute(Value::Null).unwrap();
    let Value::Array(dest) = result else {
        panic!("expected array");
    };
    assert!(dest.is_empty());
    assert_eq!(dest.elem_ty(), Ty::i32());
}

#[test]
fn null_source_maps_to_null_when_the_profile_allows() {
    let catalog = MapCatalog::new(ProfileMap {
        allow_null_collections: true,
    });
    let pair = pair(Ty::array(Ty::i32()), Ty::array(Ty::i32()));
    let plan = catalog.compile(&pair).unwrap();
    assert_eq!(plan.execute(Value::Null), Ok(Value::Null));
}

#[test]
fn member_policy_overrides_the_profile() {
    let catalog = MapCatalog::new(ProfileMap {
        allow_null_collections: true,
    });
    let pair = pair(Ty::array(Ty::i32()), Ty::array(Ty::i32()));
    let member = MemberMap {
        destination: "items".into(),
        allow_null_collections: Some(false),
    };

    let lambda = catalog.map_expression(&pair, Some(&member)).unwrap();
    let result = crate::eval::Evaluator::run_lambda(&lambda, &[Value::Null, Value::Null]).unwrap();
    let Value::Array(dest) = result else {
        panic!("expected array");
    };
    assert!(dest.is_empty());
}

#[test]
fn registered_element_conversion_disables_the_fast_path() {
    init_test_logging();
    let mut catalog = MapCatalog::new(ProfileMap::default());
    let elem_pair = TypePair::new(Ty::i32(), Ty::i32());
    let x = crate::expr::Param::new("x", Ty::i32());
    let double = crate::expr::factory::lambda(
        vec![x.clone()],
        crate::expr::factory::add(&x.expr(), &x.expr()),
    );
    catalog.register_type_map(TypeMap::new(elem_pair, Some(double)));

    let pair = pair(Ty::array(Ty::i32()), Ty::array(Ty::i32()));
    let plan = catalog.compile(&pair).unwrap();
    // The plan loops instead of bulk copying, so the conversion applies.
    assert_eq!(count_intrinsic(plan.expression(), Intrinsic::ArrayCopy), 0);

    let source = Value::array(Ty::i32(), vec![Value::i32(2), Value::i32(5)]);
    let result = plan.execute(source).unwrap();
    let Value::Array(dest) = result else {
        panic!("expected array");
    };
    assert_eq!(dest.items(), vec![Value::i32(4), Value::i32(10)]);
}

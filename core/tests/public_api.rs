//! Integration tests for the public API.
//!
//! These tests exercise the full path: configure a catalog, compile a
//! mapping plan for a type pair, and execute the emitted tree over
//! runtime values.

use pretty_assertions::assert_eq;

use remap_core::config::{MapCatalog, MemberMap, ProfileMap, TypeMap, TypePair};
use remap_core::eval::Evaluator;
use remap_core::expr::rewrite::{concat, null_check, rewrite};
use remap_core::expr::{factory, Expr, ExprKind, FieldRef, Param};
use remap_core::ty::{FieldDef, Intrinsic, ObjectShape, Ty};
use remap_core::values::Value;

fn array_pair(elem: Ty) -> TypePair {
    TypePair::new(Ty::array(elem.clone()), Ty::array(elem))
}

#[test]
fn primitive_array_round_trip() {
    let catalog = MapCatalog::new(ProfileMap::default());
    let plan = catalog.compile(&array_pair(Ty::i32())).unwrap();

    let source = Value::array(
        Ty::i32(),
        vec![Value::i32(1), Value::i32(2), Value::i32(3)],
    );
    let result = plan.execute(source.clone()).unwrap();

    let (Value::Array(source), Value::Array(dest)) = (&source, &result) else {
        panic!("expected arrays");
    };
    assert_eq!(source.items(), dest.items());
    // A copy, not an alias: writes to the destination leave the source
    // untouched.
    assert!(!source.ptr_eq(dest));
    dest.set(0, Value::i32(99));
    assert_eq!(source.get(0), Some(Value::i32(1)));
}

#[test]
fn emission_is_deterministic() {
    // Two independently built catalogs emit structurally equal plans for
    // the same pair.
    let a = MapCatalog::new(ProfileMap::default());
    let b = MapCatalog::new(ProfileMap::default());
    let pair = array_pair(Ty::i32());
    assert_eq!(
        *a.compile(&pair).unwrap().expression(),
        *b.compile(&pair).unwrap().expression()
    );
}

#[test]
fn null_collection_policy_round_trip() {
    let pair = array_pair(Ty::i32());

    let strict = MapCatalog::new(ProfileMap::default());
    let result = strict.compile(&pair).unwrap().execute(Value::Null).unwrap();
    assert_eq!(result.as_array().map(|a| a.len()), Some(0));

    let lenient = MapCatalog::new(ProfileMap {
        allow_null_collections: true,
    });
    assert_eq!(
        lenient.compile(&pair).unwrap().execute(Value::Null),
        Ok(Value::Null)
    );

    // A member-level override beats the profile default.
    let member = MemberMap {
        destination: "items".into(),
        allow_null_collections: Some(false),
    };
    let lambda = lenient.map_expression(&pair, Some(&member)).unwrap();
    let result = Evaluator::run_lambda(&lambda, &[Value::Null, Value::Null]).unwrap();
    assert_eq!(result.as_array().map(|a| a.len()), Some(0));
}

fn count_nodes(tree: &Expr, pred: impl Fn(&Expr) -> bool) -> usize {
    let mut count = 0;
    rewrite(tree, &mut |e| {
        if pred(e) {
            count += 1;
        }
        None
    });
    count
}

#[test]
fn fast_path_is_excluded_for_converted_elements() {
    let pair = array_pair(Ty::i32());

    // Without a registered element conversion the plan bulk copies.
    let plain = MapCatalog::new(ProfileMap::default());
    let plan = plain.compile(&pair).unwrap();
    assert_eq!(
        count_nodes(plan.expression(), |e| {
            matches!(e.kind(), ExprKind::Call { callee, .. }
                if callee.intrinsic == Some(Intrinsic::ArrayCopy))
        }),
        1
    );

    // With one, the same pair falls back to the element loop.
    let mut converting = MapCatalog::new(ProfileMap::default());
    let x = Param::new("x", Ty::i32());
    let negate_ish = factory::lambda(
        vec![x.clone()],
        factory::add(&x.expr(), &factory::i32_const(1)),
    );
    converting.register_type_map(TypeMap::new(
        TypePair::new(Ty::i32(), Ty::i32()),
        Some(negate_ish),
    ));
    let plan = converting.compile(&pair).unwrap();
    assert_eq!(
        count_nodes(plan.expression(), |e| {
            matches!(e.kind(), ExprKind::Call { callee, .. }
                if callee.intrinsic == Some(Intrinsic::ArrayCopy))
        }),
        0
    );
    let source = Value::array(Ty::i32(), vec![Value::i32(41)]);
    let result = plan.execute(source).unwrap();
    assert_eq!(
        result.as_array().map(|a| a.items()),
        Some(vec![Value::i32(42)])
    );
}

fn chain_shapes() -> (std::rc::Rc<ObjectShape>, std::rc::Rc<ObjectShape>, std::rc::Rc<ObjectShape>) {
    let c = ObjectShape::new("C", vec![FieldDef::new("d", Ty::i64())]);
    let b = ObjectShape::new("B", vec![FieldDef::new("c", Ty::object(c.clone()))]);
    let a = ObjectShape::new("A", vec![FieldDef::new("b", Ty::object(b.clone()))]);
    (a, b, c)
}

#[test]
fn null_check_short_circuits_deep_chains() {
    let (a, b, c) = chain_shapes();
    let source = Param::new("source", Ty::object(a.clone()));
    let leaf = factory::field(
        &factory::field(
            &factory::field(&source.expr(), FieldRef::new("b", Ty::object(b.clone()))),
            FieldRef::new("c", Ty::object(c.clone())),
        ),
        FieldRef::new("d", Ty::i64()),
    );
    let lambda = factory::lambda(vec![source], null_check(&leaf, None));

    // b is null: later links must not be dereferenced.
    let broken = Value::object(a.clone(), vec![Value::Null]);
    assert_eq!(Evaluator::run_lambda(&lambda, &[broken]), Ok(Value::i64(0)));

    let intact = Value::object(
        a,
        vec![Value::object(
            b,
            vec![Value::object(c, vec![Value::i64(7)])],
        )],
    );
    assert_eq!(Evaluator::run_lambda(&lambda, &[intact]), Ok(Value::i64(7)));
}

#[test]
fn sequence_loops_dispose_exactly_once() {
    // Observe disposal through a pre-made enumerator value: iterate it
    // directly so the emitted loop's using wrapper targets our handle.
    use remap_core::expr::loops;
    use remap_core::values::EnumeratorHandle;

    let enumerator = EnumeratorHandle::new(
        Ty::i64(),
        vec![Value::i64(1), Value::i64(2)],
    );
    let source = Param::new("source", Ty::enumerator(Ty::i64()));
    let sum = Param::new("sum", Ty::i64());
    let item = Param::new("item", Ty::i64());

    // Hand-rolled enumerator walk in the same shape for_each emits.
    let move_next = factory::call(
        remap_core::ty::MethodDef::move_next(),
        Some(&source.expr()),
        vec![],
    );
    let label = remap_core::expr::Label::new("loop_break");
    let step = factory::cond(
        &factory::equal(&move_next, &factory::bool_const(true)),
        &factory::block(
            vec![item.clone()],
            vec![
                factory::assign(
                    &item.expr(),
                    &factory::field(&source.expr(), FieldRef::read_only("current", Ty::i64())),
                ),
                factory::assign(&sum.expr(), &factory::add(&sum.expr(), &item.expr())),
            ],
        ),
        &factory::break_(label.clone()),
    );
    let body = factory::block(
        vec![sum.clone()],
        vec![
            factory::assign(&sum.expr(), &factory::i64_const(0)),
            loops::using_(&source.expr(), &factory::loop_(&step, label)),
            sum.expr(),
        ],
    );
    let lambda = factory::lambda(vec![source], body);

    let result = Evaluator::run_lambda(&lambda, &[Value::Enumerator(enumerator.clone())]);
    assert_eq!(result, Ok(Value::i64(3)));
    assert!(enumerator.is_disposed());
}

#[test]
fn sequence_loops_dispose_when_the_body_errors() {
    use remap_core::error::ExecError;
    use remap_core::expr::loops;
    use remap_core::values::EnumeratorHandle;

    let enumerator = EnumeratorHandle::new(
        Ty::i64(),
        vec![Value::i64(1), Value::i64(2)],
    );
    let source = Param::new("source", Ty::enumerator(Ty::i64()));

    // The body dereferences a field off a null constant, failing on the
    // first iteration.
    let poison = factory::field(
        &factory::null_of(&Ty::str()),
        FieldRef::read_only("len", Ty::i64()),
    );
    let move_next = factory::call(
        remap_core::ty::MethodDef::move_next(),
        Some(&source.expr()),
        vec![],
    );
    let label = remap_core::expr::Label::new("loop_break");
    let step = factory::cond(
        &factory::equal(&move_next, &factory::bool_const(true)),
        &poison,
        &factory::break_(label.clone()),
    );
    let body = loops::using_(&source.expr(), &factory::loop_(&step, label));
    let lambda = factory::lambda(vec![source], body);

    let result = Evaluator::run_lambda(&lambda, &[Value::Enumerator(enumerator.clone())]);
    assert_eq!(
        result,
        Err(ExecError::NullDereference {
            member: "len".into()
        })
    );
    assert!(enumerator.is_disposed());
}

#[test]
fn concat_composes_selector_pipelines() {
    let (a, b, _) = chain_shapes();

    // outer: |v: B| v.c is replaced into inner's body.
    let v = Param::new("v", Ty::object(b.clone()));
    let c_shape = ObjectShape::new("C", vec![FieldDef::new("d", Ty::i64())]);
    let outer = factory::lambda(
        vec![v.clone()],
        factory::field(&v.expr(), FieldRef::new("c", Ty::object(c_shape.clone()))),
    );

    let s = Param::new("s", Ty::object(a.clone()));
    let inner = factory::lambda(
        vec![s.clone()],
        factory::field(&s.expr(), FieldRef::new("b", Ty::object(b.clone()))),
    );

    let composed = concat(&outer, &inner);
    let value = Value::object(
        a,
        vec![Value::object(
            b,
            vec![Value::object(c_shape.clone(), vec![Value::i64(5)])],
        )],
    );
    let result = Evaluator::run_lambda(&composed, &[value]).unwrap();
    let Value::Object(h) = result else {
        panic!("expected object");
    };
    assert_eq!(h.shape().name, "C");
    assert_eq!(h.get("d"), Some(Value::i64(5)));
}

//! Tests for chain decomposition and composition.

use pretty_assertions::assert_eq;

use crate::ty::{FieldDef, MethodDef, MethodKind, ObjectShape, Ty};

use super::chain::*;
use super::{factory, Expr, ExprKind, FieldRef, Param};

fn customer_ty() -> Ty {
    let order = ObjectShape::new("Order", vec![FieldDef::new("total", Ty::i64())]);
    Ty::object(ObjectShape::new(
        "Customer",
        vec![FieldDef::new("order", Ty::object(order))],
    ))
}

fn order_field(target: &Expr) -> Expr {
    let order = ObjectShape::new("Order", vec![FieldDef::new("total", Ty::i64())]);
    factory::field(target, FieldRef::new("order", Ty::object(order)))
}

fn total_field(target: &Expr) -> Expr {
    factory::field(target, FieldRef::new("total", Ty::i64()))
}

#[test]
fn decomposes_field_chain_root_first() {
    let source = Param::new("source", customer_ty());
    let leaf = total_field(&order_field(&source.expr()));

    let chain = get_chain(&leaf);
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].link.name(), "order");
    assert_eq!(chain[1].link.name(), "total");
    assert!(chain[0].target.as_param().is_some());
    assert!(chain[1].expr.ptr_eq(&leaf));
}

#[test]
fn chain_stops_below_non_chain_node() {
    let sum = factory::add(&factory::i64_const(1), &factory::i64_const(2));
    let leaf = total_field(&sum);

    let chain = get_chain(&leaf);
    assert_eq!(chain.len(), 1);
    assert!(chain[0].target.ptr_eq(&sum));
}

#[test]
fn extension_call_links_through_first_argument() {
    let source = Param::new("source", Ty::seq(Ty::i32()));
    let first = MethodDef::new("first", Ty::i32(), MethodKind::Extension);
    let call = factory::call(first, None, vec![source.expr()]);

    let chain = get_chain(&call);
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].link.name(), "first");
    assert!(chain[0].target.as_param().is_some());
}

#[test]
fn plain_static_call_terminates_chain() {
    let source = Param::new("source", Ty::seq(Ty::i32()));
    let make = MethodDef::new("make", Ty::i32(), MethodKind::Static);
    let call = factory::call(make, None, vec![source.expr()]);

    assert!(get_chain(&call).is_empty());
}

#[test]
fn recomposes_over_new_root() {
    let source = Param::new("source", customer_ty());
    let leaf = total_field(&order_field(&source.expr()));

    let links: Vec<_> = members_chain(&leaf).into_iter().collect();
    let other = Param::new("other", customer_ty());
    let rebuilt = chain(&links, &other.expr());

    assert_eq!(rebuilt, total_field(&order_field(&other.expr())));
}

#[test]
fn round_trips_mixed_link_shapes() {
    let source = Param::new("source", customer_ty());
    let items = MethodDef::new("items", Ty::seq(Ty::i64()), MethodKind::Instance);
    let first = MethodDef::new("first", Ty::i64(), MethodKind::Extension);
    let links = vec![
        ChainLink::Field(FieldRef::new("order", Ty::seq(Ty::i64()))),
        ChainLink::Method(items),
        ChainLink::Method(first),
    ];

    let composed = chain(&links, &source.expr());
    let recovered: Vec<_> = members_chain(&composed).into_iter().collect();
    assert_eq!(recovered, links);
}

#[test]
fn chain_exprs_threads_lambdas_and_members() {
    let source = Param::new("source", customer_ty());
    let x = Param::new("x", Ty::i64());
    let add_one = factory::lambda(
        vec![x.clone()],
        factory::add(&x.expr(), &factory::i64_const(1)),
    );
    let member = {
        let inner = Param::new("c", customer_ty());
        total_field(&order_field(&inner.expr()))
    };

    let result = chain_exprs(&[member, add_one], &source.expr());
    let expected = factory::add(
        &total_field(&order_field(&source.expr())),
        &factory::i64_const(1),
    );
    assert_eq!(result, expected);
}

#[test]
fn member_path_accepts_pure_field_chains_only() {
    let source = Param::new("source", customer_ty());
    let selector = factory::lambda(
        vec![source.clone()],
        total_field(&order_field(&source.expr())),
    );
    assert!(is_member_path(&selector));
    assert!(ensure_member_path(&selector, "destination").is_ok());

    let first = MethodDef::new("first", Ty::i64(), MethodKind::Instance);
    let with_call = factory::lambda(
        vec![source.clone()],
        factory::call(first, Some(&order_field(&source.expr())), vec![]),
    );
    assert!(!is_member_path(&with_call));

    let computed = factory::lambda(
        vec![source.clone()],
        factory::add(&total_field(&order_field(&source.expr())), &factory::i64_const(1)),
    );
    let err = ensure_member_path(&computed, "destination").unwrap_err();
    assert!(err.to_string().contains("destination"));
}

#[test]
fn setter_requires_settable_member() {
    let source = Param::new("source", customer_ty());
    let writable = factory::field(&source.expr(), FieldRef::new("order", Ty::i64()));
    let frozen = factory::field(&source.expr(), FieldRef::read_only("order", Ty::i64()));

    assert!(get_setter(&writable).is_some());
    assert_eq!(get_setter(&frozen), None);
}

#[test]
fn update_target_rebuilds_each_link_shape() {
    let source = Param::new("source", customer_ty());
    let other = Param::new("other", customer_ty());

    let field = order_field(&source.expr());
    let retargeted = update_target(&field, &other.expr());
    assert_eq!(retargeted, order_field(&other.expr()));

    let first = MethodDef::new("first", Ty::i64(), MethodKind::Extension);
    let ext = factory::call(first.clone(), None, vec![source.expr(), factory::i64_const(3)]);
    let retargeted = update_target(&ext, &other.expr());
    match retargeted.kind() {
        ExprKind::Call { args, .. } => {
            assert_eq!(args[0], other.expr());
            assert_eq!(args[1], factory::i64_const(3));
        }
        other => panic!("expected call, got {:?}", other),
    }
}

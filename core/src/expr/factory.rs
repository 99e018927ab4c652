//! Node constructors.
//!
//! Thin wrappers over [`Expr::new`] that keep call sites terse and collect
//! the handful of constructors with real logic ([`to_type`], [`if_null_else`])
//! in one place. All constructors take borrowed operands and clone the
//! cheap handles internally.

use std::rc::Rc;

use crate::ty::{MethodDef, Ty};
use crate::values::Value;

use super::{BinOp, Expr, ExprKind, FieldRef, Label, Param};

pub fn constant(value: Value, ty: Ty) -> Expr {
    Expr::new(ExprKind::Constant(value, ty))
}

/// The null constant of a given static type.
pub fn null_of(ty: &Ty) -> Expr {
    constant(Value::Null, ty.clone())
}

pub fn bool_const(b: bool) -> Expr {
    constant(Value::bool(b), Ty::bool())
}

pub fn i32_const(n: i32) -> Expr {
    constant(Value::i32(n), Ty::i32())
}

pub fn i64_const(n: i64) -> Expr {
    constant(Value::i64(n), Ty::i64())
}

pub fn field(target: &Expr, field: FieldRef) -> Expr {
    Expr::new(ExprKind::Field {
        target: target.clone(),
        field,
    })
}

pub fn call(callee: Rc<MethodDef>, receiver: Option<&Expr>, args: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Call {
        callee,
        receiver: receiver.cloned(),
        args,
    })
}

pub fn convert(value: &Expr, ty: &Ty) -> Expr {
    Expr::new(ExprKind::Convert {
        value: value.clone(),
        ty: ty.clone(),
    })
}

/// Converts only when the static types differ; the identity case returns
/// the node unchanged so rewrites stay no-ops on already conforming trees.
pub fn to_type(value: &Expr, ty: &Ty) -> Expr {
    if value.ty() == *ty {
        value.clone()
    } else {
        convert(value, ty)
    }
}

pub fn type_as(value: &Expr, ty: &Ty) -> Expr {
    Expr::new(ExprKind::TypeAs {
        value: value.clone(),
        ty: ty.clone(),
    })
}

pub fn default_of(ty: &Ty) -> Expr {
    Expr::new(ExprKind::Default(ty.clone()))
}

pub fn new_array(elem: &Ty, len: &Expr) -> Expr {
    Expr::new(ExprKind::NewArray {
        elem: elem.clone(),
        len: len.clone(),
    })
}

pub fn array_index(array: &Expr, index: &Expr) -> Expr {
    Expr::new(ExprKind::ArrayIndex {
        array: array.clone(),
        index: index.clone(),
    })
}

pub fn array_length(array: &Expr) -> Expr {
    Expr::new(ExprKind::ArrayLength(array.clone()))
}

fn binary(op: BinOp, left: &Expr, right: &Expr) -> Expr {
    Expr::new(ExprKind::Binary {
        op,
        left: left.clone(),
        right: right.clone(),
    })
}

pub fn equal(left: &Expr, right: &Expr) -> Expr {
    binary(BinOp::Equal, left, right)
}

pub fn not_equal(left: &Expr, right: &Expr) -> Expr {
    binary(BinOp::NotEqual, left, right)
}

pub fn or_else(left: &Expr, right: &Expr) -> Expr {
    binary(BinOp::OrElse, left, right)
}

pub fn less_than(left: &Expr, right: &Expr) -> Expr {
    binary(BinOp::LessThan, left, right)
}

pub fn add(left: &Expr, right: &Expr) -> Expr {
    binary(BinOp::Add, left, right)
}

pub fn assign(target: &Expr, value: &Expr) -> Expr {
    Expr::new(ExprKind::Assign {
        target: target.clone(),
        value: value.clone(),
    })
}

pub fn block(vars: Vec<Param>, exprs: Vec<Expr>) -> Expr {
    Expr::new(ExprKind::Block { vars, exprs })
}

pub fn cond(test: &Expr, then: &Expr, or: &Expr) -> Expr {
    Expr::new(ExprKind::Cond {
        test: test.clone(),
        then: then.clone(),
        or: or.clone(),
    })
}

pub fn loop_(body: &Expr, label: Label) -> Expr {
    Expr::new(ExprKind::Loop {
        body: body.clone(),
        label,
    })
}

pub fn break_(label: Label) -> Expr {
    Expr::new(ExprKind::Break(label))
}

pub fn try_finally(body: &Expr, finally: &Expr) -> Expr {
    Expr::new(ExprKind::TryFinally {
        body: body.clone(),
        finally: finally.clone(),
    })
}

pub fn lambda(params: Vec<Param>, body: Expr) -> Expr {
    Expr::new(ExprKind::Lambda { params, body })
}

pub fn empty() -> Expr {
    Expr::new(ExprKind::Empty)
}

/// Branch on nullness: `then` when `expr` is null, otherwise `or` widened
/// to `then`'s type (defaulting to `default(then.ty)` when absent).
///
/// Non-nullable value types can never be null, so the non-null branch is
/// emitted directly without a test.
pub fn if_null_else(expr: &Expr, then: &Expr, or: Option<&Expr>) -> Expr {
    let non_null = match or {
        Some(e) => to_type(e, &then.ty()),
        None => default_of(&then.ty()),
    };
    let ty = expr.ty();
    if ty.is_value_type() && ty.nullable_inner().is_none() {
        non_null
    } else {
        cond(&equal(expr, &null_of(&ty)), then, &non_null)
    }
}

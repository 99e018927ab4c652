//! Tree rewriting.
//!
//! All rewrites are built on one recursive-descent pass: the callback sees
//! each node top-down and either substitutes a replacement (skipping its
//! subtree) or lets the pass rebuild the node from rewritten children.
//! Unchanged subtrees are returned as the same shared node, so a rewrite
//! that touches nothing is the identity.

use crate::ty::Ty;

use super::chain::{get_chain, update_target};
use super::{factory, Expr, ExprKind, Param};

/// Rewrites `expr` top-down. `f` returning `Some` replaces the node without
/// visiting its children; `None` recurses and rebuilds.
pub fn rewrite(expr: &Expr, f: &mut dyn FnMut(&Expr) -> Option<Expr>) -> Expr {
    if let Some(replacement) = f(expr) {
        return replacement;
    }
    let rw = |e: &Expr, f: &mut dyn FnMut(&Expr) -> Option<Expr>| rewrite(e, f);
    match expr.kind() {
        ExprKind::Constant(..)
        | ExprKind::Param(_)
        | ExprKind::Default(_)
        | ExprKind::Break(_)
        | ExprKind::Empty => expr.clone(),
        ExprKind::Field { target, field } => {
            let new_target = rw(target, f);
            if new_target.ptr_eq(target) {
                expr.clone()
            } else {
                factory::field(&new_target, field.clone())
            }
        }
        ExprKind::Call {
            callee,
            receiver,
            args,
        } => {
            let new_receiver = receiver.as_ref().map(|r| rw(r, f));
            let new_args: Vec<Expr> = args.iter().map(|a| rw(a, f)).collect();
            let unchanged = match (&new_receiver, receiver) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            } && new_args.iter().zip(args).all(|(a, b)| a.ptr_eq(b));
            if unchanged {
                expr.clone()
            } else {
                factory::call(callee.clone(), new_receiver.as_ref(), new_args)
            }
        }
        ExprKind::Convert { value, ty } => {
            let new_value = rw(value, f);
            if new_value.ptr_eq(value) {
                expr.clone()
            } else {
                factory::convert(&new_value, ty)
            }
        }
        ExprKind::TypeAs { value, ty } => {
            let new_value = rw(value, f);
            if new_value.ptr_eq(value) {
                expr.clone()
            } else {
                factory::type_as(&new_value, ty)
            }
        }
        ExprKind::NewArray { elem, len } => {
            let new_len = rw(len, f);
            if new_len.ptr_eq(len) {
                expr.clone()
            } else {
                factory::new_array(elem, &new_len)
            }
        }
        ExprKind::ArrayIndex { array, index } => {
            let new_array = rw(array, f);
            let new_index = rw(index, f);
            if new_array.ptr_eq(array) && new_index.ptr_eq(index) {
                expr.clone()
            } else {
                factory::array_index(&new_array, &new_index)
            }
        }
        ExprKind::ArrayLength(array) => {
            let new_array = rw(array, f);
            if new_array.ptr_eq(array) {
                expr.clone()
            } else {
                factory::array_length(&new_array)
            }
        }
        ExprKind::Binary { op, left, right } => {
            let new_left = rw(left, f);
            let new_right = rw(right, f);
            if new_left.ptr_eq(left) && new_right.ptr_eq(right) {
                expr.clone()
            } else {
                Expr::new(ExprKind::Binary {
                    op: *op,
                    left: new_left,
                    right: new_right,
                })
            }
        }
        ExprKind::Assign { target, value } => {
            let new_target = rw(target, f);
            let new_value = rw(value, f);
            if new_target.ptr_eq(target) && new_value.ptr_eq(value) {
                expr.clone()
            } else {
                factory::assign(&new_target, &new_value)
            }
        }
        ExprKind::Block { vars, exprs } => {
            let new_exprs: Vec<Expr> = exprs.iter().map(|e| rw(e, f)).collect();
            if new_exprs.iter().zip(exprs).all(|(a, b)| a.ptr_eq(b)) {
                expr.clone()
            } else {
                factory::block(vars.clone(), new_exprs)
            }
        }
        ExprKind::Cond { test, then, or } => {
            let new_test = rw(test, f);
            let new_then = rw(then, f);
            let new_or = rw(or, f);
            if new_test.ptr_eq(test) && new_then.ptr_eq(then) && new_or.ptr_eq(or) {
                expr.clone()
            } else {
                factory::cond(&new_test, &new_then, &new_or)
            }
        }
        ExprKind::Loop { body, label } => {
            let new_body = rw(body, f);
            if new_body.ptr_eq(body) {
                expr.clone()
            } else {
                factory::loop_(&new_body, label.clone())
            }
        }
        ExprKind::TryFinally { body, finally } => {
            let new_body = rw(body, f);
            let new_finally = rw(finally, f);
            if new_body.ptr_eq(body) && new_finally.ptr_eq(finally) {
                expr.clone()
            } else {
                factory::try_finally(&new_body, &new_finally)
            }
        }
        ExprKind::Lambda { params, body } => {
            let new_body = rw(body, f);
            if new_body.ptr_eq(body) {
                expr.clone()
            } else {
                factory::lambda(params.clone(), new_body)
            }
        }
    }
}

/// Replaces every occurrence of `old` (by node identity) with `new`.
pub fn replace(expr: &Expr, old: &Expr, new: &Expr) -> Expr {
    rewrite(expr, &mut |e| e.ptr_eq(old).then(|| new.clone()))
}

/// The body of `lambda` with its parameters substituted positionally.
///
/// Extra replacements beyond the lambda's arity are ignored, as are extra
/// parameters beyond the replacements. A non-lambda input passes through
/// unchanged.
pub fn replace_parameters(lambda: &Expr, replacements: &[Expr]) -> Expr {
    let ExprKind::Lambda { params, body } = lambda.kind() else {
        return lambda.clone();
    };
    substitute(body, params, replacements, false)
}

/// Like [`replace_parameters`], but widens each replacement to the declared
/// parameter type so callers can thread looser-typed values through.
pub fn convert_replace_parameters(lambda: &Expr, replacements: &[Expr]) -> Expr {
    let ExprKind::Lambda { params, body } = lambda.kind() else {
        return lambda.clone();
    };
    substitute(body, params, replacements, true)
}

fn substitute(body: &Expr, params: &[Param], replacements: &[Expr], converting: bool) -> Expr {
    let mut result = body.clone();
    for (param, replacement) in params.iter().zip(replacements) {
        let new = if converting {
            factory::to_type(replacement, &param.ty())
        } else {
            replacement.clone()
        };
        result = rewrite(&result, &mut |e| match e.kind() {
            ExprKind::Param(p) if p.ptr_eq(param) => Some(new.clone()),
            _ => None,
        });
    }
    result
}

/// Composes `inner` into `outer`: the result keeps `inner`'s parameters and
/// evaluates `outer`'s body with its first parameter bound to `inner`'s
/// result.
///
/// The first node of `inner`'s body that is neither a parameter nor a
/// lambda becomes the bound value; an untyped (`any`) value is narrowed to
/// `outer`'s parameter type first. A non-lambda `inner` passes through
/// unchanged.
pub fn concat(outer: &Expr, inner: &Expr) -> Expr {
    let ExprKind::Lambda { params, body } = inner.kind() else {
        return inner.clone();
    };
    let outer_param_ty = match outer.kind() {
        ExprKind::Lambda { params, .. } => params.first().map(Param::ty),
        _ => None,
    };
    let new_body = rewrite(body, &mut |e| match e.kind() {
        ExprKind::Param(_) | ExprKind::Lambda { .. } => None,
        _ => {
            let value = match &outer_param_ty {
                Some(ty) if e.ty().is_any() => factory::convert(e, ty),
                _ => e.clone(),
            };
            Some(replace_parameters(outer, &[value]))
        }
    });
    factory::lambda(params.clone(), new_body)
}

/// Rewrites a member chain into a short-circuiting null-safe form.
///
/// Each chain prefix is captured in a temp variable and tested before the
/// next link dereferences it; the tests are or-chained so the first null
/// prefix skips the rest and yields `default(return type)`. Value-typed
/// prefixes cannot be null but are still assigned so later links see them.
/// An expression that is not a chain rooted at a parameter passes through
/// unchanged.
///
/// `destination_ty` widens the result: when it is the nullable form of the
/// expression's type, the null case yields null instead of the default
/// value.
pub fn null_check(expr: &Expr, destination_ty: Option<&Ty>) -> Expr {
    let chain = get_chain(expr);
    let Some(root_param) = chain.first().and_then(|m| m.target.as_param()) else {
        return expr.clone();
    };
    let mut variables: Vec<Param> = vec![root_param.clone()];
    let mut name = root_param.name().to_string();
    let mut check = factory::bool_const(false);
    for member in &chain {
        let variable = Param::new(name.clone(), member.target.ty());
        name.push_str(member.link.name());
        let previous = variables[variables.len() - 1].expr();
        let assignment = factory::assign(&variable.expr(), &update_target(&member.target, &previous));
        variables.push(variable.clone());
        let link_check = if variable.ty().is_value_type() {
            factory::block(vec![], vec![assignment, factory::bool_const(false)])
        } else {
            factory::equal(&assignment, &factory::null_of(&variable.ty()))
        };
        check = factory::or_else(&check, &link_check);
    }
    let expr_ty = expr.ty();
    let return_ty = match destination_ty {
        Some(dest) if dest.nullable_inner() == Some(&expr_ty) => dest.clone(),
        _ => expr_ty,
    };
    let last = variables[variables.len() - 1].expr();
    let non_null = factory::to_type(&update_target(expr, &last), &return_ty);
    factory::block(
        variables[1..].to_vec(),
        vec![factory::cond(
            &check,
            &factory::default_of(&return_ty),
            &non_null,
        )],
    )
}

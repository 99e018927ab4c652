//! Member and method chain decomposition and composition.
//!
//! A chain is the root-to-leaf spine of nested member accesses and calls,
//! e.g. `source.order.total` or `source.items.first()`. Decomposition walks
//! leaf-inward and stops at the first node that is neither a member access
//! nor a chainable call; composition rebuilds a spine over a new root.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::MapError;
use crate::ty::{MethodDef, MethodKind};

use super::rewrite::{replace, replace_parameters};
use super::{factory, Expr, ExprKind, FieldRef};

/// One link in a chain: a field access or a chainable method.
#[derive(Clone, Debug, PartialEq)]
pub enum ChainLink {
    Field(FieldRef),
    Method(Rc<MethodDef>),
}

impl ChainLink {
    pub fn name(&self) -> &str {
        match self {
            ChainLink::Field(f) => &f.name,
            ChainLink::Method(m) => &m.name,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, ChainLink::Field(_))
    }
}

/// A decomposed chain node: the node itself, the link it applies, and the
/// expression it applies the link to.
#[derive(Clone, Debug)]
pub struct Member {
    pub expr: Expr,
    pub link: ChainLink,
    pub target: Expr,
}

/// Decomposes `expr` into its chain, ordered root to leaf.
///
/// Three node shapes extend a chain: a field access, an extension-style
/// call whose first argument is the target, and an instance call whose
/// receiver is the target. Anything else ends the walk, so an expression
/// that is not a chain at all yields an empty vector.
pub fn get_chain(expr: &Expr) -> SmallVec<[Member; 4]> {
    let mut chain = SmallVec::new();
    let mut current = expr.clone();
    loop {
        let member = match current.kind() {
            ExprKind::Field { target, field } => Member {
                expr: current.clone(),
                link: ChainLink::Field(field.clone()),
                target: target.clone(),
            },
            ExprKind::Call { callee, args, .. }
                if callee.kind == MethodKind::Extension && !args.is_empty() =>
            {
                Member {
                    expr: current.clone(),
                    link: ChainLink::Method(callee.clone()),
                    target: args[0].clone(),
                }
            }
            ExprKind::Call {
                callee,
                receiver: Some(receiver),
                ..
            } if callee.kind == MethodKind::Instance => Member {
                expr: current.clone(),
                link: ChainLink::Method(callee.clone()),
                target: receiver.clone(),
            },
            _ => break,
        };
        current = member.target.clone();
        chain.push(member);
    }
    chain.reverse();
    chain
}

/// The links of a chain, ordered root to leaf.
pub fn members_chain(expr: &Expr) -> SmallVec<[ChainLink; 4]> {
    get_chain(expr).into_iter().map(|m| m.link).collect()
}

/// Composes a spine of links over `root`, leaf outward.
pub fn chain(links: &[ChainLink], root: &Expr) -> Expr {
    links.iter().fold(root.clone(), |target, link| match link {
        ChainLink::Field(f) => factory::field(&target, f.clone()),
        ChainLink::Method(m) if m.kind == MethodKind::Instance => {
            factory::call(m.clone(), Some(&target), vec![])
        }
        ChainLink::Method(m) => factory::call(m.clone(), None, vec![target]),
    })
}

/// Threads `root` through a pipeline of expressions, left to right.
///
/// A lambda consumes the accumulated value through its parameter; any other
/// expression has its chain root replaced by the accumulated value. An
/// expression with no chain passes through unchanged.
pub fn chain_exprs(exprs: &[Expr], root: &Expr) -> Expr {
    exprs.iter().fold(root.clone(), |left, right| {
        if matches!(right.kind(), ExprKind::Lambda { .. }) {
            replace_parameters(right, &[left])
        } else {
            match get_chain(right).first() {
                Some(member) => replace(right, &member.target, &left),
                None => right.clone(),
            }
        }
    })
}

/// Whether `lambda` is a pure member path: a non-empty chain of field
/// accesses rooted at the parameter and covering the whole body.
pub fn is_member_path(lambda: &Expr) -> bool {
    let ExprKind::Lambda { body, .. } = lambda.kind() else {
        return false;
    };
    let mut current = None;
    for member in get_chain(body) {
        if !member.link.is_field() {
            return false;
        }
        current = Some(member.expr);
    }
    matches!(current, Some(leaf) if leaf.ptr_eq(body))
}

/// Validates a user-supplied member selector, naming the offending
/// argument in the error.
pub fn ensure_member_path(lambda: &Expr, argument: &str) -> Result<(), MapError> {
    if is_member_path(lambda) {
        Ok(())
    } else {
        Err(MapError::InvalidMemberPath {
            argument: argument.to_string(),
            expr: lambda.to_string(),
        })
    }
}

/// The assignable form of a member access, or `None` when the member is
/// read-only.
pub fn get_setter(expr: &Expr) -> Option<Expr> {
    match expr.kind() {
        ExprKind::Field { field, .. } if field.settable => Some(expr.clone()),
        _ => None,
    }
}

/// Rebuilds a chain node over a new target. Non-chain nodes pass through
/// unchanged.
pub fn update_target(expr: &Expr, new_target: &Expr) -> Expr {
    match expr.kind() {
        ExprKind::Field { field, .. } => factory::field(new_target, field.clone()),
        ExprKind::Call {
            callee,
            receiver: Some(_),
            args,
        } => factory::call(callee.clone(), Some(new_target), args.clone()),
        ExprKind::Call {
            callee,
            receiver: None,
            args,
        } if !args.is_empty() => {
            let mut new_args = Vec::with_capacity(args.len());
            new_args.push(new_target.clone());
            new_args.extend(args[1..].iter().cloned());
            factory::call(callee.clone(), None, new_args)
        }
        _ => expr.clone(),
    }
}

//! The expression-tree intermediate representation and its toolkit.
//!
//! Expressions are immutable, persistent trees: a lightweight `Expr` handle
//! over a reference-counted node carrying the kind and the node's static
//! type, computed at construction so every tree is well-typed by
//! construction. Rewrites never mutate in place — they produce new trees
//! that share unchanged subtrees with the original.
//!
//! The toolkit is split by concern:
//! - [`factory`]: small node constructors and typed constants
//! - [`chain`]: member/method chain decomposition and composition
//! - [`rewrite`]: recursive-descent rewriting, parameter substitution,
//!   lambda concatenation, and the null-propagating rewrite
//! - [`loops`]: iteration constructs and scoped disposal

pub mod chain;
pub mod factory;
pub mod loops;
pub mod rewrite;

#[cfg(test)]
mod chain_test;

use std::fmt;
use std::rc::Rc;

use crate::ty::{MethodDef, MethodKind, Ty};
use crate::values::Value;

/// A named, typed parameter.
///
/// Identity during rewriting is by pointer, so the same parameter can be
/// told apart from an identically named one in a different lambda. Across
/// independently built trees equality is structural (name and type), which
/// is what makes repeated emission produce structurally equal output.
#[derive(Clone, Debug)]
pub struct Param(Rc<ParamData>);

#[derive(Debug)]
pub struct ParamData {
    name: String,
    ty: Ty,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self(Rc::new(ParamData {
            name: name.into(),
            ty,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ty(&self) -> Ty {
        self.0.ty.clone()
    }

    /// This parameter as an expression node.
    pub fn expr(&self) -> Expr {
        Expr::new(ExprKind::Param(self.clone()))
    }

    pub fn ptr_eq(&self, other: &Param) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Param {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || (self.0.name == other.0.name && self.0.ty == other.0.ty)
    }
}

/// A loop label. `Break` binds to its `Loop` by pointer identity.
#[derive(Clone, Debug)]
pub struct Label(Rc<LabelData>);

#[derive(Debug)]
pub struct LabelData {
    name: String,
}

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(LabelData { name: name.into() }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ptr_eq(&self, other: &Label) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

/// Binary operators used by generated code.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinOp {
    Equal,
    NotEqual,
    /// Short-circuiting logical or: the right operand is not evaluated when
    /// the left is true.
    OrElse,
    LessThan,
    Add,
}

/// One member link: a named, typed field reference resolved against the
/// runtime value by name.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldRef {
    pub name: String,
    pub ty: Ty,
    pub settable: bool,
}

impl FieldRef {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            settable: true,
        }
    }

    pub fn read_only(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
            settable: false,
        }
    }
}

/// The kind of an expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A literal value with an explicit static type (a null constant still
    /// knows which type's null it is).
    Constant(Value, Ty),
    Param(Param),
    /// Member access `target.field`.
    Field { target: Expr, field: FieldRef },
    /// Method call. Instance calls carry a receiver; extension-style and
    /// static calls pass the receiver (if any) as the first argument.
    Call {
        callee: Rc<MethodDef>,
        receiver: Option<Expr>,
        args: Vec<Expr>,
    },
    /// Checked type conversion; raises on runtime mismatch.
    Convert { value: Expr, ty: Ty },
    /// Conditional cast; yields null on runtime mismatch.
    TypeAs { value: Expr, ty: Ty },
    /// The type-appropriate default value.
    Default(Ty),
    /// Array allocation `new [elem; len]`, zero-initialized.
    NewArray { elem: Ty, len: Expr },
    ArrayIndex { array: Expr, index: Expr },
    /// Array length as i64.
    ArrayLength(Expr),
    Binary { op: BinOp, left: Expr, right: Expr },
    /// Assignment to a parameter, settable field, or array slot; evaluates
    /// to the assigned value.
    Assign { target: Expr, value: Expr },
    /// Scoped block: declares variables, evaluates expressions in order,
    /// yields the last one.
    Block { vars: Vec<Param>, exprs: Vec<Expr> },
    Cond { test: Expr, then: Expr, or: Expr },
    /// Infinite loop exited by `Break` to its label.
    Loop { body: Expr, label: Label },
    Break(Label),
    /// The finalizer runs on every exit path, including errors.
    TryFinally { body: Expr, finally: Expr },
    Lambda { params: Vec<Param>, body: Expr },
    /// The empty expression.
    Empty,
}

/// Lightweight handle to an expression node.
#[derive(Clone, Debug)]
pub struct Expr(Rc<ExprNode>);

#[derive(Debug)]
pub struct ExprNode {
    ty: Ty,
    kind: ExprKind,
}

impl ExprNode {
    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        let ty = compute_ty(&kind);
        Self(Rc::new(ExprNode { ty, kind }))
    }

    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    pub fn kind(&self) -> &ExprKind {
        self.0.kind()
    }

    pub fn ty(&self) -> Ty {
        self.0.ty.clone()
    }

    /// Node identity, used by identity-based rewriting.
    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The parameter inside a `Param` node, if this is one.
    pub fn as_param(&self) -> Option<&Param> {
        match self.kind() {
            ExprKind::Param(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.0.ty == other.0.ty && self.0.kind == other.0.kind)
    }
}

/// The static type of a node, derived from its kind at construction.
///
/// Total over all kinds: unresolvable shapes (indexing a non-array, a
/// conditional with diverging branch types) degrade to `Any`/`Unit` rather
/// than failing, matching the toolkit's no-raise contract.
fn compute_ty(kind: &ExprKind) -> Ty {
    match kind {
        ExprKind::Constant(_, ty) => ty.clone(),
        ExprKind::Param(p) => p.ty(),
        ExprKind::Field { field, .. } => field.ty.clone(),
        ExprKind::Call { callee, .. } => callee.ret.clone(),
        ExprKind::Convert { ty, .. } => ty.clone(),
        ExprKind::TypeAs { ty, .. } => ty.clone(),
        ExprKind::Default(ty) => ty.clone(),
        ExprKind::NewArray { elem, .. } => Ty::array(elem.clone()),
        ExprKind::ArrayIndex { array, .. } => {
            array.ty().array_elem().cloned().unwrap_or_else(Ty::any)
        }
        ExprKind::ArrayLength(_) => Ty::i64(),
        ExprKind::Binary { op, left, .. } => match op {
            BinOp::Equal | BinOp::NotEqual | BinOp::OrElse | BinOp::LessThan => Ty::bool(),
            BinOp::Add => left.ty(),
        },
        ExprKind::Assign { target, .. } => target.ty(),
        ExprKind::Block { exprs, .. } => {
            exprs.last().map(|e| e.ty()).unwrap_or_else(Ty::unit)
        }
        ExprKind::Cond { then, or, .. } => {
            if then.ty() == or.ty() {
                then.ty()
            } else {
                Ty::unit()
            }
        }
        ExprKind::Loop { .. } | ExprKind::Break(_) | ExprKind::Empty => Ty::unit(),
        ExprKind::TryFinally { body, .. } => body.ty(),
        ExprKind::Lambda { params, body } => {
            Ty::func(params.iter().map(Param::ty).collect(), body.ty())
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::Constant(v, _) => write!(f, "{}", v),
            ExprKind::Param(p) => write!(f, "{}", p.name()),
            ExprKind::Field { target, field } => write!(f, "{}.{}", target, field.name),
            ExprKind::Call {
                callee,
                receiver,
                args,
            } => {
                match (receiver, callee.kind) {
                    (Some(r), _) => write!(f, "{}.{}(", r, callee.name)?,
                    (None, MethodKind::Extension) if !args.is_empty() => {
                        write!(f, "{}.{}(", args[0], callee.name)?
                    }
                    _ => write!(f, "{}(", callee.name)?,
                }
                let skip_first = receiver.is_none() && callee.kind == MethodKind::Extension;
                let rest = if skip_first && !args.is_empty() {
                    &args[1..]
                } else {
                    &args[..]
                };
                for (i, a) in rest.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            ExprKind::Convert { value, ty } => write!(f, "({} as {})", value, ty),
            ExprKind::TypeAs { value, ty } => write!(f, "({} as? {})", value, ty),
            ExprKind::Default(ty) => write!(f, "default({})", ty),
            ExprKind::NewArray { elem, len } => write!(f, "new [{}; {}]", elem, len),
            ExprKind::ArrayIndex { array, index } => write!(f, "{}[{}]", array, index),
            ExprKind::ArrayLength(array) => write!(f, "{}.length", array),
            ExprKind::Binary { op, left, right } => {
                let sym = match op {
                    BinOp::Equal => "==",
                    BinOp::NotEqual => "!=",
                    BinOp::OrElse => "||",
                    BinOp::LessThan => "<",
                    BinOp::Add => "+",
                };
                write!(f, "({} {} {})", left, sym, right)
            }
            ExprKind::Assign { target, value } => write!(f, "{} = {}", target, value),
            ExprKind::Block { exprs, .. } => {
                write!(f, "{{ ")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, " }}")
            }
            ExprKind::Cond { test, then, or } => {
                write!(f, "if {} {{ {} }} else {{ {} }}", test, then, or)
            }
            ExprKind::Loop { body, .. } => write!(f, "loop {{ {} }}", body),
            ExprKind::Break(label) => write!(f, "break '{}", label.name()),
            ExprKind::TryFinally { body, finally } => {
                write!(f, "try {{ {} }} finally {{ {} }}", body, finally)
            }
            ExprKind::Lambda { params, body } => {
                write!(f, "|")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p.name())?;
                }
                write!(f, "| {}", body)
            }
            ExprKind::Empty => write!(f, "()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::factory;

    #[test]
    fn nodes_are_typed_at_construction() {
        let p = Param::new("source", Ty::array(Ty::i32()));
        assert_eq!(p.expr().ty(), Ty::array(Ty::i32()));
        assert_eq!(factory::array_length(&p.expr()).ty(), Ty::i64());
        let idx = factory::array_index(&p.expr(), &factory::i64_const(0));
        assert_eq!(idx.ty(), Ty::i32());
    }

    #[test]
    fn structural_equality_across_builds() {
        let build = || {
            let p = Param::new("x", Ty::i32());
            factory::lambda(
                vec![p.clone()],
                factory::add(&p.expr(), &factory::i32_const(1)),
            )
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn param_identity_is_by_pointer() {
        let a = Param::new("x", Ty::i32());
        let b = Param::new("x", Ty::i32());
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
    }
}

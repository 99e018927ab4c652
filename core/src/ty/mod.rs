//! Immutable runtime type descriptors.
//!
//! The host language has no runtime reflection, so the types the mapping
//! core reasons about are explicit descriptor trees: a lightweight `Ty`
//! handle over a reference-counted node carrying the kind and a set of
//! eagerly computed flags. Descriptors are persistent — construction is the
//! only mutation, and nodes are freely shared between parents.

mod flags;
mod kind;

pub use flags::TyFlags;
pub use kind::{FieldDef, Intrinsic, MethodDef, MethodKind, ObjectShape, Scalar, TyKind};

use std::fmt;
use std::hash;
use std::rc::Rc;

/// Lightweight handle to a type descriptor node.
///
/// Equality is structural with a pointer fast path; hashing follows the
/// kind only, since flags are derived from it.
#[derive(Clone, Debug)]
pub struct Ty(Rc<TyNode>);

#[derive(Debug)]
pub struct TyNode {
    flags: TyFlags,
    kind: TyKind,
}

impl TyNode {
    pub fn new(kind: TyKind) -> Self {
        let flags = kind.compute_flags();
        Self { flags, kind }
    }

    pub fn flags(&self) -> TyFlags {
        self.flags
    }

    pub fn kind(&self) -> &TyKind {
        &self.kind
    }
}

impl Ty {
    pub fn new(kind: TyKind) -> Self {
        Self(Rc::new(TyNode::new(kind)))
    }

    pub fn node(&self) -> &TyNode {
        &self.0
    }

    pub fn kind(&self) -> &TyKind {
        self.0.kind()
    }

    pub fn flags(&self) -> TyFlags {
        self.0.flags()
    }

    pub fn ptr_eq(&self, other: &Ty) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // === Constructors ===

    pub fn scalar(scalar: Scalar) -> Self {
        Self::new(TyKind::Scalar(scalar))
    }

    pub fn bool() -> Self {
        Self::scalar(Scalar::Bool)
    }

    pub fn char() -> Self {
        Self::scalar(Scalar::Char)
    }

    pub fn i32() -> Self {
        Self::scalar(Scalar::I32)
    }

    pub fn i64() -> Self {
        Self::scalar(Scalar::I64)
    }

    pub fn f64() -> Self {
        Self::scalar(Scalar::F64)
    }

    pub fn str() -> Self {
        Self::new(TyKind::Str)
    }

    pub fn object(shape: Rc<ObjectShape>) -> Self {
        Self::new(TyKind::Object(shape))
    }

    pub fn array(elem: Ty) -> Self {
        Self::new(TyKind::Array(elem))
    }

    pub fn seq(elem: Ty) -> Self {
        Self::new(TyKind::Seq(elem))
    }

    pub fn map(key: Ty, value: Ty) -> Self {
        Self::new(TyKind::Map(key, value))
    }

    pub fn dyn_seq() -> Self {
        Self::new(TyKind::DynSeq)
    }

    pub fn pair(key: Ty, value: Ty) -> Self {
        Self::new(TyKind::Pair(key, value))
    }

    pub fn nullable(inner: Ty) -> Self {
        Self::new(TyKind::Nullable(inner))
    }

    pub fn enumerator(elem: Ty) -> Self {
        Self::new(TyKind::Enumerator(elem))
    }

    pub fn disposable() -> Self {
        Self::new(TyKind::Disposable)
    }

    pub fn func(params: Vec<Ty>, ret: Ty) -> Self {
        Self::new(TyKind::Func { params, ret })
    }

    pub fn any() -> Self {
        Self::new(TyKind::Any)
    }

    pub fn unit() -> Self {
        Self::new(TyKind::Unit)
    }

    // === Queries ===

    pub fn is_value_type(&self) -> bool {
        self.flags().contains(TyFlags::VALUE_TYPE)
    }

    pub fn is_primitive(&self) -> bool {
        self.flags().contains(TyFlags::PRIMITIVE)
    }

    pub fn is_enumerable(&self) -> bool {
        self.flags().contains(TyFlags::ENUMERABLE)
    }

    pub fn is_disposable(&self) -> bool {
        self.flags().contains(TyFlags::DISPOSABLE)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind(), TyKind::Array(_))
    }

    pub fn is_any(&self) -> bool {
        matches!(self.kind(), TyKind::Any)
    }

    /// The declared array element type, if this is an array.
    pub fn array_elem(&self) -> Option<&Ty> {
        match self.kind() {
            TyKind::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// The inner type of a nullable wrapper, if this is one.
    pub fn nullable_inner(&self) -> Option<&Ty> {
        match self.kind() {
            TyKind::Nullable(inner) => Some(inner),
            _ => None,
        }
    }

    /// Element type yielded when iterating this type, for loop construction.
    ///
    /// Degrades to `Any` for shapes that erase their element type.
    pub fn iteration_elem(&self) -> Ty {
        match self.kind() {
            TyKind::Array(elem) | TyKind::Seq(elem) | TyKind::Enumerator(elem) => elem.clone(),
            TyKind::Map(key, value) => Ty::pair(key.clone(), value.clone()),
            _ => Ty::any(),
        }
    }
}

impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.kind() == other.kind()
    }
}

impl Eq for Ty {}

impl hash::Hash for Ty {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        // Flags are computed from the kind, so hashing the kind suffices.
        self.kind().hash(state);
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            TyKind::Scalar(s) => write!(f, "{}", s),
            TyKind::Str => write!(f, "str"),
            TyKind::Object(shape) => write!(f, "{}", shape.name),
            TyKind::Array(elem) => write!(f, "[{}]", elem),
            TyKind::Seq(elem) => write!(f, "seq<{}>", elem),
            TyKind::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            TyKind::DynSeq => write!(f, "dynseq"),
            TyKind::Pair(k, v) => write!(f, "({}, {})", k, v),
            TyKind::Nullable(inner) => write!(f, "{}?", inner),
            TyKind::Enumerator(elem) => write!(f, "enumerator<{}>", elem),
            TyKind::Disposable => write!(f, "disposable"),
            TyKind::Func { params, ret } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            TyKind::Any => write!(f, "any"),
            TyKind::Unit => write!(f, "()"),
        }
    }
}

use std::fmt;
use std::rc::Rc;

use super::flags::TyFlags;
use super::Ty;

/// The kind of a type descriptor.
///
/// This is a closed set: every shape the mapping core can reason about is a
/// variant here, so shape dispatch is an exhaustive match rather than
/// open-ended subtype lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyKind {
    /// Fixed-width scalar (numeric, boolean, character).
    Scalar(Scalar),

    /// String. Reference-shaped: a string-typed slot may hold null.
    Str,

    /// User-defined object with named members.
    Object(Rc<ObjectShape>),

    /// Array with a statically known element type.
    Array(Ty),

    /// Generic sequence with a statically known element type.
    Seq(Ty),

    /// Keyed sequence of key/value pairs.
    Map(Ty, Ty),

    /// Legacy loosely-typed sequence. Erases its element type statically;
    /// resolution falls back to probing a sample instance.
    DynSeq,

    /// Key/value pair element of a [`TyKind::Map`].
    Pair(Ty, Ty),

    /// Nullable wrapper over a value type.
    Nullable(Ty),

    /// Enumerator cursor over a sequence of the given element type.
    Enumerator(Ty),

    /// Disposal capability, checkable at runtime. The target of
    /// conditional-dispose casts in generated scoped-disposal code.
    Disposable,

    /// Function shape for lambda-shaped trees.
    Func { params: Vec<Ty>, ret: Ty },

    /// The universal unknown type.
    Any,

    /// The empty/void type of statement-shaped expressions.
    Unit,
}

impl TyKind {
    pub fn compute_flags(&self) -> TyFlags {
        match self {
            TyKind::Scalar(_) => TyFlags::VALUE_TYPE | TyFlags::PRIMITIVE,
            TyKind::Str => TyFlags::empty(),
            TyKind::Object(_) => TyFlags::empty(),
            TyKind::Array(_) | TyKind::Seq(_) | TyKind::Map(..) | TyKind::DynSeq => {
                TyFlags::ENUMERABLE
            }
            TyKind::Pair(..) => TyFlags::VALUE_TYPE,
            // Nullable wrappers are value-shaped: "null" for them is the
            // absent state, not a dangling reference.
            TyKind::Nullable(_) => TyFlags::VALUE_TYPE,
            TyKind::Enumerator(_) => TyFlags::DISPOSABLE,
            TyKind::Disposable => TyFlags::DISPOSABLE,
            TyKind::Func { .. } => TyFlags::empty(),
            TyKind::Any => TyFlags::empty(),
            TyKind::Unit => TyFlags::VALUE_TYPE,
        }
    }
}

/// Fixed-width scalar variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scalar {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scalar::Bool => "bool",
            Scalar::Char => "char",
            Scalar::I8 => "i8",
            Scalar::I16 => "i16",
            Scalar::I32 => "i32",
            Scalar::I64 => "i64",
            Scalar::U8 => "u8",
            Scalar::U16 => "u16",
            Scalar::U32 => "u32",
            Scalar::U64 => "u64",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// Shape of a user-defined object type: its named fields and methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectShape {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<Rc<MethodDef>>,
}

impl ObjectShape {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            fields,
            methods: Vec::new(),
        })
    }

    pub fn with_methods(
        name: impl Into<String>,
        fields: Vec<FieldDef>,
        methods: Vec<Rc<MethodDef>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            fields,
            methods,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Rc<MethodDef>> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A named member of an [`ObjectShape`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    pub name: String,
    pub ty: Ty,
    pub settable: bool,
}

impl FieldDef {
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

/// How a method binds to its receiver.
///
/// Extension-style methods are static methods whose first argument is the
/// traversal target; chain decomposition recognizes them as links while
/// plain static methods terminate a chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Instance,
    Extension,
    Static,
}

/// A callable member referenced by call nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDef {
    pub name: String,
    pub ret: Ty,
    pub kind: MethodKind,
    pub intrinsic: Option<Intrinsic>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, ret: Ty, kind: MethodKind) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            ret,
            kind,
            intrinsic: None,
        })
    }

    /// Enumerator acquisition over a sequence with the given element type.
    pub fn get_enumerator(elem: Ty) -> Rc<Self> {
        Rc::new(Self {
            name: "get_enumerator".into(),
            ret: Ty::enumerator(elem),
            kind: MethodKind::Instance,
            intrinsic: Some(Intrinsic::GetEnumerator),
        })
    }

    pub fn move_next() -> Rc<Self> {
        Rc::new(Self {
            name: "move_next".into(),
            ret: Ty::bool(),
            kind: MethodKind::Instance,
            intrinsic: Some(Intrinsic::MoveNext),
        })
    }

    pub fn dispose() -> Rc<Self> {
        Rc::new(Self {
            name: "dispose".into(),
            ret: Ty::unit(),
            kind: MethodKind::Instance,
            intrinsic: Some(Intrinsic::Dispose),
        })
    }

    /// Bulk copy of `(source, dest, length)` primitive arrays.
    pub fn array_copy() -> Rc<Self> {
        Rc::new(Self {
            name: "array_copy".into(),
            ret: Ty::unit(),
            kind: MethodKind::Static,
            intrinsic: Some(Intrinsic::ArrayCopy),
        })
    }
}

/// Engine-known operations the evaluator executes directly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    GetEnumerator,
    MoveNext,
    Dispose,
    ArrayCopy,
}

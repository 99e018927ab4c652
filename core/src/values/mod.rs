//! Dynamic runtime values.
//!
//! The emitted mapping code executes over these values: scalars, strings,
//! objects with named fields, arrays, sequences, and enumerator cursors.
//! Aggregates are handles over reference-counted storage so generated code
//! can populate a destination in place while tests can still distinguish
//! copies from aliases via pointer identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ty::{ObjectShape, Scalar, Ty};


/// A dynamically typed runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The absent value for reference-shaped and nullable slots.
    Null,
    Scalar(ScalarValue),
    Str(Rc<str>),
    Object(ObjectHandle),
    Array(ArrayHandle),
    Seq(SeqHandle),
    /// Loosely-typed legacy sequence; element type erased.
    Dyn(SeqHandle),
    Enumerator(EnumeratorHandle),
}

/// Payload for fixed-width scalar values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl ScalarValue {
    pub fn scalar(&self) -> Scalar {
        match self {
            ScalarValue::Bool(_) => Scalar::Bool,
            ScalarValue::Char(_) => Scalar::Char,
            ScalarValue::I8(_) => Scalar::I8,
            ScalarValue::I16(_) => Scalar::I16,
            ScalarValue::I32(_) => Scalar::I32,
            ScalarValue::I64(_) => Scalar::I64,
            ScalarValue::U8(_) => Scalar::U8,
            ScalarValue::U16(_) => Scalar::U16,
            ScalarValue::U32(_) => Scalar::U32,
            ScalarValue::U64(_) => Scalar::U64,
            ScalarValue::F32(_) => Scalar::F32,
            ScalarValue::F64(_) => Scalar::F64,
        }
    }

    /// The zero value of a scalar kind, used for typed defaults.
    pub fn zero(scalar: Scalar) -> ScalarValue {
        match scalar {
            Scalar::Bool => ScalarValue::Bool(false),
            Scalar::Char => ScalarValue::Char('\0'),
            Scalar::I8 => ScalarValue::I8(0),
            Scalar::I16 => ScalarValue::I16(0),
            Scalar::I32 => ScalarValue::I32(0),
            Scalar::I64 => ScalarValue::I64(0),
            Scalar::U8 => ScalarValue::U8(0),
            Scalar::U16 => ScalarValue::U16(0),
            Scalar::U32 => ScalarValue::U32(0),
            Scalar::U64 => ScalarValue::U64(0),
            Scalar::F32 => ScalarValue::F32(0.0),
            Scalar::F64 => ScalarValue::F64(0.0),
        }
    }
}

impl Value {
    // === Constructors ===

    pub fn bool(v: bool) -> Self {
        Value::Scalar(ScalarValue::Bool(v))
    }

    pub fn char(v: char) -> Self {
        Value::Scalar(ScalarValue::Char(v))
    }

    pub fn i32(v: i32) -> Self {
        Value::Scalar(ScalarValue::I32(v))
    }

    pub fn i64(v: i64) -> Self {
        Value::Scalar(ScalarValue::I64(v))
    }

    pub fn f64(v: f64) -> Self {
        Value::Scalar(ScalarValue::F64(v))
    }

    pub fn str(v: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(v.as_ref()))
    }

    pub fn object(shape: Rc<ObjectShape>, fields: Vec<Value>) -> Self {
        Value::Object(ObjectHandle::new(shape, fields))
    }

    pub fn array(elem: Ty, items: Vec<Value>) -> Self {
        Value::Array(ArrayHandle::new(elem, items))
    }

    pub fn seq(elem: Ty, items: Vec<Value>) -> Self {
        Value::Seq(SeqHandle::new(elem, items))
    }

    pub fn dyn_seq(items: Vec<Value>) -> Self {
        Value::Dyn(SeqHandle::new(Ty::any(), items))
    }

    /// The runtime type descriptor of this value.
    ///
    /// `Null` carries no type of its own and reports the universal type.
    pub fn ty(&self) -> Ty {
        match self {
            Value::Null => Ty::any(),
            Value::Scalar(s) => Ty::scalar(s.scalar()),
            Value::Str(_) => Ty::str(),
            Value::Object(h) => Ty::object(h.shape().clone()),
            Value::Array(h) => Ty::array(h.elem_ty()),
            Value::Seq(h) => Ty::seq(h.elem_ty()),
            Value::Dyn(_) => Ty::dyn_seq(),
            Value::Enumerator(h) => Ty::enumerator(h.elem_ty()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // === Extractors ===

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(ScalarValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Scalar(ScalarValue::I32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Scalar(ScalarValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayHandle> {
        match self {
            Value::Array(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            Value::Object(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_enumerator(&self) -> Option<&EnumeratorHandle> {
        match self {
            Value::Enumerator(h) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Scalar(s) => match s {
                ScalarValue::Bool(v) => write!(f, "{}", v),
                ScalarValue::Char(v) => write!(f, "{:?}", v),
                ScalarValue::I8(v) => write!(f, "{}", v),
                ScalarValue::I16(v) => write!(f, "{}", v),
                ScalarValue::I32(v) => write!(f, "{}", v),
                ScalarValue::I64(v) => write!(f, "{}", v),
                ScalarValue::U8(v) => write!(f, "{}", v),
                ScalarValue::U16(v) => write!(f, "{}", v),
                ScalarValue::U32(v) => write!(f, "{}", v),
                ScalarValue::U64(v) => write!(f, "{}", v),
                ScalarValue::F32(v) => write!(f, "{}", v),
                ScalarValue::F64(v) => write!(f, "{}", v),
            },
            Value::Str(v) => write!(f, "{:?}", v),
            Value::Object(h) => write!(f, "{} {{..}}", h.shape().name),
            Value::Array(h) => write!(f, "[..; {}]", h.len()),
            Value::Seq(h) | Value::Dyn(h) => write!(f, "seq[..; {}]", h.len()),
            Value::Enumerator(_) => write!(f, "enumerator"),
        }
    }
}

// === Object storage ===

#[derive(Debug, PartialEq)]
pub struct ObjectData {
    shape: Rc<ObjectShape>,
    fields: RefCell<Vec<Value>>,
}

/// Shared handle to an object instance.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectHandle(Rc<ObjectData>);

impl ObjectHandle {
    pub fn new(shape: Rc<ObjectShape>, fields: Vec<Value>) -> Self {
        debug_assert_eq!(shape.fields.len(), fields.len());
        Self(Rc::new(ObjectData {
            shape,
            fields: RefCell::new(fields),
        }))
    }

    pub fn shape(&self) -> &Rc<ObjectShape> {
        &self.0.shape
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let index = self.0.shape.field_index(name)?;
        Some(self.0.fields.borrow()[index].clone())
    }

    pub fn set(&self, name: &str, value: Value) -> bool {
        match self.0.shape.field_index(name) {
            Some(index) => {
                self.0.fields.borrow_mut()[index] = value;
                true
            }
            None => false,
        }
    }

    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// === Array storage ===

#[derive(Debug, PartialEq)]
pub struct ArrayData {
    elem: Ty,
    items: Vec<Value>,
}

/// Shared handle to mutable array storage.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayHandle(Rc<RefCell<ArrayData>>);

impl ArrayHandle {
    pub fn new(elem: Ty, items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(ArrayData { elem, items })))
    }

    pub fn elem_ty(&self) -> Ty {
        self.0.borrow().elem.clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().items.get(index).cloned()
    }

    pub fn set(&self, index: usize, value: Value) -> bool {
        let mut data = self.0.borrow_mut();
        match data.items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn items(&self) -> Vec<Value> {
        self.0.borrow().items.clone()
    }

    /// Copy the first `len` items of `source` into this array's prefix.
    pub fn copy_from(&self, source: &ArrayHandle, len: usize) {
        let items = source.0.borrow().items[..len].to_vec();
        self.0.borrow_mut().items[..len].clone_from_slice(&items);
    }

    /// Pointer identity, distinguishing a copy from an alias.
    pub fn ptr_eq(&self, other: &ArrayHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// === Sequence storage ===

#[derive(Debug, PartialEq)]
pub struct SeqData {
    elem: Ty,
    items: Vec<Value>,
}

/// Shared handle to immutable sequence storage.
#[derive(Clone, Debug, PartialEq)]
pub struct SeqHandle(Rc<SeqData>);

impl SeqHandle {
    pub fn new(elem: Ty, items: Vec<Value>) -> Self {
        Self(Rc::new(SeqData { elem, items }))
    }

    pub fn elem_ty(&self) -> Ty {
        self.0.elem.clone()
    }

    pub fn len(&self) -> usize {
        self.0.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.is_empty()
    }

    pub fn first(&self) -> Option<&Value> {
        self.0.items.first()
    }

    pub fn items(&self) -> &[Value] {
        &self.0.items
    }
}

// === Enumerator cursor ===

#[derive(Debug, PartialEq)]
pub struct EnumeratorData {
    elem: Ty,
    items: Vec<Value>,
    /// None until the first `move_next`.
    pos: Option<usize>,
    disposed: bool,
}

/// Shared handle to an enumerator cursor over a snapshot of a sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumeratorHandle(Rc<RefCell<EnumeratorData>>);

impl EnumeratorHandle {
    pub fn new(elem: Ty, items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(EnumeratorData {
            elem,
            items,
            pos: None,
            disposed: false,
        })))
    }

    pub fn elem_ty(&self) -> Ty {
        self.0.borrow().elem.clone()
    }

    /// Advance the cursor. Returns false once the snapshot is exhausted.
    /// Refuses to advance a disposed cursor.
    pub fn move_next(&self) -> Result<bool, DisposedError> {
        let mut data = self.0.borrow_mut();
        if data.disposed {
            return Err(DisposedError);
        }
        let next = match data.pos {
            None => 0,
            Some(p) => p + 1,
        };
        if next < data.items.len() {
            data.pos = Some(next);
            Ok(true)
        } else {
            data.pos = Some(data.items.len());
            Ok(false)
        }
    }

    /// The element under the cursor, or `None` before the first advance or
    /// past the end.
    pub fn current(&self) -> Option<Value> {
        let data = self.0.borrow();
        let pos = data.pos?;
        data.items.get(pos).cloned()
    }

    pub fn dispose(&self) {
        self.0.borrow_mut().disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.0.borrow().disposed
    }
}

/// Marker error for operations on a disposed enumerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisposedError;

//! Tree-walking evaluator for emitted mapping expressions.
//!
//! Executes the expression IR directly over dynamic values. Scopes are a
//! stack of binding frames; parameters resolve by pointer identity so
//! identically named temporaries introduced by rewrites never shadow each
//! other by accident. `break` travels as a control-flow result rather than
//! an error, unwinding block scopes until its loop catches it.

use crate::error::ExecError;
use crate::expr::{BinOp, Expr, ExprKind, Label, Param};
use crate::ty::{Intrinsic, Scalar, Ty, TyKind};
use crate::values::{ArrayHandle, EnumeratorHandle, ScalarValue, Value};


/// Result of evaluating one node: a value, or a `break` in flight.
enum Flow {
    Value(Value),
    Break(Label),
}

/// Unwrap a value or keep propagating an in-flight break.
macro_rules! value {
    ($flow:expr) => {
        match $flow {
            Flow::Value(v) => v,
            brk @ Flow::Break(_) => return Ok(brk),
        }
    };
}

/// The expression-tree interpreter.
pub struct Evaluator {
    scopes: Vec<Vec<(Param, Value)>>,
}

impl Evaluator {
    /// Runs a lambda over positional arguments. Parameters beyond the
    /// supplied arguments bind to their type's default value.
    pub fn run_lambda(lambda: &Expr, args: &[Value]) -> Result<Value, ExecError> {
        let ExprKind::Lambda { params, body } = lambda.kind() else {
            return Err(ExecError::Internal(format!(
                "not a lambda: {}",
                lambda
            )));
        };
        let frame = params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let value = args.get(i).cloned().unwrap_or_else(|| default_value(&p.ty()));
                (p.clone(), value)
            })
            .collect();
        let mut evaluator = Evaluator {
            scopes: vec![frame],
        };
        match evaluator.eval(body)? {
            Flow::Value(v) => Ok(v),
            Flow::Break(label) => Err(ExecError::Internal(format!(
                "break to '{} escaped its loop",
                label.name()
            ))),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Flow, ExecError> {
        let value = match expr.kind() {
            ExprKind::Constant(v, _) => v.clone(),
            ExprKind::Param(p) => self.lookup(p)?,
            ExprKind::Field { target, field } => {
                let target = value!(self.eval(target)?);
                self.read_field(&target, &field.name)?
            }
            ExprKind::Call {
                callee,
                receiver,
                args,
            } => {
                let receiver = match receiver {
                    Some(r) => Some(value!(self.eval(r)?)),
                    None => None,
                };
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(value!(self.eval(arg)?));
                }
                match callee.intrinsic {
                    Some(intrinsic) => {
                        self.call_intrinsic(intrinsic, &callee.name, &callee.ret, receiver, arg_values)?
                    }
                    None => {
                        return Err(ExecError::UnsupportedCall {
                            method: callee.name.clone(),
                        })
                    }
                }
            }
            ExprKind::Convert { value, ty } => {
                let v = value!(self.eval(value)?);
                convert_value(v, ty)?
            }
            ExprKind::TypeAs { value, ty } => {
                let v = value!(self.eval(value)?);
                type_as_value(v, ty)
            }
            ExprKind::Default(ty) => default_value(ty),
            ExprKind::NewArray { elem, len } => {
                let len = value!(self.eval(len)?);
                let len = expect_i64(&len)?;
                if len < 0 {
                    return Err(ExecError::Internal(format!(
                        "negative array length {}",
                        len
                    )));
                }
                Value::Array(ArrayHandle::new(
                    elem.clone(),
                    vec![default_value(elem); len as usize],
                ))
            }
            ExprKind::ArrayIndex { array, index } => {
                let array = value!(self.eval(array)?);
                let index = value!(self.eval(index)?);
                let (handle, index) = expect_array_slot(&array, &index)?;
                handle
                    .get(index)
                    .ok_or(ExecError::IndexOutOfBounds {
                        index: index as i64,
                        len: handle.len(),
                    })?
            }
            ExprKind::ArrayLength(array) => {
                let array = value!(self.eval(array)?);
                match array {
                    Value::Array(h) => Value::i64(h.len() as i64),
                    Value::Null => {
                        return Err(ExecError::NullDereference {
                            member: "length".into(),
                        })
                    }
                    other => {
                        return Err(ExecError::TypeMismatch {
                            expected: Ty::array(Ty::any()),
                            found: other.ty(),
                        })
                    }
                }
            }
            ExprKind::Binary { op, left, right } => {
                let op = *op;
                if op == BinOp::OrElse {
                    let l = value!(self.eval(left)?);
                    if expect_bool(&l)? {
                        Value::bool(true)
                    } else {
                        let r = value!(self.eval(right)?);
                        Value::bool(expect_bool(&r)?)
                    }
                } else {
                    let l = value!(self.eval(left)?);
                    let r = value!(self.eval(right)?);
                    binary_op(op, l, r)?
                }
            }
            ExprKind::Assign { target, value } => {
                let v = value!(self.eval(value)?);
                value!(self.assign(target, v.clone())?);
                v
            }
            ExprKind::Block { vars, exprs } => {
                let frame = vars
                    .iter()
                    .map(|p| (p.clone(), default_value(&p.ty())))
                    .collect();
                self.scopes.push(frame);
                let result = self.eval_sequence(exprs);
                self.scopes.pop();
                value!(result?)
            }
            ExprKind::Cond { test, then, or } => {
                let test = value!(self.eval(test)?);
                if expect_bool(&test)? {
                    value!(self.eval(then)?)
                } else {
                    value!(self.eval(or)?)
                }
            }
            ExprKind::Loop { body, label } => loop {
                match self.eval(body)? {
                    Flow::Break(l) if l.ptr_eq(label) => break Value::Null,
                    brk @ Flow::Break(_) => return Ok(brk),
                    Flow::Value(_) => {}
                }
            },
            ExprKind::Break(label) => return Ok(Flow::Break(label.clone())),
            ExprKind::TryFinally { body, finally } => {
                let body_result = self.eval(body);
                let finally_result = self.eval(finally);
                // A body failure wins over anything the finalizer does.
                let flow = body_result?;
                match finally_result? {
                    brk @ Flow::Break(_) => return Ok(brk),
                    Flow::Value(_) => value!(flow),
                }
            }
            ExprKind::Lambda { .. } => {
                return Err(ExecError::Internal(format!(
                    "lambda evaluated as a value: {}",
                    expr
                )))
            }
            ExprKind::Empty => Value::Null,
        };
        Ok(Flow::Value(value))
    }

    fn eval_sequence(&mut self, exprs: &[Expr]) -> Result<Flow, ExecError> {
        let mut last = Value::Null;
        for expr in exprs {
            last = value!(self.eval(expr)?);
        }
        Ok(Flow::Value(last))
    }

    fn lookup(&self, param: &Param) -> Result<Value, ExecError> {
        for frame in self.scopes.iter().rev() {
            for (bound, value) in frame.iter().rev() {
                if bound.ptr_eq(param) {
                    return Ok(value.clone());
                }
            }
        }
        Err(ExecError::UnboundParameter {
            name: param.name().to_string(),
        })
    }

    fn store(&mut self, param: &Param, value: Value) -> Result<(), ExecError> {
        for frame in self.scopes.iter_mut().rev() {
            for (bound, slot) in frame.iter_mut().rev() {
                if bound.ptr_eq(param) {
                    *slot = value;
                    return Ok(());
                }
            }
        }
        Err(ExecError::UnboundParameter {
            name: param.name().to_string(),
        })
    }

    fn assign(&mut self, target: &Expr, value: Value) -> Result<Flow, ExecError> {
        match target.kind() {
            ExprKind::Param(p) => self.store(p, value)?,
            ExprKind::Field {
                target: object,
                field,
            } if field.settable => {
                let object = value!(self.eval(object)?);
                match object {
                    Value::Object(h) => {
                        if !h.set(&field.name, value) {
                            return Err(ExecError::Internal(format!(
                                "no field `{}` on `{}`",
                                field.name,
                                h.shape().name
                            )));
                        }
                    }
                    Value::Null => {
                        return Err(ExecError::NullDereference {
                            member: field.name.clone(),
                        })
                    }
                    other => {
                        return Err(ExecError::NotAssignable {
                            expr: format!("{}.{}", other, field.name),
                        })
                    }
                }
            }
            ExprKind::ArrayIndex { array, index } => {
                let array = value!(self.eval(array)?);
                let index = value!(self.eval(index)?);
                let (handle, index) = expect_array_slot(&array, &index)?;
                if !handle.set(index, value) {
                    return Err(ExecError::IndexOutOfBounds {
                        index: index as i64,
                        len: handle.len(),
                    });
                }
            }
            _ => {
                return Err(ExecError::NotAssignable {
                    expr: target.to_string(),
                })
            }
        }
        Ok(Flow::Value(Value::Null))
    }

    fn read_field(&self, target: &Value, name: &str) -> Result<Value, ExecError> {
        match target {
            Value::Null => Err(ExecError::NullDereference {
                member: name.to_string(),
            }),
            Value::Object(h) => h.get(name).ok_or_else(|| {
                ExecError::Internal(format!("no field `{}` on `{}`", name, h.shape().name))
            }),
            Value::Enumerator(h) if name == "current" => Ok(h.current().unwrap_or(Value::Null)),
            other => Err(ExecError::Internal(format!(
                "no field `{}` on value `{}`",
                name, other
            ))),
        }
    }

    fn call_intrinsic(
        &mut self,
        intrinsic: Intrinsic,
        name: &str,
        ret: &Ty,
        receiver: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Value, ExecError> {
        match intrinsic {
            Intrinsic::GetEnumerator => {
                let receiver = receiver.unwrap_or(Value::Null);
                let items = match &receiver {
                    Value::Null => {
                        return Err(ExecError::NullDereference {
                            member: name.to_string(),
                        })
                    }
                    Value::Array(h) => h.items(),
                    Value::Seq(h) | Value::Dyn(h) => h.items().to_vec(),
                    other => {
                        return Err(ExecError::TypeMismatch {
                            expected: Ty::dyn_seq(),
                            found: other.ty(),
                        })
                    }
                };
                let elem = match ret.kind() {
                    TyKind::Enumerator(elem) => elem.clone(),
                    _ => Ty::any(),
                };
                Ok(Value::Enumerator(EnumeratorHandle::new(elem, items)))
            }
            Intrinsic::MoveNext => {
                let enumerator = expect_enumerator(receiver)?;
                let advanced = enumerator.move_next().map_err(|_| ExecError::Disposed)?;
                Ok(Value::bool(advanced))
            }
            Intrinsic::Dispose => {
                let enumerator = expect_enumerator(receiver)?;
                enumerator.dispose();
                Ok(Value::Null)
            }
            Intrinsic::ArrayCopy => {
                let [source, dest, len] = args.try_into().map_err(|_| {
                    ExecError::Internal("array copy expects (source, dest, length)".into())
                })?;
                let (Value::Array(source), Value::Array(dest)) = (&source, &dest) else {
                    return Err(ExecError::TypeMismatch {
                        expected: Ty::array(Ty::any()),
                        found: source.ty(),
                    });
                };
                let len = expect_i64(&len)?;
                if len < 0 || len as usize > source.len() || len as usize > dest.len() {
                    return Err(ExecError::IndexOutOfBounds {
                        index: len,
                        len: source.len().min(dest.len()),
                    });
                }
                dest.copy_from(source, len as usize);
                Ok(Value::Null)
            }
        }
    }
}

/// The runtime default for a type: zero for scalars, null for everything
/// else.
fn default_value(ty: &Ty) -> Value {
    match ty.kind() {
        TyKind::Scalar(s) => Value::Scalar(ScalarValue::zero(*s)),
        _ => Value::Null,
    }
}

/// Checked conversion. Scalars convert numerically; null conforms to any
/// non-value shape; `any` accepts everything.
fn convert_value(value: Value, target: &Ty) -> Result<Value, ExecError> {
    if target.is_any() {
        return Ok(value);
    }
    if let Some(inner) = target.nullable_inner() {
        return if value.is_null() {
            Ok(Value::Null)
        } else {
            convert_value(value, inner)
        };
    }
    if value.is_null() {
        return if target.is_value_type() {
            Err(ExecError::InvalidCast {
                from: Ty::any(),
                to: target.clone(),
            })
        } else {
            Ok(Value::Null)
        };
    }
    if value.ty() == *target {
        return Ok(value);
    }
    if let (Value::Scalar(sv), TyKind::Scalar(ts)) = (&value, target.kind()) {
        if let Some(converted) = scalar_convert(*sv, *ts) {
            return Ok(Value::Scalar(converted));
        }
    }
    if matches!(target.kind(), TyKind::Disposable) && matches!(value, Value::Enumerator(_)) {
        return Ok(value);
    }
    Err(ExecError::InvalidCast {
        from: value.ty(),
        to: target.clone(),
    })
}

/// Conditional cast: the value when it conforms, null otherwise. No
/// numeric conversion here; this is a reference-shaped test.
fn type_as_value(value: Value, target: &Ty) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    let conforms = target.is_any()
        || value.ty() == *target
        || (matches!(target.kind(), TyKind::Disposable) && matches!(value, Value::Enumerator(_)));
    if conforms {
        value
    } else {
        Value::Null
    }
}

fn scalar_convert(value: ScalarValue, target: Scalar) -> Option<ScalarValue> {
    use ScalarValue as SV;
    if value.scalar() == target {
        return Some(value);
    }
    let wide = match value {
        SV::Bool(_) | SV::Char(_) => return None,
        SV::I8(v) => v as f64,
        SV::I16(v) => v as f64,
        SV::I32(v) => v as f64,
        SV::I64(v) => v as f64,
        SV::U8(v) => v as f64,
        SV::U16(v) => v as f64,
        SV::U32(v) => v as f64,
        SV::U64(v) => v as f64,
        SV::F32(v) => v as f64,
        SV::F64(v) => v,
    };
    let converted = match target {
        Scalar::Bool | Scalar::Char => return None,
        Scalar::I8 => SV::I8(wide as i8),
        Scalar::I16 => SV::I16(wide as i16),
        Scalar::I32 => SV::I32(wide as i32),
        Scalar::I64 => SV::I64(wide as i64),
        Scalar::U8 => SV::U8(wide as u8),
        Scalar::U16 => SV::U16(wide as u16),
        Scalar::U32 => SV::U32(wide as u32),
        Scalar::U64 => SV::U64(wide as u64),
        Scalar::F32 => SV::F32(wide as f32),
        Scalar::F64 => SV::F64(wide),
    };
    Some(converted)
}

fn binary_op(op: BinOp, left: Value, right: Value) -> Result<Value, ExecError> {
    match op {
        BinOp::Equal => Ok(Value::bool(left == right)),
        BinOp::NotEqual => Ok(Value::bool(left != right)),
        BinOp::OrElse => unreachable!("short-circuited by the caller"),
        BinOp::LessThan | BinOp::Add => {
            let (Value::Scalar(l), Value::Scalar(r)) = (&left, &right) else {
                return Err(ExecError::TypeMismatch {
                    expected: left.ty(),
                    found: right.ty(),
                });
            };
            numeric_op(op, *l, *r).ok_or(ExecError::TypeMismatch {
                expected: left.ty(),
                found: right.ty(),
            })
        }
    }
}

fn numeric_op(op: BinOp, left: ScalarValue, right: ScalarValue) -> Option<Value> {
    use ScalarValue as SV;
    macro_rules! arith {
        ($l:expr, $r:expr, $wrap:path) => {
            match op {
                BinOp::LessThan => Value::bool($l < $r),
                BinOp::Add => Value::Scalar($wrap($l + $r)),
                _ => return None,
            }
        };
    }
    let result = match (left, right) {
        (SV::I8(l), SV::I8(r)) => arith!(l, r, SV::I8),
        (SV::I16(l), SV::I16(r)) => arith!(l, r, SV::I16),
        (SV::I32(l), SV::I32(r)) => arith!(l, r, SV::I32),
        (SV::I64(l), SV::I64(r)) => arith!(l, r, SV::I64),
        (SV::U8(l), SV::U8(r)) => arith!(l, r, SV::U8),
        (SV::U16(l), SV::U16(r)) => arith!(l, r, SV::U16),
        (SV::U32(l), SV::U32(r)) => arith!(l, r, SV::U32),
        (SV::U64(l), SV::U64(r)) => arith!(l, r, SV::U64),
        (SV::F32(l), SV::F32(r)) => arith!(l, r, SV::F32),
        (SV::F64(l), SV::F64(r)) => arith!(l, r, SV::F64),
        _ => return None,
    };
    Some(result)
}

fn expect_bool(value: &Value) -> Result<bool, ExecError> {
    value.as_bool().ok_or(ExecError::TypeMismatch {
        expected: Ty::bool(),
        found: value.ty(),
    })
}

fn expect_i64(value: &Value) -> Result<i64, ExecError> {
    value.as_i64().ok_or(ExecError::TypeMismatch {
        expected: Ty::i64(),
        found: value.ty(),
    })
}

fn expect_enumerator(receiver: Option<Value>) -> Result<EnumeratorHandle, ExecError> {
    match receiver {
        Some(Value::Enumerator(h)) => Ok(h),
        Some(Value::Null) | None => Err(ExecError::NullDereference {
            member: "enumerator".into(),
        }),
        Some(other) => Err(ExecError::TypeMismatch {
            expected: Ty::enumerator(Ty::any()),
            found: other.ty(),
        }),
    }
}

fn expect_array_slot<'a>(
    array: &'a Value,
    index: &Value,
) -> Result<(&'a ArrayHandle, usize), ExecError> {
    let handle = match array {
        Value::Array(h) => h,
        Value::Null => {
            return Err(ExecError::NullDereference {
                member: "[]".into(),
            })
        }
        other => {
            return Err(ExecError::TypeMismatch {
                expected: Ty::array(Ty::any()),
                found: other.ty(),
            })
        }
    };
    let index = expect_i64(index)?;
    if index < 0 {
        return Err(ExecError::IndexOutOfBounds {
            index,
            len: handle.len(),
        });
    }
    Ok((handle, index as usize))
}

use std::rc::Rc;

use crate::{
    exception::RunResult,
    expressions::{BinOp, CmpOp},
    run::Interpreter,
    value::{Value, values_equal},
};

/// A pair of numeric operands promoted to their common tag.
///
/// Promotion follows the lattice `Int < Long < Float < Double`: the wider
/// tag wins, for arithmetic and comparison alike.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NumericPair {
    Int(i32, i32),
    Long(i64, i64),
    Float(f32, f32),
    Double(f64, f64),
}

fn width(value: &Value) -> Option<u8> {
    match value {
        Value::Int(_) => Some(0),
        Value::Long(_) => Some(1),
        Value::Float(_) => Some(2),
        Value::Double(_) => Some(3),
        _ => None,
    }
}

fn as_long(value: &Value) -> i64 {
    match value {
        Value::Int(v) => i64::from(*v),
        Value::Long(v) => *v,
        _ => unreachable!("checked by width()"),
    }
}

fn as_float(value: &Value) -> f32 {
    match value {
        Value::Int(v) => *v as f32,
        Value::Long(v) => *v as f32,
        Value::Float(v) => *v,
        _ => unreachable!("checked by width()"),
    }
}

fn as_double(value: &Value) -> f64 {
    match value {
        Value::Int(v) => f64::from(*v),
        Value::Long(v) => *v as f64,
        Value::Float(v) => f64::from(*v),
        Value::Double(v) => *v,
        _ => unreachable!("checked by width()"),
    }
}

/// Promotes two numeric values to their common tag; `None` when either
/// operand is not numeric.
pub(crate) fn promote_pair(left: &Value, right: &Value) -> Option<NumericPair> {
    let widest = width(left)?.max(width(right)?);
    Some(match widest {
        0 => match (left, right) {
            (Value::Int(l), Value::Int(r)) => NumericPair::Int(*l, *r),
            _ => unreachable!("width 0 implies both Int"),
        },
        1 => NumericPair::Long(as_long(left), as_long(right)),
        2 => NumericPair::Float(as_float(left), as_float(right)),
        _ => NumericPair::Double(as_double(left), as_double(right)),
    })
}

impl Interpreter {
    /// Arithmetic on two values: numeric promotion, `Text`
    /// concatenation for `+`, everything else unsupported.
    pub(crate) fn eval_binary(&mut self, left: Value, op: BinOp, right: Value) -> RunResult<Value> {
        if op == BinOp::Add {
            if let (Value::Text(l), Value::Text(r)) = (&left, &right) {
                let mut joined = String::with_capacity(l.len() + r.len());
                joined.push_str(l);
                joined.push_str(r);
                return Ok(Value::Text(Rc::from(joined.as_str())));
            }
        }

        let Some(pair) = promote_pair(&left, &right) else {
            return Err(self.eval_err("Unsupported binary operation for these types"));
        };

        match pair {
            NumericPair::Int(l, r) => Ok(Value::Int(match op {
                BinOp::Add => l.wrapping_add(r),
                BinOp::Sub => l.wrapping_sub(r),
                BinOp::Mul => l.wrapping_mul(r),
                BinOp::Div => {
                    if r == 0 {
                        return Err(self.eval_err("Division by zero"));
                    }
                    l.wrapping_div(r)
                }
                BinOp::Mod => {
                    if r == 0 {
                        return Err(self.eval_err("Modulo by zero"));
                    }
                    l.wrapping_rem(r)
                }
            })),
            NumericPair::Long(l, r) => Ok(Value::Long(match op {
                BinOp::Add => l.wrapping_add(r),
                BinOp::Sub => l.wrapping_sub(r),
                BinOp::Mul => l.wrapping_mul(r),
                BinOp::Div => {
                    if r == 0 {
                        return Err(self.eval_err("Division by zero"));
                    }
                    l.wrapping_div(r)
                }
                BinOp::Mod => {
                    if r == 0 {
                        return Err(self.eval_err("Modulo by zero"));
                    }
                    l.wrapping_rem(r)
                }
            })),
            NumericPair::Float(l, r) => Ok(Value::Float(match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => {
                    if r == 0.0 {
                        return Err(self.eval_err("Division by zero"));
                    }
                    l / r
                }
                BinOp::Mod => {
                    if r == 0.0 {
                        return Err(self.eval_err("Modulo by zero"));
                    }
                    l % r
                }
            })),
            NumericPair::Double(l, r) => Ok(Value::Double(match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => {
                    if r == 0.0 {
                        return Err(self.eval_err("Division by zero"));
                    }
                    l / r
                }
                BinOp::Mod => {
                    if r == 0.0 {
                        return Err(self.eval_err("Modulo by zero"));
                    }
                    l % r
                }
            })),
        }
    }

    /// Comparison per the language rules: same tags compare structurally,
    /// mixed numerics promote to the wider tag, any other cross-tag pair
    /// is unequal for `==`/`!=` and an error for ordering.
    pub(crate) fn eval_comparison(&mut self, left: Value, op: CmpOp, right: Value) -> RunResult<Value> {
        if let Some(pair) = promote_pair(&left, &right) {
            let result = match pair {
                NumericPair::Int(l, r) => compare(op, &l, &r),
                NumericPair::Long(l, r) => compare(op, &l, &r),
                NumericPair::Float(l, r) => compare_float(op, f64::from(l), f64::from(r)),
                NumericPair::Double(l, r) => compare_float(op, l, r),
            };
            return Ok(Value::Bool(result));
        }

        match (&left, &right) {
            (Value::Text(l), Value::Text(r)) => Ok(Value::Bool(compare(op, l, r))),
            (Value::Char(l), Value::Char(r)) => Ok(Value::Bool(compare(op, l, r))),
            (Value::Bool(l), Value::Bool(r)) => match op {
                CmpOp::Eq => Ok(Value::Bool(l == r)),
                CmpOp::Ne => Ok(Value::Bool(l != r)),
                _ => Err(self.eval_err("Invalid comparison operator for boolean values")),
            },
            _ => {
                let same_tag = left.base_type_name(&self.heap) == right.base_type_name(&self.heap);
                match op {
                    CmpOp::Eq => Ok(Value::Bool(values_equal(&left, &right, &self.heap))),
                    CmpOp::Ne => Ok(Value::Bool(!values_equal(&left, &right, &self.heap))),
                    _ if same_tag => Err(self.eval_err("Unsupported comparison for these types")),
                    _ => Err(self.eval_err("Cannot compare values of different types")),
                }
            }
        }
    }
}

fn compare<T: PartialOrd>(op: CmpOp, l: &T, r: &T) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Ne => l != r,
        CmpOp::Lt => l < r,
        CmpOp::Gt => l > r,
        CmpOp::Le => l <= r,
        CmpOp::Ge => l >= r,
    }
}

/// Raw IEEE comparison: NaN is unequal to everything including itself.
fn compare_float(op: CmpOp, l: f64, r: f64) -> bool {
    match op {
        CmpOp::Eq => l == r,
        CmpOp::Ne => l != r,
        CmpOp::Lt => l < r,
        CmpOp::Gt => l > r,
        CmpOp::Le => l <= r,
        CmpOp::Ge => l >= r,
    }
}

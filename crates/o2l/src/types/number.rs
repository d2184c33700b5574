use crate::{
    exception::{RunError, RunResult},
    run::Interpreter,
    types::check_arity,
    value::{Value, format_double, format_float},
};

/// Intrinsic conversion methods on the numeric tags, `Bool`, and `Char`.
///
/// Widening always succeeds; narrowing raises `EvaluationError` when the
/// value does not fit the target tag.
pub(super) fn call(
    interp: &mut Interpreter,
    receiver: &Value,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let type_name = receiver.type_name(&interp.heap);
    let result = match (receiver, method) {
        (Value::Int(v), "toString") => zero(interp, &type_name, method, args).map(|()| Value::text(v.to_string())),
        (Value::Int(v), "toLong") => zero(interp, &type_name, method, args).map(|()| Value::Long(i64::from(*v))),
        (Value::Int(v), "toFloat") => zero(interp, &type_name, method, args).map(|()| Value::Float(*v as f32)),
        (Value::Int(v), "toDouble") => zero(interp, &type_name, method, args).map(|()| Value::Double(f64::from(*v))),
        (Value::Int(v), "toBool") => zero(interp, &type_name, method, args).and_then(|()| match v {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            _ => Err(interp.eval_err(format!("Cannot convert Int {v} to Bool (expected 0 or 1)"))),
        }),

        (Value::Long(v), "toString") => zero(interp, &type_name, method, args).map(|()| Value::text(v.to_string())),
        (Value::Long(v), "toInt") => zero(interp, &type_name, method, args).and_then(|()| {
            i32::try_from(*v).map(Value::Int).map_err(|_| {
                interp.eval_err(format!("Long value {v} cannot be converted to Int (out of range)"))
            })
        }),
        (Value::Long(v), "toFloat") => zero(interp, &type_name, method, args).map(|()| Value::Float(*v as f32)),
        (Value::Long(v), "toDouble") => zero(interp, &type_name, method, args).map(|()| Value::Double(*v as f64)),
        (Value::Long(v), "toBool") => zero(interp, &type_name, method, args).and_then(|()| match v {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            _ => Err(interp.eval_err(format!("Cannot convert Long {v} to Bool (expected 0 or 1)"))),
        }),

        (Value::Float(v), "toString") => zero(interp, &type_name, method, args).map(|()| Value::text(format_float(*v))),
        (Value::Float(v), "toInt") => {
            zero(interp, &type_name, method, args).and_then(|()| float_to_int(interp, f64::from(*v), "Float"))
        }
        (Value::Float(v), "toLong") => {
            zero(interp, &type_name, method, args).and_then(|()| float_to_long(interp, f64::from(*v), "Float"))
        }
        (Value::Float(v), "toDouble") => zero(interp, &type_name, method, args).map(|()| Value::Double(f64::from(*v))),
        (Value::Float(v), "isNaN") => zero(interp, &type_name, method, args).map(|()| Value::Bool(v.is_nan())),
        (Value::Float(v), "isInfinite") => zero(interp, &type_name, method, args).map(|()| Value::Bool(v.is_infinite())),
        (Value::Float(v), "isFinite") => zero(interp, &type_name, method, args).map(|()| Value::Bool(v.is_finite())),

        (Value::Double(v), "toString") => zero(interp, &type_name, method, args).map(|()| Value::text(format_double(*v))),
        (Value::Double(v), "toInt") => zero(interp, &type_name, method, args).and_then(|()| float_to_int(interp, *v, "Double")),
        (Value::Double(v), "toLong") => zero(interp, &type_name, method, args).and_then(|()| float_to_long(interp, *v, "Double")),
        (Value::Double(v), "toFloat") => zero(interp, &type_name, method, args).and_then(|()| {
            let narrowed = *v as f32;
            if narrowed.is_infinite() && v.is_finite() {
                Err(interp.eval_err(format!("Double value {v} cannot be converted to Float (out of range)")))
            } else {
                Ok(Value::Float(narrowed))
            }
        }),
        (Value::Double(v), "isNaN") => zero(interp, &type_name, method, args).map(|()| Value::Bool(v.is_nan())),
        (Value::Double(v), "isInfinite") => zero(interp, &type_name, method, args).map(|()| Value::Bool(v.is_infinite())),
        (Value::Double(v), "isFinite") => zero(interp, &type_name, method, args).map(|()| Value::Bool(v.is_finite())),

        (Value::Bool(v), "toString") => zero(interp, &type_name, method, args).map(|()| Value::text(v.to_string())),
        (Value::Bool(v), "toInt") => zero(interp, &type_name, method, args).map(|()| Value::Int(i32::from(*v))),
        (Value::Bool(v), "toLong") => zero(interp, &type_name, method, args).map(|()| Value::Long(i64::from(*v))),
        (Value::Bool(v), "toFloat") => zero(interp, &type_name, method, args).map(|()| Value::Float(f32::from(u8::from(*v)))),
        (Value::Bool(v), "toDouble") => zero(interp, &type_name, method, args).map(|()| Value::Double(f64::from(u8::from(*v)))),

        (Value::Char(c), "toString") => {
            zero(interp, &type_name, method, args).map(|()| Value::text((*c as char).to_string()))
        }
        (Value::Char(c), "toInt") => zero(interp, &type_name, method, args).map(|()| Value::Int(i32::from(*c))),
        (Value::Char(c), "toUpper") => {
            zero(interp, &type_name, method, args).map(|()| Value::Char(c.to_ascii_uppercase()))
        }
        (Value::Char(c), "toLower") => {
            zero(interp, &type_name, method, args).map(|()| Value::Char(c.to_ascii_lowercase()))
        }
        (Value::Char(c), "isAlpha") => {
            zero(interp, &type_name, method, args).map(|()| Value::Bool(c.is_ascii_alphabetic()))
        }
        (Value::Char(c), "isDigit") => {
            zero(interp, &type_name, method, args).map(|()| Value::Bool(c.is_ascii_digit()))
        }
        _ => return None,
    };
    Some(result)
}

fn zero(interp: &Interpreter, type_name: &str, method: &str, args: &[Value]) -> Result<(), RunError> {
    check_arity(interp, type_name, method, args, 0)
}

/// Truncation toward zero; NaN, infinities, and out-of-range magnitudes
/// are information-losing and raise.
fn float_to_int(interp: &Interpreter, v: f64, from: &str) -> RunResult<Value> {
    if !v.is_finite() {
        return Err(interp.eval_err(format!("Cannot convert non-finite {from} to Int")));
    }
    let truncated = v.trunc();
    if truncated < f64::from(i32::MIN) || truncated > f64::from(i32::MAX) {
        return Err(interp.eval_err(format!(
            "{from} value {v} cannot be converted to Int (out of range)"
        )));
    }
    Ok(Value::Int(truncated as i32))
}

fn float_to_long(interp: &Interpreter, v: f64, from: &str) -> RunResult<Value> {
    if !v.is_finite() {
        return Err(interp.eval_err(format!("Cannot convert non-finite {from} to Long")));
    }
    let truncated = v.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(interp.eval_err(format!(
            "{from} value {v} cannot be converted to Long (out of range)"
        )));
    }
    Ok(Value::Long(truncated as i64))
}

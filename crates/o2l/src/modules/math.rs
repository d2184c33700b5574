use crate::{
    eval::{NumericPair, promote_pair},
    exception::{RunError, RunResult},
    modules::{NativeFn, register},
    object::ObjectInstance,
    run::Interpreter,
    value::Value,
};

/// Builds the `math` object.
pub(super) fn create_math_object() -> ObjectInstance {
    let mut object = ObjectInstance::new("math");
    register(&mut object, "pi", NativeFn::Pi);
    register(&mut object, "e", NativeFn::E);
    register(&mut object, "abs", NativeFn::Abs);
    register(&mut object, "sqrt", NativeFn::Sqrt);
    register(&mut object, "pow", NativeFn::Pow);
    register(&mut object, "floor", NativeFn::Floor);
    register(&mut object, "ceil", NativeFn::Ceil);
    register(&mut object, "round", NativeFn::Round);
    register(&mut object, "min", NativeFn::Min);
    register(&mut object, "max", NativeFn::Max);
    register(&mut object, "log", NativeFn::Log);
    register(&mut object, "log10", NativeFn::Log10);
    register(&mut object, "exp", NativeFn::Exp);
    register(&mut object, "sin", NativeFn::Sin);
    register(&mut object, "cos", NativeFn::Cos);
    register(&mut object, "tan", NativeFn::Tan);
    object
}

pub(super) fn call(interp: &mut Interpreter, function: NativeFn, args: &[Value]) -> RunResult<Value> {
    match function {
        NativeFn::Pi => constant(interp, "pi", args, std::f64::consts::PI),
        NativeFn::E => constant(interp, "e", args, std::f64::consts::E),
        NativeFn::Abs => {
            let value = one_numeric(interp, "abs", args)?;
            Ok(match value {
                Value::Int(v) => Value::Int(v.wrapping_abs()),
                Value::Long(v) => Value::Long(v.wrapping_abs()),
                Value::Float(v) => Value::Float(v.abs()),
                Value::Double(v) => Value::Double(v.abs()),
                _ => unreachable!("checked by one_numeric"),
            })
        }
        NativeFn::Floor => map_float(interp, "floor", args, f64::floor),
        NativeFn::Ceil => map_float(interp, "ceil", args, f64::ceil),
        NativeFn::Round => map_float(interp, "round", args, f64::round),
        NativeFn::Sqrt => map_double(interp, "sqrt", args, f64::sqrt),
        NativeFn::Log => map_double(interp, "log", args, f64::ln),
        NativeFn::Log10 => map_double(interp, "log10", args, f64::log10),
        NativeFn::Exp => map_double(interp, "exp", args, f64::exp),
        NativeFn::Sin => map_double(interp, "sin", args, f64::sin),
        NativeFn::Cos => map_double(interp, "cos", args, f64::cos),
        NativeFn::Tan => map_double(interp, "tan", args, f64::tan),
        NativeFn::Pow => {
            let (base, exponent) = two_numeric(interp, "pow", args)?;
            Ok(Value::Double(as_double(&base).powf(as_double(&exponent))))
        }
        NativeFn::Min => pick(interp, "min", args, true),
        NativeFn::Max => pick(interp, "max", args, false),
        _ => unreachable!("routed by call_native"),
    }
}

fn constant(interp: &Interpreter, name: &str, args: &[Value], value: f64) -> RunResult<Value> {
    if args.is_empty() {
        Ok(Value::Double(value))
    } else {
        Err(interp.eval_err(format!("math.{name}() takes no arguments")))
    }
}

fn one_numeric(interp: &Interpreter, name: &str, args: &[Value]) -> Result<Value, RunError> {
    match args {
        [value] if value.is_numeric() => Ok(value.clone()),
        [value] => Err(interp.eval_err(format!(
            "math.{name}() expects a numeric argument, got {}",
            value.type_name(&interp.heap)
        ))),
        _ => Err(interp.eval_err(format!("math.{name}() takes exactly 1 argument"))),
    }
}

fn two_numeric(interp: &Interpreter, name: &str, args: &[Value]) -> Result<(Value, Value), RunError> {
    match args {
        [a, b] if a.is_numeric() && b.is_numeric() => Ok((a.clone(), b.clone())),
        [_, _] => Err(interp.eval_err(format!("math.{name}() expects numeric arguments"))),
        _ => Err(interp.eval_err(format!("math.{name}() takes exactly 2 arguments"))),
    }
}

fn as_double(value: &Value) -> f64 {
    match value {
        Value::Int(v) => f64::from(*v),
        Value::Long(v) => *v as f64,
        Value::Float(v) => f64::from(*v),
        Value::Double(v) => *v,
        _ => unreachable!("checked by the numeric guards"),
    }
}

/// Functions that keep integer inputs intact and round floats in their
/// own tag (`floor`, `ceil`, `round`).
fn map_float(
    interp: &Interpreter,
    name: &str,
    args: &[Value],
    f: impl Fn(f64) -> f64,
) -> RunResult<Value> {
    let value = one_numeric(interp, name, args)?;
    Ok(match value {
        Value::Int(_) | Value::Long(_) => value,
        Value::Float(v) => Value::Float(f(f64::from(v)) as f32),
        Value::Double(v) => Value::Double(f(v)),
        _ => unreachable!("checked by one_numeric"),
    })
}

/// Functions whose result is inherently fractional; always `Double`.
fn map_double(
    interp: &Interpreter,
    name: &str,
    args: &[Value],
    f: impl Fn(f64) -> f64,
) -> RunResult<Value> {
    let value = one_numeric(interp, name, args)?;
    Ok(Value::Double(f(as_double(&value))))
}

/// `min`/`max`: the result carries the promoted tag of the pair.
fn pick(interp: &Interpreter, name: &str, args: &[Value], smaller: bool) -> RunResult<Value> {
    let (a, b) = two_numeric(interp, name, args)?;
    let pair = promote_pair(&a, &b).expect("both operands are numeric");
    Ok(match pair {
        NumericPair::Int(l, r) => Value::Int(if smaller { l.min(r) } else { l.max(r) }),
        NumericPair::Long(l, r) => Value::Long(if smaller { l.min(r) } else { l.max(r) }),
        NumericPair::Float(l, r) => Value::Float(if smaller { l.min(r) } else { l.max(r) }),
        NumericPair::Double(l, r) => Value::Double(if smaller { l.min(r) } else { l.max(r) }),
    })
}

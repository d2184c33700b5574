use crate::{
    exception::RunResult,
    io::PrintWriter as _,
    modules::{NativeFn, register},
    object::ObjectInstance,
    run::Interpreter,
    value::Value,
};

/// Builds the `system.io` object.
pub(super) fn create_io_object() -> ObjectInstance {
    let mut object = ObjectInstance::new("io");
    register(&mut object, "print", NativeFn::Print);
    register(&mut object, "input", NativeFn::Input);
    object
}

pub(super) fn call(interp: &mut Interpreter, function: NativeFn, args: &[Value]) -> RunResult<Value> {
    match function {
        NativeFn::Print => print(interp, args),
        NativeFn::Input => {
            if let Some(prompt) = args.first() {
                let rendered = prompt.display(&interp.heap);
                interp.writer.stdout_write(&rendered);
            }
            let line = interp.writer.stdin_line();
            Ok(Value::text(line))
        }
        _ => unreachable!("routed by call_native"),
    }
}

/// `io.print(format, args...)`: printf-style `%s %d %f %b %o` plus `%%`,
/// with a trailing newline.
fn print(interp: &mut Interpreter, args: &[Value]) -> RunResult<Value> {
    let rendered = match args {
        [] => String::new(),
        [Value::Text(format), rest @ ..] => format_text(interp, format, rest)?,
        [single] => single.display(&interp.heap),
        _ => {
            return Err(interp.eval_err("system.io.print() expects a Text format string"));
        }
    };
    interp.writer.stdout_write(&rendered);
    interp.writer.stdout_push('\n');
    Ok(Value::Bool(true))
}

fn format_text(interp: &Interpreter, format: &str, args: &[Value]) -> RunResult<String> {
    let mut out = String::with_capacity(format.len());
    let mut next_arg = 0usize;
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(spec @ ('s' | 'd' | 'f' | 'b' | 'o')) => {
                let Some(value) = args.get(next_arg) else {
                    return Err(interp.eval_err(format!(
                        "Not enough arguments for format string (missing value for '%{spec}')"
                    )));
                };
                next_arg += 1;
                let matches_spec = match spec {
                    'd' => matches!(value, Value::Int(_) | Value::Long(_)),
                    'f' => matches!(value, Value::Float(_) | Value::Double(_)),
                    'b' => matches!(value, Value::Bool(_)),
                    _ => true,
                };
                if !matches_spec {
                    return Err(interp.eval_err(format!(
                        "Format specifier '%{spec}' does not match argument of type {}",
                        value.type_name(&interp.heap)
                    )));
                }
                out.push_str(&value.display(&interp.heap));
            }
            Some(other) => {
                return Err(interp.eval_err(format!("Unknown format specifier '%{other}'")));
            }
            None => {
                return Err(interp.eval_err("Dangling '%' at end of format string"));
            }
        }
    }
    Ok(out)
}

use crate::{
    exception::RunResult,
    heap::{HeapData, ListInstance},
    modules::{NativeFn, register},
    object::ObjectInstance,
    run::Interpreter,
    value::Value,
};

/// Builds the `system.os` object.
pub(super) fn create_os_object() -> ObjectInstance {
    let mut object = ObjectInstance::new("os");
    register(&mut object, "args", NativeFn::Args);
    register(&mut object, "argc", NativeFn::Argc);
    register(&mut object, "getEnv", NativeFn::GetEnv);
    register(&mut object, "osName", NativeFn::OsName);
    object
}

pub(super) fn call(interp: &mut Interpreter, function: NativeFn, args: &[Value]) -> RunResult<Value> {
    match function {
        NativeFn::Args => {
            if !args.is_empty() {
                return Err(interp.eval_err("os.args() takes no arguments"));
            }
            let values: Vec<Value> = interp.program_args.iter().map(Value::text).collect();
            let id = interp
                .heap
                .allocate(HeapData::List(ListInstance::with_elements("Text", values)));
            Ok(Value::Ref(id))
        }
        NativeFn::Argc => {
            if !args.is_empty() {
                return Err(interp.eval_err("os.argc() takes no arguments"));
            }
            Ok(Value::Int(interp.program_args.len() as i32))
        }
        NativeFn::GetEnv => {
            let [Value::Text(name)] = args else {
                return Err(interp.eval_err("os.getEnv() takes exactly 1 Text argument"));
            };
            match std::env::var(&**name) {
                Ok(value) => Ok(Value::text(value)),
                Err(_) => Err(interp.eval_err(format!("Environment variable '{name}' not found"))),
            }
        }
        NativeFn::OsName => {
            if !args.is_empty() {
                return Err(interp.eval_err("os.osName() takes no arguments"));
            }
            Ok(Value::text(std::env::consts::OS))
        }
        _ => unreachable!("routed by call_native"),
    }
}

mod math;
mod system_io;
mod system_os;
mod testing;

use crate::{
    exception::RunResult,
    expressions::ImportPath,
    heap::{Heap, HeapData, HeapId},
    object::ObjectInstance,
    run::Interpreter,
    value::Value,
};

/// Identity of a native method registered on a built-in module object.
///
/// The enum is both the dispatch key in `call_native` and the payload
/// stored in `MethodBody::Native`; the strum display form is the method
/// name as scripts see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub(crate) enum NativeFn {
    // system.io
    Print,
    Input,
    // system.os
    Args,
    Argc,
    GetEnv,
    OsName,
    // math
    Pi,
    E,
    Abs,
    Sqrt,
    Pow,
    Floor,
    Ceil,
    Round,
    Min,
    Max,
    Log,
    Log10,
    Exp,
    Sin,
    Cos,
    Tan,
    // testing
    AssertEqual,
    AssertNotEqual,
    AssertTrue,
    AssertFalse,
    AssertGreater,
    AssertLess,
    AssertNear,
    AssertNull,
    AssertGreaterEqual,
    AssertNotEmpty,
    Fail,
}

/// Whether an import spec names a built-in module.
pub(crate) fn is_native_module(path: &ImportPath) -> bool {
    if path.user {
        return false;
    }
    if path.package.len() == 1 && path.package[0] == "system" {
        return matches!(path.object.as_str(), "io" | "os");
    }
    if path.package.is_empty() {
        return matches!(path.object.as_str(), "math" | "testing");
    }
    false
}

/// Materializes a built-in module as a freshly built object instance.
///
/// These never go through parsing; each factory registers its intrinsic
/// methods directly.
pub(crate) fn create_native_module(name: &str, heap: &mut Heap) -> Option<HeapId> {
    let object = match name {
        "io" => system_io::create_io_object(),
        "os" => system_os::create_os_object(),
        "math" => math::create_math_object(),
        "testing" => testing::create_testing_object(),
        _ => return None,
    };
    Some(heap.allocate(HeapData::Object(object)))
}

/// Dispatches a native method to its module's implementation.
pub(crate) fn call_native(interp: &mut Interpreter, function: NativeFn, args: &[Value]) -> RunResult<Value> {
    match function {
        NativeFn::Print | NativeFn::Input => system_io::call(interp, function, args),
        NativeFn::Args | NativeFn::Argc | NativeFn::GetEnv | NativeFn::OsName => {
            system_os::call(interp, function, args)
        }
        NativeFn::Pi
        | NativeFn::E
        | NativeFn::Abs
        | NativeFn::Sqrt
        | NativeFn::Pow
        | NativeFn::Floor
        | NativeFn::Ceil
        | NativeFn::Round
        | NativeFn::Min
        | NativeFn::Max
        | NativeFn::Log
        | NativeFn::Log10
        | NativeFn::Exp
        | NativeFn::Sin
        | NativeFn::Cos
        | NativeFn::Tan => math::call(interp, function, args),
        NativeFn::AssertEqual
        | NativeFn::AssertNotEqual
        | NativeFn::AssertTrue
        | NativeFn::AssertFalse
        | NativeFn::AssertGreater
        | NativeFn::AssertLess
        | NativeFn::AssertNear
        | NativeFn::AssertNull
        | NativeFn::AssertGreaterEqual
        | NativeFn::AssertNotEmpty
        | NativeFn::Fail => testing::call(interp, function, args),
    }
}

fn register(object: &mut ObjectInstance, name: &str, function: NativeFn) {
    object.add_native(name, function);
}

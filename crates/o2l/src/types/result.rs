use std::rc::Rc;

use crate::{
    exception::RunResult,
    run::Interpreter,
    types::check_arity,
    value::{ErrorValue, ResultValue, Value},
};

/// Intrinsic methods on `Result` values.
pub(super) fn call(
    interp: &mut Interpreter,
    result: &Rc<ResultValue>,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let outcome = match method {
        "isSuccess" => check_arity(interp, "Result", method, args, 0).map(|()| Value::Bool(result.success)),
        "isError" => check_arity(interp, "Result", method, args, 0).map(|()| Value::Bool(!result.success)),
        "getResult" => check_arity(interp, "Result", method, args, 0).and_then(|()| {
            if result.success {
                Ok(result.value.clone())
            } else {
                Err(interp.eval_err("Cannot getResult() on an error Result"))
            }
        }),
        "getError" => check_arity(interp, "Result", method, args, 0).and_then(|()| {
            if result.success {
                Err(interp.eval_err("Cannot getError() on a success Result"))
            } else {
                Ok(result.value.clone())
            }
        }),
        _ => return None,
    };
    Some(outcome)
}

/// Intrinsic methods on `Error` values.
pub(super) fn call_error(
    interp: &mut Interpreter,
    error: &Rc<ErrorValue>,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let outcome = match method {
        "getMessage" => check_arity(interp, "Error", method, args, 0).map(|()| Value::Text(error.message.clone())),
        "getCode" => check_arity(interp, "Error", method, args, 0).map(|()| Value::Text(error.code.clone())),
        _ => return None,
    };
    Some(outcome)
}

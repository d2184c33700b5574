use crate::{
    exception::RunResult,
    heap::{HeapData, HeapId, ListIterator},
    run::Interpreter,
    types::{check_arity, expect_int},
    value::Value,
};

/// Intrinsic methods on `List` values. Index access is bounds-checked.
pub(super) fn call(
    interp: &mut Interpreter,
    id: HeapId,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let result = match method {
        "add" => {
            if let Err(e) = check_arity(interp, "List", method, args, 1) {
                return Some(Err(e));
            }
            let element = args[0].clone();
            let HeapData::List(list) = interp.heap.get_mut(id) else {
                return None;
            };
            list.add(element);
            Ok(Value::Bool(true))
        }
        "get" => {
            let index = match check_arity(interp, "List", method, args, 1)
                .and_then(|()| expect_int(interp, "List.get()", &args[0]))
            {
                Ok(index) => index,
                Err(e) => return Some(Err(e)),
            };
            let HeapData::List(list) = interp.heap.get(id) else {
                return None;
            };
            if index < 0 {
                let len = list.len();
                return Some(Err(interp.eval_err(format!(
                    "List index {index} out of bounds (size: {len})"
                ))));
            }
            list.get(index as usize).map_err(|message| interp.eval_err(message))
        }
        "remove" => {
            let index = match check_arity(interp, "List", method, args, 1)
                .and_then(|()| expect_int(interp, "List.remove()", &args[0]))
            {
                Ok(index) => index,
                Err(e) => return Some(Err(e)),
            };
            if index < 0 {
                let len = match interp.heap.get(id) {
                    HeapData::List(list) => list.len(),
                    _ => return None,
                };
                return Some(Err(interp.eval_err(format!(
                    "List index {index} out of bounds (size: {len})"
                ))));
            }
            let removed = match interp.heap.get_mut(id) {
                HeapData::List(list) => list.remove(index as usize),
                _ => return None,
            };
            match removed {
                Ok(()) => Ok(Value::Bool(true)),
                Err(message) => Err(interp.eval_err(message)),
            }
        }
        "pop" => {
            if let Err(e) = check_arity(interp, "List", method, args, 0) {
                return Some(Err(e));
            }
            let popped = match interp.heap.get_mut(id) {
                HeapData::List(list) => list.pop(),
                _ => return None,
            };
            popped.map_err(|message| interp.eval_err(message))
        }
        "reverse" => {
            if let Err(e) = check_arity(interp, "List", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::List(list) = interp.heap.get_mut(id) else {
                return None;
            };
            list.reverse();
            Ok(Value::Bool(true))
        }
        "size" => {
            if let Err(e) = check_arity(interp, "List", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::List(list) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Int(list.len() as i32))
        }
        "empty" => {
            if let Err(e) = check_arity(interp, "List", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::List(list) = interp.heap.get(id) else {
                return None;
            };
            Ok(Value::Bool(list.is_empty()))
        }
        "clear" => {
            if let Err(e) = check_arity(interp, "List", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::List(list) = interp.heap.get_mut(id) else {
                return None;
            };
            list.clear();
            Ok(Value::Bool(true))
        }
        "iterator" => {
            if let Err(e) = check_arity(interp, "List", method, args, 0) {
                return Some(Err(e));
            }
            let iterator = interp
                .heap
                .allocate(HeapData::Iterator(ListIterator { list: id, index: 0 }));
            Ok(Value::Ref(iterator))
        }
        _ => return None,
    };
    Some(result)
}

/// Methods on the stateful iterator produced by `List.iterator()`.
pub(super) fn call_iterator(
    interp: &mut Interpreter,
    id: HeapId,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let result = match method {
        "hasNext" => {
            if let Err(e) = check_arity(interp, "ListIterator", method, args, 0) {
                return Some(Err(e));
            }
            let (list_id, index) = iterator_state(interp, id)?;
            let HeapData::List(list) = interp.heap.get(list_id) else {
                return None;
            };
            Ok(Value::Bool(index < list.len()))
        }
        "next" => {
            if let Err(e) = check_arity(interp, "ListIterator", method, args, 0) {
                return Some(Err(e));
            }
            let (list_id, index) = iterator_state(interp, id)?;
            let element = match interp.heap.get(list_id) {
                HeapData::List(list) if index < list.len() => list.elements()[index].clone(),
                HeapData::List(_) => {
                    return Some(Err(interp.eval_err("Iterator has no more elements")));
                }
                _ => return None,
            };
            let HeapData::Iterator(iterator) = interp.heap.get_mut(id) else {
                return None;
            };
            iterator.index = index + 1;
            Ok(element)
        }
        "reset" => {
            if let Err(e) = check_arity(interp, "ListIterator", method, args, 0) {
                return Some(Err(e));
            }
            let HeapData::Iterator(iterator) = interp.heap.get_mut(id) else {
                return None;
            };
            iterator.index = 0;
            Ok(Value::Bool(true))
        }
        "index" => {
            if let Err(e) = check_arity(interp, "ListIterator", method, args, 0) {
                return Some(Err(e));
            }
            let (_, index) = iterator_state(interp, id)?;
            Ok(Value::Int(index as i32))
        }
        _ => return None,
    };
    Some(result)
}

fn iterator_state(interp: &Interpreter, id: HeapId) -> Option<(HeapId, usize)> {
    match interp.heap.get(id) {
        HeapData::Iterator(iterator) => Some((iterator.list, iterator.index)),
        _ => None,
    }
}

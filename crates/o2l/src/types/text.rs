use std::rc::Rc;

use crate::{
    exception::{RunError, RunResult},
    heap::{HeapData, ListInstance, MapInstance},
    run::Interpreter,
    types::{check_arity, expect_int, expect_text},
    value::{MapKey, Value},
};

/// Intrinsic methods on `Text` values.
///
/// Indexing is in characters, not bytes; conversions trim surrounding
/// whitespace and reject anything that does not parse completely.
pub(super) fn call(
    interp: &mut Interpreter,
    s: &Rc<str>,
    method: &str,
    args: &[Value],
) -> Option<RunResult<Value>> {
    let result = match method {
        "length" => zero(interp, method, args).map(|()| Value::Int(s.chars().count() as i32)),
        "toString" => zero(interp, method, args).map(|()| Value::Text(s.clone())),
        "toInt" => zero(interp, method, args).and_then(|()| convert(interp, s, "Int")),
        "toLong" => zero(interp, method, args).and_then(|()| convert(interp, s, "Long")),
        "toFloat" => zero(interp, method, args).and_then(|()| convert(interp, s, "Float")),
        "toDouble" => zero(interp, method, args).and_then(|()| convert(interp, s, "Double")),
        "toBool" => zero(interp, method, args).and_then(|()| {
            let trimmed = s.trim();
            match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(interp.eval_err(format!("Cannot convert '{trimmed}' to Bool"))),
            }
        }),

        "upper" => zero(interp, method, args).map(|()| Value::text(s.to_uppercase())),
        "lower" | "caseFold" => zero(interp, method, args).map(|()| Value::text(s.to_lowercase())),
        "capitalize" => zero(interp, method, args).map(|()| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => {
                    let mut out: String = first.to_uppercase().collect();
                    out.push_str(&chars.as_str().to_lowercase());
                    Value::text(out)
                }
                None => Value::Text(s.clone()),
            }
        }),
        "title" => zero(interp, method, args).map(|()| Value::text(title_case(s))),
        "swapCase" => zero(interp, method, args).map(|()| {
            let swapped: String = s
                .chars()
                .flat_map(|c| {
                    if c.is_uppercase() {
                        c.to_lowercase().collect::<Vec<_>>()
                    } else {
                        c.to_uppercase().collect::<Vec<_>>()
                    }
                })
                .collect();
            Value::text(swapped)
        }),

        "find" => one_text(interp, method, args).map(|needle| Value::Int(find_index(s, &needle))),
        "rfind" => one_text(interp, method, args).map(|needle| Value::Int(rfind_index(s, &needle))),
        "index" => one_text(interp, method, args).and_then(|needle| {
            match find_index(s, &needle) {
                -1 => Err(interp.eval_err(format!("Substring '{needle}' not found"))),
                index => Ok(Value::Int(index)),
            }
        }),
        "rindex" => one_text(interp, method, args).and_then(|needle| {
            match rfind_index(s, &needle) {
                -1 => Err(interp.eval_err(format!("Substring '{needle}' not found"))),
                index => Ok(Value::Int(index)),
            }
        }),
        "count" => one_text(interp, method, args).map(|needle| {
            if needle.is_empty() {
                Value::Int(s.chars().count() as i32 + 1)
            } else {
                Value::Int(s.matches(&*needle).count() as i32)
            }
        }),
        "contains" => one_text(interp, method, args).map(|needle| Value::Bool(s.contains(&*needle))),
        "startswith" => one_text(interp, method, args).map(|prefix| Value::Bool(s.starts_with(&*prefix))),
        "endswith" => one_text(interp, method, args).map(|suffix| Value::Bool(s.ends_with(&*suffix))),

        "isAlpha" => zero(interp, method, args).map(|()| {
            Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic))
        }),
        "isDigit" | "isDecimal" => zero(interp, method, args).map(|()| {
            Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        }),
        "isNumeric" => zero(interp, method, args).map(|()| {
            Value::Bool(!s.is_empty() && s.chars().all(char::is_numeric))
        }),
        "isAlnum" => zero(interp, method, args).map(|()| {
            Value::Bool(!s.is_empty() && s.chars().all(char::is_alphanumeric))
        }),
        "isLower" => zero(interp, method, args).map(|()| {
            Value::Bool(s.chars().any(char::is_lowercase) && !s.chars().any(char::is_uppercase))
        }),
        "isUpper" => zero(interp, method, args).map(|()| {
            Value::Bool(s.chars().any(char::is_uppercase) && !s.chars().any(char::is_lowercase))
        }),
        "isSpace" => zero(interp, method, args).map(|()| {
            Value::Bool(!s.is_empty() && s.chars().all(char::is_whitespace))
        }),
        "isPrintable" => zero(interp, method, args).map(|()| {
            Value::Bool(s.chars().all(|c| !c.is_control()))
        }),
        "isAscii" => zero(interp, method, args).map(|()| Value::Bool(s.is_ascii())),
        "isIdentifier" => zero(interp, method, args).map(|()| {
            let mut chars = s.chars();
            let valid = match chars.next() {
                Some(first) => {
                    (first.is_alphabetic() || first == '_')
                        && chars.all(|c| c.is_alphanumeric() || c == '_')
                }
                None => false,
            };
            Value::Bool(valid)
        }),
        "isTitle" => zero(interp, method, args).map(|()| Value::Bool(is_title_case(s))),

        "strip" => zero(interp, method, args).map(|()| Value::text(s.trim())),
        "lstrip" => zero(interp, method, args).map(|()| Value::text(s.trim_start())),
        "rstrip" => zero(interp, method, args).map(|()| Value::text(s.trim_end())),

        "replace" => two_text(interp, method, args).map(|(old, new)| {
            Value::text(s.replace(&*old, &new))
        }),
        "split" => one_text(interp, method, args).and_then(|sep| {
            if sep.is_empty() {
                return Err(interp.eval_err("Text.split() separator must not be empty"));
            }
            let parts: Vec<Value> = s.split(&*sep).map(Value::text).collect();
            Ok(allocate_text_list(interp, parts))
        }),
        "splitlines" => zero(interp, method, args).map(|()| {
            let parts: Vec<Value> = s.lines().map(Value::text).collect();
            allocate_text_list(interp, parts)
        }),
        "partition" => one_text(interp, method, args).map(|sep| {
            let parts = match s.split_once(&*sep) {
                Some((before, after)) => vec![Value::text(before), Value::Text(sep), Value::text(after)],
                None => vec![Value::Text(s.clone()), Value::text(""), Value::text("")],
            };
            allocate_text_list(interp, parts)
        }),
        "rpartition" => one_text(interp, method, args).map(|sep| {
            let parts = match s.rsplit_once(&*sep) {
                Some((before, after)) => vec![Value::text(before), Value::Text(sep), Value::text(after)],
                None => vec![Value::text(""), Value::text(""), Value::Text(s.clone())],
            };
            allocate_text_list(interp, parts)
        }),

        "center" => one_int(interp, method, args).map(|width| Value::text(center(s, width))),
        "ljust" => one_int(interp, method, args).map(|width| Value::text(just(s, width, false))),
        "rjust" => one_int(interp, method, args).map(|width| Value::text(just(s, width, true))),
        "zfill" => one_int(interp, method, args).map(|width| Value::text(zfill(s, width))),

        "format" => format_positional(interp, s, args),
        "formatMap" => {
            if let Err(e) = check_arity(interp, "Text", method, args, 1) {
                Err(e)
            } else {
                format_map(interp, s, &args[0])
            }
        }
        "join" => {
            if let Err(e) = check_arity(interp, "Text", method, args, 1) {
                Err(e)
            } else {
                join(interp, s, &args[0])
            }
        }
        "makeTrans" => two_text(interp, method, args).and_then(|(from, to)| {
            make_trans(interp, &from, &to)
        }),
        "translate" => {
            if let Err(e) = check_arity(interp, "Text", method, args, 1) {
                Err(e)
            } else {
                translate(interp, s, &args[0])
            }
        }
        _ => return None,
    };
    Some(result)
}

// --- argument helpers -----------------------------------------------------

fn zero(interp: &Interpreter, method: &str, args: &[Value]) -> Result<(), RunError> {
    check_arity(interp, "Text", method, args, 0)
}

fn one_text(interp: &Interpreter, method: &str, args: &[Value]) -> Result<Rc<str>, RunError> {
    check_arity(interp, "Text", method, args, 1)?;
    expect_text(interp, &format!("Text.{method}()"), &args[0])
}

fn two_text(interp: &Interpreter, method: &str, args: &[Value]) -> Result<(Rc<str>, Rc<str>), RunError> {
    check_arity(interp, "Text", method, args, 2)?;
    let first = expect_text(interp, &format!("Text.{method}()"), &args[0])?;
    let second = expect_text(interp, &format!("Text.{method}()"), &args[1])?;
    Ok((first, second))
}

fn one_int(interp: &Interpreter, method: &str, args: &[Value]) -> Result<i32, RunError> {
    check_arity(interp, "Text", method, args, 1)?;
    expect_int(interp, &format!("Text.{method}()"), &args[0])
}

fn allocate_text_list(interp: &mut Interpreter, parts: Vec<Value>) -> Value {
    let id = interp
        .heap
        .allocate(HeapData::List(ListInstance::with_elements("Text", parts)));
    Value::Ref(id)
}

// --- conversions ----------------------------------------------------------

fn convert(interp: &Interpreter, s: &str, target: &str) -> RunResult<Value> {
    let trimmed = s.trim();
    let fail = || interp.eval_err(format!("Cannot convert '{trimmed}' to {target}"));
    if trimmed.is_empty() {
        return Err(fail());
    }
    match target {
        "Int" => trimmed.parse::<i32>().map(Value::Int).map_err(|_| fail()),
        "Long" => trimmed.parse::<i64>().map(Value::Long).map_err(|_| fail()),
        "Float" => trimmed.parse::<f32>().map(Value::Float).map_err(|_| fail()),
        "Double" => trimmed.parse::<f64>().map(Value::Double).map_err(|_| fail()),
        _ => Err(fail()),
    }
}

// --- string algorithms ----------------------------------------------------

/// Byte offset of a match converted to a character index; -1 when absent.
fn find_index(s: &str, needle: &str) -> i32 {
    match s.find(needle) {
        Some(byte_index) => s[..byte_index].chars().count() as i32,
        None => -1,
    }
}

fn rfind_index(s: &str, needle: &str) -> i32 {
    match s.rfind(needle) {
        Some(byte_index) => s[..byte_index].chars().count() as i32,
        None => -1,
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn is_title_case(s: &str) -> bool {
    let mut any_cased = false;
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                if !c.is_uppercase() {
                    return false;
                }
            } else if c.is_uppercase() {
                return false;
            }
            any_cased = true;
            at_word_start = false;
        } else {
            at_word_start = true;
        }
    }
    any_cased
}

fn center(s: &str, width: i32) -> String {
    let len = s.chars().count();
    let width = width.max(0) as usize;
    if width <= len {
        return s.to_owned();
    }
    let total = width - len;
    let left = total / 2;
    let right = total - left;
    format!("{}{s}{}", " ".repeat(left), " ".repeat(right))
}

fn just(s: &str, width: i32, right_align: bool) -> String {
    let len = s.chars().count();
    let width = width.max(0) as usize;
    if width <= len {
        return s.to_owned();
    }
    let pad = " ".repeat(width - len);
    if right_align { format!("{pad}{s}") } else { format!("{s}{pad}") }
}

/// Zero padding that keeps a leading sign in front.
fn zfill(s: &str, width: i32) -> String {
    let len = s.chars().count();
    let width = width.max(0) as usize;
    if width <= len {
        return s.to_owned();
    }
    let zeros = "0".repeat(width - len);
    match s.strip_prefix('-') {
        Some(rest) => format!("-{zeros}{rest}"),
        None => match s.strip_prefix('+') {
            Some(rest) => format!("+{zeros}{rest}"),
            None => format!("{zeros}{s}"),
        },
    }
}

/// `format("{0} and {1}", a, b)` - positional placeholders.
fn format_positional(interp: &mut Interpreter, template: &str, args: &[Value]) -> RunResult<Value> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let mut index_text = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(digit) if digit.is_ascii_digit() => index_text.push(digit),
                _ => return Err(interp.eval_err("Malformed placeholder in Text.format() template")),
            }
        }
        let index: usize = index_text
            .parse()
            .map_err(|_| interp.eval_err("Malformed placeholder in Text.format() template"))?;
        let Some(value) = args.get(index) else {
            return Err(interp.eval_err(format!("Format index {index} out of range")));
        };
        out.push_str(&value.display(&interp.heap));
    }
    Ok(Value::text(out))
}

/// `formatMap("{name}", map)` - named placeholders from a `Map`.
fn format_map(interp: &mut Interpreter, template: &str, arg: &Value) -> RunResult<Value> {
    let Value::Ref(id) = arg else {
        return Err(interp.eval_err("Text.formatMap() expects a Map argument"));
    };
    let HeapData::Map(map) = interp.heap.get(*id) else {
        return Err(interp.eval_err("Text.formatMap() expects a Map argument"));
    };
    let map = map.clone();

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let mut key = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(part) => key.push(part),
                None => return Err(interp.eval_err("Malformed placeholder in Text.formatMap() template")),
            }
        }
        let lookup = MapKey::Text(Rc::from(key.as_str()));
        let Some(value) = map.get(&lookup) else {
            return Err(interp.eval_err(format!("Format key '{key}' not found in map")));
        };
        out.push_str(&value.display(&interp.heap));
    }
    Ok(Value::text(out))
}

/// `", ".join(list)` - concatenates a `List<Text>` with the receiver.
fn join(interp: &mut Interpreter, sep: &str, arg: &Value) -> RunResult<Value> {
    let Value::Ref(id) = arg else {
        return Err(interp.eval_err("Text.join() expects a List argument"));
    };
    let HeapData::List(list) = interp.heap.get(*id) else {
        return Err(interp.eval_err("Text.join() expects a List argument"));
    };
    let mut out = String::new();
    for (i, element) in list.elements().iter().enumerate() {
        let Value::Text(text) = element else {
            return Err(interp.eval_err("Text.join() requires a List<Text>"));
        };
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(text);
    }
    Ok(Value::text(out))
}

/// Builds a character translation table as a `Map<Text, Text>`.
fn make_trans(interp: &mut Interpreter, from: &str, to: &str) -> RunResult<Value> {
    let from_chars: Vec<char> = from.chars().collect();
    let to_chars: Vec<char> = to.chars().collect();
    if from_chars.len() != to_chars.len() {
        return Err(interp.eval_err(
            "Text.makeTrans() arguments must have equal length",
        ));
    }
    let mut map = MapInstance::new();
    for (f, t) in from_chars.into_iter().zip(to_chars) {
        map.put(MapKey::Text(Rc::from(f.to_string().as_str())), Value::text(t.to_string()));
    }
    Ok(Value::Ref(interp.heap.allocate(HeapData::Map(map))))
}

/// Applies a `makeTrans` table character by character.
fn translate(interp: &mut Interpreter, s: &str, arg: &Value) -> RunResult<Value> {
    let Value::Ref(id) = arg else {
        return Err(interp.eval_err("Text.translate() expects a Map argument"));
    };
    let HeapData::Map(map) = interp.heap.get(*id) else {
        return Err(interp.eval_err("Text.translate() expects a Map argument"));
    };
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        let key = MapKey::Text(Rc::from(c.to_string().as_str()));
        match map.get(&key) {
            Some(Value::Text(replacement)) => out.push_str(replacement),
            Some(_) | None => out.push(c),
        }
    }
    Ok(Value::text(out))
}

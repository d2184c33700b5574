use o2l::{Exception, Interpreter, NoPrint, Value};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Result<Value, Exception> {
    let mut interp = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    interp.execute_source(source, "test.obq")
}

fn eval(expr: &str, return_type: &str) -> Value {
    let source = format!(
        "Object Main {{\n    method main(): {return_type} {{\n        return {expr}\n    }}\n}}\n"
    );
    run(&source).unwrap_or_else(|e| panic!("`{expr}` failed: {e}"))
}

fn eval_err(expr: &str) -> Exception {
    let source = format!(
        "Object Main {{\n    method main(): Int {{\n        x: Int = 0\n        {expr}\n        return x\n    }}\n}}\n"
    );
    run(&source).expect_err("expected failure")
}

#[test]
fn int_conversions() {
    assert!(matches!(eval("42.toLong()", "Long"), Value::Long(42)));
    assert!(matches!(eval("42.toDouble()", "Double"), Value::Double(v) if v == 42.0));
    assert!(matches!(eval("42.toFloat()", "Float"), Value::Float(v) if v == 42.0));
    assert!(matches!(eval("1.toBool()", "Bool"), Value::Bool(true)));
    assert!(matches!(eval("0.toBool()", "Bool"), Value::Bool(false)));
    assert!(matches!(eval("42.toString()", "Text"), Value::Text(s) if &*s == "42"));
}

#[test]
fn int_to_bool_requires_zero_or_one() {
    let err = eval_err("b: Bool = 2.toBool()");
    assert!(err.message().contains("expected 0 or 1"));
}

#[test]
fn long_conversions() {
    assert!(matches!(eval("42l.toInt()", "Int"), Value::Int(42)));
    assert!(matches!(eval("42l.toDouble()", "Double"), Value::Double(v) if v == 42.0));
    assert!(matches!(eval("42l.toString()", "Text"), Value::Text(s) if &*s == "42"));
}

#[test]
fn long_to_int_checks_range() {
    let err = eval_err("i: Int = 9000000000l.toInt()");
    assert!(err.message().contains("out of range"), "got: {}", err.message());
}

#[test]
fn double_conversions_truncate_toward_zero() {
    assert!(matches!(eval("3.9d.toInt()", "Int"), Value::Int(3)));
    assert!(matches!(eval("-3.9d.toInt()", "Int"), Value::Int(-3)));
    assert!(matches!(eval("3.5d.toLong()", "Long"), Value::Long(3)));
}

#[test]
fn double_to_int_rejects_out_of_range() {
    let err = eval_err("i: Int = (3000000000.0 * 1000.0).toInt()");
    assert!(err.message().contains("out of range"), "got: {}", err.message());
}

#[test]
fn float_predicates() {
    assert!(matches!(eval("(0.0 / 1.0).isFinite()", "Bool"), Value::Bool(true)));
    assert!(matches!(eval("2.5f.isNaN()", "Bool"), Value::Bool(false)));
    assert!(matches!(eval("2.5f.isFinite()", "Bool"), Value::Bool(true)));
}

#[test]
fn bool_conversions() {
    assert!(matches!(eval("true.toInt()", "Int"), Value::Int(1)));
    assert!(matches!(eval("false.toInt()", "Int"), Value::Int(0)));
    assert!(matches!(eval("true.toLong()", "Long"), Value::Long(1)));
    assert!(matches!(eval("true.toString()", "Text"), Value::Text(s) if &*s == "true"));
}

#[test]
fn char_methods() {
    assert!(matches!(eval("'a'.toUpper()", "Char"), Value::Char(b'A')));
    assert!(matches!(eval("'Z'.toLower()", "Char"), Value::Char(b'z')));
    assert!(matches!(eval("'a'.toInt()", "Int"), Value::Int(97)));
    assert!(matches!(eval("'7'.isDigit()", "Bool"), Value::Bool(true)));
    assert!(matches!(eval("'x'.isAlpha()", "Bool"), Value::Bool(true)));
}

#[test]
fn float_to_string_uses_shortest_form() {
    assert!(matches!(eval("2.5d.toString()", "Text"), Value::Text(s) if &*s == "2.5"));
    assert!(matches!(eval("0.1d.toString()", "Text"), Value::Text(s) if &*s == "0.1"));
}

#[test]
fn conversion_arity_is_checked() {
    let err = eval_err("i: Int = 42.toLong(1)");
    assert_eq!(err.message(), "Int.toLong() takes no arguments");
}

#[test]
fn mixed_tag_equality_is_false_ordering_is_an_error() {
    let source = r#"
        Object Main {
            method main(): Int {
                if (1 == "1") {
                    return 1
                }
                if (1 != "1") {
                    return 2
                }
                return 0
            }
        }
        "#;
    let result = run(source).unwrap();
    assert!(matches!(result, Value::Int(2)));

    let err = run(
        r#"
        Object Main {
            method main(): Int {
                if ("a" < 1) {
                    return 1
                }
                return 0
            }
        }
        "#,
    )
    .expect_err("expected failure");
    assert!(err.message().contains("Cannot compare values of different types"));
}

#[test]
fn numeric_promotion_lattice_for_comparisons() {
    let source = r"
        Object Main {
            method main(): Int {
                ok: Int = 0
                if (1 < 2l) {
                    ok = ok + 1
                }
                if (3l == 3.0) {
                    ok = ok + 1
                }
                if (2.5f < 3) {
                    ok = ok + 1
                }
                if (1 == 1.0) {
                    ok = ok + 1
                }
                return ok
            }
        }
        ";
    let result = run(source).unwrap();
    assert!(matches!(result, Value::Int(4)));
}

#[test]
fn bool_ordering_is_rejected() {
    let err = run(
        r"
        Object Main {
            method main(): Int {
                if (true < false) {
                    return 1
                }
                return 0
            }
        }
        ",
    )
    .expect_err("expected failure");
    assert!(err.message().contains("Invalid comparison operator for boolean values"));
}

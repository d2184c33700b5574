use o2l::{ExcKind, Exception, Interpreter, NoPrint, Value};
use pretty_assertions::assert_eq;

fn run(source: &str) -> Result<Value, Exception> {
    let mut interp = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    interp.execute_source(source, "test.obq")
}

fn run_int(source: &str) -> i32 {
    match run(source) {
        Ok(Value::Int(v)) => v,
        other => panic!("expected Int result, got {other:?}"),
    }
}

fn run_err(source: &str) -> Exception {
    run(source).expect_err("expected an error")
}

#[test]
fn simple_program_returns_exit_code() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                return 42
            }
        }
        ",
    );
    assert_eq!(code, 42);
}

#[test]
fn binary_op_promotes_to_double() {
    // Int + Double operates in the wider tag.
    let result = run(
        r"
        Object Main {
            method main(): Double {
                return 1 + 2.5
            }
        }
        ",
    )
    .unwrap();
    match result {
        Value::Double(v) => assert_eq!(v, 3.5),
        other => panic!("expected Double, got {other:?}"),
    }
}

#[test]
fn constant_reassignment_is_rejected() {
    let err = run_err(
        r"
        Object Main {
            method main(): Int {
                const x: Int = 5
                x = 6
                return x
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::Evaluation);
    assert!(
        err.message().contains("Cannot reassign constant variable 'x'"),
        "unexpected message: {}",
        err.message()
    );
}

#[test]
fn non_external_methods_are_not_callable_from_outside() {
    let err = run_err(
        r"
        Object Calc {
            method secret(): Int {
                return 42
            }
        }
        Object Main {
            method main(): Int {
                c: Calc = new Calc()
                return c.secret()
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::Evaluation);
    assert!(
        err.message().contains("not externally accessible"),
        "unexpected message: {}",
        err.message()
    );
}

#[test]
fn internal_methods_are_callable_through_this() {
    let code = run_int(
        r"
        Object Calc {
            method secret(): Int {
                return 42
            }
            @external method reveal(): Int {
                return this.secret()
            }
        }
        Object Main {
            method main(): Int {
                c: Calc = new Calc()
                return c.reveal()
            }
        }
        ",
    );
    assert_eq!(code, 42);
}

#[test]
fn string_comparison_in_conditionals() {
    let code = run_int(
        r#"
        Object Main {
            method main(): Int {
                if ("hello" == "hello") {
                    return 1
                }
                return 0
            }
        }
        "#,
    );
    assert_eq!(code, 1);
}

#[test]
fn while_with_break_and_continue_sums_odds() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                sum: Int = 0
                i: Int = 0
                while (i < 9) {
                    i = i + 1
                    if (i % 2 == 0) {
                        continue
                    }
                    sum = sum + i
                }
                return sum
            }
        }
        ",
    );
    assert_eq!(code, 25);
}

#[test]
fn method_dispatch_by_argument() {
    let code = run_int(
        r#"
        Object Calculator {
            @external method compute(operation: Text): Int {
                if (operation == "add") {
                    return 10
                }
                if (operation == "subtract") {
                    return 20
                }
                return 0
            }
        }
        Object Main {
            method main(): Int {
                calc: Calculator = new Calculator()
                return calc.compute("add")
            }
        }
        "#,
    );
    assert_eq!(code, 10);
}

#[test]
fn missing_main_is_an_error() {
    let err = run_err(
        r"
        Object Helper {
            @external method help(): Int {
                return 1
            }
        }
        ",
    );
    assert!(err.message().contains("Main"), "unexpected message: {}", err.message());
}

#[test]
fn main_receives_program_arguments() {
    let source = r"
        Object Main {
            method main(args: List<Text>): Int {
                return args.size()
            }
        }
        ";
    let mut interp = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    interp.set_program_args(vec!["test.obq".to_owned(), "one".to_owned(), "two".to_owned()]);
    let result = interp.execute_source(source, "test.obq").unwrap();
    assert!(matches!(result, Value::Int(3)));
}

#[test]
fn result_type_success_path() {
    let code = run_int(
        r#"
        Object SafeMath {
            @external method divide(a: Int, b: Int): Result<Int, Error> {
                if (b == 0) {
                    failure: Error = new Error("Division by zero")
                    return Result.error(failure)
                }
                return Result.success(a / b)
            }
        }
        Object Main {
            method main(): Int {
                math: SafeMath = new SafeMath()
                result: Result<Int, Error> = math.divide(10, 2)
                if (result.isSuccess()) {
                    return result.getResult()
                }
                return -1
            }
        }
        "#,
    );
    assert_eq!(code, 5);
}

#[test]
fn result_type_error_path() {
    let code = run_int(
        r#"
        Object SafeMath {
            @external method divide(a: Int, b: Int): Result<Int, Error> {
                if (b == 0) {
                    failure: Error = new Error("Division by zero", "MATH001")
                    return Result.error(failure)
                }
                return Result.success(a / b)
            }
        }
        Object Main {
            method main(): Int {
                math: SafeMath = new SafeMath()
                result: Result<Int, Error> = math.divide(10, 0)
                if (result.isError()) {
                    failure: Error = result.getError()
                    if (failure.getCode() == "MATH001") {
                        return 7
                    }
                }
                return -1
            }
        }
        "#,
    );
    assert_eq!(code, 7);
}

#[test]
fn division_by_zero_raises() {
    let err = run_err(
        r"
        Object Main {
            method main(): Int {
                return 10 / 0
            }
        }
        ",
    );
    assert!(err.message().contains("Division by zero"));
}

#[test]
fn modulo_by_zero_raises() {
    let err = run_err(
        r"
        Object Main {
            method main(): Int {
                return 10 % 0
            }
        }
        ",
    );
    assert!(err.message().contains("Modulo by zero"));
}

#[test]
fn scope_hygiene_names_do_not_leak_from_blocks() {
    let err = run_err(
        r"
        Object Main {
            method main(): Int {
                if (true) {
                    inner: Int = 1
                }
                return inner
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::UnresolvedReference);
    assert!(err.message().contains("Variable 'inner' not found"));
}

#[test]
fn wrong_arity_is_an_error() {
    let err = run_err(
        r"
        Object Calc {
            @external method add(a: Int, b: Int): Int {
                return a + b
            }
        }
        Object Main {
            method main(): Int {
                c: Calc = new Calc()
                return c.add(1)
            }
        }
        ",
    );
    assert!(err.message().contains("expects 2 arguments, got 1"));
}

#[test]
fn annotation_mismatch_is_a_type_error() {
    let err = run_err(
        r#"
        Object Main {
            method main(): Int {
                x: Int = "nope"
                return 0
            }
        }
        "#,
    );
    assert_eq!(err.kind(), ExcKind::TypeMismatch);
}

#[test]
fn numeric_widening_in_declarations() {
    let result = run(
        r"
        Object Main {
            method main(): Double {
                x: Double = 5
                return x
            }
        }
        ",
    )
    .unwrap();
    assert!(matches!(result, Value::Double(v) if v == 5.0));
}

#[test]
fn stack_trace_points_at_the_failing_method() {
    let err = run_err(
        r"
        Object Deep {
            @external method inner(): Int {
                return 1 / 0
            }
            @external method outer(): Int {
                return this.inner()
            }
        }
        Object Main {
            method main(): Int {
                d: Deep = new Deep()
                return d.outer()
            }
        }
        ",
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("Evaluation Error: Division by zero"), "got: {rendered}");
    assert!(rendered.contains("Stack trace:"), "got: {rendered}");
    // Innermost first: inner before outer before main.
    let inner_pos = rendered.find("at Deep.inner").expect("inner frame");
    let outer_pos = rendered.find("at Deep.outer").expect("outer frame");
    let main_pos = rendered.find("at Main.main").expect("main frame");
    assert!(inner_pos < outer_pos && outer_pos < main_pos, "got: {rendered}");
    assert!(rendered.contains("(test.obq:"), "got: {rendered}");
}

#[test]
fn to_string_round_trips_for_int_long_bool() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                i: Int = -37
                l: Long = 9000000000l
                b: Bool = true
                ok: Int = 0
                if (i.toString().toInt() == i) {
                    ok = ok + 1
                }
                if (l.toString().toLong() == l) {
                    ok = ok + 1
                }
                if (b.toString().toBool() == b) {
                    ok = ok + 1
                }
                return ok
            }
        }
        ",
    );
    assert_eq!(code, 3);
}

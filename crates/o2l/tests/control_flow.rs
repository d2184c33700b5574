use o2l::{ExcKind, Exception, Interpreter, NoPrint, Value};
use pretty_assertions::assert_eq;

fn run_int(source: &str) -> i32 {
    let mut interp = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    match interp.execute_source(source, "test.obq") {
        Ok(Value::Int(v)) => v,
        other => panic!("expected Int result, got {other:?}"),
    }
}

fn run_err(source: &str) -> Exception {
    let mut interp = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    interp
        .execute_source(source, "test.obq")
        .expect_err("expected an error")
}

#[test]
fn break_exits_the_loop() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                i: Int = 0
                while (i < 10) {
                    i = i + 1
                    if (i == 5) {
                        break
                    }
                }
                return i
            }
        }
        ",
    );
    assert_eq!(code, 5);
}

#[test]
fn break_only_exits_the_innermost_loop() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                outer: Int = 0
                total: Int = 0
                while (outer < 3) {
                    outer = outer + 1
                    inner: Int = 0
                    while (inner < 100) {
                        inner = inner + 1
                        if (inner == 2) {
                            break
                        }
                    }
                    total = total + inner
                }
                return total
            }
        }
        ",
    );
    assert_eq!(code, 6);
}

#[test]
fn continue_skips_to_the_condition() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                i: Int = 0
                count: Int = 0
                while (i < 10) {
                    i = i + 1
                    if (i % 3 == 0) {
                        continue
                    }
                    count = count + 1
                }
                return count
            }
        }
        ",
    );
    assert_eq!(code, 7);
}

#[test]
fn return_unwinds_out_of_nested_loops() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                i: Int = 0
                while (true) {
                    j: Int = 0
                    while (true) {
                        j = j + 1
                        if (j == 4) {
                            return i * 10 + j
                        }
                    }
                }
                return -1
            }
        }
        ",
    );
    assert_eq!(code, 4);
}

#[test]
fn else_if_chain_picks_the_first_match() {
    let code = run_int(
        r"
        Object Main {
            method grade(score: Int): Int {
                if (score >= 90) {
                    return 4
                } else if (score >= 80) {
                    return 3
                } else if (score >= 70) {
                    return 2
                } else {
                    return 1
                }
            }
            method main(): Int {
                return this.grade(75) * 100 + this.grade(85) * 10 + this.grade(95)
            }
        }
        ",
    );
    assert_eq!(code, 234);
}

#[test]
fn while_condition_must_be_bool() {
    let err = run_err(
        r"
        Object Main {
            method main(): Int {
                while (1) {
                    break
                }
                return 0
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::TypeMismatch);
    assert!(err.message().contains("While condition must evaluate to Bool, got Int"));
}

#[test]
fn if_condition_must_be_bool() {
    let err = run_err(
        r#"
        Object Main {
            method main(): Int {
                if ("yes") {
                    return 1
                }
                return 0
            }
        }
        "#,
    );
    assert_eq!(err.kind(), ExcKind::TypeMismatch);
}

#[test]
fn logical_operators_short_circuit() {
    // The right operand would divide by zero; short-circuiting must
    // prevent its evaluation.
    let code = run_int(
        r"
        Object Main {
            @external method boom(): Bool {
                x: Int = 1 / 0
                return true
            }
            method main(): Int {
                a: Bool = false && this.boom()
                b: Bool = true || this.boom()
                if (!a && b) {
                    return 1
                }
                return 0
            }
        }
        ",
    );
    assert_eq!(code, 1);
}

#[test]
fn loops_and_conditionals_scope_their_bodies() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                x: Int = 1
                i: Int = 0
                while (i < 3) {
                    i = i + 1
                    x: Int = 100
                    x = x + 1
                }
                return x
            }
        }
        ",
    );
    // The inner `x` shadows per iteration; the outer binding is intact.
    assert_eq!(code, 1);
}

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

#[test]
fn thrown_values_are_caught_and_bound() {
    let code = run_int(
        r#"
        Object Main {
            method main(): Int {
                try {
                    throw new Error("boom", "E1")
                } catch (e) {
                    if (e.getMessage() == "boom" && e.getCode() == "E1") {
                        return 1
                    }
                    return 2
                }
                return 0
            }
        }
        "#,
    );
    assert_eq!(code, 1);
}

#[test]
fn any_value_can_be_thrown() {
    let code = run_int(
        r#"
        Object Main {
            method main(): Int {
                try {
                    throw 42
                } catch (e) {
                    return e
                }
            }
        }
        "#,
    );
    assert_eq!(code, 42);
}

#[test]
fn finally_runs_on_the_normal_path() {
    let code = run_int(
        r"
        Object Tracker {
            property log: List<Int>
            constructor() {
                this.log = []
            }
            @external method record(v: Int): Int {
                this.log.add(v)
                return v
            }
            @external method total(): Int {
                sum: Int = 0
                it: ListIterator = this.log.iterator()
                while (it.hasNext()) {
                    sum = sum + it.next()
                }
                return sum
            }
        }
        Object Main {
            method main(): Int {
                t: Tracker = new Tracker()
                try {
                    t.record(1)
                } catch (e) {
                    t.record(100)
                } finally {
                    t.record(10)
                }
                return t.total()
            }
        }
        ",
    );
    assert_eq!(code, 11);
}

#[test]
fn finally_runs_after_catch() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                marks: List<Int> = []
                try {
                    throw 1
                } catch (e) {
                    marks.add(2)
                } finally {
                    marks.add(3)
                }
                return marks.get(0) * 10 + marks.get(1)
            }
        }
        ",
    );
    assert_eq!(code, 23);
}

#[test]
fn finally_runs_when_return_unwinds_through_it() {
    let code = run_int(
        r"
        Object Audit {
            property log: List<Int>
            constructor() {
                this.log = []
            }
            @external method run(): Int {
                try {
                    return 5
                } catch (e) {
                    return 6
                } finally {
                    this.log.add(1)
                }
            }
            @external method entries(): Int {
                return this.log.size()
            }
        }
        Object Main {
            method main(): Int {
                a: Audit = new Audit()
                result: Int = a.run()
                return result * 10 + a.entries()
            }
        }
        ",
    );
    assert_eq!(code, 51);
}

#[test]
fn uncaught_throw_reaches_the_top() {
    let err = run(
        r#"
        Object Main {
            method main(): Int {
                throw "unhandled"
            }
        }
        "#,
    )
    .expect_err("expected failure");
    assert!(err.message().contains("Thrown: unhandled"), "got: {}", err.message());
}

#[test]
fn engine_errors_are_not_caught_by_catch() {
    let err = run(
        r"
        Object Main {
            method main(): Int {
                try {
                    return 1 / 0
                } catch (e) {
                    return 9
                }
            }
        }
        ",
    )
    .expect_err("expected failure");
    assert_eq!(err.kind(), ExcKind::Evaluation);
    assert!(err.message().contains("Division by zero"));
}

#[test]
fn rethrow_from_catch_propagates() {
    let code = run_int(
        r#"
        Object Main {
            method main(): Int {
                try {
                    try {
                        throw "inner"
                    } catch (e) {
                        throw e + "!"
                    }
                } catch (outer) {
                    if (outer == "inner!") {
                        return 1
                    }
                    return 2
                }
                return 0
            }
        }
        "#,
    );
    assert_eq!(code, 1);
}

#[test]
fn nested_method_throws_are_caught_by_outer_callers() {
    let code = run_int(
        r#"
        Object Risky {
            @external method explode(): Int {
                throw new Error("kaboom")
            }
        }
        Object Main {
            method main(): Int {
                r: Risky = new Risky()
                try {
                    return r.explode()
                } catch (e) {
                    if (e.getCode() == "Error") {
                        return 3
                    }
                    return 4
                }
            }
        }
        "#,
    );
    assert_eq!(code, 3);
}

#[test]
fn call_stack_balances_after_errors() {
    // Two programs in the same interpreter: a failing one and then a
    // succeeding one. The second still works and traces cleanly.
    let mut interp = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    let failing = r"
        Object Main {
            method main(): Int {
                return 1 / 0
            }
        }
        ";
    let err = interp.execute_source(failing, "test.obq").expect_err("must fail");
    assert!(err.message().contains("Division by zero"));

    let mut second = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    let succeeding = r"
        Object Main {
            method main(): Int {
                return 8
            }
        }
        ";
    let result = second.execute_source(succeeding, "test.obq").unwrap();
    assert!(matches!(result, Value::Int(8)));
}

#[test]
fn catch_scope_does_not_leak_the_binding() {
    let err = run(
        r#"
        Object Main {
            method main(): Int {
                try {
                    throw 1
                } catch (e) {
                    x: Int = e
                }
                return e
            }
        }
        "#,
    )
    .expect_err("expected failure");
    assert_eq!(err.kind(), ExcKind::UnresolvedReference);
    assert!(err.message().contains("Variable 'e' not found"));
}

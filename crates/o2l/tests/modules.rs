use std::fs;

use o2l::{CollectStringPrint, Exception, Interpreter, NoPrint, Value};
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
fn system_io_print_goes_through_the_writer() {
    let writer = CollectStringPrint::new();
    let output = writer.handle();
    let mut interp = Interpreter::with_writer("test.obq", Box::new(writer));
    let source = r#"
        import system.io

        Object Main {
            method main(): Int {
                io.print("plain")
                io.print("%s scored %d points", "ada", 42)
                io.print("pi is roughly %f", 3.5)
                return 0
            }
        }
        "#;
    let result = interp.execute_source(source, "test.obq").unwrap();
    assert!(matches!(result, Value::Int(0)));
    assert_eq!(&*output.borrow(), "plain\nada scored 42 points\npi is roughly 3.5\n");
}

#[test]
fn print_rejects_mismatched_specifiers() {
    let err = run(
        r#"
        import system.io

        Object Main {
            method main(): Int {
                io.print("%d", "not a number")
                return 0
            }
        }
        "#,
    )
    .expect_err("expected failure");
    assert!(err.message().contains("'%d'"), "got: {}", err.message());
}

#[test]
fn system_os_exposes_program_arguments() {
    let source = r#"
        import system.os

        Object Main {
            method main(): Int {
                first: Text = os.args().get(0)
                if (first == "test.obq") {
                    return os.argc()
                }
                return -1
            }
        }
        "#;
    let mut interp = Interpreter::with_writer("test.obq", Box::new(NoPrint));
    interp.set_program_args(vec!["test.obq".to_owned(), "x".to_owned()]);
    let result = interp.execute_source(source, "test.obq").unwrap();
    assert!(matches!(result, Value::Int(2)));
}

#[test]
fn math_module_functions() {
    let code = run_int(
        r"
        import math

        Object Main {
            method main(): Int {
                ok: Int = 0
                if (math.sqrt(16.0) == 4.0) {
                    ok = ok + 1
                }
                if (math.abs(-3) == 3) {
                    ok = ok + 1
                }
                if (math.max(2, 9) == 9 && math.min(2, 9) == 2) {
                    ok = ok + 1
                }
                if (math.pow(2, 10) == 1024.0) {
                    ok = ok + 1
                }
                if (math.pi() > 3.14 && math.pi() < 3.15) {
                    ok = ok + 1
                }
                return ok
            }
        }
        ",
    );
    assert_eq!(code, 5);
}

#[test]
fn testing_module_assertions() {
    let code = run_int(
        r#"
        import testing

        Object Main {
            method main(): Int {
                testing.assertEqual(4, 4)
                testing.assertEqual("a", "a")
                testing.assertNotEqual(1, 2)
                testing.assertTrue(true)
                testing.assertFalse(false)
                testing.assertGreater(5, 3)
                testing.assertLess(3, 5)
                testing.assertNear(1.0, 1.05, 0.1)
                return 0
            }
        }
        "#,
    );
    assert_eq!(code, 0);
}

#[test]
fn assert_equal_uses_double_tolerance() {
    // 0.1 + 0.2 != 0.3 bitwise; the testing library compares within
    // 1e-15 for Double.
    let code = run_int(
        r"
        import testing

        Object Main {
            method main(): Int {
                testing.assertEqual(0.1 + 0.2, 0.3)
                return 0
            }
        }
        ",
    );
    assert_eq!(code, 0);
}

#[test]
fn failed_assertion_raises() {
    let err = run(
        r"
        import testing

        Object Main {
            method main(): Int {
                testing.assertEqual(1, 2)
                return 0
            }
        }
        ",
    )
    .expect_err("expected failure");
    assert!(err.message().contains("assertEqual failed"), "got: {}", err.message());
}

#[test]
fn stubbed_assertions_return_true() {
    let code = run_int(
        r"
        import testing

        Object Main {
            method main(): Int {
                testing.assertNull(42)
                testing.assertGreaterEqual(1, 100)
                testing.assertNotEmpty(0)
                return 0
            }
        }
        ",
    );
    assert_eq!(code, 0);
}

#[test]
fn unknown_library_import_fails() {
    let err = run(
        r"
        import nonexistent

        Object Main {
            method main(): Int {
                return 0
            }
        }
        ",
    )
    .expect_err("expected failure");
    assert!(err.message().contains("Library not found: nonexistent"));
}

#[test]
fn user_import_loads_a_local_module() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Helper.obq"),
        r"
        Object Helper {
            @external method triple(x: Int): Int {
                return x * 3
            }
        }
        ",
    )
    .unwrap();

    let source = r"
        @import Helper

        Object Main {
            method main(): Int {
                h: Helper = new Helper()
                return h.triple(14)
            }
        }
        ";
    let mut interp = Interpreter::with_writer("main.obq", Box::new(NoPrint));
    interp.add_module_search_path(dir.path());
    let result = interp.execute_source(source, "main.obq").unwrap();
    assert!(matches!(result, Value::Int(42)));
}

#[test]
fn modules_are_cached_across_imports() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Shared.obq"),
        r"
        Object Shared {
            @external method one(): Int {
                return 1
            }
        }
        ",
    )
    .unwrap();
    fs::write(
        dir.path().join("UserA.obq"),
        r"
        @import Shared

        Object UserA {
            @external method go(): Int {
                s: Shared = new Shared()
                return s.one()
            }
        }
        ",
    )
    .unwrap();

    let source = r"
        @import Shared
        @import UserA

        Object Main {
            method main(): Int {
                a: UserA = new UserA()
                s: Shared = new Shared()
                return a.go() + s.one()
            }
        }
        ";
    let mut interp = Interpreter::with_writer("main.obq", Box::new(NoPrint));
    interp.add_module_search_path(dir.path());
    let result = interp.execute_source(source, "main.obq").unwrap();
    assert!(matches!(result, Value::Int(2)));
}

#[test]
fn circular_imports_are_detected_with_a_readable_chain() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("A.obq"),
        r"
        @import B

        Object A {
            @external method a(): Int {
                return 1
            }
        }
        ",
    )
    .unwrap();
    fs::write(
        dir.path().join("B.obq"),
        r"
        @import A

        Object B {
            @external method b(): Int {
                return 2
            }
        }
        ",
    )
    .unwrap();

    let source = r"
        @import A

        Object Main {
            method main(): Int {
                return 0
            }
        }
        ";
    let mut interp = Interpreter::with_writer("main.obq", Box::new(NoPrint));
    interp.add_module_search_path(dir.path());
    let err = interp.execute_source(source, "main.obq").expect_err("expected cycle error");
    assert_eq!(err.message(), "Circular @import detected: A -> B -> A");
}

#[test]
fn loader_state_survives_a_failed_import() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Loop.obq"),
        r"
        @import Loop

        Object Loop {
        }
        ",
    )
    .unwrap();
    fs::write(
        dir.path().join("Fine.obq"),
        r"
        Object Fine {
            @external method ok(): Int {
                return 5
            }
        }
        ",
    )
    .unwrap();

    let mut interp = Interpreter::with_writer("main.obq", Box::new(NoPrint));
    interp.add_module_search_path(dir.path());

    let failing = r"
        @import Loop

        Object Main {
            method main(): Int {
                return 0
            }
        }
        ";
    let err = interp.execute_source(failing, "main.obq").expect_err("expected cycle error");
    assert!(err.message().contains("Circular @import detected"));

    // The loader chains were unwound; the same interpreter can still
    // import cleanly.
    let fine = r"
        @import Fine

        Object Main {
            method main(): Int {
                f: Fine = new Fine()
                return f.ok()
            }
        }
        ";
    let result = interp.execute_source(fine, "main.obq").unwrap();
    assert!(matches!(result, Value::Int(5)));
}

#[test]
fn wildcard_and_member_imports_bind_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Util.obq"),
        r"
        Object Util {
            @external method seven(): Int {
                return 7
            }
        }
        ",
    )
    .unwrap();

    let source = r"
        @import Util.seven

        Object Main {
            method main(): Int {
                u: Util = new Util()
                return u.seven() + Util_seven.seven()
            }
        }
        ";
    let mut interp = Interpreter::with_writer("main.obq", Box::new(NoPrint));
    interp.add_module_search_path(dir.path());
    let result = interp.execute_source(source, "main.obq").unwrap();
    assert!(matches!(result, Value::Int(14)));

    let wildcard = r"
        @import Util.*

        Object Main {
            method main(): Int {
                u: Util = new Util()
                return u.seven()
            }
        }
        ";
    let mut second = Interpreter::with_writer("main.obq", Box::new(NoPrint));
    second.add_module_search_path(dir.path());
    let result = second.execute_source(wildcard, "main.obq").unwrap();
    assert!(matches!(result, Value::Int(7)));
}

#[test]
fn member_import_requires_the_method_to_exist() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Util.obq"),
        r"
        Object Util {
        }
        ",
    )
    .unwrap();

    let source = r"
        @import Util.missing

        Object Main {
            method main(): Int {
                return 0
            }
        }
        ";
    let mut interp = Interpreter::with_writer("main.obq", Box::new(NoPrint));
    interp.add_module_search_path(dir.path());
    let err = interp.execute_source(source, "main.obq").expect_err("expected failure");
    assert!(err.message().contains("Method 'missing' not found in object 'Util'"));
}

#[test]
fn qualified_native_calls_work_through_the_dotted_binding() {
    let code = run_int(
        r"
        import system.os

        Object Main {
            method main(): Int {
                return system.os.argc()
            }
        }
        ",
    );
    assert_eq!(code, 1);
}

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
fn constructor_sets_properties() {
    let code = run_int(
        r"
        Object Counter {
            property start: Int
            constructor(start: Int) {
                this.start = start
            }
            @external method value(): Int {
                return this.start
            }
        }
        Object Main {
            method main(): Int {
                c: Counter = new Counter(7)
                return c.value()
            }
        }
        ",
    );
    assert_eq!(code, 7);
}

#[test]
fn properties_are_set_once() {
    let err = run_err(
        r"
        Object Counter {
            property count: Int
            constructor(count: Int) {
                this.count = count
            }
            @external method bump(): Int {
                this.count = this.count + 1
                return this.count
            }
        }
        Object Main {
            method main(): Int {
                c: Counter = new Counter(1)
                return c.bump()
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::Evaluation);
    assert!(err.message().contains("immutable"), "got: {}", err.message());
}

#[test]
fn properties_are_readable_from_outside() {
    let code = run_int(
        r"
        Object Point {
            property x: Int
            constructor(x: Int) {
                this.x = x
            }
        }
        Object Main {
            method main(): Int {
                p: Point = new Point(12)
                return p.x
            }
        }
        ",
    );
    assert_eq!(code, 12);
}

#[test]
fn each_new_instance_is_independent() {
    let code = run_int(
        r"
        Object Box {
            property value: Int
            constructor(value: Int) {
                this.value = value
            }
        }
        Object Main {
            method main(): Int {
                a: Box = new Box(1)
                b: Box = new Box(2)
                return a.value * 10 + b.value
            }
        }
        ",
    );
    assert_eq!(code, 12);
}

#[test]
fn missing_property_is_unresolved() {
    let err = run_err(
        r"
        Object Empty {
        }
        Object Main {
            method main(): Int {
                e: Empty = new Empty()
                return e.nothing
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::UnresolvedReference);
    assert!(err.message().contains("Property 'nothing' not found in object 'Empty'"));
}

#[test]
fn missing_method_is_unresolved() {
    let err = run_err(
        r"
        Object Empty {
        }
        Object Main {
            method main(): Int {
                e: Empty = new Empty()
                return e.nothing()
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::UnresolvedReference);
    assert!(err.message().contains("Method 'nothing' not found in object 'Empty'"));
}

#[test]
fn records_store_typed_fields() {
    let code = run_int(
        r"
        Record Point {
            x: Int
            y: Int
        }
        Object Main {
            method main(): Int {
                p: Point = Point(x = 3, y = 4)
                return p.x * p.x + p.y * p.y
            }
        }
        ",
    );
    assert_eq!(code, 25);
}

#[test]
fn record_field_type_mismatch_is_rejected() {
    let err = run_err(
        r#"
        Record Point {
            x: Int
        }
        Object Main {
            method main(): Int {
                p: Point = Point(x = "three")
                return 0
            }
        }
        "#,
    );
    assert_eq!(err.kind(), ExcKind::TypeMismatch);
}

#[test]
fn record_missing_and_unknown_fields_are_rejected() {
    let err = run_err(
        r"
        Record Point {
            x: Int
            y: Int
        }
        Object Main {
            method main(): Int {
                p: Point = Point(x = 1)
                return 0
            }
        }
        ",
    );
    assert!(err.message().contains("Missing field 'y'"));

    let err = run_err(
        r"
        Record Point {
            x: Int
        }
        Object Main {
            method main(): Int {
                p: Point = Point(x = 1, z = 2)
                return 0
            }
        }
        ",
    );
    assert!(err.message().contains("no field 'z'"));
}

#[test]
fn enums_are_named_integer_constants() {
    let code = run_int(
        r"
        Enum Color {
            RED
            GREEN = 5
            BLUE
        }
        Object Main {
            method main(): Int {
                g: Color = Color.GREEN
                b: Color = Color.BLUE
                return g.getValue() * 10 + b.getValue()
            }
        }
        ",
    );
    assert_eq!(code, 56);
}

#[test]
fn enum_values_carry_their_enum_name() {
    let source = r"
        Enum Color {
            RED
        }
        Object Main {
            method main(): Text {
                r: Color = Color.RED
                return r.toString()
            }
        }
        ";
    match run(source).unwrap() {
        Value::Text(s) => assert_eq!(&*s, "Color.RED"),
        other => panic!("expected Text, got {other:?}"),
    }
}

#[test]
fn unknown_enum_member_is_unresolved() {
    let err = run_err(
        r"
        Enum Color {
            RED
        }
        Object Main {
            method main(): Int {
                c: Color = Color.MAGENTA
                return 0
            }
        }
        ",
    );
    assert!(err.message().contains("Enum 'Color' has no member 'MAGENTA'"));
}

#[test]
fn protocol_conformance_is_checked_at_declaration() {
    let err = run_err(
        r"
        Protocol Shape {
            method area(): Double
        }
        Object Square: Shape {
            @external method side(): Double {
                return 2.0
            }
        }
        Object Main {
            method main(): Int {
                return 0
            }
        }
        ",
    );
    assert!(
        err.message().contains("does not implement all methods"),
        "got: {}",
        err.message()
    );
}

#[test]
fn conforming_objects_evaluate_normally() {
    let code = run_int(
        r"
        Protocol Shape {
            method area(): Int
        }
        Object Square: Shape {
            property side: Int
            constructor(side: Int) {
                this.side = side
            }
            @external method area(): Int {
                return this.side * this.side
            }
        }
        Object Main {
            method main(): Int {
                s: Square = new Square(3)
                return s.area()
            }
        }
        ",
    );
    assert_eq!(code, 9);
}

#[test]
fn protocol_signature_mismatch_fails_conformance() {
    let err = run_err(
        r"
        Protocol Shape {
            method scale(factor: Int): Int
        }
        Object Square: Shape {
            @external method scale(factor: Double): Int {
                return 1
            }
        }
        Object Main {
            method main(): Int {
                return 0
            }
        }
        ",
    );
    assert!(err.message().contains("does not implement all methods"));
}

#[test]
fn namespaced_objects_bind_qualified_names() {
    let code = run_int(
        r"
        namespace geo {
            Object Calc {
                @external method twice(x: Int): Int {
                    return x * 2
                }
            }
        }
        Object Main {
            method main(): Int {
                c: geo.Calc = new geo.Calc()
                return c.twice(21)
            }
        }
        ",
    );
    assert_eq!(code, 42);
}

#[test]
fn objects_without_constructor_reject_arguments() {
    let err = run_err(
        r"
        Object Plain {
        }
        Object Main {
            method main(): Int {
                p: Plain = new Plain(1)
                return 0
            }
        }
        ",
    );
    assert!(err.message().contains("does not declare a constructor"));
}

#[test]
fn unknown_object_type_in_new_is_unresolved() {
    let err = run_err(
        r"
        Object Main {
            method main(): Int {
                x: Int = 0
                y: Missing = new Missing()
                return x
            }
        }
        ",
    );
    assert_eq!(err.kind(), ExcKind::UnresolvedReference);
    assert!(err.message().contains("Object type 'Missing' not found"));
}

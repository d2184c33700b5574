use o2l::{Exception, Interpreter, NoPrint, Value};
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
fn list_basics() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                numbers: List<Int> = [10, 20, 30]
                numbers.add(40)
                return numbers.get(0) + numbers.get(3) + numbers.size()
            }
        }
        ",
    );
    assert_eq!(code, 54);
}

#[test]
fn list_pop_remove_reverse_clear() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                numbers: List<Int> = [1, 2, 3, 4]
                popped: Int = numbers.pop()
                numbers.remove(0)
                numbers.reverse()
                first: Int = numbers.get(0)
                numbers.clear()
                size: Int = numbers.size()
                return popped * 100 + first * 10 + size
            }
        }
        ",
    );
    // popped=4, after remove [2,3], reversed [3,2], first=3, cleared.
    assert_eq!(code, 430);
}

#[test]
fn list_get_is_bounds_checked() {
    let err = run(
        r"
        Object Main {
            method main(): Int {
                numbers: List<Int> = [1]
                return numbers.get(5)
            }
        }
        ",
    )
    .expect_err("expected failure");
    assert!(
        err.message().contains("List index 5 out of bounds (size: 1)"),
        "got: {}",
        err.message()
    );
}

#[test]
fn pop_from_empty_list_raises() {
    let err = run(
        r"
        Object Main {
            method main(): Int {
                numbers: List<Int> = [1]
                numbers.pop()
                return numbers.pop()
            }
        }
        ",
    )
    .expect_err("expected failure");
    assert!(err.message().contains("Cannot pop from empty list"));
}

#[test]
fn list_element_tags_are_checked_at_construction() {
    let err = run(
        r#"
        Object Main {
            method main(): Int {
                mixed: List<Int> = [1, "two"]
                return 0
            }
        }
        "#,
    )
    .expect_err("expected failure");
    assert!(err.message().contains("List elements"), "got: {}", err.message());
}

#[test]
fn lists_are_passed_by_shared_reference() {
    let code = run_int(
        r"
        Object Mutator {
            @external method push(items: List<Int>): Int {
                items.add(99)
                return items.size()
            }
        }
        Object Main {
            method main(): Int {
                items: List<Int> = [1]
                m: Mutator = new Mutator()
                m.push(items)
                return items.get(1)
            }
        }
        ",
    );
    assert_eq!(code, 99);
}

#[test]
fn iterator_walks_the_list() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                numbers: List<Int> = [1, 2, 3, 4]
                it: ListIterator = numbers.iterator()
                sum: Int = 0
                while (it.hasNext()) {
                    sum = sum + it.next()
                }
                return sum
            }
        }
        ",
    );
    assert_eq!(code, 10);
}

#[test]
fn iterator_next_past_the_end_raises() {
    let err = run(
        r"
        Object Main {
            method main(): Int {
                numbers: List<Int> = [1]
                it: ListIterator = numbers.iterator()
                it.next()
                return it.next()
            }
        }
        ",
    )
    .expect_err("expected failure");
    assert!(err.message().contains("Iterator has no more elements"));
}

#[test]
fn map_basics() {
    let code = run_int(
        r#"
        Object Main {
            method main(): Int {
                ages: Map<Text, Int> = {"ada": 36, "alan": 41}
                ages.put("grace", 85)
                if (!ages.contains("ada")) {
                    return -1
                }
                ages.remove("alan")
                return ages.get("ada") + ages.get("grace") + ages.size()
            }
        }
        "#,
    );
    assert_eq!(code, 36 + 85 + 2);
}

#[test]
fn map_insertion_order_is_preserved_and_duplicates_overwrite() {
    let code = run_int(
        r#"
        Object Main {
            method main(): Int {
                m: Map<Text, Int> = {"b": 1, "a": 2, "b": 3}
                keys: List<Text> = m.keys()
                if (keys.get(0) == "b" && keys.get(1) == "a") {
                    return m.get("b")
                }
                return -1
            }
        }
        "#,
    );
    assert_eq!(code, 3);
}

#[test]
fn map_missing_key_raises() {
    let err = run(
        r#"
        Object Main {
            method main(): Int {
                m: Map<Text, Int> = {}
                return m.get("missing")
            }
        }
        "#,
    )
    .expect_err("expected failure");
    assert!(err.message().contains("Key 'missing' not found in map"));
}

#[test]
fn set_membership_is_unique() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                seen: Set<Int> = {1, 2, 2, 3}
                seen.add(3)
                seen.add(4)
                if (!seen.contains(2)) {
                    return -1
                }
                seen.remove(1)
                return seen.size()
            }
        }
        ",
    );
    assert_eq!(code, 3);
}

#[test]
fn set_elements_returns_a_list() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                seen: Set<Int> = {5, 6}
                items: List<Int> = seen.elements()
                return items.get(0) + items.get(1)
            }
        }
        ",
    );
    assert_eq!(code, 11);
}

#[test]
fn empty_list_adopts_the_declared_element_tag() {
    let code = run_int(
        r"
        Object Main {
            method main(): Int {
                numbers: List<Int> = []
                numbers.add(5)
                return numbers.get(0)
            }
        }
        ",
    );
    assert_eq!(code, 5);
}

#[test]
fn collection_display_forms() {
    let source = r#"
        Object Main {
            method main(): Text {
                numbers: List<Int> = [1, 2, 3]
                return numbers.toString()
            }
        }
        "#;
    match run(source).unwrap() {
        Value::Text(s) => assert_eq!(&*s, "[1, 2, 3]"),
        other => panic!("expected Text, got {other:?}"),
    }
}

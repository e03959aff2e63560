//! Function and method calls

use super::{compile, listing};

#[test]
fn test_call_statement_in_block() {
    let module = compile("do f(1) end");
    assert_eq!(
        listing(module.main()),
        vec![
            "GET_GLOBAL 0 0",
            "SET_TOP 1",
            "SET_TOP 1",
            "LOAD_CONST 1 1",
            "SET_TOP 2",
            "CALL 0",
            "SET_TOP 0",
            "SET_TOP 0",
            "SET_TOP 0",
            "RETURN 0 0",
        ]
    );
}

#[test]
fn test_call_without_arguments() {
    let module = compile("f()");
    assert_eq!(
        listing(module.main()),
        vec!["GET_GLOBAL 0 0", "SET_TOP 1", "CALL 0", "SET_TOP 0", "SET_TOP 0", "RETURN 0 0"]
    );
}

#[test]
fn test_call_result_replaces_function_register() {
    let module = compile("local a = f(1, 2)");
    assert_eq!(
        listing(module.main()),
        vec![
            "SET_TOP 1",
            "GET_GLOBAL 1 0",
            "SET_TOP 2",
            "SET_TOP 2",
            "LOAD_CONST 2 1",
            "SET_TOP 3",
            "LOAD_CONST 3 2",
            "SET_TOP 4",
            "CALL 1",
            "SET_TOP 2",
            "MOVE 0 1",
            "SET_TOP 1",
            "SET_TOP 0",
            "RETURN 0 0",
        ]
    );
}

#[test]
fn test_method_call_uses_self() {
    let module = compile("obj:m(1)");
    assert_eq!(
        listing(module.main()),
        vec![
            "GET_GLOBAL 0 0",
            "SELF 0 0 1",
            "SET_TOP 2",
            "SET_TOP 2",
            "LOAD_CONST 2 2",
            "SET_TOP 3",
            "CALL 0",
            "SET_TOP 0",
            "SET_TOP 0",
            "RETURN 0 0",
        ]
    );
    assert_eq!(module.main().constants.get(1).and_then(|c| c.as_str()), Some("m"));
}

#[test]
fn test_nested_call_arguments() {
    let module = compile("f(g(x))");
    let code = listing(module.main());
    // g lands in the first argument slot of f and its own call leaves one value there
    assert!(code.contains(&"CALL 1".to_string()));
    assert_eq!(code.iter().filter(|i| i.starts_with("CALL")).count(), 2);
    assert_eq!(code[code.len() - 4], "CALL 0");
}

#[test]
fn test_call_with_string_and_table_arguments() {
    let module = compile("print \"hi\"\nconfigure { debug = true }");
    let code = listing(module.main());
    assert!(code.contains(&"LOAD_CONST 1 1".to_string()));
    assert!(code.contains(&"NEW_TABLE 1 0 1".to_string()));
    assert!(code.contains(&"LOAD_TRUE 2".to_string()));
}

#[test]
fn test_chained_member_call() {
    let module = compile("a.b.c(1)");
    let code = listing(module.main());
    assert_eq!(&code[..3], &["GET_GLOBAL 0 0", "GET_FIELD 0 0 1", "GET_FIELD 0 0 2"]);
    assert!(code.contains(&"CALL 0".to_string()));
}

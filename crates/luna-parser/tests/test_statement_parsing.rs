use luna_parser::ast::{GenericFor, IfStatement, NumericFor};
use luna_parser::{parse, parse_chunk, CallKind, Expression, Literal, Statement};

#[test]
fn test_parse_empty_chunk() {
    let chunk = parse("").unwrap();
    assert!(chunk.block.statements.is_empty());
    assert!(chunk.block.return_stmt.is_none());
    assert_eq!(chunk.module, "<chunk>");
}

#[test]
fn test_parse_chunk_keeps_module_name() {
    let chunk = parse_chunk("main.luna", "local a").unwrap();
    assert_eq!(chunk.module, "main.luna");
}

#[test]
fn test_parse_local_name_list() {
    let chunk = parse("local a, b = 1, 'x'").unwrap();
    assert_eq!(chunk.block.statements.len(), 1);

    match &chunk.block.statements[0] {
        Statement::LocalNameList { names, exp_list } => {
            assert_eq!(names.names.len(), 2);
            assert_eq!(names.names[0].name, "a");
            assert_eq!(names.names[1].name, "b");
            let exp_list = exp_list.as_ref().unwrap();
            assert_eq!(exp_list.len(), 2);
            match &exp_list.expressions[1] {
                Expression::Terminator(t) => assert_eq!(t.value, Literal::String("x".into())),
                _ => panic!("Expected string literal"),
            }
        }
        _ => panic!("Expected LocalNameList"),
    }
}

#[test]
fn test_parse_local_without_initializer() {
    let chunk = parse("local a").unwrap();
    match &chunk.block.statements[0] {
        Statement::LocalNameList { names, exp_list } => {
            assert_eq!(names.names.len(), 1);
            assert!(exp_list.is_none());
        }
        _ => panic!("Expected LocalNameList"),
    }
}

#[test]
fn test_parse_lines_are_recorded() {
    let chunk = parse("local a = 1\n\nlocal b = 2").unwrap();
    match &chunk.block.statements[1] {
        Statement::LocalNameList { names, .. } => assert_eq!(names.names[0].line, 3),
        _ => panic!("Expected LocalNameList"),
    }
}

#[test]
fn test_parse_call_statement() {
    let chunk = parse("print(1, 2)").unwrap();
    match &chunk.block.statements[0] {
        Statement::Call(call) => {
            assert_eq!(call.args.len(), 2);
            match &call.kind {
                CallKind::Normal { caller } => {
                    assert_eq!(caller, &Expression::name("print", 1));
                }
                _ => panic!("Expected normal call"),
            }
        }
        _ => panic!("Expected Call"),
    }
}

#[test]
fn test_parse_method_call_statement() {
    let chunk = parse("obj:greet 'hi'").unwrap();
    match &chunk.block.statements[0] {
        Statement::Call(call) => match &call.kind {
            CallKind::Method { object, method } => {
                assert_eq!(object, &Expression::name("obj", 1));
                assert_eq!(method.name, "greet");
                assert_eq!(call.args.len(), 1);
            }
            _ => panic!("Expected method call"),
        },
        _ => panic!("Expected Call"),
    }
}

#[test]
fn test_parse_bare_expression_statement_is_rejected() {
    assert!(parse("a.b").is_err());
    assert!(parse("1 + 2").is_err());
}

#[test]
fn test_parse_assignment_targets() {
    let chunk = parse("a, t.x, t[1] = 1, 2, 3").unwrap();
    match &chunk.block.statements[0] {
        Statement::Assignment {
            targets, exp_list, ..
        } => {
            assert_eq!(targets.len(), 3);
            assert!(matches!(targets[0], Expression::Name(_)));
            assert!(matches!(targets[1], Expression::Member { .. }));
            assert!(matches!(targets[2], Expression::Index { .. }));
            assert_eq!(exp_list.len(), 3);
        }
        _ => panic!("Expected Assignment"),
    }
}

#[test]
fn test_parse_assignment_to_call_is_rejected() {
    assert!(parse("f() = 1").is_err());
}

#[test]
fn test_parse_do_block_with_return() {
    let chunk = parse("do local x = 1 end return x").unwrap();
    assert_eq!(chunk.block.statements.len(), 1);
    assert!(matches!(chunk.block.statements[0], Statement::Do(_)));
    let ret = chunk.block.return_stmt.as_ref().unwrap();
    assert_eq!(ret.exp_list.as_ref().unwrap().len(), 1);
}

#[test]
fn test_parse_bare_return() {
    let chunk = parse("return").unwrap();
    let ret = chunk.block.return_stmt.unwrap();
    assert!(ret.exp_list.is_none());
}

#[test]
fn test_parse_if_elseif_else() {
    let source = "if a then x = 1 elseif b then x = 2 elseif c then x = 3 else x = 4 end";
    let chunk = parse(source).unwrap();
    match &chunk.block.statements[0] {
        Statement::If(IfStatement {
            else_ifs,
            else_block,
            ..
        }) => {
            assert_eq!(else_ifs.len(), 2);
            assert!(else_block.is_some());
        }
        _ => panic!("Expected If"),
    }
}

#[test]
fn test_parse_while_and_repeat() {
    let chunk = parse("while x do break end repeat x = x - 1 until x").unwrap();
    assert!(matches!(chunk.block.statements[0], Statement::While { .. }));
    assert!(matches!(chunk.block.statements[1], Statement::Repeat { .. }));
}

#[test]
fn test_parse_numeric_for_with_step() {
    let chunk = parse("for i = 10, 1, -1 do end").unwrap();
    match &chunk.block.statements[0] {
        Statement::NumericFor(NumericFor { var, step, .. }) => {
            assert_eq!(var.name, "i");
            assert!(step.is_some());
        }
        _ => panic!("Expected NumericFor"),
    }
}

#[test]
fn test_parse_numeric_for_without_step() {
    let chunk = parse("for i = 1, 3 do print(i) end").unwrap();
    match &chunk.block.statements[0] {
        Statement::NumericFor(NumericFor { step, body, .. }) => {
            assert!(step.is_none());
            assert_eq!(body.statements.len(), 1);
        }
        _ => panic!("Expected NumericFor"),
    }
}

#[test]
fn test_parse_generic_for() {
    let chunk = parse("for k, v in pairs(t) do end").unwrap();
    match &chunk.block.statements[0] {
        Statement::GenericFor(GenericFor {
            names, exp_list, ..
        }) => {
            assert_eq!(names.names.len(), 2);
            assert_eq!(exp_list.len(), 1);
        }
        _ => panic!("Expected GenericFor"),
    }
}

#[test]
fn test_parse_function_statement_with_method_name() {
    let chunk = parse("function a.b:c(x, y) return x end").unwrap();
    match &chunk.block.statements[0] {
        Statement::Function { name, body } => {
            assert_eq!(name.display_name(), "a.b:c");
            assert_eq!(body.params.names.len(), 2);
            assert!(body.block.return_stmt.is_some());
        }
        _ => panic!("Expected Function"),
    }
}

#[test]
fn test_parse_local_function() {
    let chunk = parse("local function f() end").unwrap();
    match &chunk.block.statements[0] {
        Statement::LocalFunction { name, body } => {
            assert_eq!(name.name, "f");
            assert!(body.params.names.is_empty());
        }
        _ => panic!("Expected LocalFunction"),
    }
}

#[test]
fn test_parse_keyword_prefixed_identifiers() {
    // `endx`, `dox` and `format` start with keywords but are plain names
    let chunk = parse("local endx, dox, format = 1, 2, 3").unwrap();
    match &chunk.block.statements[0] {
        Statement::LocalNameList { names, .. } => {
            let names: Vec<_> = names.names.iter().map(|n| n.name.as_str()).collect();
            assert_eq!(names, vec!["endx", "dox", "format"]);
        }
        _ => panic!("Expected LocalNameList"),
    }
}

#[test]
fn test_parse_comments_and_semicolons() {
    let source = "-- line comment\nlocal a = 1; --[[ block\ncomment ]] local b = 2;";
    let chunk = parse(source).unwrap();
    assert_eq!(chunk.block.statements.len(), 2);
}

#[test]
fn test_parse_syntax_error() {
    let err = parse("local = 1").unwrap_err();
    assert!(err.starts_with("Parse error"));
}

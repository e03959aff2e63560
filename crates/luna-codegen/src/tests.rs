//! Integration tests for the compiler

use crate::bytecode::{BytecodeModule, FunctionPrototype};
use crate::bytecode_debug::format_instruction;
use crate::compiler::Compiler;
use crate::error::CompileError;
use crate::options::CompileOptions;

mod calls;

/// Helper to parse and compile source code with the given options
fn compile_with(source: &str, options: CompileOptions) -> Result<BytecodeModule, String> {
    let chunk = luna_parser::parse(source).map_err(|e| format!("Parse error: {}", e))?;
    Compiler::new(options)
        .compile(&chunk)
        .map_err(|e| format!("Compile error: {}", e))
}

fn compile(source: &str) -> BytecodeModule {
    compile_with(source, CompileOptions::default()).unwrap()
}

/// Compile and return the error instead of a module
fn compile_err(source: &str, options: CompileOptions) -> CompileError {
    let chunk = luna_parser::parse(source).unwrap();
    Compiler::new(options).compile(&chunk).unwrap_err()
}

/// One line per instruction, as `format_instruction` renders it
fn listing(func: &FunctionPrototype) -> Vec<String> {
    func.code.iter().map(|&i| format_instruction(i)).collect()
}

#[test]
fn test_empty_chunk() {
    let module = compile("");
    assert_eq!(module.functions.len(), 1);
    assert_eq!(listing(module.main()), vec!["SET_TOP 0", "RETURN 0 0"]);
    assert_eq!(module.main().register_count, 0);
}

#[test]
fn test_module_name_comes_from_chunk() {
    let chunk = luna_parser::parse_chunk("main.luna", "local a").unwrap();
    let module = crate::compile(&chunk, CompileOptions::default()).unwrap();
    assert_eq!(module.name, "main.luna");
    assert_eq!(module.main().name, "<main>");
}

#[test]
fn test_compile_source_reports_parse_errors() {
    let err = crate::compile_source("bad.luna", "local = 1", CompileOptions::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to parse bad.luna"));
}

#[test]
fn test_compile_source_reports_compile_errors() {
    let err = crate::compile_source("loop.luna", "break", CompileOptions::default()).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("failed to compile loop.luna"));
    assert!(message.contains("break statement outside loop"));
}

#[test]
fn test_line_numbers_follow_source() {
    let module = compile("local a = 1\n\nlocal b = 2");
    let main = module.main();
    assert_eq!(main.line_numbers.len(), main.code.len());
    // local a: SET_TOP, LOAD_CONST, SET_TOP, MOVE, SET_TOP
    assert_eq!(&main.line_numbers[..5], &[1, 1, 1, 1, 1]);
    assert_eq!(&main.line_numbers[5..10], &[3, 3, 3, 3, 3]);
}

#[test]
fn test_module_json_round_trip() {
    let module = compile("local t = { x = 1 }\nlocal function f() return t end");
    let json = module.to_json().unwrap();
    let decoded = BytecodeModule::from_json(&json).unwrap();
    assert_eq!(decoded, module);
}

#[test]
fn test_disassembly_mentions_every_function() {
    let module = compile("local function f() local function g() end end");
    let text = crate::bytecode_debug::disassemble(&module);
    assert!(text.contains("Function F0: <main>"));
    assert!(text.contains("Function F1: f"));
    assert!(text.contains("Function F2: g"));
    assert!(text.contains("CLOSURE 0 0"));
}

#[test]
fn test_options_from_json_drive_strict_mode() {
    let options = CompileOptions::from_json(r#"{"strict_globals": true, "globals": ["print"]}"#).unwrap();
    assert!(compile_with("print(1)", options.clone()).is_ok());
    assert_eq!(
        compile_err("y = 1", options),
        CompileError::UndefinedVariable {
            name: "y".to_string(),
            line: 1
        }
    );
}

//! Bytecode debugging utilities

use crate::bytecode::{BytecodeModule, FunctionPrototype};
use crate::opcode::{instruction::*, OpCode, OperandFormat};
use std::fmt::Write;

/// Render one instruction as `NAME operands`, e.g. `MOVE 0 1` or `JUMP +3`.
///
/// Operands are printed raw, in the order of the opcode's operand format.
pub fn format_instruction(instruction: u32) -> String {
    let opcode_byte = decode_opcode(instruction);
    let opcode = match OpCode::from_u8(opcode_byte) {
        Some(op) => op,
        None => return format!("UNKNOWN opcode={} (raw: 0x{:08x})", opcode_byte, instruction),
    };

    let a = decode_a(instruction);
    let name = opcode.name();
    match opcode.format() {
        OperandFormat::None => name.to_string(),
        OperandFormat::A => format!("{} {}", name, a),
        OperandFormat::AB => format!("{} {} {}", name, a, decode_b(instruction)),
        OperandFormat::ABC => format!(
            "{} {} {} {}",
            name,
            a,
            decode_b(instruction),
            decode_c(instruction)
        ),
        OperandFormat::ABx => format!("{} {} {}", name, a, decode_bx(instruction)),
        OperandFormat::SBx => format!("{} {:+}", name, decode_sbx(instruction)),
        OperandFormat::AsBx => format!("{} {} {:+}", name, a, decode_sbx(instruction)),
    }
}

/// Disassemble every prototype of a module, main first
pub fn disassemble(module: &BytecodeModule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; module {}", module.name);
    for func in &module.functions {
        out.push_str(&disassemble_function(func));
    }
    out
}

/// Print detailed bytecode disassembly of one prototype
pub fn disassemble_function(func: &FunctionPrototype) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_function(&mut out, func);
    out
}

fn write_function(out: &mut String, func: &FunctionPrototype) -> std::fmt::Result {
    writeln!(out, "\n========== Function {}: {} ==========", func.id, func.name)?;
    writeln!(out, "Defined at line {}", func.line_defined)?;
    writeln!(
        out,
        "Parameters: {}  Registers: {}  Constants: {}",
        func.param_count,
        func.register_count,
        func.constants.len()
    )?;

    if !func.upvalues.is_empty() {
        writeln!(out, "\nUpvalues:")?;
        for (i, upval) in func.upvalues.iter().enumerate() {
            let source = if upval.in_stack { "register" } else { "upvalue" };
            writeln!(out, "  [{}] {} <- {} {}", i, upval.name, source, upval.index)?;
        }
    }

    if !func.constants.is_empty() {
        writeln!(out, "\nConstants:")?;
        for (i, constant) in func.constants.iter().enumerate() {
            writeln!(out, "  K[{}] {}", i, constant)?;
        }
    }

    writeln!(out, "\nBytecode:")?;
    for (pc, &instruction) in func.code.iter().enumerate() {
        let line = func.line_at(pc).unwrap_or(0);
        write!(out, "{:04}  [{:>4}]  {:<24}", pc, line, format_instruction(instruction))?;
        if let Some(note) = annotate(instruction, pc, func) {
            write!(out, " ; {}", note)?;
        }
        writeln!(out)?;
    }

    if !func.children.is_empty() {
        let children: Vec<String> = func.children.iter().map(|id| id.to_string()).collect();
        writeln!(out, "\nChildren: {}", children.join(", "))?;
    }
    Ok(())
}

/// Resolve constant operands and jump targets for the listing
fn annotate(instruction: u32, pc: usize, func: &FunctionPrototype) -> Option<String> {
    let opcode = OpCode::from_u8(decode_opcode(instruction))?;
    let constant = |idx: usize| func.constants.get(idx).map(|k| k.to_string());

    match opcode {
        OpCode::LoadConst | OpCode::GetGlobal | OpCode::SetGlobal => {
            constant(decode_bx(instruction) as usize)
        }
        OpCode::GetField | OpCode::SelfMethod => constant(decode_c(instruction) as usize),
        OpCode::SetField => constant(decode_b(instruction) as usize),
        OpCode::Closure => func
            .children
            .get(decode_bx(instruction) as usize)
            .map(|id| id.to_string()),
        op if op.is_jump() => {
            let target = pc as i64 + 1 + decode_sbx(instruction) as i64;
            Some(format!("to {:04}", target))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_instruction_by_operand_format() {
        assert_eq!(format_instruction(encode_abc(OpCode::Move.as_u8(), 0, 1, 0)), "MOVE 0 1");
        assert_eq!(format_instruction(encode_abx(OpCode::LoadConst.as_u8(), 1, 0)), "LOAD_CONST 1 0");
        assert_eq!(format_instruction(encode_abc(OpCode::SetTop.as_u8(), 1, 0, 0)), "SET_TOP 1");
        assert_eq!(format_instruction(encode_abc(OpCode::Add.as_u8(), 0, 0, 1)), "ADD 0 0 1");
        assert_eq!(format_instruction(encode_asbx(OpCode::Jump.as_u8(), 0, 3)), "JUMP +3");
        assert_eq!(format_instruction(encode_asbx(OpCode::Jump.as_u8(), 0, -2)), "JUMP -2");
        assert_eq!(
            format_instruction(encode_asbx(OpCode::JumpIfFalse.as_u8(), 0, 2)),
            "JUMP_IF_FALSE 0 +2"
        );
    }

    #[test]
    fn test_unknown_opcode() {
        assert!(format_instruction(0xfe00_0000).starts_with("UNKNOWN"));
    }
}

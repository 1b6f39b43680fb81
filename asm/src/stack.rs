//! Assembler for the stack dialect (the J5 family).
//!
//! One instruction per line: an optional leading `name:` label, a
//! mnemonic, and — for `SET`, `BRANCH`, `BRZERO` only — a single trailing
//! operand. Numeric literals are decimal, or hex with a trailing `H`
//! (`2AH`), matching the dialect's assembly convention.

use dcj_core::stack::{StackInstruction, StackOp, StackOperand};
use dcj_core::{Error, Result};

use crate::lex::{strip_comment, words};

pub fn assemble(source: &str) -> Result<Vec<StackInstruction>> {
    let mut program = Vec::new();

    for (line_no, raw_line) in source.lines().enumerate() {
        let line = strip_comment(raw_line);
        let tokens = words(line);
        if tokens.is_empty() {
            continue;
        }

        if let Some(instr) = assemble_line(&tokens, line_no + 1)? {
            program.push(instr);
        }
    }

    Ok(program)
}

fn assemble_line(tokens: &[String], line_no: usize) -> Result<Option<StackInstruction>> {
    let mut tokens = tokens;
    let mut label = None;

    if let Some(first) = tokens.get(0) {
        if let Some(name) = first.strip_suffix(':') {
            if name.is_empty() {
                return Err(Error::lexical(format!(
                    "line {}: empty label name",
                    line_no
                )));
            }
            label = Some(name.to_string());
            tokens = &tokens[1..];
        }
    }

    let mnemonic = match tokens.get(0) {
        Some(m) => m,
        None => {
            return if label.is_some() {
                Err(Error::lexical(format!(
                    "line {}: label with no instruction",
                    line_no
                )))
            } else {
                Ok(None)
            }
        }
    };

    let op = parse_opcode(mnemonic, line_no)?;
    let operands = &tokens[1..];

    let operand = if op.carries_operand() {
        if operands.len() != 1 {
            return Err(Error::lexical(format!(
                "line {}: {:?} takes exactly one operand, got {}",
                line_no,
                op,
                operands.len()
            )));
        }
        parse_operand(&operands[0], line_no)?
    } else {
        if !operands.is_empty() {
            return Err(Error::lexical(format!(
                "line {}: {:?} takes no operand",
                line_no, op
            )));
        }
        StackOperand::None
    };

    let mut instr = StackInstruction::new(op, operand);
    if let Some(l) = label {
        instr = instr.with_label(l);
    }
    Ok(Some(instr))
}

fn parse_opcode(mnemonic: &str, line_no: usize) -> Result<StackOp> {
    use StackOp::*;
    Ok(match mnemonic {
        "ADD" => Add,
        "SUB" => Sub,
        "AND" => And,
        "OR" => Or,
        "NOT" => Not,
        "XOR" => Xor,
        "SHR" => Shr,
        "SHL" => Shl,
        "INC" => Inc,
        "DEC" => Dec,
        "TGT" => Tgt,
        "TLT" => Tlt,
        "TEQ" => Teq,
        "TSZ" => Tsz,
        "SSET" => Sset,
        "SET" => Set,
        "LOAD" => Load,
        "STORE" => Store,
        "BRANCH" => Branch,
        "BRZERO" => Brzero,
        "IBRANCH" => Ibranch,
        "CALL" => Call,
        "RETURN" => Return,
        "STOP" => Stop,
        "OUT" => Out,
        "DROP" => Drop,
        "DUP" => Dup,
        "SWAP" => Swap,
        "RSD3" => Rsd3,
        "RSU3" => Rsu3,
        "TUCK2" => Tuck2,
        "TUCK3" => Tuck3,
        "COPY3" => Copy3,
        "PUSH" => Push,
        "POP" => Pop,
        other => {
            return Err(Error::lexical(format!(
                "line {}: unknown opcode \"{}\"",
                line_no, other
            )))
        }
    })
}

fn parse_operand(tok: &str, line_no: usize) -> Result<StackOperand> {
    if let Some(hex) = tok.strip_suffix('H').or_else(|| tok.strip_suffix('h')) {
        if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return u16::from_str_radix(hex, 16)
                .map(StackOperand::Literal)
                .map_err(|_| {
                    Error::lexical(format!("line {}: invalid hex literal \"{}\"", line_no, tok))
                });
        }
    }

    if !tok.is_empty() && tok.chars().all(|c| c.is_ascii_digit()) {
        return tok
            .parse::<u16>()
            .map(StackOperand::Literal)
            .map_err(|_| Error::lexical(format!("line {}: invalid decimal literal \"{}\"", line_no, tok)));
    }

    Ok(StackOperand::Label(tok.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn simple_program() {
        let prog = assemble("SET 3\nOUT\nDROP").unwrap();
        assert_eq!(prog.len(), 3);
        assert_eq!(prog[0].op, StackOp::Set);
        assert_eq!(prog[0].operand, StackOperand::Literal(3));
        assert_eq!(prog[1].op, StackOp::Out);
        assert_eq!(prog[2].op, StackOp::Drop);
    }

    #[test]
    fn labels_and_branch() {
        let prog = assemble("loop: DUP\nBRANCH loop").unwrap();
        assert_eq!(prog[0].label.as_deref(), Some("loop"));
        assert_eq!(prog[1].operand, StackOperand::Label("loop".to_string()));
    }

    #[test]
    fn hex_literal_with_trailing_h() {
        let prog = assemble("SET 2AH").unwrap();
        assert_eq!(prog[0].operand, StackOperand::Literal(0x2A));
    }

    #[test]
    fn non_operand_opcode_rejects_operand() {
        assert!(assemble("DUP 1").is_err());
    }

    #[test]
    fn operand_opcode_requires_operand() {
        assert!(assemble("SET").is_err());
    }

    #[test]
    fn unknown_opcode_errors() {
        assert!(assemble("NOPE").is_err());
    }
}

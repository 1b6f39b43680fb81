use dcj_core::register::{reg2addr, RegInstruction, RegOp, RegOperand, Reg};
use dcj_core::stack::{StackInstruction, StackOp, StackOperand};
use dcj_core::{Error, Result};

/// Pushes the *address* denoted by `operand`: where a subsequent `STORE`
/// should write, or what a subsequent `LOAD` should read from.
fn address_on_stack(operand: &RegOperand) -> Result<Vec<StackInstruction>> {
    match operand {
        RegOperand::Register(r) => Ok(vec![set(reg2addr(*r))]),
        RegOperand::Literal(n) => Ok(vec![set(*n)]),
        RegOperand::Array(inner) => match inner.as_ref() {
            RegOperand::Register(r) => Ok(vec![set(reg2addr(*r)), bare(StackOp::Load)]),
            RegOperand::Literal(n) => Ok(vec![set(*n)]),
            RegOperand::Sum(left, right) => {
                let mut out = value_on_stack(left)?;
                out.extend(value_on_stack(right)?);
                out.push(bare(StackOp::Add));
                Ok(out)
            }
            other => Err(Error::translation(format!(
                "unsupported operand shape inside array form: {:?}",
                other
            ))),
        },
        RegOperand::Label(_) => Err(Error::translation(
            "attempted to load a label onto the stack".to_string(),
        )),
        RegOperand::Sum(_, _) => Err(Error::translation(
            "attempted to load a label onto the stack".to_string(),
        )),
    }
}

/// Pushes the *value* denoted by `operand`.
fn value_on_stack(operand: &RegOperand) -> Result<Vec<StackInstruction>> {
    let mut out = address_on_stack(operand)?;
    if needs_load(operand) {
        out.push(bare(StackOp::Load));
    }
    Ok(out)
}

fn needs_load(operand: &RegOperand) -> bool {
    matches!(operand, RegOperand::Register(_) | RegOperand::Array(_))
}

fn set(n: u16) -> StackInstruction {
    StackInstruction::new(StackOp::Set, StackOperand::Literal(n))
}

fn bare(op: StackOp) -> StackInstruction {
    StackInstruction::bare(op)
}

fn is_pc(operand: &RegOperand) -> bool {
    matches!(operand, RegOperand::Register(Reg::PC))
}

/// Translates one register instruction into its stack snippet. Branch
/// placeholders (`BRZERO`/`BRANCH` with [`StackOperand::PlaceholderOffset`])
/// are left for the stitcher to patch.
pub fn translate_instruction(instr: &RegInstruction) -> Result<Vec<StackInstruction>> {
    let mut snippet = match instr.op {
        RegOp::SET => translate_set(instr)?,
        RegOp::ADD => translate_binop(instr, StackOp::Add)?,
        RegOp::SUB => translate_binop(instr, StackOp::Sub)?,
        RegOp::OUT => {
            let mut out = value_on_stack(&instr.b)?;
            out.push(bare(StackOp::Out));
            out.push(bare(StackOp::Drop));
            out
        }
        RegOp::IFN => translate_condop(instr, StackOp::Teq, true)?,
        RegOp::IFE => translate_condop(instr, StackOp::Teq, false)?,
        RegOp::IFG => translate_condop(instr, StackOp::Tgt, false)?,
        RegOp::IFL => translate_condop(instr, StackOp::Tlt, false)?,
        other => {
            return Err(Error::translation(format!(
                "unimplemented register opcode: {:?}",
                other
            )))
        }
    };

    if let (Some(label), Some(first)) = (&instr.label, snippet.first_mut()) {
        first.label = Some(label.clone());
    }

    Ok(snippet)
}

fn translate_set(instr: &RegInstruction) -> Result<Vec<StackInstruction>> {
    let a = instr.a.as_ref().expect("SET has an a-operand");

    if is_pc(&instr.b) {
        if let RegOperand::Label(name) = a {
            return Ok(vec![StackInstruction::new(
                StackOp::Branch,
                StackOperand::Label(name.clone()),
            )]);
        }
        if is_pc(a) {
            return Ok(vec![bare(StackOp::Stop)]);
        }
    }

    if matches!(instr.b, RegOperand::Literal(_)) {
        return Ok(Vec::new());
    }

    let mut out = value_on_stack(a)?;
    out.extend(address_on_stack(&instr.b)?);
    out.push(bare(StackOp::Store));
    Ok(out)
}

fn translate_binop(instr: &RegInstruction, op: StackOp) -> Result<Vec<StackInstruction>> {
    if matches!(instr.b, RegOperand::Literal(_)) {
        return Ok(Vec::new());
    }

    let a = instr.a.as_ref().expect("binop has an a-operand");
    let mut out = value_on_stack(&instr.b)?;
    out.extend(value_on_stack(a)?);
    out.push(bare(op));
    out.extend(address_on_stack(&instr.b)?);
    out.push(bare(StackOp::Store));
    Ok(out)
}

/// `simple` selects the `IFN` shape (a single patched `BRZERO`); otherwise
/// the `IFE`/`IFG`/`IFL` shape (`BRZERO 2; BRANCH <patched>`).
fn translate_condop(
    instr: &RegInstruction,
    test: StackOp,
    simple: bool,
) -> Result<Vec<StackInstruction>> {
    let a = instr.a.as_ref().expect("condop has an a-operand");
    let mut out = value_on_stack(a)?;
    out.extend(value_on_stack(&instr.b)?);
    out.push(bare(test));
    out.push(bare(StackOp::Drop));
    out.push(bare(StackOp::Drop));

    if simple {
        out.push(StackInstruction::new(
            StackOp::Brzero,
            StackOperand::PlaceholderOffset,
        ));
    } else {
        out.push(StackInstruction::new(StackOp::Brzero, StackOperand::Literal(2)));
        out.push(StackInstruction::new(
            StackOp::Branch,
            StackOperand::PlaceholderOffset,
        ));
    }

    Ok(out)
}

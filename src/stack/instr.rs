/// Stack-IR opcodes, in the same groupings used to introduce them.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum StackOp {
    // Binary arithmetic (and NOT, grouped with them by convention).
    Add,
    Sub,
    And,
    Or,
    Not,
    Xor,
    Shr,
    Shl,
    // Unary increment/decrement.
    Inc,
    Dec,
    // Tests.
    Tgt,
    Tlt,
    Teq,
    Tsz,
    // Data movement.
    Sset,
    Set,
    Load,
    Store,
    // Control.
    Branch,
    Brzero,
    Ibranch,
    Call,
    Return,
    Stop,
    Out,
    // Stack manipulation.
    Drop,
    Dup,
    Swap,
    Rsd3,
    Rsu3,
    Tuck2,
    Tuck3,
    Copy3,
    Push,
    Pop,
}

impl StackOp {
    /// Only `SET`, `BRANCH`, `BRZERO` carry an operand in well-formed code.
    pub fn carries_operand(self) -> bool {
        matches!(self, StackOp::Set | StackOp::Branch | StackOp::Brzero)
    }
}

/// A stack-IR operand. [`StackOperand::PlaceholderOffset`] stands in for
/// the un-patched branch target the translator emits; the stitcher
/// resolves it to a [`StackOperand::Literal`] and no other pass should ever
/// observe one. Modelling it as its own variant (instead of a sentinel
/// literal value) makes "this branch hasn't been patched yet" a checkable
/// fact rather than a convention.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum StackOperand {
    None,
    Literal(u16),
    Label(String),
    PlaceholderOffset,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StackInstruction {
    pub op: StackOp,
    pub operand: StackOperand,
    pub label: Option<String>,
}

impl StackInstruction {
    pub fn new(op: StackOp, operand: StackOperand) -> StackInstruction {
        StackInstruction {
            op,
            operand,
            label: None,
        }
    }

    pub fn bare(op: StackOp) -> StackInstruction {
        StackInstruction::new(op, StackOperand::None)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> StackInstruction {
        self.label = Some(label.into());
        self
    }
}

pub type StackProgram = Vec<StackInstruction>;

/// Net change in stack depth after executing one instance of the opcode,
/// independent of operand value. Derived from §4.1/§4.5's semantics and
/// made exhaustive over every `StackOp`, since the scheduler's rebalance
/// step needs a total function here.
pub fn stack_diff(op: StackOp) -> i32 {
    match op {
        StackOp::Add => -1,
        StackOp::Sub => -1,
        StackOp::And => -1,
        StackOp::Or => -1,
        StackOp::Not => 0,
        StackOp::Xor => -1,
        StackOp::Shr => -1,
        StackOp::Shl => -1,
        StackOp::Inc => 0,
        StackOp::Dec => 0,
        StackOp::Tgt => 0,
        StackOp::Tlt => 0,
        StackOp::Teq => 0,
        StackOp::Tsz => 0,
        StackOp::Sset => -1,
        StackOp::Set => 1,
        StackOp::Load => 0,
        StackOp::Store => -2,
        StackOp::Branch => 0,
        StackOp::Brzero => 0,
        StackOp::Ibranch => -1,
        StackOp::Call => 1,
        StackOp::Return => -1,
        StackOp::Stop => 0,
        StackOp::Out => 0,
        StackOp::Drop => -1,
        StackOp::Dup => 1,
        StackOp::Swap => 0,
        StackOp::Rsd3 => 0,
        StackOp::Rsu3 => 0,
        StackOp::Tuck2 => 1,
        StackOp::Tuck3 => 1,
        StackOp::Copy3 => 1,
        StackOp::Push => 1,
        StackOp::Pop => -1,
    }
}

use std::fmt;

use util::EnumFromStr;
use util_derive::EnumFromStr;

/// The twelve named registers of the register machine, in their canonical
/// ordering. That ordering is load-bearing: [`Reg::index`] (and therefore
/// [`reg2addr`]) is defined in terms of position in this list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Reg {
    A,
    B,
    C,
    X,
    Y,
    Z,
    I,
    J,
    PC,
    SP,
    EX,
    IA,
}

impl Reg {
    pub const ALL: [Reg; 12] = [
        Reg::A,
        Reg::B,
        Reg::C,
        Reg::X,
        Reg::Y,
        Reg::Z,
        Reg::I,
        Reg::J,
        Reg::PC,
        Reg::SP,
        Reg::EX,
        Reg::IA,
    ];

    /// Position in the canonical ordering above.
    pub fn index(self) -> usize {
        match self {
            Reg::A => 0,
            Reg::B => 1,
            Reg::C => 2,
            Reg::X => 3,
            Reg::Y => 4,
            Reg::Z => 5,
            Reg::I => 6,
            Reg::J => 7,
            Reg::PC => 8,
            Reg::SP => 9,
            Reg::EX => 10,
            Reg::IA => 11,
        }
    }

    pub fn from_name(name: &str) -> Option<Reg> {
        match name {
            "A" => Some(Reg::A),
            "B" => Some(Reg::B),
            "C" => Some(Reg::C),
            "X" => Some(Reg::X),
            "Y" => Some(Reg::Y),
            "Z" => Some(Reg::Z),
            "I" => Some(Reg::I),
            "J" => Some(Reg::J),
            "PC" => Some(Reg::PC),
            "SP" => Some(Reg::SP),
            "EX" => Some(Reg::EX),
            "IA" => Some(Reg::IA),
            _ => None,
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::A => "A",
            Reg::B => "B",
            Reg::C => "C",
            Reg::X => "X",
            Reg::Y => "Y",
            Reg::Z => "Z",
            Reg::I => "I",
            Reg::J => "J",
            Reg::PC => "PC",
            Reg::SP => "SP",
            Reg::EX => "EX",
            Reg::IA => "IA",
        };
        write!(f, "{}", name)
    }
}

/// Register *i* (canonical position) lives at `0x2000 - (i + 1)` in stack
/// memory; the region below `0x2000` is the register file as seen by a
/// translated program.
pub const REGISTER_FILE_TOP: u16 = 0x2000;

pub fn reg2addr(reg: Reg) -> u16 {
    REGISTER_FILE_TOP - (reg.index() as u16 + 1)
}

/// Register-IR opcodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
pub enum RegOp {
    SET,
    ADD,
    SUB,
    MUL,
    MLI,
    DIV,
    DVI,
    MOD,
    MDI,
    AND,
    BOR,
    XOR,
    SHR,
    ASR,
    SHL,
    IFB,
    IFC,
    IFE,
    IFN,
    IFG,
    IFA,
    IFL,
    IFU,
    ADX,
    SBX,
    STI,
    STD,
    JSR,
    DAT,
    OUT,
}

impl RegOp {
    /// True for the two opcodes whose single operand lives in `b` and which
    /// carry no `a` operand at all.
    pub fn is_unary(self) -> bool {
        matches!(self, RegOp::OUT | RegOp::DAT)
    }
}

/// A register-IR operand: a bare atom, or — only reachable through the
/// `Label` case — a compound array/sum form built from other operands.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RegOperand {
    Register(Reg),
    Literal(u16),
    Label(String),
    /// `[inner]`: dereference-by-label-name sugar; `inner` is itself an
    /// operand (typically `Register` or `Literal`).
    Array(Box<RegOperand>),
    /// `left+right`.
    Sum(Box<RegOperand>, Box<RegOperand>),
}

/// One register-IR instruction. `b` is always present and is the
/// destination-like operand; `a` is absent for unary opcodes ([`RegOp::is_unary`]).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RegInstruction {
    pub op: RegOp,
    pub b: RegOperand,
    pub a: Option<RegOperand>,
    pub label: Option<String>,
}

impl RegInstruction {
    pub fn new(op: RegOp, b: RegOperand, a: Option<RegOperand>) -> RegInstruction {
        RegInstruction {
            op,
            b,
            a,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> RegInstruction {
        self.label = Some(label.into());
        self
    }
}

pub type RegProgram = Vec<RegInstruction>;

/// Finds the index of the instruction carrying `label`, if any.
pub fn find_label(program: &[RegInstruction], label: &str) -> Option<usize> {
    program.iter().position(|instr| {
        instr
            .label
            .as_ref()
            .map(|l| l == label)
            .unwrap_or(false)
    })
}

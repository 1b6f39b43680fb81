//! The DCPU-16-style register machine: a 16-bit word machine with twelve
//! named registers, 64Ki words of memory, and thirty opcodes.

mod instr;
mod machine;

pub use instr::{find_label, reg2addr, Reg, RegInstruction, RegOp, RegOperand, RegProgram, REGISTER_FILE_TOP};
pub use machine::RegisterMachine;

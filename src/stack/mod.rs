//! The J5-style stack machine: a 16-bit word machine with a data stack,
//! 64Ki words of memory, a flag byte, and thirty-five opcodes.

mod instr;
mod machine;

pub use instr::{stack_diff, StackInstruction, StackOp, StackOperand, StackProgram};
pub use machine::{Flag, StackMachine};

//! Assemblers for the two toy-ISA source dialects used by the studio:
//! the register dialect (DCPU-16 family, see [`register`]) and the
//! stack dialect (J5 family, see [`stack`]).
//!
//! Neither assembler is part of the translation core; they are its
//! textual front end, each turning ASCII source into the corresponding
//! immutable instruction list from `dcj-core`.

mod lex;
pub mod register;
pub mod stack;

//! Shared instruction models and direct executors for the two toy ISAs:
//! the DCPU-16-style register machine ([`register`]) and the J5-style
//! stack machine ([`stack`]).
//!
//! Neither executor here knows about the translation pipeline that turns
//! one into the other; that lives in the `dcj-xlate` crate, built on top
//! of the types exposed here.

pub mod error;
pub mod logger;
pub mod register;
pub mod stack;


pub use error::{Error, Result};
pub use logger::{LogLevel, Logger};

use std::fmt;

/// The error taxonomy shared by every crate in the workspace.
///
/// Every variant maps to one of the four families a source file or a
/// running machine can fail with: a malformed line, an unresolved name,
/// a snippet the translator can't build, or something that goes wrong
/// while a machine is actually ticking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed line, unknown opcode, bad operand arity, invalid numeric literal.
    Lexical(String),
    /// Undefined label, invalid register name.
    Resolution(String),
    /// Unimplemented register opcode, unsupported operand shape, scheduler overflow.
    Translation(String),
    /// Stack underflow, out-of-range memory access, unrecognised opcode, I/O failure.
    Runtime(String),
}

impl Error {
    pub fn lexical(msg: impl Into<String>) -> Error {
        Error::Lexical(msg.into())
    }

    pub fn resolution(msg: impl Into<String>) -> Error {
        Error::Resolution(msg.into())
    }

    pub fn translation(msg: impl Into<String>) -> Error {
        Error::Translation(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Error {
        Error::Runtime(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lexical(msg) => write!(f, "{}", msg),
            Error::Resolution(msg) => write!(f, "{}", msg),
            Error::Translation(msg) => write!(f, "{}", msg),
            Error::Runtime(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Runtime(format!("I/O failure: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

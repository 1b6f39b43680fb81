//! Library half of the `dcj` studio binary: reads a source file, picks an
//! assembler dialect, and drives one of the three execution modes
//! (`-c` mixed-mode translate-and-run, `-s` direct stack execution,
//! `-r` direct register execution). Kept separate from [`main`](../src/main.rs)
//! so the argument-parsing and the actual run logic can be tested apart.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use dcj_core::register::RegisterMachine;
use dcj_core::stack::StackMachine;
use dcj_core::{Error as CoreError, Logger};
use dcj_xlate::MixedModeDriver;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error, PathBuf),
    Core(CoreError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err, path) => write!(f, "reading \"{}\" failed: {}", path.display(), err),
            Error::Core(err) => write!(f, "{}", err),
        }
    }
}

impl From<CoreError> for Error {
    fn from(err: CoreError) -> Error {
        Error::Core(err)
    }
}

fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|err| Error::Io(err, path.to_owned()))
}

/// `-c`: assemble the register dialect, translate to stack IR, and run it
/// through the mixed-mode driver. Returns the driver's accumulated cost.
pub fn run_convert(
    path: &Path,
    opt: u8,
    cache_enabled: bool,
    speed_limit: bool,
    logger: Logger,
) -> Result<u64, Error> {
    let source = read_source(path)?;
    let program = dcj_asm::register::assemble(&source)?;
    let mut driver = MixedModeDriver::new(program, opt, cache_enabled, speed_limit, logger);
    driver.run()?;
    Ok(driver.cost())
}

/// `-s`: assemble the stack dialect and run it directly.
pub fn run_stack(path: &Path, logger: Logger) -> Result<(), Error> {
    let source = read_source(path)?;
    let program = dcj_asm::stack::assemble(&source)?;
    let mut machine = StackMachine::new(logger);
    machine.load_program(program);
    machine.run()?;
    Ok(())
}

/// `-r`: assemble the register dialect and run it directly, without
/// translation.
pub fn run_register(path: &Path, logger: Logger) -> Result<(), Error> {
    let source = read_source(path)?;
    let program = dcj_asm::register::assemble(&source)?;
    let mut machine = RegisterMachine::new(logger);
    machine.load_program(program);
    machine.run()?;
    Ok(())
}

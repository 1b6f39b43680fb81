use std::io::{self, Write};

use crate::logger::Logger;
use crate::{Error, Result};

use super::instr::{find_label, Reg, RegInstruction, RegOp, RegOperand, RegProgram};

const MEMORY_WORDS: usize = 65_536;

pub enum TickResult {
    Running,
    Halted,
}

/// Direct interpreter of the register IR — no translation, no stack
/// machine involved. Used for the `-r` CLI mode and as the ground truth
/// that the mixed-mode driver's `OUT` stream must match (see the testable
/// properties around driver/direct equivalence).
pub struct RegisterMachine {
    registers: [u16; 12],
    memory: Box<[u16]>,
    program: RegProgram,
    terminate: bool,
    skip_next: bool,
    logger: Logger,
    output: Box<dyn Write>,
}

impl RegisterMachine {
    pub fn new(logger: Logger) -> RegisterMachine {
        RegisterMachine::with_output(logger, Box::new(io::stdout()))
    }

    pub fn with_output(logger: Logger, output: Box<dyn Write>) -> RegisterMachine {
        let mut registers = [0u16; 12];
        registers[Reg::SP.index()] = 0xFFFF;
        RegisterMachine {
            registers,
            memory: vec![0u16; MEMORY_WORDS].into_boxed_slice(),
            program: Vec::new(),
            terminate: false,
            skip_next: false,
            logger,
            output,
        }
    }

    pub fn load_program(&mut self, program: RegProgram) {
        self.program = program;
    }

    pub fn register(&self, reg: Reg) -> u16 {
        self.registers[reg.index()]
    }

    pub fn registers_dump(&self) -> String {
        Reg::ALL
            .iter()
            .map(|r| format!("{}={:#06x}", r, self.registers[r.index()]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.tick()? {
                TickResult::Running => {}
                TickResult::Halted => return Ok(()),
            }
        }
    }

    pub fn tick(&mut self) -> Result<TickResult> {
        if self.terminate {
            return Ok(TickResult::Halted);
        }

        let pc = self.registers[Reg::PC.index()] as usize;
        if pc >= self.program.len() {
            return Ok(TickResult::Halted);
        }

        self.registers[Reg::PC.index()] = (pc + 1) as u16;
        let instr = self.program[pc].clone();

        if self.skip_next {
            self.skip_next = false;
            self.logger.debug2(format!("skip {:?}", instr.op));
            return Ok(TickResult::Running);
        }

        self.execute(&instr)?;

        if self.terminate {
            Ok(TickResult::Halted)
        } else {
            Ok(TickResult::Running)
        }
    }

    fn execute(&mut self, instr: &RegInstruction) -> Result<()> {
        self.logger.debug(format!("exec {:?}", instr.op));

        match instr.op {
            RegOp::SET => {
                let value = self.resolve(instr.a.as_ref().expect("SET has an a-operand"))?;
                self.write_dest(&instr.b, value)?;
            }
            RegOp::ADD => self.binop(instr, |m, b, a| {
                let (res, overflow) = b.overflowing_add(a);
                m.set_ex(if overflow { 1 } else { 0 });
                res
            })?,
            RegOp::SUB => self.binop(instr, |m, b, a| {
                let (res, underflow) = b.overflowing_sub(a);
                m.set_ex(if underflow { 1 } else { 0 });
                res
            })?,
            RegOp::MUL => self.binop(instr, |m, b, a| {
                let wide = b as u32 * a as u32;
                m.set_ex((wide >> 16) as u16);
                wide as u16
            })?,
            RegOp::MLI => self.binop(instr, |m, b, a| {
                let wide = (b as i16 as i32) * (a as i16 as i32);
                m.set_ex((wide >> 16) as u16);
                wide as u16
            })?,
            RegOp::DIV => self.binop(instr, |m, b, a| {
                if a == 0 {
                    m.set_ex(0);
                    0
                } else {
                    m.set_ex((((b as u32) << 16) / a as u32) as u16);
                    b / a
                }
            })?,
            RegOp::DVI => self.binop(instr, |m, b, a| {
                let (bi, ai) = (b as i16, a as i16);
                if ai == 0 {
                    m.set_ex(0);
                    0
                } else {
                    m.set_ex((((bi as i32) << 16) / ai as i32) as u16);
                    (bi / ai) as u16
                }
            })?,
            RegOp::MOD => self.binop(instr, |_, b, a| if a == 0 { 0 } else { b % a })?,
            RegOp::MDI => self.binop(instr, |_, b, a| {
                let (bi, ai) = (b as i16, a as i16);
                if ai == 0 {
                    0
                } else {
                    (bi % ai) as u16
                }
            })?,
            RegOp::AND => self.binop(instr, |_, b, a| b & a)?,
            RegOp::BOR => self.binop(instr, |_, b, a| b | a)?,
            RegOp::XOR => self.binop(instr, |_, b, a| b ^ a)?,
            RegOp::SHR => self.binop(instr, |m, b, a| {
                m.set_ex((((b as u32) << 16) >> a) as u16);
                b >> a
            })?,
            RegOp::ASR => self.binop(instr, |m, b, a| {
                m.set_ex((((b as i16 as i32) << 16) >> a) as u16);
                ((b as i16) >> a) as u16
            })?,
            RegOp::SHL => self.binop(instr, |m, b, a| {
                m.set_ex((((b as u32) << a) >> 16) as u16);
                b << a
            })?,
            RegOp::ADX => self.binop(instr, |m, b, a| {
                let wide = b as u32 + a as u32 + m.register(Reg::EX) as u32;
                m.set_ex(if wide > 0xFFFF { 1 } else { 0 });
                wide as u16
            })?,
            RegOp::SBX => self.binop(instr, |m, b, a| {
                let wide = b as i32 - a as i32 + m.register(Reg::EX) as i32;
                m.set_ex(if wide < 0 {
                    0xFFFF
                } else if wide > 0xFFFF {
                    1
                } else {
                    0
                });
                wide as u16
            })?,
            RegOp::IFB => self.condop(instr, |b, a| (b & a) != 0)?,
            RegOp::IFC => self.condop(instr, |b, a| (b & a) == 0)?,
            RegOp::IFE => self.condop(instr, |b, a| b == a)?,
            RegOp::IFN => self.condop(instr, |b, a| b != a)?,
            RegOp::IFG => self.condop(instr, |b, a| b > a)?,
            RegOp::IFA => self.condop(instr, |b, a| (b as i16) > (a as i16))?,
            RegOp::IFL => self.condop(instr, |b, a| b < a)?,
            RegOp::IFU => self.condop(instr, |b, a| (b as i16) < (a as i16))?,
            RegOp::DAT => {
                let value = self.resolve(&instr.b)?;
                if value == 0 {
                    self.terminate = true;
                }
            }
            RegOp::OUT => self.out(instr)?,
            RegOp::STI | RegOp::STD | RegOp::JSR => {
                return Err(Error::runtime(format!(
                    "unrecognised opcode in direct register execution: {:?}",
                    instr.op
                )));
            }
        }

        Ok(())
    }

    fn binop(
        &mut self,
        instr: &RegInstruction,
        f: impl FnOnce(&mut RegisterMachine, u16, u16) -> u16,
    ) -> Result<()> {
        let b = self.resolve(&instr.b)?;
        let a = self.resolve(instr.a.as_ref().expect("binop has an a-operand"))?;
        let result = f(self, b, a);
        self.write_dest(&instr.b, result)
    }

    fn condop(&mut self, instr: &RegInstruction, pred: impl FnOnce(u16, u16) -> bool) -> Result<()> {
        let b = self.resolve(&instr.b)?;
        let a = self.resolve(instr.a.as_ref().expect("condop has an a-operand"))?;
        self.skip_next = !pred(b, a);
        Ok(())
    }

    fn out(&mut self, instr: &RegInstruction) -> Result<()> {
        let text = match &instr.b {
            RegOperand::Label(name) if self.label_holds_data(name) => {
                let idx = find_label(&self.program, name)
                    .ok_or_else(|| Error::resolution(format!("undefined label: {}", name)))?;
                let value = self.resolve(&self.program[idx].b.clone())?;
                value.to_string()
            }
            other => self.resolve(other)?.to_string(),
        };
        writeln!(self.output, "{}", text).map_err(Error::from)?;
        Ok(())
    }

    /// A bare label names a `DAT` instruction's stored value rather than
    /// the label's own position when used as an `OUT` operand.
    fn label_holds_data(&self, name: &str) -> bool {
        find_label(&self.program, name)
            .map(|idx| self.program[idx].op == RegOp::DAT)
            .unwrap_or(false)
    }

    fn set_ex(&mut self, value: u16) {
        self.registers[Reg::EX.index()] = value;
    }

    fn resolve(&self, operand: &RegOperand) -> Result<u16> {
        match operand {
            RegOperand::Register(r) => Ok(self.registers[r.index()]),
            RegOperand::Literal(n) => Ok(*n),
            RegOperand::Label(name) => find_label(&self.program, name)
                .map(|idx| idx as u16)
                .ok_or_else(|| Error::resolution(format!("undefined label: {}", name))),
            RegOperand::Array(inner) => {
                let addr = self.resolve(inner)?;
                self.read_mem(addr)
            }
            RegOperand::Sum(left, right) => {
                let l = self.resolve(left)?;
                let r = self.resolve(right)?;
                Ok(l.wrapping_add(r))
            }
        }
    }

    fn write_dest(&mut self, operand: &RegOperand, value: u16) -> Result<()> {
        match operand {
            RegOperand::Register(r) => {
                self.registers[r.index()] = value;
                Ok(())
            }
            // Writing to a literal destination is a no-op, matching the
            // register machine the stack dialect was distilled from.
            RegOperand::Literal(_) => Ok(()),
            RegOperand::Label(name) => {
                let addr = find_label(&self.program, name)
                    .map(|idx| idx as u16)
                    .ok_or_else(|| Error::resolution(format!("undefined label: {}", name)))?;
                self.write_mem(addr, value)
            }
            RegOperand::Array(inner) => {
                let addr = self.resolve(inner)?;
                self.write_mem(addr, value)
            }
            RegOperand::Sum(_, _) => Err(Error::runtime(
                "cannot write to a sum-form operand".to_string(),
            )),
        }
    }

    fn read_mem(&self, addr: u16) -> Result<u16> {
        self.memory
            .get(addr as usize)
            .copied()
            .ok_or_else(|| Error::runtime(format!("out-of-range memory read at {:#06x}", addr)))
    }

    fn write_mem(&mut self, addr: u16, value: u16) -> Result<()> {
        match self.memory.get_mut(addr as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::runtime(format!(
                "out-of-range memory write at {:#06x}",
                addr
            ))),
        }
    }
}

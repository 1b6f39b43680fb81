use std::collections::HashMap;
use std::thread::sleep;
use std::time::{Duration, Instant};

use dcj_core::register::{find_label, RegInstruction, RegProgram};
use dcj_core::stack::{StackInstruction, StackMachine, StackOp, StackOperand, StackProgram};
use dcj_core::{Error, Logger, Result};

use crate::peephole;
use crate::scheduler;
use crate::snippet::translate_instruction;
use crate::stitch::stitch;

/// Runs a register program section-at-a-time by lazily translating and
/// caching each section's stack snippet, then executing it on an embedded
/// stack machine. Bridges register-level branches across section
/// boundaries without ever re-entering the register executor.
pub struct MixedModeDriver {
    program: RegProgram,
    cache: HashMap<u16, (StackProgram, usize)>,
    cache_enabled: bool,
    opt: u8,
    speed_limit: bool,
    cost: u64,
    machine: StackMachine,
    logger: Logger,
}

impl MixedModeDriver {
    pub fn new(
        program: RegProgram,
        opt: u8,
        cache_enabled: bool,
        speed_limit: bool,
        logger: Logger,
    ) -> MixedModeDriver {
        MixedModeDriver::with_output(
            program,
            opt,
            cache_enabled,
            speed_limit,
            logger,
            Box::new(std::io::stdout()),
        )
    }

    /// Same as [`MixedModeDriver::new`], but with the embedded stack
    /// machine's `OUT` sink redirected — used to compare the driver's
    /// output stream against the direct register executor's.
    pub fn with_output(
        program: RegProgram,
        opt: u8,
        cache_enabled: bool,
        speed_limit: bool,
        logger: Logger,
        output: Box<dyn std::io::Write>,
    ) -> MixedModeDriver {
        MixedModeDriver {
            program,
            cache: HashMap::new(),
            cache_enabled,
            opt,
            speed_limit,
            cost: 0,
            machine: StackMachine::with_output(logger.clone(), output),
            logger,
        }
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    pub fn run(&mut self) -> Result<()> {
        let mut reg_pc = 0usize;

        while reg_pc < self.program.len() {
            let next_label = find_next_label(&self.program, reg_pc);
            let length = next_label - reg_pc;
            let section_label = self.program[reg_pc].label.clone();

            let start = Instant::now();
            let hit = self.cache_enabled && self.cache.contains_key(&(reg_pc as u16));
            let (snippet, snip_len) = self.get_snippet(reg_pc, next_label)?;
            self.cost += if hit { 1 } else { snip_len as u64 * 10 };

            self.logger.debug(format!(
                "section reg_pc={} length={} cache={}",
                reg_pc,
                length,
                if hit { "hit" } else { "miss" }
            ));

            self.machine.load_program(snippet.clone());
            self.machine.set_pc(0);

            let mut exit_reg_pc: Option<usize> = None;

            while !self.machine.terminate() {
                let pc = self.machine.pc() as usize;
                if pc >= snippet.len() {
                    break;
                }

                let instr = &snippet[pc];
                if instr.op == StackOp::Branch {
                    if let StackOperand::Label(name) = &instr.operand {
                        self.cost += 2;
                        if section_label.as_deref() == Some(name.as_str()) {
                            self.machine.set_pc(0);
                            continue;
                        } else {
                            exit_reg_pc = Some(find_label(&self.program, name).ok_or_else(|| {
                                Error::resolution(format!("undefined label: {}", name))
                            })?);
                            break;
                        }
                    }
                }

                self.cost += per_instruction_cost(instr.op);
                self.machine.tick()?;
            }

            if self.speed_limit {
                let budget = Duration::from_millis(100 * length as u64);
                let elapsed = start.elapsed();
                if budget > elapsed {
                    sleep(budget - elapsed);
                }
            }

            if self.machine.terminate() {
                break;
            }

            reg_pc = exit_reg_pc.unwrap_or(reg_pc + length);
        }

        Ok(())
    }

    fn get_snippet(&mut self, reg_pc: usize, next_label: usize) -> Result<(StackProgram, usize)> {
        let key = reg_pc as u16;
        if self.cache_enabled {
            if let Some(entry) = self.cache.get(&key) {
                return Ok(entry.clone());
            }
        }

        let length = next_label - reg_pc;
        let snippets: Result<Vec<Vec<StackInstruction>>> = self.program[reg_pc..next_label]
            .iter()
            .map(translate_instruction)
            .collect();
        let mut program = stitch(snippets?);

        if self.opt >= 1 {
            program = peephole::optimise(program);
        }
        if self.opt >= 2 {
            program = scheduler::schedule(program)?;
            program = peephole::optimise(program);
        }

        if self.cache_enabled {
            self.cache.insert(key, (program.clone(), length));
        }

        Ok((program, length))
    }
}

fn find_next_label(program: &[RegInstruction], reg_pc: usize) -> usize {
    program
        .iter()
        .enumerate()
        .skip(reg_pc + 1)
        .find(|(_, instr)| instr.label.is_some())
        .map(|(idx, _)| idx)
        .unwrap_or(program.len())
}

fn per_instruction_cost(op: StackOp) -> u64 {
    match op {
        StackOp::Branch | StackOp::Brzero => 2,
        StackOp::Load | StackOp::Store => 3,
        _ => 1,
    }
}

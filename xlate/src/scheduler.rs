use dcj_core::stack::{stack_diff, StackInstruction, StackOp, StackProgram};
use dcj_core::{Error, Result};

#[derive(Clone, Copy, Debug)]
struct Pair {
    first: usize,
    second: usize,
}

fn bare(op: StackOp) -> StackInstruction {
    StackInstruction::bare(op)
}

fn discover_pairs(program: &[StackInstruction]) -> Vec<Pair> {
    let mut pairs = Vec::new();
    if program.len() < 2 {
        return pairs;
    }

    for i in 0..program.len() - 1 {
        if program[i].op != StackOp::Set || program[i + 1].op != StackOp::Store {
            continue;
        }
        let addr = program[i].operand.clone();

        for j in (i + 1)..program.len() - 1 {
            if program[j].op == StackOp::Set
                && program[j].operand == addr
                && program[j + 1].op == StackOp::Load
            {
                pairs.push(Pair { first: i, second: j });
                break;
            }
        }
    }

    pairs
}

/// Rewrites `SET A; STORE … SET A; LOAD` producer/consumer pairs into
/// stack-preserving sequences, subject to the depth gating in the design.
pub fn schedule(mut prog: StackProgram) -> Result<StackProgram> {
    let mut pairs = discover_pairs(&prog);
    pairs.sort_by_key(|p| p.second - p.first);

    let mut pending = pairs.split_off(0);

    while !pending.is_empty() {
        let pair = pending.remove(0);
        let (i, j) = (pair.first, pair.second);

        let depth_start = pending.iter().filter(|p| p.first < i && i < p.second).count();
        let depth_end = pending.iter().filter(|p| p.first < j && j < p.second).count();

        if depth_start > 2 || depth_end > 2 {
            continue;
        }

        let dup_op = match depth_start {
            0 => StackOp::Dup,
            1 => StackOp::Tuck2,
            _ => StackOp::Tuck3,
        };

        let delta: i32 = prog[i + 2..j].iter().map(|instr| stack_diff(instr.op)).sum();
        if delta < 0 {
            return Err(Error::translation(format!(
                "scheduler stack delta {} is negative",
                delta
            )));
        }

        let rebalance = match delta {
            0 => None,
            1 => Some(StackOp::Swap),
            2 => Some(StackOp::Rsd3),
            _ => {
                return Err(Error::translation(format!(
                    "scheduler stack delta {} exceeds 2",
                    delta
                )))
            }
        };

        prog = rewrite_pair(&prog, i, j, dup_op, rebalance);

        for p in pending.iter_mut() {
            p.first = fixup_index(p.first, i, j, rebalance.is_some());
            p.second = fixup_index(p.second, i, j, rebalance.is_some());
        }
    }

    Ok(prog)
}

fn rewrite_pair(
    prog: &StackProgram,
    i: usize,
    j: usize,
    dup_op: StackOp,
    rebalance: Option<StackOp>,
) -> StackProgram {
    let mut out = Vec::with_capacity(prog.len() + 2);
    for (idx, instr) in prog.iter().enumerate() {
        if idx == i {
            out.push(bare(dup_op));
        }
        if idx == j || idx == j + 1 {
            if idx == j + 1 {
                if let Some(op) = rebalance {
                    out.push(bare(op));
                }
            }
            continue;
        }
        out.push(instr.clone());
    }
    out
}

fn fixup_index(old: usize, i: usize, j: usize, rebalanced: bool) -> usize {
    let mut v = old as i64;
    if old >= i {
        v += 1;
    }
    if old >= j {
        v -= 2;
    }
    if rebalanced && old > j {
        v += 1;
    }
    v as usize
}

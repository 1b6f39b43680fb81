use dcj_core::stack::{StackInstruction, StackOp, StackOperand, StackProgram};

/// Runs the fixed battery of local rewrites, in order, each as a single
/// forward sweep. Unlike the scheduler this never needs a fixed-point
/// re-scan: every pass here is defined over a disjoint sliding window.
pub fn optimise(program: StackProgram) -> StackProgram {
    let program = rewrite_pairs(program, is_inc_pattern, |_| vec![bare(StackOp::Inc)]);
    let program = rewrite_pairs(program, is_dec_pattern, |_| vec![bare(StackOp::Dec)]);
    let program = rewrite_pairs(program, is_test_zero_pattern, |_| vec![bare(StackOp::Tsz)]);
    let program = rewrite_quads(program, is_store_load_pattern, |window| {
        vec![bare(StackOp::Dup), window[0].clone(), window[1].clone()]
    });
    rewrite_pairs(program, is_dup_swap_pattern, |window| vec![window[0].clone()])
}

fn bare(op: StackOp) -> StackInstruction {
    StackInstruction::bare(op)
}

fn is_inc_pattern(window: &[StackInstruction]) -> bool {
    is_set_literal(&window[0], 1) && window[1].op == StackOp::Add
}

fn is_dec_pattern(window: &[StackInstruction]) -> bool {
    is_set_literal(&window[0], 1) && window[1].op == StackOp::Sub
}

fn is_test_zero_pattern(window: &[StackInstruction]) -> bool {
    is_set_literal(&window[0], 0) && window[1].op == StackOp::Teq
}

fn is_store_load_pattern(window: &[StackInstruction]) -> bool {
    window[0].op == StackOp::Set
        && window[1].op == StackOp::Store
        && window[2].op == StackOp::Set
        && window[3].op == StackOp::Load
        && window[2].operand == window[0].operand
}

fn is_dup_swap_pattern(window: &[StackInstruction]) -> bool {
    window[0].op == StackOp::Dup && window[1].op == StackOp::Swap
}

fn is_set_literal(instr: &StackInstruction, n: u16) -> bool {
    instr.op == StackOp::Set && instr.operand == StackOperand::Literal(n)
}

/// Slides a 2-wide window over `program`; wherever `matches` fires,
/// replaces the window with `replace`'s output and resumes scanning past it.
fn rewrite_pairs(
    program: StackProgram,
    matches: impl Fn(&[StackInstruction]) -> bool,
    replace: impl Fn(&[StackInstruction]) -> Vec<StackInstruction>,
) -> StackProgram {
    let mut out = Vec::with_capacity(program.len());
    let mut i = 0;
    while i < program.len() {
        if i + 2 <= program.len() && matches(&program[i..i + 2]) {
            let mut rewritten = replace(&program[i..i + 2]);
            carry_label(&program[i], &mut rewritten);
            out.extend(rewritten);
            i += 2;
        } else {
            out.push(program[i].clone());
            i += 1;
        }
    }
    out
}

/// Same as [`rewrite_pairs`] but with a 4-wide window.
fn rewrite_quads(
    program: StackProgram,
    matches: impl Fn(&[StackInstruction]) -> bool,
    replace: impl Fn(&[StackInstruction]) -> Vec<StackInstruction>,
) -> StackProgram {
    let mut out = Vec::with_capacity(program.len());
    let mut i = 0;
    while i < program.len() {
        if i + 4 <= program.len() && matches(&program[i..i + 4]) {
            let mut rewritten = replace(&program[i..i + 4]);
            carry_label(&program[i], &mut rewritten);
            out.extend(rewritten);
            i += 4;
        } else {
            out.push(program[i].clone());
            i += 1;
        }
    }
    out
}

fn carry_label(original_first: &StackInstruction, rewritten: &mut [StackInstruction]) {
    if let (Some(label), Some(first)) = (&original_first.label, rewritten.first_mut()) {
        first.label = Some(label.clone());
    }
}

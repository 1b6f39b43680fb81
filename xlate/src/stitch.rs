use dcj_core::stack::{StackInstruction, StackOp, StackOperand, StackProgram};

/// Concatenates per-instruction snippets into one stack program,
/// back-patching every [`StackOperand::PlaceholderOffset`] left by the
/// snippet translator with the length of the snippet that follows it.
pub fn stitch(mut snippets: Vec<Vec<StackInstruction>>) -> StackProgram {
    let lengths: Vec<usize> = snippets.iter().map(|s| s.len()).collect();

    for i in 0..snippets.len().saturating_sub(1) {
        let patch = lengths[i + 1] as u16 + 1;
        if let Some(last) = snippets[i].last_mut() {
            if is_placeholder_branch(last) {
                last.operand = StackOperand::Literal(patch);
            }
        }
    }

    snippets.into_iter().flatten().collect()
}

fn is_placeholder_branch(instr: &StackInstruction) -> bool {
    matches!(instr.op, StackOp::Brzero | StackOp::Branch)
        && instr.operand == StackOperand::PlaceholderOffset
}

//! Genome text format
//!
//! One instruction per whitespace-separated token. A token is an
//! instruction name, optionally followed by modifier letters:
//!
//! ```text
//! ; minimal copy loop
//! HAlloc SetFlowa MovHeadc HSearchb Swap-Stka
//! HCopy GetHeadb IfLessc MovHead HDivide
//! ```
//!
//! `IOab` is `IO NopA NopB`. A bare `a`, `b` or `c` is a standalone nop,
//! and so is its full name. `;` comments run to end of line.
//!
//! Resolution tries the whole token first, then strips one, two and three
//! trailing letters; the first stem that names an instruction wins.

use super::{Genome, InstructionTable, Opcode, MAX_MODIFIERS};
use crate::error::{CpuError, Result};

/// Parse a text genome against `table`.
pub fn parse_genome(src: &str, table: &InstructionTable) -> Result<Genome> {
    let mut opcodes = Vec::new();
    for line in src.lines() {
        let code = line.split(';').next().unwrap_or("");
        for token in code.split_whitespace() {
            opcodes.extend(resolve_token(token, table)?);
        }
    }
    table.decode(&opcodes)
}

/// Positions spelled by one token.
fn resolve_token(token: &str, table: &InstructionTable) -> Result<Vec<Opcode>> {
    if let Some(op) = table.try_lookup(token) {
        return Ok(vec![op]);
    }

    let mut chars = token.chars();
    if let (Some(letter), None) = (chars.next(), chars.next()) {
        if let Some(nop) = Opcode::from_modifier_letter(letter) {
            return Ok(vec![nop]);
        }
    }

    for (split, _) in token.char_indices().rev().take(MAX_MODIFIERS) {
        if split == 0 {
            break;
        }
        let (stem, suffix) = token.split_at(split);
        let Some(nops) = suffix
            .chars()
            .map(Opcode::from_modifier_letter)
            .collect::<Option<Vec<_>>>()
        else {
            // A non-letter here rules out every longer suffix as well
            break;
        };
        if let Some(op) = table.try_lookup(stem) {
            let mut out = Vec::with_capacity(nops.len() + 1);
            out.push(op);
            out.extend(nops);
            return Ok(out);
        }
    }

    Err(CpuError::Parse {
        token: token.to_string(),
        message: "unknown instruction".to_string(),
    })
}

/// Format a genome as a single line of tokens.
///
/// Modifier letters are attached to their instruction unless the joined
/// token would read back as something else, in which case the modifiers
/// are written as separate nop names.
pub fn format_genome(genome: &Genome, table: &InstructionTable) -> String {
    let instructions = genome.instructions();
    let mut tokens: Vec<String> = Vec::with_capacity(instructions.len());
    let mut pos = 0;

    while pos < instructions.len() {
        let inst = &instructions[pos];
        let name = table.name(inst.opcode);

        if inst.is_nop() || inst.modifiers.is_empty() {
            tokens.push(name.to_string());
            pos += 1;
            continue;
        }

        let letters: Option<String> = inst.modifiers.iter().map(|m| m.modifier_letter()).collect();
        let mut expected = Vec::with_capacity(inst.modifiers.len() + 1);
        expected.push(inst.opcode);
        expected.extend(&inst.modifiers);

        match letters.map(|l| format!("{}{}", name, l)) {
            Some(joined) if resolve_token(&joined, table).ok().as_deref() == Some(&expected[..]) => {
                tokens.push(joined);
            }
            _ => {
                tokens.push(name.to_string());
                tokens.extend(inst.modifiers.iter().map(|m| table.name(*m).to_string()));
            }
        }
        pos += 1 + inst.modifiers.len();
    }

    tokens.join(" ")
}

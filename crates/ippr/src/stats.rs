//! Execution statistics for the `--stati` surface.
//!
//! The collector rides along with the execution engine: it counts executed
//! instructions (`LABEL`, `DPRINT` and `BREAK` do not count), tracks which
//! instruction ran most often, watches the high-water mark of initialised
//! variables, and tallies opcode frequencies over the program source.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::io::{self, Write};

use crate::program::{Opcode, Program};

/// One line of the statistics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    /// Number of executed (counted) instructions.
    Insts,
    /// Maximum number of simultaneously initialised variables.
    Vars,
    /// `order` of the most-executed instruction, ties going to the lowest.
    Hot,
    /// The most frequent opcodes in the source, comma-separated.
    Frequent,
    /// An empty line.
    Eol,
}

#[derive(Debug, Clone, Default)]
pub struct Stats {
    executed: u64,
    max_vars: usize,
    /// Execution count per instruction `order` (counted opcodes only).
    hits: HashMap<u32, u64>,
    /// Opcode occurrence counts over the program source.
    present: HashMap<&'static str, u64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally opcode frequencies of the program image.
    pub fn record_source(&mut self, program: &Program) {
        for instruction in &program.instructions {
            *self.present.entry(instruction.opcode.name()).or_insert(0) += 1;
        }
    }

    /// Count one executed instruction.
    pub fn record_execution(&mut self, opcode: Opcode, order: u32) {
        if matches!(opcode, Opcode::Label | Opcode::Dprint | Opcode::Break) {
            return;
        }
        self.executed += 1;
        *self.hits.entry(order).or_insert(0) += 1;
    }

    /// Track the high-water mark of initialised variables.
    pub fn record_vars(&mut self, defined: usize) {
        self.max_vars = self.max_vars.max(defined);
    }

    pub fn insts(&self) -> u64 {
        self.executed
    }

    pub fn vars(&self) -> usize {
        self.max_vars
    }

    /// The `order` of the most-executed instruction, if anything ran.
    pub fn hot(&self) -> Option<u32> {
        self.hits
            .iter()
            .map(|(&order, &count)| (count, Reverse(order)))
            .max()
            .map(|(_, Reverse(order))| order)
    }

    /// The names of the most frequent source opcodes, name-ordered.
    pub fn frequent(&self) -> Vec<&'static str> {
        let Some(&top) = self.present.values().max() else {
            return Vec::new();
        };
        let mut names: Vec<&'static str> = self
            .present
            .iter()
            .filter(|&(_, &count)| count == top)
            .map(|(&name, _)| name)
            .collect();
        names.sort_unstable();
        names
    }

    /// Render the requested fields, one per line, in the given order.
    pub fn write_report<W: Write>(&self, fields: &[StatField], writer: &mut W) -> io::Result<()> {
        for field in fields {
            match field {
                StatField::Insts => writeln!(writer, "{}", self.insts())?,
                StatField::Vars => writeln!(writer, "{}", self.vars())?,
                StatField::Hot => writeln!(writer, "{}", self.hot().unwrap_or(0))?,
                StatField::Frequent => writeln!(writer, "{}", self.frequent().join(","))?,
                StatField::Eol => writeln!(writer)?,
            }
        }
        Ok(())
    }
}

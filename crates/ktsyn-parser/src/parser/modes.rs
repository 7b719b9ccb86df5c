//! Whitespace/newline mode stack
//!
//! Two flags are tracked: whether a line break is significant (terminates a
//! statement) and whether adjacent raw tokens such as `?` `.` are read as one
//! complex token. Each flag has its own stack so pushes and pops of the two may
//! interleave. Pushing and popping is the caller's job; nothing unwinds the
//! stacks implicitly except rollback, which restores a snapshot.

use super::Parser;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeStack {
    newlines: Vec<bool>,
    joining: Vec<bool>,
}

impl Default for ModeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeStack {
    pub fn new() -> Self {
        Self {
            newlines: vec![true],
            joining: vec![true],
        }
    }

    pub fn newlines_enabled(&self) -> bool {
        self.newlines.last().copied().unwrap_or(true)
    }

    pub fn joining_enabled(&self) -> bool {
        self.joining.last().copied().unwrap_or(true)
    }

    /// Depth of the newline stack
    pub fn depth(&self) -> usize {
        self.newlines.len()
    }

    fn push_newlines(&mut self, enabled: bool) {
        self.newlines.push(enabled);
    }

    fn pop_newlines(&mut self) {
        if self.newlines.len() > 1 {
            self.newlines.pop();
        } else {
            tracing::warn!("unbalanced newline mode restore");
        }
    }

    fn push_joining(&mut self, enabled: bool) {
        self.joining.push(enabled);
    }

    fn pop_joining(&mut self) {
        if self.joining.len() > 1 {
            self.joining.pop();
        } else {
            tracing::warn!("unbalanced token joining restore");
        }
    }
}

impl<'t> Parser<'t> {
    /// Line breaks become significant until the matching [`Parser::restore_newlines`]
    pub fn enable_newlines(&mut self) {
        self.modes.push_newlines(true);
    }

    /// Line breaks are ignored until the matching [`Parser::restore_newlines`]
    pub fn disable_newlines(&mut self) {
        self.modes.push_newlines(false);
    }

    pub fn restore_newlines(&mut self) {
        self.modes.pop_newlines();
    }

    pub fn enable_joining(&mut self) {
        self.modes.push_joining(true);
    }

    pub fn disable_joining(&mut self) {
        self.modes.push_joining(false);
    }

    pub fn restore_joining(&mut self) {
        self.modes.pop_joining();
    }

    pub fn modes(&self) -> &ModeStack {
        &self.modes
    }
}

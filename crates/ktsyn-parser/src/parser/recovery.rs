//! Expectation and error recovery helpers shared by all productions
//!
//! Recovery never consumes `{` or `}`: braces belong to the production that
//! opened them, so a broken declaration can never swallow the rest of a body.

use super::{Marker, Parser};
use crate::syntax::SyntaxKind::{self, *};
use crate::token_set::TokenSet;

const BRACES: TokenSet = TokenSet::new(&[LBRACE, RBRACE]);

impl<'t> Parser<'t> {
    /// Consume `kind` or record a zero-width diagnostic
    pub fn expect(&mut self, kind: SyntaxKind, message: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(message);
        false
    }

    /// Consume `kind`, otherwise report and recover: tokens in `recovery` (and
    /// braces) are left alone, anything else is wrapped in an error node.
    pub fn expect_with_recovery(
        &mut self,
        kind: SyntaxKind,
        message: &str,
        recovery: Option<TokenSet>,
    ) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_with_recovery(message, recovery);
        false
    }

    /// Report `message`, consuming the current token unless it is worth keeping
    pub fn error_with_recovery(&mut self, message: &str, recovery: Option<TokenSet>) {
        let Some(set) = recovery else {
            self.error(message);
            return;
        };
        let keep = self.is_at_set(set)
            || self.is_at_set(BRACES)
            || (set.contains(EOL_OR_SEMICOLON) && self.at_eol_or_semicolon());
        if keep || self.at_eof() {
            self.error(message);
        } else {
            self.error_and_advance(message, 1);
        }
    }

    /// Wrap exactly `n` tokens in an error node
    pub fn error_and_advance(&mut self, message: &str, n: usize) {
        let m = self.start();
        self.bump_n(n);
        m.error(self, message);
    }

    /// Wrap every token up to a member of `set` (or a brace) in one error node
    pub fn error_until(&mut self, message: &str, set: TokenSet) {
        let m = self.start();
        self.skip_until(set);
        m.error(self, message);
    }

    /// Advance up to a member of `set`, a brace, or the end of a logical line
    /// when `set` contains `EOL_OR_SEMICOLON`
    pub fn skip_until(&mut self, set: TokenSet) {
        let set = set.union(BRACES);
        let stop_at_eol = set.contains(EOL_OR_SEMICOLON);
        while !self.at_eof() && !self.is_at_set(set) {
            if stop_at_eol && self.at_eol_or_semicolon() {
                break;
            }
            self.bump();
        }
    }

    /// Commit `marker` as an error when `condition` holds, drop it otherwise
    pub fn error_if(&mut self, marker: Marker, condition: bool, message: &str) {
        if condition {
            marker.error(self, message);
        } else {
            marker.drop(self);
        }
    }

    /// Consume tokens up to and including the `}` that closes an already
    /// consumed `{`
    pub fn advance_balanced_block(&mut self) {
        let mut depth = 1usize;
        while !self.at_eof() {
            match self.current() {
                LBRACE => depth += 1,
                RBRACE => depth -= 1,
                _ => {}
            }
            self.bump();
            if depth == 0 {
                break;
            }
        }
    }
}

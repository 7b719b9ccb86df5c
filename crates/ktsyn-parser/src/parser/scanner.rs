//! Bracket-balance scanner
//!
//! A read-only walk over the upcoming tokens that keeps track of bracket nesting
//! and asks a pattern, token by token, whether it has seen enough. Used to find
//! things such as the last `.` of a receiver type before committing to a parse.

use super::Parser;
use crate::syntax::SyntaxKind::{self, *};
use crate::token_set::TokenSet;

/// Decides, for each token of a scan, whether the scan stops
pub trait TokenStreamPattern {
    /// Called at every token before the bracket counters see it. `offset` is
    /// the token's raw index. Returning true stops the scan.
    fn process(&mut self, p: &Parser<'_>, offset: usize, top_level: bool) -> bool;

    /// Raw index of the match, if any
    fn result(&self) -> Option<usize>;

    fn is_top_level(&self, round: i32, angle: i32, curly: i32, square: i32) -> bool {
        round == 0 && angle == 0 && curly == 0 && square == 0
    }

    /// Called on a `)` that does not close the innermost open bracket.
    /// Returning true stops the scan.
    fn handle_unmatched_closing(&mut self, _closing: SyntaxKind) -> bool {
        true
    }
}

/// A yes/no question about the token under the scan cursor
pub trait TokenStreamPredicate {
    fn matching(&self, p: &Parser<'_>, top_level: bool) -> bool;
}

impl<F> TokenStreamPredicate for F
where
    F: Fn(&Parser<'_>, bool) -> bool,
{
    fn matching(&self, p: &Parser<'_>, top_level: bool) -> bool {
        self(p, top_level)
    }
}

/// Matches a top-level token in the set
#[derive(Debug, Clone, Copy)]
pub struct AtSet(pub TokenSet);

impl TokenStreamPredicate for AtSet {
    fn matching(&self, p: &Parser<'_>, top_level: bool) -> bool {
        top_level && p.is_at_set(self.0)
    }
}

/// Finds the first `look_for` match, giving up where `stop_at` matches
pub struct FirstBefore<L, S> {
    look_for: L,
    stop_at: S,
    occurrence: Option<usize>,
}

impl<L: TokenStreamPredicate, S: TokenStreamPredicate> FirstBefore<L, S> {
    pub fn new(look_for: L, stop_at: S) -> Self {
        Self {
            look_for,
            stop_at,
            occurrence: None,
        }
    }
}

impl<L: TokenStreamPredicate, S: TokenStreamPredicate> TokenStreamPattern for FirstBefore<L, S> {
    fn process(&mut self, p: &Parser<'_>, offset: usize, top_level: bool) -> bool {
        if self.look_for.matching(p, top_level) {
            self.occurrence = Some(offset);
            return true;
        }
        self.stop_at.matching(p, top_level)
    }

    fn result(&self) -> Option<usize> {
        self.occurrence
    }
}

/// Finds the last `look_for` match before `stop_at` matches at top level
pub struct LastBefore<L, S> {
    look_for: L,
    stop_at: S,
    occurrence: Option<usize>,
    dont_stop_right_after_occurrence: bool,
    previous_matched: bool,
}

impl<L: TokenStreamPredicate, S: TokenStreamPredicate> LastBefore<L, S> {
    pub fn new(look_for: L, stop_at: S) -> Self {
        Self {
            look_for,
            stop_at,
            occurrence: None,
            dont_stop_right_after_occurrence: false,
            previous_matched: false,
        }
    }

    /// Ignore `stop_at` on the token right after a `look_for` match
    pub fn dont_stop_right_after_occurrence(mut self) -> Self {
        self.dont_stop_right_after_occurrence = true;
        self
    }
}

impl<L: TokenStreamPredicate, S: TokenStreamPredicate> TokenStreamPattern for LastBefore<L, S> {
    fn process(&mut self, p: &Parser<'_>, offset: usize, top_level: bool) -> bool {
        let matched = self.look_for.matching(p, top_level);
        if matched {
            self.occurrence = Some(offset);
        }
        if top_level
            && self.stop_at.matching(p, top_level)
            && !(self.dont_stop_right_after_occurrence && self.previous_matched)
        {
            return true;
        }
        self.previous_matched = matched;
        false
    }

    fn result(&self) -> Option<usize> {
        self.occurrence
    }
}

impl<'t> Parser<'t> {
    /// Run `pattern` over the upcoming tokens; the cursor is left where it was
    pub fn scan(&mut self, pattern: &mut dyn TokenStreamPattern) -> Option<usize> {
        let start = self.pos;
        let (mut round, mut angle, mut curly, mut square) = (0i32, 0i32, 0i32, 0i32);
        let mut opens: Vec<SyntaxKind> = Vec::new();

        while !self.at_eof() {
            let top_level = pattern.is_top_level(round, angle, curly, square);
            if pattern.process(self, self.pos, top_level) {
                break;
            }
            match self.current() {
                LPAR => {
                    round += 1;
                    opens.push(LPAR);
                }
                LT => {
                    angle += 1;
                    opens.push(LT);
                }
                LBRACE => {
                    curly += 1;
                    opens.push(LBRACE);
                }
                LBRACKET => {
                    square += 1;
                    opens.push(LBRACKET);
                }
                RPAR => {
                    round -= 1;
                    if opens.pop() != Some(LPAR) && pattern.handle_unmatched_closing(RPAR) {
                        break;
                    }
                }
                GT => {
                    angle -= 1;
                    if opens.last() == Some(&LT) {
                        opens.pop();
                    }
                }
                RBRACE => {
                    curly -= 1;
                    if opens.last() == Some(&LBRACE) {
                        opens.pop();
                    }
                }
                RBRACKET => {
                    square -= 1;
                    if opens.last() == Some(&LBRACKET) {
                        opens.pop();
                    }
                }
                _ => {}
            }
            self.step();
        }

        self.pos = start;
        pattern.result()
    }

    /// Raw index of the last `.`/`?.` that ends a receiver type, if the
    /// upcoming tokens start with one
    pub fn last_dot_after_receiver(&mut self) -> Option<usize> {
        use crate::token_set::RECEIVER_TYPE_TERMINATORS;

        fn stop_in_parenthesized(p: &Parser<'_>, top_level: bool) -> bool {
            if top_level && p.definitely_out_of_receiver() {
                return true;
            }
            top_level && !p.is_at(QUEST) && !p.is_at(LPAR) && !p.is_at(RPAR)
        }

        fn stop_in_plain(p: &Parser<'_>, top_level: bool) -> bool {
            if top_level && (p.definitely_out_of_receiver() || p.is_at(LPAR)) {
                return true;
            }
            if top_level && p.is_at(IDENTIFIER) {
                let next = p.lookahead(1);
                return !matches!(next, LT | DOT | SAFE_ACCESS | QUEST);
            }
            false
        }

        let dot = AtSet(RECEIVER_TYPE_TERMINATORS);
        if self.is_at(LPAR) {
            self.scan(&mut FirstBefore::new(dot, stop_in_parenthesized))
        } else {
            self.scan(&mut LastBefore::new(dot, stop_in_plain))
        }
    }

    fn definitely_out_of_receiver(&self) -> bool {
        use crate::token_set::TOP_LEVEL_DECLARATION_FIRST;

        const OUT_OF_RECEIVER: TokenSet = TokenSet::new(&[EQ, COLON, LBRACE, RBRACE, BY_KW]);
        self.is_at_set(OUT_OF_RECEIVER.union(TOP_LEVEL_DECLARATION_FIRST))
    }
}

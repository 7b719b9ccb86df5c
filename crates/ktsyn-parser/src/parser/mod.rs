//! Marker-based recursive-descent parser state
//!
//! The [`Parser`] owns everything a single parse touches: the token vector, the
//! cursor, the newline/joining mode stacks, the soft-keyword remap log and the
//! append-only event log that the sink later turns into a rowan tree. Grammar
//! productions read tokens only through the cursor methods and shape the tree
//! only through [`Marker`]s.

mod cursor;
mod event;
mod marker;
mod modes;
mod recovery;
mod scanner;

pub use cursor::Token;
pub(crate) use event::Event;
pub use marker::{CompletedMarker, LeadingTrivia, Marker, TrailingTrivia};
pub use modes::ModeStack;
pub use scanner::{AtSet, FirstBefore, LastBefore, TokenStreamPattern, TokenStreamPredicate};

use crate::error::ParseErrorKind;
use crate::grammar::ExpressionGrammar;
use crate::lexer::Lexer;
use crate::syntax::SyntaxKind::{self, *};
use crate::token_set::{TokenSet, SOFT_KEYWORDS};

/// One soft-keyword remap, kept so rollback can undo it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Remap {
    raw: usize,
    previous: SyntaxKind,
}

/// Parser state for one parse invocation
pub struct Parser<'t> {
    source: &'t str,
    tokens: Vec<Token>,
    /// Raw index of the current significant token (or `eof_at`)
    pos: usize,
    /// Raw index one past the last consumed token
    prev_end: usize,
    /// Artificial end of input for truncated sub-parses
    eof_at: usize,
    modes: ModeStack,
    remaps: Vec<Remap>,
    events: Vec<Event>,
    /// Start events whose `forward_parent` was set, so rollback can unlink them
    forward_links: Vec<usize>,
    exprs: &'t dyn ExpressionGrammar,
    /// Newline-stack depth at which a `by` delegation clause began
    by_clause_depth: Option<usize>,
    collapse_blocks: bool,
    /// The input ends inside a block comment
    unclosed_comment: bool,
}

impl<'t> Parser<'t> {
    /// Lex `source` and position the cursor on the first significant token
    pub fn new(source: &'t str, exprs: &'t dyn ExpressionGrammar) -> Self {
        let raw = Lexer::new(source).tokenize();
        let unclosed_comment = raw.last().is_some_and(|t| t.is_unclosed_comment());
        let tokens: Vec<Token> = raw.into_iter().map(|t| Token::new(t.kind(), t.span)).collect();
        let eof_at = tokens.len();
        let mut parser = Self {
            source,
            tokens,
            pos: 0,
            prev_end: 0,
            eof_at,
            modes: ModeStack::new(),
            remaps: Vec::new(),
            events: Vec::new(),
            forward_links: Vec::new(),
            exprs,
            by_clause_depth: None,
            collapse_blocks: false,
            unclosed_comment,
        };
        parser.pos = parser.skip_trivia_from(0);
        parser
    }

    pub(crate) fn set_collapse_blocks(&mut self, collapse: bool) {
        self.collapse_blocks = collapse;
    }

    /// Whether function bodies should be collapsed into a single lazy token
    pub fn collapse_blocks(&self) -> bool {
        self.collapse_blocks
    }

    /// The expression/statement grammar this parser delegates to
    pub fn expressions(&self) -> &'t dyn ExpressionGrammar {
        self.exprs
    }

    pub fn source(&self) -> &'t str {
        self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Replay the event log into a tree
    pub(crate) fn into_parse(self) -> crate::Parse {
        let (green, errors) = crate::sink::build_tree(self.source, &self.tokens, self.events);
        crate::Parse::new(green, errors)
    }

    // === Soft-keyword resolver ===

    /// Check for `kind` at the cursor, remapping soft keywords in place.
    ///
    /// An identifier spelled like the soft keyword `kind` is remapped to `kind`;
    /// a soft keyword is remapped back to IDENTIFIER when IDENTIFIER is asked for.
    /// `EOL_OR_SEMICOLON` matches end of input, `;` or a preceding line break.
    pub fn at(&mut self, kind: SyntaxKind) -> bool {
        let current = self.current();
        if current == kind {
            return true;
        }
        if kind == EOL_OR_SEMICOLON {
            return self.at_eol_or_semicolon();
        }
        if current == IDENTIFIER && kind.is_soft_keyword() {
            if kind.keyword_text() == Some(self.current_text()) {
                self.remap_current(kind);
                return true;
            }
            return false;
        }
        if kind == IDENTIFIER && current.is_soft_keyword() {
            self.remap_current(IDENTIFIER);
            return true;
        }
        false
    }

    /// Set version of [`Parser::at`]
    pub fn at_set(&mut self, set: TokenSet) -> bool {
        let current = self.current();
        if set.contains(current) {
            return true;
        }
        if set.contains(EOL_OR_SEMICOLON) && self.at_eol_or_semicolon() {
            return true;
        }
        if current == IDENTIFIER {
            if let Some(keyword) = SyntaxKind::from_soft_keyword(self.current_text()) {
                if set.contains(keyword) {
                    self.remap_current(keyword);
                    return true;
                }
            }
        } else if set.contains(IDENTIFIER) && current.is_soft_keyword() {
            self.remap_current(IDENTIFIER);
            return true;
        }
        false
    }

    /// Read-only variant of [`Parser::at`], never remaps
    pub fn is_at(&self, kind: SyntaxKind) -> bool {
        let current = self.current();
        current == kind
            || (kind == EOL_OR_SEMICOLON && self.at_eol_or_semicolon())
            || (current == IDENTIFIER
                && kind.is_soft_keyword()
                && kind.keyword_text() == Some(self.current_text()))
            || (kind == IDENTIFIER && current.is_soft_keyword())
    }

    /// Read-only variant of [`Parser::at_set`], never remaps
    pub fn is_at_set(&self, set: TokenSet) -> bool {
        let current = self.current();
        if set.contains(current) || (set.contains(EOL_OR_SEMICOLON) && self.at_eol_or_semicolon()) {
            return true;
        }
        if current == IDENTIFIER {
            return SyntaxKind::from_soft_keyword(self.current_text())
                .map_or(false, |keyword| set.contains(keyword));
        }
        set.contains(IDENTIFIER) && SOFT_KEYWORDS.contains(current)
    }

    fn at_eol_or_semicolon(&self) -> bool {
        self.at_eof() || self.current() == SEMICOLON || self.newline_before_current()
    }

    /// Consume the current token if it is `kind`
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token after remapping it to `kind`
    pub fn bump_remap(&mut self, kind: SyntaxKind) {
        if !self.at_eof() {
            self.remap_current(kind);
            self.bump();
        }
    }

    fn remap_current(&mut self, kind: SyntaxKind) {
        let raw = self.pos;
        if raw >= self.eof_at {
            return;
        }
        let previous = self.tokens[raw].effective;
        if previous != kind {
            self.remaps.push(Remap { raw, previous });
            self.tokens[raw].effective = kind;
        }
    }

    // === `by` clause restriction ===

    /// Run `f` as a `by` delegation clause: a trailing lambda is not an argument
    /// unless it sits inside brackets opened within the clause.
    pub fn in_by_clause<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.by_clause_depth.replace(self.modes.depth());
        let result = f(self);
        self.by_clause_depth = saved;
        result
    }

    /// Whether a `{` after a call may be taken as its trailing lambda
    pub fn trailing_lambda_allowed(&self) -> bool {
        match self.by_clause_depth {
            Some(depth) => self.modes.depth() > depth,
            None => true,
        }
    }

    // === Diagnostics ===

    /// Record a zero-width diagnostic at the current position
    pub fn error(&mut self, message: impl Into<String>) {
        self.error_with(ParseErrorKind::MissingToken, message);
    }

    pub fn error_with(&mut self, kind: ParseErrorKind, message: impl Into<String>) {
        self.events.push(Event::Error {
            message: message.into(),
            kind,
        });
    }

    /// Flag an unterminated block or doc comment at end of input, once
    pub fn check_unclosed_comment(&mut self) {
        if !self.at_eof() || self.eof_at != self.tokens.len() {
            return;
        }
        if self.unclosed_comment {
            self.error_with(ParseErrorKind::UnterminatedConstruct, "Unclosed comment");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::DefaultExpressions;

    #[test]
    fn test_soft_keyword_remap_and_back() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("get x", &exprs);
        assert_eq!(p.current(), IDENTIFIER);
        assert!(!p.is_at(SET_KW));
        assert!(p.is_at(GET_KW));
        // read-only check leaves the token alone
        assert_eq!(p.current(), IDENTIFIER);

        assert!(p.at(GET_KW));
        assert_eq!(p.current(), GET_KW);
        assert!(p.at(IDENTIFIER));
        assert_eq!(p.current(), IDENTIFIER);
    }

    #[test]
    fn test_at_set_remaps_soft_keywords() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("private fun", &exprs);
        assert!(p.at_set(crate::token_set::MODIFIER_KEYWORDS));
        assert_eq!(p.current(), PRIVATE_KW);
    }

    #[test]
    fn test_eol_or_semicolon() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("a\nb; c", &exprs);
        assert!(!p.at(EOL_OR_SEMICOLON));
        p.bump();
        assert!(p.at(EOL_OR_SEMICOLON));
        p.bump();
        assert!(p.at(EOL_OR_SEMICOLON));
        p.bump();
        assert!(!p.at(EOL_OR_SEMICOLON));
        p.bump();
        assert!(p.at(EOL_OR_SEMICOLON));
    }

    #[test]
    fn test_unclosed_comment_reported_once() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("x /* open", &exprs);
        p.bump();
        p.check_unclosed_comment();
        let errors = p
            .events
            .iter()
            .filter(|e| matches!(e, Event::Error { .. }))
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_nested_comment_ending_in_close_is_still_open() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("x /* a /* b */", &exprs);
        p.bump();
        p.check_unclosed_comment();
        assert!(p.events.iter().any(|e| matches!(e, Event::Error { .. })));
    }
}

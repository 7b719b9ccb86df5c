//! Token cursor: current token, lookahead, raw lookup and consumption

use super::{Event, Parser};
use crate::syntax::SyntaxKind::{self, *};
use std::ops::Range;

/// A lexed token with its original and effective kinds.
///
/// The lexer sets both kinds; only soft-keyword remapping changes `effective`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub original: SyntaxKind,
    pub effective: SyntaxKind,
    pub range: Range<usize>,
}

impl Token {
    pub fn new(kind: SyntaxKind, range: Range<usize>) -> Self {
        Self {
            original: kind,
            effective: kind,
            range,
        }
    }
}

impl<'t> Parser<'t> {
    /// Kind of the current token, `EOF` at the end of input
    pub fn current(&self) -> SyntaxKind {
        self.kind_at(self.pos)
    }

    /// Text of the current token (both halves of a joined token)
    pub fn current_text(&self) -> &'t str {
        if self.pos >= self.eof_at {
            return "";
        }
        let start = self.tokens[self.pos].range.start;
        let end = self.tokens[self.pos + self.token_len_at(self.pos) - 1].range.end;
        &self.source[start..end]
    }

    /// Byte range of the current token, empty at end of input
    pub fn current_range(&self) -> Range<usize> {
        if self.pos >= self.eof_at {
            let end = self.tokens.get(self.pos).map_or(self.source.len(), |t| t.range.start);
            return end..end;
        }
        let start = self.tokens[self.pos].range.start;
        let end = self.tokens[self.pos + self.token_len_at(self.pos) - 1].range.end;
        start..end
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.eof_at
    }

    /// Kind of the significant token `k` positions ahead (`lookahead(0)` is the
    /// current token). Never remaps and never records events.
    pub fn lookahead(&self, k: usize) -> SyntaxKind {
        let mut raw = self.pos;
        for _ in 0..k {
            if raw >= self.eof_at {
                return EOF;
            }
            raw = self.skip_trivia_from(raw + self.token_len_at(raw));
        }
        self.kind_at(raw)
    }

    /// Text of the significant token `k` positions ahead
    pub fn lookahead_text(&self, k: usize) -> &'t str {
        let mut raw = self.pos;
        for _ in 0..k {
            if raw >= self.eof_at {
                return "";
            }
            raw = self.skip_trivia_from(raw + self.token_len_at(raw));
        }
        if raw >= self.eof_at {
            return "";
        }
        &self.source[self.tokens[raw].range.clone()]
    }

    /// Trivia-inclusive lookup relative to the current raw position
    pub fn raw_lookup(&self, k: isize) -> SyntaxKind {
        match self.raw_index(k) {
            Some(raw) => self.tokens[raw].effective,
            None => EOF,
        }
    }

    pub fn raw_lookup_text(&self, k: isize) -> &'t str {
        match self.raw_index(k) {
            Some(raw) => &self.source[self.tokens[raw].range.clone()],
            None => "",
        }
    }

    fn raw_index(&self, k: isize) -> Option<usize> {
        let raw = self.pos.checked_add_signed(k)?;
        (raw < self.eof_at.min(self.tokens.len())).then_some(raw)
    }

    /// Whether a line break occurs in the whitespace right before the current
    /// token. Always false while newlines are disabled.
    pub fn newline_before_current(&self) -> bool {
        if !self.modes.newlines_enabled() {
            return false;
        }
        if self.at_eof() {
            return true;
        }
        let mut raw = self.pos.min(self.tokens.len());
        while raw > 0 {
            raw -= 1;
            let token = &self.tokens[raw];
            match token.original {
                EOL_COMMENT | BLOCK_COMMENT | DOC_COMMENT | SHEBANG_COMMENT => continue,
                WHITESPACE => {
                    if self.source[token.range.clone()].contains('\n') {
                        return true;
                    }
                }
                _ => return false,
            }
        }
        false
    }

    /// Consume the current token and move to the next significant one
    pub fn bump(&mut self) {
        if self.at_eof() {
            return;
        }
        let kind = self.current();
        let n_raw = self.token_len_at(self.pos);
        self.events.push(Event::Token {
            kind,
            n_raw: n_raw as u32,
        });
        self.pos += n_raw;
        self.prev_end = self.pos;
        self.pos = self.skip_trivia_from(self.pos);
    }

    /// Consume `n` tokens
    pub fn bump_n(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    /// Move past the current token without recording it, for read-only scans
    pub(super) fn step(&mut self) {
        if !self.at_eof() {
            let n_raw = self.token_len_at(self.pos);
            self.pos = self.skip_trivia_from(self.pos + n_raw);
        }
    }

    /// Run `f` with end of input forced at raw index `raw`
    pub fn with_eof_at<R>(&mut self, raw: usize, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.eof_at;
        self.eof_at = self.eof_at.min(raw);
        tracing::trace!(eof_at = self.eof_at, "entering truncated view");
        let result = f(self);
        self.eof_at = saved;
        result
    }

    /// Kind of the last consumed raw token, `EOF` before the first one
    pub fn last_token(&self) -> SyntaxKind {
        match self.prev_end.checked_sub(1) {
            Some(raw) => self.tokens[raw].effective,
            None => EOF,
        }
    }

    /// Raw index of the current token
    pub fn raw_position(&self) -> usize {
        self.pos
    }

    pub(super) fn skip_trivia_from(&self, mut raw: usize) -> usize {
        while raw < self.eof_at && self.tokens[raw].original.is_trivia() {
            raw += 1;
        }
        raw
    }

    fn kind_at(&self, raw: usize) -> SyntaxKind {
        if raw >= self.eof_at {
            return EOF;
        }
        if self.modes.joining_enabled() {
            if let Some(joined) = self.joined_at(raw) {
                return joined;
            }
        }
        self.tokens[raw].effective
    }

    /// Number of raw tokens the significant token at `raw` spans
    fn token_len_at(&self, raw: usize) -> usize {
        if self.modes.joining_enabled() && self.joined_at(raw).is_some() {
            2
        } else {
            1
        }
    }

    /// Complex token formed by `raw` and the directly adjacent raw token
    fn joined_at(&self, raw: usize) -> Option<SyntaxKind> {
        let next = raw + 1;
        if next >= self.eof_at {
            return None;
        }
        let joined = match (self.tokens[raw].effective, self.tokens[next].effective) {
            (QUEST, DOT) => SAFE_ACCESS,
            (QUEST, COLON) => ELVIS,
            (EXCL, EXCL) => EXCLEXCL,
            (EXCL, IN_KW) => NOT_IN,
            (EXCL, IS_KW) => NOT_IS,
            (AS_KW, QUEST) => AS_SAFE,
            _ => return None,
        };
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use crate::grammar::DefaultExpressions;
    use crate::parser::Parser;
    use crate::syntax::SyntaxKind::*;

    #[test]
    fn test_lookahead_skips_trivia() {
        let exprs = DefaultExpressions;
        let p = Parser::new("a /* c */ . // x\n b", &exprs);
        assert_eq!(p.current(), IDENTIFIER);
        assert_eq!(p.lookahead(1), DOT);
        assert_eq!(p.lookahead(2), IDENTIFIER);
        assert_eq!(p.lookahead(3), EOF);
        assert_eq!(p.lookahead(10), EOF);
    }

    #[test]
    fn test_raw_lookup_includes_trivia() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("a /* c */b", &exprs);
        p.bump();
        assert_eq!(p.raw_lookup(0), IDENTIFIER);
        assert_eq!(p.raw_lookup(-1), BLOCK_COMMENT);
        assert_eq!(p.raw_lookup(-2), WHITESPACE);
        assert_eq!(p.raw_lookup(-3), IDENTIFIER);
        assert_eq!(p.raw_lookup(-4), EOF);
        assert_eq!(p.raw_lookup(1), EOF);
    }

    #[test]
    fn test_newline_before_current_respects_mode() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("a // c\n  b", &exprs);
        p.bump();
        assert!(p.newline_before_current());
        p.disable_newlines();
        assert!(!p.newline_before_current());
        p.restore_newlines();
        assert!(p.newline_before_current());
    }

    #[test]
    fn test_end_of_input_counts_as_line_break() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("a", &exprs);
        p.bump();
        assert!(p.at_eof());
        assert!(p.newline_before_current());
        p.disable_newlines();
        assert!(!p.newline_before_current());
        p.restore_newlines();
    }

    #[test]
    fn test_complex_tokens_join_only_when_enabled() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("a?.b ?: c", &exprs);
        p.bump();
        assert_eq!(p.current(), SAFE_ACCESS);
        assert_eq!(p.current_text(), "?.");
        p.disable_joining();
        assert_eq!(p.current(), QUEST);
        assert_eq!(p.lookahead(1), DOT);
        p.restore_joining();
        p.bump();
        p.bump();
        assert_eq!(p.current(), ELVIS);
    }

    #[test]
    fn test_truncated_view() {
        let exprs = DefaultExpressions;
        let mut p = Parser::new("a b c", &exprs);
        let c = p.tokens().len() - 1;
        p.with_eof_at(c, |p| {
            p.bump();
            assert_eq!(p.current(), IDENTIFIER);
            p.bump();
            assert!(p.at_eof());
            assert_eq!(p.lookahead(1), EOF);
        });
        assert!(!p.at_eof());
        assert_eq!(p.current_text(), "c");
    }
}

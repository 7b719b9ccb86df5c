//! Event replay into a rowan green tree
//!
//! The parser only records significant tokens. The sink walks the raw token
//! vector alongside the events and decides, using the binders stored on each
//! node, which whitespace and comments end up inside which node. Every raw
//! token is emitted exactly once, so the tree text always equals the input.

use crate::error::{ParseError, ParseErrorKind};
use crate::parser::{Event, LeadingTrivia, Token, TrailingTrivia};
use crate::syntax::SyntaxKind::{self, *};
use rowan::{GreenNode, GreenNodeBuilder};

/// A node about to be opened
struct PendingNode {
    kind: SyntaxKind,
    leading: LeadingTrivia,
    error: Option<(String, ParseErrorKind)>,
}

/// A node currently open in the builder
struct OpenNode {
    start: usize,
    error: Option<(String, ParseErrorKind)>,
}

struct Sink<'a> {
    source: &'a str,
    tokens: &'a [Token],
    builder: GreenNodeBuilder<'static>,
    /// Next raw token to emit
    pos: usize,
    /// Byte offset of `pos`
    offset: usize,
    open: Vec<OpenNode>,
    rooted: bool,
    errors: Vec<ParseError>,
}

/// Build the tree for `events` over `tokens`, returning it with its diagnostics
pub(crate) fn build_tree(
    source: &str,
    tokens: &[Token],
    mut events: Vec<Event>,
) -> (GreenNode, Vec<ParseError>) {
    let mut sink = Sink {
        source,
        tokens,
        builder: GreenNodeBuilder::new(),
        pos: 0,
        offset: 0,
        open: Vec::new(),
        rooted: false,
        errors: Vec::new(),
    };

    for i in 0..events.len() {
        match std::mem::replace(&mut events[i], Event::tombstone()) {
            Event::Start {
                kind: TOMBSTONE,
                forward_parent: None,
                ..
            } => {}
            Event::Start {
                kind,
                forward_parent,
                leading,
                error,
            } => {
                let mut chain = vec![PendingNode {
                    kind,
                    leading,
                    error,
                }];
                let mut idx = i;
                let mut next = forward_parent;
                while let Some(distance) = next {
                    idx += distance as usize;
                    next = match events.get_mut(idx).map(|e| std::mem::replace(e, Event::tombstone())) {
                        Some(Event::Start {
                            kind,
                            forward_parent,
                            leading,
                            error,
                        }) => {
                            chain.push(PendingNode {
                                kind,
                                leading,
                                error,
                            });
                            forward_parent
                        }
                        _ => None,
                    };
                }
                chain.retain(|node| node.kind != TOMBSTONE);
                chain.reverse();
                let later = later_binders(&events[i + 1..]);
                sink.start_nodes(chain, &later);
            }
            Event::Finish { trailing } => sink.finish_node(trailing),
            Event::Token { kind, n_raw } => sink.token(kind, n_raw as usize),
            Event::Error { message, kind } => sink.zero_width_error(message, kind),
        }
    }

    sink.finish()
}

/// Leading binders of the nodes that open before the next token
fn later_binders(events: &[Event]) -> Vec<LeadingTrivia> {
    let mut binders = Vec::new();
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start {
                kind,
                forward_parent,
                leading,
                ..
            } => {
                if *kind != TOMBSTONE {
                    binders.push(*leading);
                }
                let mut idx = i;
                let mut next = *forward_parent;
                while let Some(distance) = next {
                    idx += distance as usize;
                    next = match events.get(idx) {
                        Some(Event::Start {
                            kind,
                            forward_parent,
                            leading,
                            ..
                        }) => {
                            if *kind != TOMBSTONE {
                                binders.push(*leading);
                            }
                            *forward_parent
                        }
                        _ => None,
                    };
                }
            }
            Event::Error { .. } => {}
            Event::Token { .. } | Event::Finish { .. } => break,
        }
    }
    binders
}

impl<'a> Sink<'a> {
    fn start_nodes(&mut self, chain: Vec<PendingNode>, later: &[LeadingTrivia]) {
        let run_end = self.next_significant();
        let mut splits: Vec<usize> = chain
            .iter()
            .map(|node| node.leading)
            .chain(later.iter().copied())
            .map(|binder| self.leading_split(binder, run_end))
            .collect();
        // An enclosing node starts no later than anything it contains
        for i in (0..splits.len().saturating_sub(1)).rev() {
            splits[i] = splits[i].min(splits[i + 1]);
        }

        for (node, split) in chain.into_iter().zip(splits) {
            let split = if self.open.is_empty() { self.pos } else { split };
            self.rooted = true;
            self.emit_until(split);
            self.builder.start_node(node.kind.into());
            self.open.push(OpenNode {
                start: self.offset,
                error: node.error,
            });
            if node.leading == LeadingTrivia::Shebang {
                self.absorb_shebang();
            }
        }
    }

    fn finish_node(&mut self, trailing: TrailingTrivia) {
        match self.open.len() {
            0 => {
                tracing::warn!("unbalanced finish event");
                return;
            }
            1 => {
                self.wrap_leftovers();
                self.emit_until(self.tokens.len());
            }
            _ => {
                let split = self.trailing_split(trailing);
                self.emit_until(split);
            }
        }
        self.builder.finish_node();
        if let Some(OpenNode {
            start,
            error: Some((message, kind)),
        }) = self.open.pop()
        {
            self.errors.push(ParseError {
                message,
                range: start..self.offset,
                kind,
            });
        }
    }

    fn token(&mut self, kind: SyntaxKind, n_raw: usize) {
        if self.open.is_empty() {
            tracing::warn!(?kind, "token outside of the root node");
            return;
        }
        let run_end = self.next_significant();
        self.emit_until(run_end);
        let last = (self.pos + n_raw).min(self.tokens.len());
        if last <= self.pos {
            return;
        }
        let end = self.tokens[last - 1].range.end;
        self.builder.token(kind.into(), &self.source[self.offset..end]);
        self.pos = last;
        self.offset = end;
    }

    fn zero_width_error(&mut self, message: String, kind: ParseErrorKind) {
        let at = self
            .tokens
            .get(self.next_significant())
            .map_or(self.source.len(), |t| t.range.start);
        self.errors.push(ParseError {
            message,
            range: at..at,
            kind,
        });
    }

    /// Significant tokens the grammar never consumed end up in one error node
    fn wrap_leftovers(&mut self) {
        let first = self.next_significant();
        let Some(last) = self.tokens[first.min(self.tokens.len())..]
            .iter()
            .rposition(|t| !t.original.is_trivia())
            .map(|i| first + i)
        else {
            return;
        };
        self.emit_until(first);
        let start = self.offset;
        self.builder.start_node(ERROR.into());
        self.emit_until(last + 1);
        self.builder.finish_node();
        self.errors.push(ParseError {
            message: "Unexpected symbol".to_string(),
            range: start..self.offset,
            kind: ParseErrorKind::UnexpectedToken,
        });
    }

    fn absorb_shebang(&mut self) {
        if self.tokens.get(self.pos).map(|t| t.original) != Some(SHEBANG_COMMENT) {
            return;
        }
        let mut end = self.pos + 1;
        if self.tokens.get(end).map(|t| t.original) == Some(WHITESPACE) {
            end += 1;
        }
        self.emit_until(end);
    }

    /// Where a node with `binder` starts inside the trivia run `pos..run_end`
    fn leading_split(&self, binder: LeadingTrivia, run_end: usize) -> usize {
        let run = self.pos..run_end;
        match binder {
            LeadingTrivia::Exclude => run_end,
            LeadingTrivia::All | LeadingTrivia::Shebang => self.pos,
            LeadingTrivia::DocComment => run
                .rev()
                .find(|&raw| self.tokens[raw].original == DOC_COMMENT)
                .unwrap_or(run_end),
            LeadingTrivia::Comments => {
                if let Some(doc) = run
                    .clone()
                    .rev()
                    .find(|&raw| self.tokens[raw].original == DOC_COMMENT)
                {
                    return doc;
                }
                let at_stream_edge = self.pos == 0;
                let mut split = run_end;
                for raw in run.rev() {
                    let token = &self.tokens[raw];
                    if token.original == WHITESPACE {
                        if self.text(raw).matches('\n').count() > 1 {
                            break;
                        }
                    } else if token.original.is_comment() {
                        let own_line = raw == self.pos
                            || at_stream_edge
                            || (self.tokens[raw - 1].original == WHITESPACE
                                && self.text(raw - 1).contains('\n'));
                        if own_line {
                            split = raw;
                        }
                    } else {
                        break;
                    }
                }
                split
            }
        }
    }

    /// Where a node with `binder` ends inside the trivia after its last token
    fn trailing_split(&self, binder: TrailingTrivia) -> usize {
        let run_end = self.next_significant();
        match binder {
            TrailingTrivia::Exclude => self.pos,
            TrailingTrivia::All => run_end,
            TrailingTrivia::SameLineComments => {
                let mut split = self.pos;
                for raw in self.pos..run_end {
                    let token = &self.tokens[raw];
                    if token.original == WHITESPACE {
                        if self.text(raw).contains('\n') {
                            break;
                        }
                    } else if token.original.is_comment() {
                        split = raw + 1;
                    } else {
                        break;
                    }
                }
                split
            }
        }
    }

    fn next_significant(&self) -> usize {
        let mut raw = self.pos;
        while raw < self.tokens.len() && self.tokens[raw].original.is_trivia() {
            raw += 1;
        }
        raw
    }

    fn text(&self, raw: usize) -> &'a str {
        &self.source[self.tokens[raw].range.clone()]
    }

    /// Emit raw tokens up to `end` one by one
    fn emit_until(&mut self, end: usize) {
        let end = end.min(self.tokens.len());
        while self.pos < end {
            let token = &self.tokens[self.pos];
            self.builder
                .token(token.effective.into(), &self.source[token.range.clone()]);
            self.offset = token.range.end;
            self.pos += 1;
        }
    }

    fn finish(mut self) -> (GreenNode, Vec<ParseError>) {
        if !self.rooted {
            // Nothing was parsed; keep the text under an error root
            self.builder.start_node(ERROR.into());
            self.emit_until(self.tokens.len());
            self.builder.finish_node();
        }
        while !self.open.is_empty() {
            self.finish_node(TrailingTrivia::All);
        }
        self.errors.sort_by_key(|e| e.range.start);
        (self.builder.finish(), self.errors)
    }
}

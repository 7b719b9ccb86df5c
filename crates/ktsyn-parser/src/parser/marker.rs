//! Markers: the only way productions shape the tree
//!
//! A [`Marker`] records where a node starts together with a snapshot of the
//! parser state. Every state-changing operation takes the marker by value, so a
//! marker that was committed or dropped can no longer be rolled back.

use super::{Event, ModeStack, Parser};
use crate::error::ParseErrorKind;
use crate::syntax::SyntaxKind::{self, *};

/// Which trivia in front of a node's first token the node takes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LeadingTrivia {
    /// Preceding trivia stays with the parent or previous sibling
    #[default]
    Exclude,
    /// From the first doc comment of the preceding run onward
    DocComment,
    /// The comments directly preceding, up to a blank line
    Comments,
    /// A shebang line at the start of the file and the whitespace after it
    Shebang,
    /// All preceding trivia
    All,
}

/// Which trivia after a node's last token the node takes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingTrivia {
    #[default]
    Exclude,
    /// Comments that start on the same line as the last token
    SameLineComments,
    All,
}

/// Parser state a marker can be rolled back to
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pos: usize,
    prev_end: usize,
    events: usize,
    remaps: usize,
    forward_links: usize,
    modes: ModeStack,
}

/// An open node
#[must_use = "markers must be committed, dropped or rolled back"]
#[derive(Debug)]
pub struct Marker {
    start: usize,
    snapshot: Snapshot,
}

/// A committed node, which can still be wrapped with [`CompletedMarker::precede`]
#[derive(Debug, Clone)]
pub struct CompletedMarker {
    start: usize,
    kind: SyntaxKind,
    snapshot: Snapshot,
}

impl<'t> Parser<'t> {
    /// Open a marker at the current token
    pub fn start(&mut self) -> Marker {
        let snapshot = self.snapshot();
        let start = self.events.len();
        self.events.push(Event::tombstone());
        Marker { start, snapshot }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            prev_end: self.prev_end,
            events: self.events.len(),
            remaps: self.remaps.len(),
            forward_links: self.forward_links.len(),
            modes: self.modes.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.prev_end = snapshot.prev_end;
        self.events.truncate(snapshot.events);
        while self.remaps.len() > snapshot.remaps {
            if let Some(remap) = self.remaps.pop() {
                self.tokens[remap.raw].effective = remap.previous;
            }
        }
        self.unlink_forward_parents(snapshot.forward_links);
        self.modes = snapshot.modes;
    }

    /// Clear every `forward_parent` set after the first `keep` links
    fn unlink_forward_parents(&mut self, keep: usize) {
        while self.forward_links.len() > keep {
            let Some(idx) = self.forward_links.pop() else {
                break;
            };
            if let Some(Event::Start { forward_parent, .. }) = self.events.get_mut(idx) {
                *forward_parent = None;
            }
        }
    }

    /// Whether any token was consumed since `snapshot` was taken
    fn consumed_since(&self, snapshot: &Snapshot) -> bool {
        self.prev_end > snapshot.pos
    }
}

impl Marker {
    /// Close the marker as a node of `kind`
    pub fn commit(self, p: &mut Parser<'_>, kind: SyntaxKind) -> CompletedMarker {
        self.commit_with(p, kind, LeadingTrivia::Exclude, TrailingTrivia::Exclude)
    }

    /// Close the marker as a node of `kind` that binds the given trivia
    pub fn commit_with(
        self,
        p: &mut Parser<'_>,
        kind: SyntaxKind,
        leading: LeadingTrivia,
        trailing: TrailingTrivia,
    ) -> CompletedMarker {
        self.close(p, kind, leading, trailing, None)
    }

    fn close(
        self,
        p: &mut Parser<'_>,
        kind: SyntaxKind,
        leading: LeadingTrivia,
        trailing: TrailingTrivia,
        error: Option<(String, ParseErrorKind)>,
    ) -> CompletedMarker {
        if let Event::Start {
            kind: slot,
            leading: slot_leading,
            error: slot_error,
            ..
        } = &mut p.events[self.start]
        {
            *slot = kind;
            *slot_leading = leading;
            *slot_error = error;
        }
        p.events.push(Event::Finish { trailing });
        CompletedMarker {
            start: self.start,
            kind,
            snapshot: self.snapshot,
        }
    }

    /// Forget the grouping; children stay where they are
    pub fn drop(self, p: &mut Parser<'_>) {
        if let Event::Start { kind, .. } = &mut p.events[self.start] {
            *kind = TOMBSTONE;
        }
    }

    /// Undo everything done since the marker was opened
    pub fn rollback(self, p: &mut Parser<'_>) {
        tracing::trace!(
            from = p.pos,
            to = self.snapshot.pos,
            events = p.events.len() - self.snapshot.events,
            "rollback"
        );
        p.restore(self.snapshot);
    }

    /// Close the marker as an ERROR node. A marker that spans no token yields a
    /// zero-width diagnostic instead of an empty node.
    pub fn error(self, p: &mut Parser<'_>, message: impl Into<String>) {
        self.error_with(p, ParseErrorKind::UnexpectedToken, message);
    }

    pub fn error_with(self, p: &mut Parser<'_>, kind: ParseErrorKind, message: impl Into<String>) {
        if p.consumed_since(&self.snapshot) {
            self.close(
                p,
                ERROR,
                LeadingTrivia::Exclude,
                TrailingTrivia::Exclude,
                Some((message.into(), kind)),
            );
        } else {
            self.drop(p);
            p.error_with(kind, message);
        }
    }

    /// Replace everything consumed since the marker was opened with a single
    /// token of `kind`
    pub fn collapse(self, p: &mut Parser<'_>, kind: SyntaxKind) {
        let n_raw = p.prev_end.saturating_sub(self.snapshot.pos);
        p.unlink_forward_parents(self.snapshot.forward_links);
        p.events.truncate(self.start);
        if n_raw > 0 {
            p.events.push(Event::Token {
                kind,
                n_raw: n_raw as u32,
            });
        }
    }
}

impl CompletedMarker {
    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    /// Open a marker that becomes the parent of this node once committed
    pub fn precede(&self, p: &mut Parser<'_>) -> Marker {
        let new_start = p.events.len();
        let mut idx = self.start;
        while let Event::Start {
            forward_parent: Some(distance),
            ..
        } = p.events[idx]
        {
            idx += distance as usize;
        }
        if let Event::Start { forward_parent, .. } = &mut p.events[idx] {
            *forward_parent = Some((new_start - idx) as u32);
        }
        p.forward_links.push(idx);
        p.events.push(Event::tombstone());
        Marker {
            start: new_start,
            snapshot: self.snapshot.clone(),
        }
    }
}

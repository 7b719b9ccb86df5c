//! Parser events
//!
//! Productions never build tree nodes directly. They append events to a flat
//! log which the sink replays into a rowan green tree once parsing is done.

use super::marker::{LeadingTrivia, TrailingTrivia};
use crate::error::ParseErrorKind;
use crate::syntax::SyntaxKind::{self, TOMBSTONE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    /// Opens a node. A `TOMBSTONE` kind marks a dropped or pending marker.
    ///
    /// `forward_parent` is the distance to a later `Start` that becomes this
    /// node's parent (see `CompletedMarker::precede`).
    Start {
        kind: SyntaxKind,
        forward_parent: Option<u32>,
        leading: LeadingTrivia,
        error: Option<(String, ParseErrorKind)>,
    },
    Finish {
        trailing: TrailingTrivia,
    },
    /// One significant token spanning `n_raw` raw tokens (two for joined tokens,
    /// more for collapsed runs)
    Token {
        kind: SyntaxKind,
        n_raw: u32,
    },
    /// Zero-width diagnostic
    Error {
        message: String,
        kind: ParseErrorKind,
    },
}

impl Event {
    pub(crate) fn tombstone() -> Self {
        Event::Start {
            kind: TOMBSTONE,
            forward_parent: None,
            leading: LeadingTrivia::Exclude,
            error: None,
        }
    }
}

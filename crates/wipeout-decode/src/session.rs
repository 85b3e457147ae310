//! Per-decode diagnostic context.

use std::collections::HashSet;

use crate::record::PrimitiveKind;

/// Diagnostic state owned by the caller of a decode.
///
/// Records which primitive kinds have been seen so that the first occurrence
/// of each is logged once. It never influences what a decoder produces, so
/// reusing a session across calls only changes logging.
#[derive(Debug, Default)]
pub struct DecodeSession {
    seen: HashSet<PrimitiveKind>,
}

impl DecodeSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that a record of `kind` was encountered at `offset`.
    pub fn note(&mut self, kind: PrimitiveKind, offset: usize) {
        if self.seen.insert(kind) {
            tracing::debug!(?kind, tag = kind.tag(), offset, "first primitive of kind");
        }
    }

    /// Whether a record of `kind` has been noted.
    #[must_use]
    pub fn has_seen(&self, kind: PrimitiveKind) -> bool {
        self.seen.contains(&kind)
    }

    /// Kinds seen so far, in tag order.
    #[must_use]
    pub fn seen_kinds(&self) -> Vec<PrimitiveKind> {
        let mut kinds: Vec<_> = self.seen.iter().copied().collect();
        kinds.sort_by_key(|kind| kind.tag());
        kinds
    }
}

//! Playback session: the queue being read, the cursor into it and the
//! pending inter-article advance.

use super::PlaybackMode;
use crate::article::Article;
use std::time::Instant;

/// Scheduled move to the next article after the inter-article pause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAdvance {
    pub due: Instant,
}

/// One play or play-all request, from start until stop or completion.
///
/// `cursor` stays within `0..=queue.len()`; `queue.len()` means exhausted.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    queue: Vec<Article>,
    cursor: usize,
    mode: PlaybackMode,
    pending_advance: Option<PendingAdvance>,
}

impl PlaybackSession {
    /// Session reading a single article.
    pub fn single(article: Article) -> Self {
        Self {
            queue: vec![article],
            cursor: 0,
            mode: PlaybackMode::Single,
            pending_advance: None,
        }
    }

    /// Session reading `queue` front to back.
    pub fn play_all(queue: Vec<Article>) -> Self {
        Self {
            queue,
            cursor: 0,
            mode: PlaybackMode::PlayAll,
            pending_advance: None,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn queue(&self) -> &[Article] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Article under the cursor (`None` once exhausted)
    pub fn current(&self) -> Option<&Article> {
        self.queue.get(self.cursor)
    }

    /// Whether a play-all session has another article after the cursor
    pub fn has_next(&self) -> bool {
        self.mode == PlaybackMode::PlayAll && self.cursor + 1 < self.queue.len()
    }

    /// Move the cursor forward by one, up to the exhausted position.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.queue.len());
    }

    /// Move the cursor by `delta` within `[0, len - 1]`.
    ///
    /// Only play-all sessions can be stepped. Returns `false` when the cursor
    /// did not move (single mode, or already at the boundary).
    pub fn step(&mut self, delta: isize) -> bool {
        if self.mode != PlaybackMode::PlayAll || self.queue.is_empty() {
            return false;
        }
        let last = self.queue.len() - 1;
        let target = self
            .cursor
            .min(last)
            .saturating_add_signed(delta)
            .min(last);
        if target == self.cursor {
            return false;
        }
        self.cursor = target;
        true
    }

    pub fn schedule_advance(&mut self, due: Instant) {
        self.pending_advance = Some(PendingAdvance { due });
    }

    pub fn cancel_advance(&mut self) -> Option<PendingAdvance> {
        self.pending_advance.take()
    }

    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.pending_advance
    }

    /// Take the pending advance if it is due at `now`.
    pub fn take_due_advance(&mut self, now: Instant) -> Option<PendingAdvance> {
        match self.pending_advance {
            Some(pending) if pending.due <= now => self.pending_advance.take(),
            _ => None,
        }
    }
}

//! Pending notice queue and overflow counter.

use std::collections::VecDeque;

use notice_protocol::Notice;

#[derive(Debug, Clone)]
struct Queued {
    notice: Notice,
    /// Ingest sequence number of the batch this notice came from.
    batch: u64,
}

/// FIFO of not-yet-displayed notices plus the overflow count of the last
/// decoded batch.
///
/// Append-only until drained: repeated titles or URLs are never merged.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    pending: VecDeque<Queued>,
    disabled_count: u32,
    overflow_shown: bool,
    batches: u64,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch's notices in source order and replaces the overflow
    /// count with the batch's.
    pub fn ingest(&mut self, notices: Vec<Notice>, disabled_count: u32) {
        self.batches += 1;
        let batch = self.batches;
        self.pending
            .extend(notices.into_iter().map(|notice| Queued { notice, batch }));
        self.disabled_count = disabled_count;
        self.overflow_shown = false;
    }

    /// Pops the head notice together with the number of notices from the
    /// same batch still waiting behind it.
    pub fn pop(&mut self) -> Option<(Notice, usize)> {
        let head = self.pending.pop_front()?;
        let others = self
            .pending
            .iter()
            .filter(|q| q.batch == head.batch)
            .count();
        Some((head.notice, others))
    }

    /// Returns the overflow count the first time it is asked for after an
    /// ingest, if it is non-zero. The count itself is left untouched.
    pub fn take_overflow(&mut self) -> Option<u32> {
        if self.overflow_shown || self.disabled_count == 0 {
            return None;
        }
        self.overflow_shown = true;
        Some(self.disabled_count)
    }

    /// Drops every pending notice. The overflow count is kept.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Whether anything is waiting: itemized notices or an overflow count.
    pub fn has_work(&self) -> bool {
        !self.pending.is_empty() || self.disabled_count > 0
    }

    pub fn disabled_count(&self) -> u32 {
        self.disabled_count
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Iterates pending notices head first.
    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.pending.iter().map(|q| &q.notice)
    }
}

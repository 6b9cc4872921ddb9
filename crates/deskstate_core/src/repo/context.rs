//! Deadline-bound request context.
//!
//! A [`RequestContext`] is created per request and passed by `&mut` into
//! every store call. It owns the request deadline and, when opened with
//! [`RequestContext::with_journal`], the request's [`UpdateJournal`].

use super::journal::{UpdateBatch, UpdateJournal, UpdateRecord};
use super::object_store::{StoreError, StoreResult};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RequestContext {
    deadline: Instant,
    journal: Option<UpdateJournal>,
}

impl RequestContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline,
            journal: None,
        }
    }

    /// Attaches an empty journal. A context that already carries one is
    /// returned unchanged.
    pub fn with_journal(mut self) -> Self {
        if self.journal.is_none() {
            self.journal = Some(UpdateJournal::new());
        }
        self
    }

    pub fn has_journal(&self) -> bool {
        self.journal.is_some()
    }

    pub fn journal(&self) -> Option<&UpdateJournal> {
        self.journal.as_ref()
    }

    /// Returns the accumulated batch without clearing it.
    ///
    /// Empty when the context was never journaled.
    pub fn drain_journal(&self) -> UpdateBatch {
        self.journal
            .as_ref()
            .map(UpdateJournal::to_batch)
            .unwrap_or_default()
    }

    pub(crate) fn record(&mut self, record: UpdateRecord) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(record);
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn check_deadline(&self) -> StoreResult<()> {
        if self.is_expired() {
            return Err(StoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Runs `f` with the deadline narrowed to at most `timeout` from now.
    ///
    /// The journal stays shared with the caller; the original deadline is
    /// restored afterwards.
    pub fn scoped<R>(&mut self, timeout: Duration, f: impl FnOnce(&mut Self) -> R) -> R {
        let outer = self.deadline;
        self.deadline = outer.min(Instant::now() + timeout);
        let result = f(self);
        self.deadline = outer;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::RequestContext;
    use crate::model::Tab;
    use crate::repo::journal::{UpdateRecord, UpdateType};
    use crate::repo::object_store::StoreError;
    use std::time::Duration;

    fn record() -> UpdateRecord {
        UpdateRecord::for_object(UpdateType::Created, &Tab::new("T"))
    }

    #[test]
    fn with_journal_is_idempotent() {
        let mut ctx = RequestContext::with_timeout(Duration::from_secs(1)).with_journal();
        ctx.record(record());
        let ctx = ctx.with_journal();
        assert_eq!(ctx.drain_journal().len(), 1);
    }

    #[test]
    fn unjournaled_context_drops_records() {
        let mut ctx = RequestContext::with_timeout(Duration::from_secs(1));
        ctx.record(record());
        assert!(!ctx.has_journal());
        assert!(ctx.drain_journal().is_empty());
    }

    #[test]
    fn drain_does_not_clear() {
        let mut ctx = RequestContext::with_timeout(Duration::from_secs(1)).with_journal();
        ctx.record(record());
        assert_eq!(ctx.drain_journal().len(), 1);
        assert_eq!(ctx.drain_journal().len(), 1);
    }

    #[test]
    fn zero_timeout_is_expired() {
        let ctx = RequestContext::with_timeout(Duration::ZERO);
        assert!(matches!(
            ctx.check_deadline(),
            Err(StoreError::DeadlineExceeded)
        ));
    }

    #[test]
    fn scoped_narrows_and_restores_deadline() {
        let mut ctx = RequestContext::with_timeout(Duration::from_secs(60)).with_journal();
        let outer = ctx.deadline();

        let inner = ctx.scoped(Duration::from_millis(10), |scoped| {
            scoped.record(record());
            scoped.deadline()
        });

        assert!(inner < outer);
        assert_eq!(ctx.deadline(), outer);
        assert_eq!(ctx.drain_journal().len(), 1);
    }

    #[test]
    fn scoped_never_extends_deadline() {
        let mut ctx = RequestContext::with_timeout(Duration::from_millis(5));
        let outer = ctx.deadline();
        let inner = ctx.scoped(Duration::from_secs(60), |scoped| scoped.deadline());
        assert_eq!(inner, outer);
    }
}

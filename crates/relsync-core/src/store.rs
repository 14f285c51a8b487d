use crate::filter::Filter;
use crate::ticket::{Mutations, Ticket};
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("ticket store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("ticket store unreachable: {0}")]
    Transport(String),

    #[error("unexpected ticket store response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ---------------------------------------------------------------------------
// TicketStore
// ---------------------------------------------------------------------------

/// The project-tracking system the reconcilers read from and write to.
///
/// Every call reports failure as a `StoreError`; whether to continue is the
/// caller's decision.
pub trait TicketStore {
    /// Tickets matching `filter`, carrying the requested `fields` (by id).
    fn query(&self, fields: &[&str], filter: &Filter) -> StoreResult<Vec<Ticket>>;

    fn update_fields(&self, key: &str, mutations: &Mutations) -> StoreResult<()>;

    fn add_comment(&self, key: &str, text: &str) -> StoreResult<()>;
}

impl<S: TicketStore + ?Sized> TicketStore for &S {
    fn query(&self, fields: &[&str], filter: &Filter) -> StoreResult<Vec<Ticket>> {
        (**self).query(fields, filter)
    }

    fn update_fields(&self, key: &str, mutations: &Mutations) -> StoreResult<()> {
        (**self).update_fields(key, mutations)
    }

    fn add_comment(&self, key: &str, text: &str) -> StoreResult<()> {
        (**self).add_comment(key, text)
    }
}

// ---------------------------------------------------------------------------
// DryRunStore
// ---------------------------------------------------------------------------

/// Forwards queries to `inner` but only logs updates and comments.
#[derive(Debug)]
pub struct DryRunStore<S> {
    inner: S,
}

impl<S: TicketStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: TicketStore> TicketStore for DryRunStore<S> {
    fn query(&self, fields: &[&str], filter: &Filter) -> StoreResult<Vec<Ticket>> {
        self.inner.query(fields, filter)
    }

    fn update_fields(&self, key: &str, mutations: &Mutations) -> StoreResult<()> {
        let payload = serde_json::to_string(mutations).unwrap_or_default();
        info!(key, %payload, "dry-run: skipping update");
        Ok(())
    }

    fn add_comment(&self, key: &str, text: &str) -> StoreResult<()> {
        info!(key, text, "dry-run: skipping comment");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn dry_run_reads_but_never_writes() {
        let store = MemoryStore::new(vec![("Tagged", "cf_tagged")]);
        store.insert(Ticket::new("RUN-1"));
        let dry = DryRunStore::new(&store);

        let found = dry
            .query(&["key"], &Filter::is_empty("Tagged"))
            .unwrap();
        assert_eq!(found.len(), 1);

        dry.update_fields("RUN-1", &Mutations::new().add("cf_tagged", "org/a"))
            .unwrap();
        dry.add_comment("RUN-1", "hello").unwrap();

        assert!(store.updates().is_empty());
        assert!(store.comments().is_empty());
        assert_eq!(store.labels("RUN-1", "cf_tagged"), None);
    }

    #[test]
    fn store_error_display_includes_body() {
        let err = StoreError::Status {
            status: 400,
            body: "{\"errorMessages\":[\"bad jql\"]}".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad jql"));
    }
}

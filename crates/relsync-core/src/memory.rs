//! In-process ticket store used by the reconciler tests.

use crate::config::FieldMap;
use crate::filter::Filter;
use crate::store::{StoreError, StoreResult, TicketStore};
use crate::ticket::{FieldOp, Mutations, Ticket};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailOn {
    Query,
    Update,
    Comment,
}

/// Evaluates filters against tickets held in memory and records every write.
///
/// Filters name fields by clause; tickets hold fields by id. Clauses without
/// an alias are looked up verbatim.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    aliases: HashMap<String, String>,
    tickets: RefCell<BTreeMap<String, Ticket>>,
    queries: RefCell<Vec<Filter>>,
    updates: RefCell<Vec<(String, Mutations)>>,
    comments: RefCell<Vec<(String, String)>>,
    fail_on: Cell<Option<FailOn>>,
    ignore_filters: Cell<bool>,
}

impl MemoryStore {
    pub(crate) fn new<'a>(aliases: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            aliases: aliases
                .into_iter()
                .map(|(clause, id)| (clause.to_string(), id.to_string()))
                .collect(),
            ..Self::default()
        }
    }

    pub(crate) fn for_fields(fields: &FieldMap) -> Self {
        Self::new(fields.aliases())
    }

    pub(crate) fn insert(&self, ticket: Ticket) {
        self.tickets.borrow_mut().insert(ticket.key.clone(), ticket);
    }

    /// Insert a ticket whose label fields hold the given repositories.
    pub(crate) fn insert_labels(&self, key: &str, labels: &[(&str, &[&str])]) {
        let mut ticket = Ticket::new(key);
        for (field, repos) in labels {
            ticket
                .fields
                .insert(field.to_string(), Value::from(repos.to_vec()));
        }
        self.insert(ticket);
    }

    pub(crate) fn fail_on(&self, op: FailOn) {
        self.fail_on.set(Some(op));
    }

    /// Return every ticket from `query`, as a search index lagging behind
    /// recent updates would.
    pub(crate) fn ignore_filters(&self) {
        self.ignore_filters.set(true);
    }

    pub(crate) fn labels(&self, key: &str, field: &str) -> Option<BTreeSet<String>> {
        self.tickets.borrow().get(key)?.labels(field)
    }

    pub(crate) fn text(&self, key: &str, field: &str) -> Option<String> {
        self.tickets
            .borrow()
            .get(key)?
            .text(field)
            .map(str::to_string)
    }

    pub(crate) fn queries(&self) -> Vec<Filter> {
        self.queries.borrow().clone()
    }

    pub(crate) fn updates(&self) -> Vec<(String, Mutations)> {
        self.updates.borrow().clone()
    }

    pub(crate) fn comments(&self) -> Vec<(String, String)> {
        self.comments.borrow().clone()
    }

    fn resolve<'a>(&'a self, clause: &'a str) -> &'a str {
        self.aliases.get(clause).map(String::as_str).unwrap_or(clause)
    }

    fn matches(&self, ticket: &Ticket, filter: &Filter) -> bool {
        match filter {
            Filter::Contains { field, value } => ticket
                .labels(self.resolve(field))
                .is_some_and(|s| s.contains(value)),
            Filter::NotContains { field, value } => ticket
                .labels(self.resolve(field))
                .is_some_and(|s| !s.is_empty() && !s.contains(value)),
            Filter::IsEmpty { field } => ticket
                .labels(self.resolve(field))
                .map_or(true, |s| s.is_empty()),
            Filter::And(items) => items.iter().all(|f| self.matches(ticket, f)),
            Filter::Or(items) => items.iter().any(|f| self.matches(ticket, f)),
        }
    }

    fn check(&self, op: FailOn) -> StoreResult<()> {
        if self.fail_on.get() == Some(op) {
            return Err(StoreError::Status {
                status: 500,
                body: format!("injected {op:?} failure"),
            });
        }
        Ok(())
    }
}

impl TicketStore for MemoryStore {
    fn query(&self, fields: &[&str], filter: &Filter) -> StoreResult<Vec<Ticket>> {
        self.queries.borrow_mut().push(filter.clone());
        self.check(FailOn::Query)?;
        let tickets = self.tickets.borrow();
        Ok(tickets
            .values()
            .filter(|t| self.ignore_filters.get() || self.matches(t, filter))
            .map(|t| Ticket {
                key: t.key.clone(),
                fields: t
                    .fields
                    .iter()
                    .filter(|(id, _)| fields.contains(&id.as_str()))
                    .map(|(id, v)| (id.clone(), v.clone()))
                    .collect(),
            })
            .collect())
    }

    fn update_fields(&self, key: &str, mutations: &Mutations) -> StoreResult<()> {
        self.check(FailOn::Update)?;
        let mut tickets = self.tickets.borrow_mut();
        let ticket = tickets.get_mut(key).ok_or_else(|| StoreError::Status {
            status: 404,
            body: format!("issue {key} does not exist"),
        })?;
        for (field, ops) in &mutations.update {
            for op in ops {
                match op {
                    FieldOp::Set(v) => {
                        ticket.fields.insert(field.clone(), Value::from(v.as_str()));
                    }
                    FieldOp::Add(v) => {
                        let slot = ticket.fields.entry(field.clone()).or_insert(Value::Null);
                        if !slot.is_array() {
                            *slot = Value::Array(Vec::new());
                        }
                        if let Value::Array(items) = slot {
                            if !items.iter().any(|i| i.as_str() == Some(v.as_str())) {
                                items.push(Value::from(v.as_str()));
                            }
                        }
                    }
                }
            }
        }
        self.updates
            .borrow_mut()
            .push((key.to_string(), mutations.clone()));
        Ok(())
    }

    fn add_comment(&self, key: &str, text: &str) -> StoreResult<()> {
        self.check(FailOn::Comment)?;
        self.comments
            .borrow_mut()
            .push((key.to_string(), text.to_string()));
        Ok(())
    }
}

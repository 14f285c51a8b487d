use crate::config::{AggregateGroup, Config, FieldMap, StandaloneRepo};
use crate::filter::Filter;
use crate::release::{Release, ReleaseMode};
use crate::report::{StepFailure, StepReport, TicketChange};
use crate::store::{StoreError, TicketStore};
use crate::ticket::{Mutations, Ticket};
use crate::types::{Stage, CODE_STATUS_PRODUCTION};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Step names
// ---------------------------------------------------------------------------

pub const STEP_MERGE: &str = "merge";
pub const STEP_TAGGING: &str = "micro-service-tagging";
pub const STEP_STANDALONE: &str = "standalone-release";

pub fn aggregate_step(group: &AggregateGroup) -> String {
    format!("aggregate-release:{}", group.name)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// `repo` reached develop but not master.
pub fn merge_filter(fields: &FieldMap, repo: &str) -> Filter {
    Filter::contains(fields.clause(Stage::Develop), repo)
        .and(Filter::lacks(fields.clause(Stage::Master), repo))
}

/// `repo` reached master but was not tagged yet.
pub fn tagging_filter(fields: &FieldMap, repo: &str) -> Filter {
    Filter::contains(fields.clause(Stage::Master), repo)
        .and(Filter::lacks(fields.clause(Stage::Tagged), repo))
}

/// Some member of `group` is tagged but not in production.
///
/// `None` for a group without members.
pub fn aggregate_filter(fields: &FieldMap, group: &AggregateGroup) -> Option<Filter> {
    Filter::any(group.members.iter().map(|m| {
        Filter::contains(fields.clause(Stage::Tagged), m.as_str())
            .and(Filter::lacks(fields.clause(Stage::Production), m.as_str()))
    }))
}

/// Repositories an aggregate release moves to production on one ticket:
/// `(tagged ∩ group) − prod`, in sorted order.
pub fn aggregate_promotions(
    group: &AggregateGroup,
    tagged: Option<BTreeSet<String>>,
    prod: Option<BTreeSet<String>>,
) -> Vec<String> {
    let tagged = tagged.unwrap_or_default();
    let diff: BTreeSet<String> = match prod {
        None => tagged,
        Some(prod) => tagged.difference(&prod).cloned().collect(),
    };
    diff.into_iter().filter(|r| group.contains(r)).collect()
}

/// Timestamp format written to the last-production-update field.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Applies merge and release events to tickets held in a [`TicketStore`].
///
/// Each step is a single pass: query, then update and comment ticket by
/// ticket. Store failures are logged and recorded in the step's report;
/// the pass carries on with the next call.
pub struct Reconciler<'a, S> {
    config: &'a Config,
    store: S,
    clock: fn() -> DateTime<Utc>,
}

impl<'a, S: TicketStore> Reconciler<'a, S> {
    pub fn new(config: &'a Config, store: S) -> Self {
        Self {
            config,
            store,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn fields(&self) -> &FieldMap {
        &self.config.fields
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    /// Move tickets waiting on `repo`'s merge to the master stage.
    pub fn merge(&self, repo: &str) -> StepReport {
        let mut report = StepReport::new(STEP_MERGE, repo);
        let master = self.fields().master_repos.id.as_str();

        for ticket in self.select(&mut report, &["key"], &merge_filter(self.fields(), repo)) {
            info!(key = %ticket.key, repo, "promoting to master");
            self.update(
                &mut report,
                &ticket.key,
                &Mutations::new().add(master, repo),
                vec![repo.to_string()],
            );
            self.comment(
                &mut report,
                &ticket.key,
                &format!("merged to master using repository: {repo}"),
            );
        }
        report
    }

    // -----------------------------------------------------------------------
    // Release dispatch
    // -----------------------------------------------------------------------

    /// Run every step `release` calls for, in order.
    pub fn release(&self, release: &Release) -> Vec<StepReport> {
        info!(
            repo = %release.repo,
            version = %release.version,
            mode = release.mode.as_str(),
            "dispatching release"
        );
        match &release.mode {
            ReleaseMode::Standalone { version_field } => {
                let standalone = StandaloneRepo {
                    repo: release.repo.clone(),
                    version_field: version_field.clone(),
                };
                vec![self.release_standalone(&standalone, &release.version)]
            }
            ReleaseMode::MicroService => {
                vec![self.tag_micro_service(&release.repo, &release.version)]
            }
            ReleaseMode::AggregateRoot { aggregates } => {
                let mut steps = vec![self.tag_micro_service(&release.repo, &release.version)];
                for name in aggregates {
                    match self.config.aggregate(name) {
                        Ok(group) => steps.push(self.release_aggregate(group, &release.version)),
                        Err(e) => warn!(aggregate = %name, error = %e, "skipping aggregate"),
                    }
                }
                steps
            }
        }
    }

    // -----------------------------------------------------------------------
    // Micro-service tagging
    // -----------------------------------------------------------------------

    /// Mark tickets merged through `repo` as tagged for production.
    pub fn tag_micro_service(&self, repo: &str, version: &str) -> StepReport {
        let mut report = StepReport::new(STEP_TAGGING, repo);
        let tagged = self.fields().tagged_repos.id.as_str();

        for ticket in self.select(&mut report, &["key"], &tagging_filter(self.fields(), repo)) {
            info!(key = %ticket.key, repo, version, "tagging for production");
            self.comment(
                &mut report,
                &ticket.key,
                &format!("micro-service-tagged-for-production at: {repo}. tag: {version}"),
            );
            self.update(
                &mut report,
                &ticket.key,
                &Mutations::new().add(tagged, repo),
                vec![repo.to_string()],
            );
        }
        report
    }

    // -----------------------------------------------------------------------
    // Standalone release
    // -----------------------------------------------------------------------

    /// Release a directly deployable repository straight to production.
    pub fn release_standalone(&self, standalone: &StandaloneRepo, version: &str) -> StepReport {
        let repo = standalone.repo.as_str();
        let mut report = StepReport::new(STEP_STANDALONE, repo);
        let now = format_timestamp((self.clock)());
        let fields = self.fields();

        for ticket in self.select(&mut report, &["key"], &tagging_filter(fields, repo)) {
            info!(key = %ticket.key, repo, version, "releasing standalone repo");
            let mutations = Mutations::new()
                .set(&standalone.version_field, version)
                .set(&fields.last_prod_update, &now)
                .set(&fields.code_status, CODE_STATUS_PRODUCTION)
                .add(&fields.tagged_repos.id, repo)
                .add(&fields.prod_repos.id, repo);
            self.update(&mut report, &ticket.key, &mutations, vec![repo.to_string()]);
            self.comment(
                &mut report,
                &ticket.key,
                &format!("released-to-production: {repo}. tag: {version}"),
            );
        }
        report
    }

    // -----------------------------------------------------------------------
    // Aggregate release
    // -----------------------------------------------------------------------

    /// Release an aggregate: promote every member tagged since the previous
    /// release of `group` on each affected ticket.
    pub fn release_aggregate(&self, group: &AggregateGroup, version: &str) -> StepReport {
        let mut report = StepReport::new(aggregate_step(group), &group.root);
        let Some(filter) = aggregate_filter(self.fields(), group) else {
            warn!(aggregate = %group.name, "aggregate has no members; nothing to release");
            return report;
        };
        let now = format_timestamp((self.clock)());
        let fields = self.fields();
        let tagged_id = fields.tagged_repos.id.as_str();
        let prod_id = fields.prod_repos.id.as_str();

        for ticket in self.select(&mut report, &["key", prod_id, tagged_id], &filter) {
            let promote =
                aggregate_promotions(group, ticket.labels(tagged_id), ticket.labels(prod_id));
            if promote.is_empty() {
                report.skipped.push(ticket.key.clone());
                continue;
            }
            info!(
                key = %ticket.key,
                aggregate = %group.name,
                version,
                repos = ?promote,
                "promoting to production"
            );

            let mut mutations = Mutations::new();
            for repo in &promote {
                mutations = mutations.add(prod_id, repo);
            }
            let mutations = mutations
                .set(&group.version_field, version)
                .set(&fields.last_prod_update, &now)
                .set(&fields.code_status, CODE_STATUS_PRODUCTION);
            self.update(&mut report, &ticket.key, &mutations, promote);
            self.comment(
                &mut report,
                &ticket.key,
                &format!("released-{}-to-production. tag: {version}", group.name),
            );
        }
        report
    }

    // -----------------------------------------------------------------------
    // Store calls
    // -----------------------------------------------------------------------

    fn select(&self, report: &mut StepReport, fields: &[&str], filter: &Filter) -> Vec<Ticket> {
        match self.store.query(fields, filter) {
            Ok(tickets) => {
                info!(step = %report.step, count = tickets.len(), "tickets selected");
                report.selected = tickets.iter().map(|t| t.key.clone()).collect();
                tickets
            }
            Err(e) => {
                record_failure(report, None, "query", e);
                Vec::new()
            }
        }
    }

    fn update(&self, report: &mut StepReport, key: &str, mutations: &Mutations, repos: Vec<String>) {
        match self.store.update_fields(key, mutations) {
            Ok(()) => report.changed.push(TicketChange {
                key: key.to_string(),
                repos,
            }),
            Err(e) => record_failure(report, Some(key), "update", e),
        }
    }

    fn comment(&self, report: &mut StepReport, key: &str, text: &str) {
        if let Err(e) = self.store.add_comment(key, text) {
            record_failure(report, Some(key), "comment", e);
        }
    }
}

fn record_failure(report: &mut StepReport, key: Option<&str>, operation: &str, err: StoreError) {
    warn!(
        step = %report.step,
        key = key.unwrap_or("-"),
        operation,
        error = %err,
        "ticket store call failed; continuing"
    );
    report.failures.push(StepFailure {
        key: key.map(str::to_string),
        operation: operation.to_string(),
        error: err.to_string(),
    });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

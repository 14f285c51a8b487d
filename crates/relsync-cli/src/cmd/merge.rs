use crate::cmd::open_store;
use crate::output::print_report;
use relsync_core::{config::Config, reconcile::Reconciler, report::RunReport};

pub fn run(config: &Config, repo: &str, dry_run: bool, json: bool) -> anyhow::Result<()> {
    anyhow::ensure!(!repo.trim().is_empty(), "repository must not be empty");
    let store = open_store(config, dry_run)?;

    let step = Reconciler::new(config, store.as_ref()).merge(repo);
    let report = RunReport {
        repo: repo.to_string(),
        version: None,
        mode: None,
        dry_run,
        steps: vec![step],
    };
    print_report(&report, json)
}

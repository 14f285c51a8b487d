use crate::cmd::open_store;
use crate::output::print_report;
use anyhow::Context;
use relsync_core::{config::Config, reconcile::Reconciler, release::Release, report::RunReport};

pub fn run(
    config: &Config,
    repo: &str,
    git_ref: &str,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    anyhow::ensure!(!repo.trim().is_empty(), "repository must not be empty");
    let release = Release::from_tag_ref(config, repo, git_ref)
        .with_context(|| format!("cannot determine release version for '{repo}'"))?;
    let store = open_store(config, dry_run)?;

    let steps = Reconciler::new(config, store.as_ref()).release(&release);
    let report = RunReport {
        repo: release.repo.clone(),
        version: Some(release.version.clone()),
        mode: Some(release.mode.as_str().to_string()),
        dry_run,
        steps,
    };
    print_report(&report, json)
}

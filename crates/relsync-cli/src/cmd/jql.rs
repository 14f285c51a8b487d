use crate::output::print_json;
use clap::Subcommand;
use relsync_core::{
    config::Config,
    reconcile::{aggregate_filter, aggregate_step, merge_filter, tagging_filter, STEP_MERGE, STEP_TAGGING},
};

#[derive(Subcommand)]
pub enum JqlSubcommand {
    /// Tickets a merge of this repository would promote to master
    Merge {
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: String,
    },
    /// Tickets a tag of this repository would mark as tagged (or release, if standalone)
    Tag {
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: String,
    },
    /// Tickets a release of this aggregate (e.g. cluster, backend) would inspect
    Aggregate { name: String },
}

pub fn run(config: &Config, subcmd: JqlSubcommand, json: bool) -> anyhow::Result<()> {
    let (step, jql) = match subcmd {
        JqlSubcommand::Merge { repo } => {
            (STEP_MERGE.to_string(), merge_filter(&config.fields, &repo).to_string())
        }
        JqlSubcommand::Tag { repo } => {
            (STEP_TAGGING.to_string(), tagging_filter(&config.fields, &repo).to_string())
        }
        JqlSubcommand::Aggregate { name } => {
            let group = config.aggregate(&name)?;
            let filter = aggregate_filter(&config.fields, group)
                .ok_or_else(|| anyhow::anyhow!("aggregate '{name}' has no members"))?;
            (aggregate_step(group), filter.to_string())
        }
    };

    if json {
        print_json(&serde_json::json!({ "step": step, "jql": jql }))?;
    } else {
        println!("{jql}");
    }
    Ok(())
}

//! CLI for the loadretry retry policy.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use loadretry_core::config::{self, LoadRetryConfig};
use loadretry_core::retry::{ErrorKind, LoadableKind, RetryConfig};

use commands::{
    run_completions, run_config, run_decide, run_fetch, run_man, run_plan, run_probe,
};

/// Top-level CLI for loadretry.
#[derive(Debug, Parser)]
#[command(name = "loadretry")]
#[command(about = "loadretry: load-error retry policy for streaming clients", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Failure classification as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Connectivity,
    Other,
}

impl From<KindArg> for ErrorKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Connectivity => ErrorKind::Connectivity,
            KindArg::Other => ErrorKind::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoadableArg {
    Manifest,
    Segment,
    Subtitle,
    DrmKey,
}

impl From<LoadableArg> for LoadableKind {
    fn from(k: LoadableArg) -> Self {
        match k {
            LoadableArg::Manifest => LoadableKind::Manifest,
            LoadableArg::Segment => LoadableKind::Segment,
            LoadableArg::Subtitle => LoadableKind::Subtitle,
            LoadableArg::DrmKey => LoadableKind::DrmKey,
        }
    }
}

/// Policy overrides shared by `decide` and `plan`.
#[derive(Debug, Clone, Copy, Default, clap::Args)]
pub struct PolicyArgs {
    /// Retries guaranteed for non-connectivity errors (default from config).
    #[arg(long, value_name = "N")]
    pub min_retry_count: Option<u32>,
    /// Give up on connectivity errors at this count (default: never).
    #[arg(long, value_name = "N")]
    pub connectivity_ceiling: Option<u32>,
}

impl PolicyArgs {
    /// Config values with command-line overrides applied.
    pub fn apply(&self, base: RetryConfig) -> RetryConfig {
        RetryConfig {
            min_retry_count: self.min_retry_count.unwrap_or(base.min_retry_count),
            connectivity_ceiling: self.connectivity_ceiling.or(base.connectivity_ceiling),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Decide what to do after one failed load.
    Decide {
        /// Failure classification.
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Consecutive failures for the loadable, including this one (1-based).
        #[arg(long)]
        count: u32,
        #[command(flatten)]
        policy: PolicyArgs,
        /// Print the directive as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the retry schedule for consecutive failures of one kind.
    Plan {
        /// Failure classification.
        #[arg(long, value_enum)]
        kind: KindArg,
        #[command(flatten)]
        policy: PolicyArgs,
        /// Stop after this many failures even if the policy keeps retrying.
        #[arg(long, default_value = "10", value_name = "N")]
        limit: u32,
        /// Print one JSON directive per line.
        #[arg(long)]
        json: bool,
    },

    /// Check whether any connectivity endpoint is reachable.
    Probe {
        /// Endpoints to try (default: from config).
        endpoints: Vec<String>,
        /// Keep checking once per second, up to N times, until online.
        #[arg(long, value_name = "N")]
        wait: Option<u32>,
    },

    /// Fetch a URL, retrying failures per the policy.
    Fetch {
        /// HTTP/HTTPS URL of the loadable.
        url: String,
        /// Kind of loadable (only affects logging and counter identity).
        #[arg(long, value_enum, default_value = "segment")]
        kind: LoadableArg,
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Show the config file path and effective values.
    Config,

    /// Generate shell completions.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Completions { shell } => return run_completions(shell),
            CliCommand::Man => return run_man(),
            _ => {}
        }

        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        dispatch(cli.command, &cfg).await
    }
}

async fn dispatch(command: CliCommand, cfg: &LoadRetryConfig) -> Result<()> {
    match command {
        CliCommand::Decide {
            kind,
            count,
            policy,
            json,
        } => run_decide(kind.into(), count, policy.apply(cfg.retry), json)?,
        CliCommand::Plan {
            kind,
            policy,
            limit,
            json,
        } => run_plan(kind.into(), policy.apply(cfg.retry), limit, json)?,
        CliCommand::Probe { endpoints, wait } => run_probe(cfg, endpoints, wait).await?,
        CliCommand::Fetch { url, kind, policy } => {
            run_fetch(cfg, &url, kind.into(), policy.apply(cfg.retry)).await?
        }
        CliCommand::Config => run_config(cfg)?,
        CliCommand::Completions { shell } => run_completions(shell)?,
        CliCommand::Man => run_man()?,
    }
    Ok(())
}

#[cfg(test)]
mod tests;

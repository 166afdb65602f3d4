//! Command line interface

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use grafana_api::prelude::*;

use crate::{
    migrate::{run_export, run_import},
    reconcile::Policy,
    snapshot::{SnapshotFormat, load_snapshot},
};

#[derive(Parser, Debug)]
#[command(name = "dashmove")]
#[command(author, version, about = "Grafana dashboard migration tool", long_about = None)]
pub struct Cli {
    /// Verbose mode (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture an instance's state into a snapshot file
    Export(ExportArgs),

    /// Replay a snapshot against an instance
    Import(ImportArgs),
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Instance base url, e.g. <https://grafana.local:3000>
    #[arg(short, long)]
    pub url: String,

    /// Service account token or session cookie
    #[arg(short, long, env = "DASHMOVE_SECRET", hide_env_values = true)]
    pub secret: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Snapshot file, or a directory to derive the file name in
    #[arg(short, long)]
    pub location: PathBuf,

    /// Export only dashboards carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Snapshot encoding
    #[arg(short, long, value_enum, default_value_t = SnapshotFormat::Json)]
    pub format: SnapshotFormat,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Snapshot file to import
    #[arg(short, long)]
    pub location: PathBuf,

    /// Snapshot encoding
    #[arg(short, long, value_enum, default_value_t = SnapshotFormat::Json)]
    pub format: SnapshotFormat,

    /// Destructive policy: delete live dashboards and foreign folders,
    /// replace conflicting datasources and alert rules
    #[arg(long = "override")]
    pub override_policy: bool,
}

impl ImportArgs {
    pub fn policy(&self) -> Policy {
        if self.override_policy {
            Policy::Override
        } else {
            Policy::Merge
        }
    }
}

async fn connect(args: &ConnectionArgs) -> Result<GrafanaClient> {
    let credential = Credential::parse(&args.secret);
    GrafanaClient::connect(&args.url, credential)
        .await
        .with_context(|| format!("connecting to {}", args.url))
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export(args) => {
            let client = connect(&args.connection).await?;
            let path = run_export(&client, args.tag.as_deref(), &args.location, args.format)
                .await?;
            println!("wrote {}", path.display());
        }
        Commands::Import(args) => {
            // decode fully before touching the target
            let snapshot = load_snapshot(&args.location, args.format)?;
            let client = connect(&args.connection).await?;
            let report = run_import(&client, &snapshot, args.policy()).await?;
            println!("{report}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_defaults() {
        let cli = Cli::parse_from([
            "dashmove", "export", "-u", "http://a", "-s", "tok", "-l", "/tmp",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export");
        };
        assert_eq!(args.format, SnapshotFormat::Json);
        assert!(args.tag.is_none());
    }

    #[test]
    fn test_import_policy_flag() {
        let cli = Cli::parse_from([
            "dashmove", "import", "-u", "http://a", "-s", "tok", "-l", "x.json", "--override",
        ]);
        let Commands::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.policy(), Policy::Override);
    }
}

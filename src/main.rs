use std::path::PathBuf;

use chronos_provider::{
    client::SchedulerClient,
    config::ProviderOpts,
    manifest::{Manifest, StateFile},
    plan::{self, Plan},
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Opts {
    #[clap(flatten)]
    provider: ProviderOpts,

    /// Path to job definitions
    #[clap(short, long, env = "CHRONOS_MANIFEST", default_value = "chronos.toml")]
    manifest: PathBuf,

    /// Where tracked resources are recorded between runs
    #[clap(short, long, env = "CHRONOS_STATE", default_value = "chronos.state.json")]
    state: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show what apply would change
    Plan,
    /// Create, update and delete jobs until the scheduler matches the manifest
    Apply,
    /// Re-read tracked jobs from the scheduler
    Refresh,
    /// Delete every tracked job
    Destroy,
}

async fn inner_main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    let client = SchedulerClient::new(&opts.provider.provider_config());
    let mut state = StateFile::load(&opts.state)?;

    match opts.command {
        Command::Plan => {
            let manifest = Manifest::from_file(&opts.manifest)?;
            print!("{}", Plan::refreshed(&client, &manifest, &mut state).await?);
        }
        Command::Apply => {
            let manifest = Manifest::from_file(&opts.manifest)?;
            let plan = Plan::refreshed(&client, &manifest, &mut state).await?;
            print!("{}", plan);
            plan.apply(&client, &mut state).await?;
        }
        Command::Refresh => plan::refresh(&client, &mut state).await?,
        Command::Destroy => plan::destroy(&client, &mut state).await?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = inner_main().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

// Apply a JSON fixture file to the database named by DATABASE_URL.
//
// Usage: fixtures <setup|cleanup|teardown> <fixture.json>

use anyhow::{bail, Context, Result};
use pg_fixtures::config::DatabaseConfig;
use pg_fixtures::fixtures::load_tables;
use pg_fixtures::TableSet;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: fixtures <setup|cleanup|teardown> <fixture.json>";

#[derive(Clone, Copy, Debug)]
enum Command {
    Setup,
    Cleanup,
    Teardown,
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "setup" => Ok(Command::Setup),
            "cleanup" => Ok(Command::Cleanup),
            "teardown" => Ok(Command::Teardown),
            other => bail!("unknown command '{}'\n{}", other, USAGE),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main())
}

async fn async_main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let (command, path) = match (args.next(), args.next()) {
        (Some(command), Some(path)) => (command.parse::<Command>()?, path),
        _ => bail!(USAGE),
    };

    let tables = load_tables(&path).with_context(|| format!("reading {}", path))?;
    let config = DatabaseConfig::from_env()?;
    let executor = config
        .executor()
        .await
        .context("connecting to the database")?;

    tracing::info!("Running {:?} for {} tables from {}", command, tables.len(), path);

    let set = TableSet::new(executor, tables);
    let result = match command {
        Command::Setup => set.setup().await,
        Command::Cleanup => set.cleanup().await,
        Command::Teardown => set.teardown().await,
    };

    if let Err(e) = &result {
        tracing::error!("{:?} failed: {}", command, e);
    }
    result?;

    Ok(())
}

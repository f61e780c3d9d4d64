//! seiswalk: step through event × station waveform pairs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sw_core::Visit;
use sw_data::{Archive, Command, Outcome, SeismogramCursor, Session, TraversalBuilder, TraversalConfig};

#[derive(Debug, Parser)]
#[command(name = "seiswalk", version, about = "Step through waveforms of every event at every station")]
struct Args {
    /// Session configuration (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Offline archive serving events, stations and waveforms; overrides the one in the config
    #[arg(short, long)]
    archive: Option<PathBuf>,

    /// Comma separated commands to run instead of reading stdin, e.g. "n,n,p,q"
    #[arg(short, long)]
    script: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Where commands are read from
enum Input {
    Script(std::vec::IntoIter<String>),
    Stdin(Lines<BufReader<Stdin>>),
}

impl Input {
    fn new(script: Option<&str>) -> Self {
        match script {
            Some(script) => Input::Script(
                script
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            None => Input::Stdin(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        match self {
            Input::Script(lines) => Ok(lines.next()),
            Input::Stdin(lines) => Ok(lines.next_line().await?),
        }
    }
}

fn summary(visit: &Visit) -> String {
    let origin = visit
        .event
        .origin_time()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown origin".to_string());
    format!(
        "{} {} {} {}",
        visit.waveforms.len(),
        visit.station_label(),
        visit.waveforms.channel_codes().join(","),
        origin
    )
}

/// Apply one command, reporting the outcome; returns false once the user quits
async fn step<C: SeismogramCursor>(session: &mut Session<C>, command: Command) -> bool {
    match session.apply(command).await {
        Ok(Outcome::Visit(visit)) => {
            println!("{}", summary(&visit));
            true
        }
        Ok(Outcome::Finished) => {
            println!("-- no more stations going {} --", command);
            true
        }
        Ok(Outcome::Quit) => false,
        Err(e) => {
            error!("{} failed: {}", command, e);
            if e.is_transient() {
                println!("-- {} failed, try again --", command);
            }
            true
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = TraversalConfig::load(&args.config)
        .await
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let mut builder = TraversalBuilder::new(config);
    if let Some(path) = &args.archive {
        let archive = Archive::load(path)
            .await
            .with_context(|| format!("loading archive {}", path.display()))?;
        builder = builder.with_archive(Arc::new(archive));
    }
    let traversal = builder.build().await.context("building traversal")?;
    info!("Inventory holds {} stations", traversal.inventory.station_count());

    let mut session = Session::new(traversal.cursor);
    let mut input = Input::new(args.script.as_deref());

    if step(&mut session, Command::Next).await {
        while let Some(line) = input.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };
            if !step(&mut session, command).await {
                break;
            }
        }
    }

    info!(
        "Showed {} stations, skipped {} without data",
        session.visited(),
        session.skipped()
    );
    Ok(())
}

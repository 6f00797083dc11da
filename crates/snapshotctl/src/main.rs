use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use snapshot_session::{
    HttpSnapshotApi, SessionConfig, SessionView, SnapshotSession, DEFAULT_SNAPSHOT_BATCH_SIZE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "snapshotctl", version, about = "Manage capture snapshots of a running pipeline")]
struct Args {
    /// Pipeline server base URL, e.g. http://127.0.0.1:18630
    #[arg(long, default_value = "http://127.0.0.1:18630")]
    server: String,

    /// Pipeline name.
    #[arg(long)]
    pipeline: String,

    /// Active pipeline revision.
    #[arg(long, default_value = "0")]
    revision: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the pipeline's snapshots.
    List,
    /// Start a new capture.
    Capture {
        /// Records to capture per batch.
        #[arg(long, default_value_t = DEFAULT_SNAPSHOT_BATCH_SIZE)]
        batch_size: u32,

        /// Block until the capture completes.
        #[arg(long)]
        wait: bool,
    },
    /// Delete a snapshot.
    Delete {
        #[arg(long)]
        name: String,
    },
    /// Cancel an in-progress capture (deletes the incomplete snapshot).
    Cancel {
        #[arg(long)]
        name: String,
    },
    /// Follow an in-progress capture until it completes.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let api = Arc::new(HttpSnapshotApi::new(&args.server));
    let mut config = SessionConfig::new(args.pipeline, args.revision);
    if let Cmd::Capture { batch_size, .. } = &args.cmd {
        config.batch_size = *batch_size;
    }

    let session = SnapshotSession::open(api, config).await;
    ensure_ok(&session.view())?;

    match args.cmd {
        Cmd::List => {
            print_snapshots(&session.view())?;
        }
        Cmd::Capture { wait, .. } => {
            session.capture_snapshot().await;
            let view = session.view();
            ensure_ok(&view)?;
            let name = view
                .snapshots
                .last()
                .map(|s| s.id.clone())
                .context("capture did not record a snapshot")?;
            println!("capturing {name}");
            if wait {
                wait_for_completion(&session).await?;
                print_snapshots(&session.view())?;
            }
        }
        Cmd::Delete { name } => {
            let index = position_of(&session.view(), &name)?;
            session.delete_snapshot(&name, index).await;
            ensure_ok(&session.view())?;
            println!("deleted {name}");
        }
        Cmd::Cancel { name } => {
            let index = position_of(&session.view(), &name)?;
            session.cancel_snapshot(&name, index).await;
            ensure_ok(&session.view())?;
            println!("cancelled {name}");
        }
        Cmd::Watch => {
            if session.view().snapshot_in_progress {
                wait_for_completion(&session).await?;
                print_snapshots(&session.view())?;
            } else {
                println!("no capture in progress");
            }
        }
    }

    session.close();
    Ok(())
}

fn ensure_ok(view: &SessionView) -> Result<()> {
    if let Some(err) = view.errors.first() {
        bail!("{}", err.message);
    }
    Ok(())
}

fn position_of(view: &SessionView, name: &str) -> Result<usize> {
    view.snapshots
        .iter()
        .position(|s| s.id == name)
        .with_context(|| format!("no snapshot named {name}"))
}

fn print_snapshots(view: &SessionView) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&view.snapshots)?);
    Ok(())
}

async fn wait_for_completion(session: &SnapshotSession) -> Result<()> {
    let mut rx = session.subscribe();
    loop {
        {
            let view = rx.borrow();
            if let Some(err) = view.errors.first() {
                bail!("{}", err.message);
            }
            if !view.snapshot_in_progress {
                return Ok(());
            }
        }
        rx.changed().await.context("session state feed closed")?;
    }
}

/// epochline replay server
///
/// Plays a recorded training run back over the same push channels a live
/// dashboard server exposes, so the follower can be exercised without a
/// training job.
///
/// Run with:
///   cargo run --bin replay -- --epochs run.json --model-id mnist --snapshot 5
///
/// Routes:
///   GET  /epochs                 first `--snapshot` epochs (page-load data)
///   GET  /subscribe/epoch/end/   remaining epochs, one per `--interval-ms`
///   GET  /subscribe/train/       training start/finish notices
///   POST /tags                   tag add/remove

mod state;
mod routes;
mod handlers;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tiny_http::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

use state::ReplayState;

#[derive(Parser, Debug)]
#[command(name = "replay", version)]
struct Args {
    /// Recorded epochs (JSON list, or object keyed by epoch number).
    #[arg(long)]
    epochs: PathBuf,

    /// Identifier announced as the run's target.
    #[arg(long)]
    model_id: String,

    /// Epochs served as the page-load snapshot.
    #[arg(long, default_value_t = 1)]
    snapshot: usize,

    /// Delay between streamed epochs.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    #[arg(long, default_value = "127.0.0.1:5000")]
    addr: String,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let records = epochline::series::load_epochs(&args.epochs)?;
    let state = ReplayState::new(
        args.model_id,
        records,
        args.snapshot,
        Duration::from_millis(args.interval_ms),
    );
    info!(
        model_id = %state.model_id,
        snapshot = state.initial().len(),
        live = state.live().len(),
        "replaying {}", args.epochs.display()
    );

    let server = Server::http(&args.addr)?;
    info!("listening on http://{}", args.addr);

    let shared_state = Arc::new(Mutex::new(state));

    // One thread per request: event streams stay open for the whole
    // playback and must not stall other requests.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
    Ok(())
}

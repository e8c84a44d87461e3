use std::path::PathBuf;
use std::sync::mpsc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use epochline::{series, DashConfig, DashboardSession, SvgChart};

/// Follows a training run's epoch-end stream and keeps an SVG chart of its
/// metrics up to date.
#[derive(Parser, Debug)]
#[command(name = "epochline", version)]
struct Args {
    /// Training run to follow.
    #[arg(long)]
    model_id: String,

    /// Epochs recorded so far (JSON list, or object keyed by epoch number).
    #[arg(long)]
    epochs: PathBuf,

    /// Configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server root, overrides `app.server-url` / `app.server-port`.
    #[arg(long)]
    server: Option<String>,

    /// Where to write the chart, overrides `chart.output`.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> epochline::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => DashConfig::load(path)?,
        None       => DashConfig::default(),
    };
    if let Some(server) = args.server {
        config.app.server_url = server;
    }
    if let Some(output) = args.output {
        config.chart.output = Some(output);
    }
    config.validate()?;

    let records = series::load_epochs(&args.epochs)?;

    let mut chart = SvgChart::new(config.chart.width, config.chart.height);
    if let Some(out) = &config.chart.output {
        chart = chart.with_output(out);
    }

    let mut session = DashboardSession::new(args.model_id.as_str(), &records, chart)?;

    let (tx, rx) = mpsc::channel();
    let epoch_source = session.subscribe(config.epoch_source(), tx.clone())?;
    let train_source = epochline::stream::EventSource::open(config.train_source(), tx)?;
    info!(epochs = %epoch_source.url(), train = %train_source.url(), "following run");

    session.run(&rx);
    Ok(())
}

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use orbitcore::schedule::SystemClock;
use orbitcore::Scheduler;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use workflow::config::{ConfigOverrides, TrackerConfig};
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Satellite fleet tracker driver")]
struct Args {
    /// Evaluate a single refresh cycle and print a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a tracker config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    catalog_url: Option<String>,
    /// Relay prefix placed in front of the catalog URL
    #[arg(long)]
    relay: Option<String>,
    /// Read element sets from a local text file instead of the network
    #[arg(long)]
    tle_file: Option<PathBuf>,
    /// Use a generated catalog with this many objects
    #[arg(long)]
    synthetic: Option<usize>,
    #[arg(long)]
    filter_height: Option<f64>,
    /// Evaluation instant for --offline (RFC 3339), defaults to now
    #[arg(long)]
    at: Option<DateTime<Utc>>,
    /// Run the live scheduler behind the HTTP bridge until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Append the offline summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let overrides = ConfigOverrides {
        catalog_url: args.catalog_url,
        relay_url: args.relay,
        tle_file: args.tle_file,
        synthetic_count: args.synthetic,
        filter_height_km: args.filter_height,
        bind: args.bind,
    };
    let config = if let Some(path) = args.config {
        TrackerConfig::load(path)?.with_overrides(overrides)
    } else {
        TrackerConfig::from_args(overrides)
    };
    config
        .pipeline
        .validate()
        .context("validating pipeline configuration")?;

    let now = Utc::now();
    let source = config.source(now)?;

    if args.offline {
        let instant = args.at.unwrap_or(now);
        let runner = Runner::new(config.clone(), source.clone());
        let result = runner.execute(instant).await?;

        println!(
            "Offline run at {} -> objects {} (dropped {}), fixes {}, visible {} above {} km",
            result.evaluated_at.to_rfc3339(),
            result.object_count,
            result.dropped_count,
            result.fix_count,
            result.visible_count(),
            result.visible.threshold_km
        );
        for fix in result.leading_fixes(5) {
            println!(
                "  {:<24} lat {:>7.2} lon {:>8.2} height {:>8.1} km",
                fix.name, fix.latitude, fix.longitude, fix.height_km
            );
        }

        if let Some(report_path) = args.report {
            let report = format!(
                "at={} objects={} dropped={} fixes={} visible={} threshold_km={}\n",
                result.evaluated_at.to_rfc3339(),
                result.object_count,
                result.dropped_count,
                result.fix_count,
                result.visible_count(),
                result.visible.threshold_km
            );
            append_report(&report_path, &report)?;
        }
    }

    if args.serve {
        let handle = Scheduler::new(config.pipeline.clone(), source, Arc::new(SystemClock))
            .context("starting scheduler")?
            .start();
        let gui_bridge = GuiBridge::new(handle);
        let (bound, server) = gui_bridge.serve(config.bind)?;
        log::info!("HTTP bridge listening on http://{} (Ctrl+C to stop)", bound);

        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        gui_bridge.teardown().await;
        server.abort();
        log::info!("scheduler torn down, bridge stopped");
    }

    Ok(())
}

/// Appends one summary line to `path`, creating parent directories as needed.
fn append_report(path: &Path, line: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("writing report to {}", path.display()))?;
    Ok(())
}

//! Command-line front end: CSV in, CSV out.
//!
//! Reads a request table from CSV, runs a validation batch against the
//! routing API, and writes the outcome table plus a statistics summary.
//! Per-route failures are rows in the output, not process failures; the exit
//! code only reflects argument and I/O errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use serde_json::{Map, Value};
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

use routecheck::{
    ApiOptions, BatchRunner, ReqwestHttpClient, RetrySettings, RouteOutcome, RouteRequest,
    RunnerConfig,
};

const REQUIRED_COLUMNS: [&str; 4] = ["origin_lon", "origin_lat", "dest_lon", "dest_lat"];

/// Validate routing-engine responses against their requested destinations.
#[derive(Parser)]
#[command(name = "routecheck")]
#[command(about = "Batch-validate routing API responses", long_about = None)]
struct Cli {
    /// Input CSV with origin_lon, origin_lat, dest_lon, dest_lat columns;
    /// extra columns pass through to the output unchanged
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV for the per-route outcomes
    #[arg(short, long)]
    output: PathBuf,

    /// Routing API base URL, up to the profile segment
    /// (e.g. "https://router.example.com/route/v1/")
    #[arg(long)]
    base_url: String,

    /// API access token
    #[arg(long, default_value = "")]
    access_token: String,

    /// Logical routing profile
    #[arg(long, default_value = "car")]
    profile: String,

    /// Routes per batch
    #[arg(long, default_value_t = 200)]
    batch_size: usize,

    /// Concurrent validations per batch
    #[arg(long, default_value_t = 7)]
    max_workers: usize,

    /// Delay after each completed route, in seconds
    #[arg(long, default_value_t = 0.1)]
    request_delay: f64,

    /// Retry attempts per route for transient failures
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("routecheck=info")),
        )
        .init();

    let cli = Cli::parse();

    let (requests, passthrough_columns) = read_requests(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    tracing::info!(
        routes = requests.len(),
        input = %cli.input.display(),
        "Loaded request table"
    );

    let options = Arc::new(ApiOptions {
        base_url: cli.base_url,
        access_token: cli.access_token,
        ..ApiOptions::default()
    });
    let config = RunnerConfig {
        batch_size: cli.batch_size,
        max_workers: cli.max_workers,
        request_delay: Duration::from_secs_f64(cli.request_delay.max(0.0)),
        timeout: Duration::from_secs(cli.timeout),
        retry: RetrySettings {
            max_retries: cli.max_retries,
            ..RetrySettings::default()
        },
        ..RunnerConfig::default()
    };

    let runner = BatchRunner::new(ReqwestHttpClient::new(), options, cli.profile, config);

    let mut updates = runner.subscribe();
    let progress = tokio::spawn(async move {
        while let Some(update) = updates.next().await {
            tracing::info!(
                completed = update.completed,
                total = update.total,
                batch = update.batch,
                total_batches = update.total_batches,
                "Progress"
            );
        }
    });

    let (outcomes, stats) = runner.run(requests).await;
    progress.abort();

    write_outcomes(&cli.output, &outcomes, &passthrough_columns)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    tracing::info!(
        total = stats.total_routes,
        successful = stats.successful_routes,
        failed = stats.failed_routes,
        success_rate = format!("{:.1}%", stats.success_rate),
        total_retries = stats.total_retries,
        output = %cli.output.display(),
        "Validation complete"
    );

    Ok(())
}

/// Read the request table, returning the requests and the names of the
/// passthrough columns in input order.
///
/// Missing coordinate columns abort the run before any network activity.
/// Cells that fail to parse as numbers become NaN so the affected row is
/// recorded as a local validation error instead of aborting everything.
fn read_requests(path: &Path) -> anyhow::Result<(Vec<RouteRequest>, Vec<String>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|header| header == *column))
        .copied()
        .collect();
    if !missing.is_empty() {
        anyhow::bail!("input is missing required columns: {}", missing.join(", "));
    }

    let column_index = |name: &str| -> usize {
        // Presence was checked above
        headers.iter().position(|header| header == name).unwrap_or(0)
    };
    let coordinate_indexes: Vec<usize> = REQUIRED_COLUMNS.iter().map(|c| column_index(c)).collect();

    let passthrough_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !REQUIRED_COLUMNS.contains(&header.as_str()))
        .map(|(index, header)| (index, header.clone()))
        .collect();

    let mut requests = Vec::new();
    for record in reader.records() {
        let record = record?;
        let coordinate = |slot: usize| -> f64 {
            record
                .get(coordinate_indexes[slot])
                .map(str::trim)
                .and_then(|cell| cell.parse().ok())
                .unwrap_or(f64::NAN)
        };

        let mut passthrough = Map::new();
        for (index, name) in &passthrough_columns {
            let cell = record.get(*index).unwrap_or("");
            passthrough.insert(name.clone(), Value::from(cell));
        }

        requests.push(
            RouteRequest::new(coordinate(0), coordinate(1), coordinate(2), coordinate(3))
                .with_passthrough(passthrough),
        );
    }

    let column_names = passthrough_columns.into_iter().map(|(_, name)| name).collect();
    Ok((requests, column_names))
}

/// Write the outcome table: the fixed columns first, then the passthrough
/// columns in their input order.
fn write_outcomes(
    path: &Path,
    outcomes: &[RouteOutcome],
    passthrough_columns: &[String],
) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec![
        "origin_lon",
        "origin_lat",
        "dest_lon",
        "dest_lat",
        "last_route_lon",
        "last_route_lat",
        "distance_to_dest",
        "status",
        "retries",
    ];
    header.extend(passthrough_columns.iter().map(String::as_str));
    writer.write_record(&header)?;

    let optional = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    for outcome in outcomes {
        let mut record = vec![
            outcome.origin_lon.to_string(),
            outcome.origin_lat.to_string(),
            outcome.dest_lon.to_string(),
            outcome.dest_lat.to_string(),
            optional(outcome.last_route_lon),
            optional(outcome.last_route_lat),
            optional(outcome.distance_to_dest),
            outcome.status.to_string(),
            outcome.retries.to_string(),
        ];
        for column in passthrough_columns {
            record.push(match outcome.passthrough.get(column) {
                Some(Value::String(cell)) => cell.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            });
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

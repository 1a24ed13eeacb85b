use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ga4_reports::client::{Credentials, DataApiClient};
use ga4_reports::config::{self, Config};
use ga4_reports::models::report_config::ReportConfig;
use ga4_reports::models::request::DateRange;
use ga4_reports::report::{AlignmentPolicy, BatchReportBuilder};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the JSON output, so logs go to stderr
    let json_logs = std::env::var("GA4_LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ga4_reports=info".into()),
        ))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        cli::Commands::Run {
            target,
            credentials,
            allow_partial,
            pretty,
        } => run_reports(cfg, target, credentials, allow_partial, pretty).await,
        cli::Commands::Plan { target } => print_plan(&cfg, target),
    };

    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }
    result
}

struct Resolved {
    config: ReportConfig,
    property_id: String,
    builder: BatchReportBuilder,
}

fn resolve_target(cfg: &Config, target: cli::Target) -> anyhow::Result<Resolved> {
    let config = ReportConfig::from_path(&target.config)
        .with_context(|| format!("loading report configuration {}", target.config.display()))?;
    let property_id = target
        .property_id
        .or_else(|| cfg.property_id.clone())
        .context("no property id: pass --property-id or set GA4_PROPERTY_ID")?;
    let date_range = DateRange::or_default(
        target.start_date.or_else(|| cfg.start_date.clone()),
        target.end_date.or_else(|| cfg.end_date.clone()),
    );

    Ok(Resolved {
        config,
        property_id,
        builder: BatchReportBuilder::new(date_range),
    })
}

async fn run_reports(
    cfg: Config,
    target: cli::Target,
    credentials_path: Option<std::path::PathBuf>,
    allow_partial: bool,
    pretty: bool,
) -> anyhow::Result<()> {
    let resolved = resolve_target(&cfg, target)?;
    let alignment = if allow_partial {
        AlignmentPolicy::Lenient
    } else {
        cfg.alignment()
    };
    let builder = resolved.builder.with_alignment(alignment);

    let credentials = match (&cfg.access_token, credentials_path.or_else(|| cfg.credentials_path.clone())) {
        (Some(token), _) => Credentials::AccessToken(token.clone()),
        (None, Some(path)) => Credentials::service_account_file(&path)?,
        (None, None) => anyhow::bail!(
            "no credentials: pass --credentials, or set GOOGLE_APPLICATION_CREDENTIALS or GA4_ACCESS_TOKEN"
        ),
    };

    let client = DataApiClient::connect(&cfg.api_base_url, &credentials, cfg.http_timeout)
        .await
        .context("connecting to the Data API")?;

    let tables = builder
        .generate_batch_report(&client, &resolved.property_id, &resolved.config)
        .await?;

    for table in &tables {
        tracing::info!(report = table.name(), rows = table.num_rows(), columns = table.num_columns(), "table ready");
    }

    let mut out = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut out, &tables)?;
    } else {
        serde_json::to_writer(&mut out, &tables)?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_plan(cfg: &Config, target: cli::Target) -> anyhow::Result<()> {
    let resolved = resolve_target(cfg, target)?;
    let batch = resolved.builder.plan(&resolved.config, &resolved.property_id)?;

    let body = serde_json::json!({
        "property": batch.property(),
        "reports": batch.names().collect::<Vec<_>>(),
        "body": batch.to_request(),
    });
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

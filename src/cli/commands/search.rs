//! `search` command.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::icons;
use crate::config::Settings;
use crate::documents::{download_one, ArtifactKind, DownloadReport};
use crate::export::{export_csv, export_json};
use crate::http_client::Transport;
use crate::rate_limit::RateLimiter;
use crate::search::{Record, RecordFilter, SearchClient, SearchRequest, StopReason};

use super::{DownloadKind, ExportFormat, SearchArgs};

/// Run a search, then export and download the results.
pub async fn cmd_search(settings: &Settings, query: &str, args: &SearchArgs) -> anyhow::Result<()> {
    let language = args
        .lang
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_else(|| settings.language.clone());

    let fields = if args.fields.is_empty() {
        settings.fields.clone()
    } else {
        args.fields.clone()
    };
    let mut request = SearchRequest::new(query)
        .fields(fields)
        .page(args.page)
        .page_size(args.page_size.unwrap_or(settings.page_size));
    if let Some(limit) = args.limit {
        request = request.limit(limit);
    }
    if let Some(max_pages) = args.max_pages {
        request = request.max_pages(max_pages);
    }
    if args.require_pdf {
        request = request.filter(RecordFilter::pdf_language(&language));
    }

    println!("{} Query: {}", icons::info(), query);

    let client = SearchClient::from_settings(settings, RateLimiter::new(settings.min_interval()))
        .map_err(anyhow::Error::msg)?;

    let outcome = client.search(&request).await?;

    let total = outcome
        .total_count
        .map(|t| format!(" of {} reported", t))
        .unwrap_or_default();
    match outcome.stop {
        StopReason::Failed(ref e) => println!(
            "{} Retrieved {} notices{} before failure: {}",
            icons::warn(),
            outcome.len(),
            total,
            e
        ),
        ref stop => println!(
            "{} Retrieved {} notices{} ({}, {} page(s))",
            icons::success(),
            outcome.len(),
            total,
            stop,
            outcome.pages_fetched
        ),
    }

    if outcome.is_empty() {
        return Ok(());
    }

    let base = settings.output_dir.join(&args.output);
    if matches!(args.format, ExportFormat::Json | ExportFormat::Both) {
        if let Some(path) = export_json(&outcome.records, &base)? {
            println!("{} Saved {}", icons::success(), path.display());
        }
    }
    if matches!(args.format, ExportFormat::Csv | ExportFormat::Both) {
        if let Some(path) = export_csv(&outcome.records, &base)? {
            println!("{} Saved {}", icons::success(), path.display());
        }
    }

    if !args.download.is_empty() {
        let limiter = RateLimiter::new(settings.download_interval());
        for kind in &args.download {
            let kind = match kind {
                DownloadKind::Pdf => ArtifactKind::pdf(&language),
                DownloadKind::Xml => ArtifactKind::Xml,
            };
            let dir = settings.output_dir.join(kind.extension());
            let report =
                download_with_progress(client.transport().as_ref(), &limiter, &outcome.records, &kind, &dir)
                    .await?;
            println!(
                "{} {}: {} saved, {} without link, {} failed",
                if report.failed > 0 {
                    icons::warn()
                } else {
                    icons::success()
                },
                kind,
                report.saved,
                report.skipped,
                report.failed
            );
        }
    }

    if !outcome.is_complete() {
        println!(
            "{} Results are partial; re-run with a narrower query or later",
            icons::error()
        );
    }

    Ok(())
}

async fn download_with_progress(
    transport: &dyn Transport,
    limiter: &RateLimiter,
    records: &[Record],
    kind: &ArtifactKind,
    dir: &Path,
) -> anyhow::Result<DownloadReport> {
    tokio::fs::create_dir_all(dir).await?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")?
            .progress_chars("█▓░"),
    );
    pb.set_message(kind.to_string());

    let mut report = DownloadReport::default();
    for (index, record) in records.iter().enumerate() {
        let status = download_one(transport, limiter, record, index, kind, dir).await;
        report.record(&status);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(report)
}

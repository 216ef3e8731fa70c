//! Per-notice artifact download (PDF renderings and XML sources).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::http_client::Transport;
use crate::rate_limit::RateLimiter;
use crate::search::{Record, PDF_LINKS};

/// Default spacing between artifact downloads.
pub const DEFAULT_DOWNLOAD_INTERVAL: Duration = Duration::from_secs(1);

/// Language key of the multilingual XML link.
const XML_LANGUAGE: &str = "MUL";

/// Which linked document to fetch for each notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactKind {
    /// PDF rendering in the given language (`links.pdf.<lang>`).
    Pdf { language: String },
    /// Multilingual XML source (`links.xml.MUL`).
    Xml,
}

impl ArtifactKind {
    pub fn pdf(language: &str) -> Self {
        Self::Pdf {
            language: language.to_string(),
        }
    }

    /// File extension, also used as the sub-directory name.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf { .. } => "pdf",
            Self::Xml => "xml",
        }
    }

    /// Link URL for this kind on `record`.
    pub fn link<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            Self::Pdf { language } => record.link(PDF_LINKS, language),
            Self::Xml => record.link("xml", XML_LANGUAGE),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf { language } => write!(f, "PDF ({})", language),
            Self::Xml => write!(f, "XML"),
        }
    }
}

/// Result of fetching one notice's artifact.
#[derive(Debug)]
pub enum DownloadStatus {
    Saved(PathBuf),
    /// The record has no link of the requested kind.
    Skipped,
    Failed(String),
}

/// Totals for a batch of downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadReport {
    pub fn record(&mut self, status: &DownloadStatus) {
        match status {
            DownloadStatus::Saved(_) => self.saved += 1,
            DownloadStatus::Skipped => self.skipped += 1,
            DownloadStatus::Failed(_) => self.failed += 1,
        }
    }
}

/// File name for a notice: its publication number with path-hostile
/// characters replaced, or `notice-<index>` when it has none.
pub fn artifact_file_name(record: &Record, index: usize, kind: &ArtifactKind) -> String {
    let stem = record
        .publication_number()
        .map(|number| {
            number
                .chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>()
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| format!("notice-{}", index));
    format!("{}.{}", stem, kind.extension())
}

/// Fetch one artifact and write it into `dir`.
///
/// Failures are logged and returned as [`DownloadStatus::Failed`]; they
/// never abort a batch.
pub async fn download_one(
    transport: &dyn Transport,
    limiter: &RateLimiter,
    record: &Record,
    index: usize,
    kind: &ArtifactKind,
    dir: &Path,
) -> DownloadStatus {
    let Some(url) = kind.link(record) else {
        return DownloadStatus::Skipped;
    };
    let path = dir.join(artifact_file_name(record, index, kind));

    limiter.throttle().await;
    debug!("Downloading {} from {}", kind, url);

    let result: Result<(), String> = async {
        let response = transport.get(url).await.map_err(|e| e.to_string())?;
        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| e.to_string())
    }
    .await;

    match result {
        Ok(()) => DownloadStatus::Saved(path),
        Err(e) => {
            warn!(
                "Failed to download {} for {}: {}",
                kind,
                record.publication_number().unwrap_or("unknown notice"),
                e
            );
            DownloadStatus::Failed(e)
        }
    }
}

/// Download the `kind` artifact of every record into `dir`, one at a time.
pub async fn download_artifacts(
    transport: &dyn Transport,
    limiter: &RateLimiter,
    records: &[Record],
    kind: &ArtifactKind,
    dir: &Path,
) -> std::io::Result<DownloadReport> {
    tokio::fs::create_dir_all(dir).await?;

    let mut report = DownloadReport::default();
    for (index, record) in records.iter().enumerate() {
        let status = download_one(transport, limiter, record, index, kind, dir).await;
        report.record(&status);
    }
    Ok(report)
}

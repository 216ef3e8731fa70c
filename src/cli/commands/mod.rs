//! CLI commands implementation.

mod count;
mod query;
mod search;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{load_settings, LoadOptions, API_URL_ENV};
use crate::query::{ExpertQuery, NoticeType};

#[derive(Parser)]
#[command(name = "tedquire")]
#[command(about = "Search and download procurement notices from TED")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Search notices and export the results
    Search {
        /// Expert query (built from the criteria flags when omitted)
        query: Option<String>,
        #[command(flatten)]
        criteria: CriteriaArgs,
        #[command(flatten)]
        options: SearchArgs,
    },

    /// Print how many notices match a query
    Count {
        /// Expert query (built from the criteria flags when omitted)
        query: Option<String>,
        #[command(flatten)]
        criteria: CriteriaArgs,
    },

    /// Print the expert query built from the criteria flags
    Query {
        #[command(flatten)]
        criteria: CriteriaArgs,
    },
}

/// Export file formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
    /// JSON and CSV
    #[default]
    Both,
    /// Print a summary only
    None,
}

/// Linked documents that can be downloaded per notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DownloadKind {
    /// PDF rendering in the --lang language
    Pdf,
    /// Multilingual XML source
    Xml,
}

/// Pagination, filtering and output options for `search`.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Fields to request (comma separated)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,
    /// First page to fetch
    #[arg(long, default_value = "1")]
    page: u32,
    /// Records per page (config default when omitted)
    #[arg(long)]
    page_size: Option<u32>,
    /// Maximum number of records to keep (defaults to the page size)
    #[arg(short, long)]
    limit: Option<usize>,
    /// Maximum number of pages to fetch
    #[arg(long)]
    max_pages: Option<u32>,
    /// Language for PDF filtering and downloads (e.g. DEU, ENG)
    #[arg(long)]
    lang: Option<String>,
    /// Keep only notices with a PDF in --lang
    #[arg(long)]
    require_pdf: bool,
    /// Export format
    #[arg(short, long, value_enum, default_value = "both")]
    format: ExportFormat,
    /// Output file base name; a timestamp and extension are appended
    #[arg(short, long, default_value = "ted_results")]
    output: String,
    /// Documents to download per notice (comma separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    download: Vec<DownloadKind>,
}

/// Expert query criteria; blank values are ignored.
#[derive(Debug, Clone, Default, Args)]
pub struct CriteriaArgs {
    /// Full-text phrase
    #[arg(long)]
    full_text: Option<String>,
    /// NUTS region code or label (e.g. "DE6 - Hamburg")
    #[arg(long)]
    region: Option<String>,
    /// CPV code of the procedure
    #[arg(long)]
    cpv: Option<String>,
    /// CPV code of any lot
    #[arg(long)]
    cpv_lot: Option<String>,
    /// Notice form type
    #[arg(long, value_enum)]
    notice_type: Option<NoticeType>,
    /// Procedure type code
    #[arg(long)]
    procedure: Option<String>,
    /// Contract nature (works, supplies, services)
    #[arg(long)]
    contract_nature: Option<String>,
    /// Legal basis of the notice
    #[arg(long)]
    legal_basis: Option<String>,
    /// Published on or after (YYYY-MM-DD)
    #[arg(long)]
    published_from: Option<String>,
    /// Published on or before (YYYY-MM-DD)
    #[arg(long)]
    published_to: Option<String>,
    /// Tender deadline on or before (YYYY-MM-DD)
    #[arg(long)]
    deadline_to: Option<String>,
    /// Buyer name
    #[arg(long)]
    buyer: Option<String>,
    /// Buyer country (ISO 3166-1 alpha-3, e.g. DEU)
    #[arg(long)]
    country: Option<String>,
    /// Main activity of the contracting authority
    #[arg(long)]
    authority_activity: Option<String>,
    /// Lot identifier
    #[arg(long)]
    lot: Option<String>,
    /// Publication number (e.g. 123456-2025)
    #[arg(long)]
    publication_number: Option<String>,
    /// Official Journal issue
    #[arg(long)]
    gazette_issue: Option<String>,
}

impl CriteriaArgs {
    pub fn to_query(&self) -> ExpertQuery {
        fn value(field: &Option<String>) -> &str {
            field.as_deref().unwrap_or("")
        }

        let query = ExpertQuery::new()
            .full_text(value(&self.full_text))
            .region(value(&self.region))
            .cpv(value(&self.cpv))
            .cpv_lot(value(&self.cpv_lot))
            .procedure(value(&self.procedure))
            .contract_nature(value(&self.contract_nature))
            .legal_basis(value(&self.legal_basis))
            .published_from(value(&self.published_from))
            .published_to(value(&self.published_to))
            .deadline_to(value(&self.deadline_to))
            .buyer_name(value(&self.buyer))
            .buyer_country(value(&self.country))
            .authority_activity(value(&self.authority_activity))
            .lot(value(&self.lot))
            .publication_number(value(&self.publication_number))
            .gazette_issue(value(&self.gazette_issue));

        match self.notice_type {
            Some(notice_type) => query.notice_type(notice_type),
            None => query,
        }
    }

    /// The explicit query if given, otherwise one built from the flags.
    pub fn resolve(&self, explicit: Option<String>) -> String {
        explicit
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| self.to_query().build())
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let (mut settings, _config) = load_settings(options)
        .await
        .map_err(anyhow::Error::msg)?;

    if let Some(url) = cli.api_url {
        settings.base_url = url;
    }

    match cli.command {
        Commands::Search {
            query,
            criteria,
            options,
        } => search::cmd_search(&settings, &criteria.resolve(query), &options).await,
        Commands::Count { query, criteria } => {
            count::cmd_count(&settings, &criteria.resolve(query)).await
        }
        Commands::Query { criteria } => query::cmd_query(&criteria),
    }
}

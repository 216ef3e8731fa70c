//! Expert query builder.
//!
//! Helps construct TED expert-search queries (`FT~("…") AND CY="DEU" …`)
//! from individual criteria.

use chrono::{Local, NaiveDate};

/// Notice form types accepted by the `notice-type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum NoticeType {
    /// Contract or concession notice
    CnStandard,
    /// Contract or concession award notice
    CanStandard,
    /// Prior or periodic indicative notice
    PinStandard,
    /// Design contest notice
    CnDesg,
    /// Design contest result
    CanDesg,
    /// Modification notice
    CanModif,
    /// Social and other specific services notice
    CnSocial,
    /// Social and other specific services award
    CanSocial,
    /// Voluntary ex ante transparency notice
    Veat,
    /// Buyer profile
    PinBuyer,
}

impl NoticeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CnStandard => "cn-standard",
            Self::CanStandard => "can-standard",
            Self::PinStandard => "pin-standard",
            Self::CnDesg => "cn-desg",
            Self::CanDesg => "can-desg",
            Self::CanModif => "can-modif",
            Self::CnSocial => "cn-social",
            Self::CanSocial => "can-social",
            Self::Veat => "veat",
            Self::PinBuyer => "pin-buyer",
        }
    }
}

/// Builder for TED expert queries.
///
/// Criteria are AND-joined in a fixed order regardless of the order the
/// setters were called in. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct ExpertQuery {
    full_text: Option<String>,
    region: Option<String>,
    cpv: Option<String>,
    cpv_lot: Option<String>,
    notice_type: Option<NoticeType>,
    procedure: Option<String>,
    contract_nature: Option<String>,
    legal_basis: Option<String>,
    published_from: Option<String>,
    published_to: Option<String>,
    deadline_to: Option<String>,
    buyer_name: Option<String>,
    buyer_country: Option<String>,
    authority_activity: Option<String>,
    lot: Option<String>,
    publication_number: Option<String>,
    gazette_issue: Option<String>,
}

/// Trimmed value, or `None` when blank.
fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `2025-03-01` → `20250301`; already compact dates pass through.
fn compact_date(value: &str) -> Option<String> {
    non_blank(value).map(|d| d.replace('-', ""))
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

impl ExpertQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full-text search phrase (`FT~`).
    pub fn full_text(mut self, text: &str) -> Self {
        self.full_text = non_blank(text);
        self
    }

    /// NUTS region code (`RC`). Accepts picker labels such as
    /// `"DE6 - Hamburg"` and keeps only the leading code.
    pub fn region(mut self, label: &str) -> Self {
        self.region = label.split_whitespace().next().map(str::to_string);
        self
    }

    /// CPV code of the procedure (`PC`).
    pub fn cpv(mut self, code: &str) -> Self {
        self.cpv = non_blank(code);
        self
    }

    /// CPV code of any lot.
    pub fn cpv_lot(mut self, code: &str) -> Self {
        self.cpv_lot = non_blank(code);
        self
    }

    pub fn notice_type(mut self, notice_type: NoticeType) -> Self {
        self.notice_type = Some(notice_type);
        self
    }

    /// Procedure type code (`PR`), e.g. `open`.
    pub fn procedure(mut self, code: &str) -> Self {
        self.procedure = non_blank(code);
        self
    }

    /// Contract nature (`NC`): `works`, `supplies` or `services`.
    pub fn contract_nature(mut self, nature: &str) -> Self {
        self.contract_nature = non_blank(nature);
        self
    }

    pub fn legal_basis(mut self, basis: &str) -> Self {
        self.legal_basis = non_blank(basis);
        self
    }

    /// Earliest publication date, `YYYY-MM-DD` or `YYYYMMDD`.
    pub fn published_from(mut self, date: &str) -> Self {
        self.published_from = compact_date(date);
        self
    }

    /// Latest publication date, `YYYY-MM-DD` or `YYYYMMDD`.
    pub fn published_to(mut self, date: &str) -> Self {
        self.published_to = compact_date(date);
        self
    }

    /// Latest tender submission deadline.
    pub fn deadline_to(mut self, date: &str) -> Self {
        self.deadline_to = compact_date(date);
        self
    }

    /// Buyer name (`AU`).
    pub fn buyer_name(mut self, name: &str) -> Self {
        self.buyer_name = non_blank(name);
        self
    }

    /// Buyer country, ISO 3166-1 alpha-3 (`CY`).
    pub fn buyer_country(mut self, country: &str) -> Self {
        self.buyer_country = non_blank(country);
        self
    }

    pub fn authority_activity(mut self, activity: &str) -> Self {
        self.authority_activity = non_blank(activity);
        self
    }

    pub fn lot(mut self, lot: &str) -> Self {
        self.lot = non_blank(lot);
        self
    }

    /// Publication number (`ND`), e.g. `123456-2025`.
    pub fn publication_number(mut self, number: &str) -> Self {
        self.publication_number = non_blank(number);
        self
    }

    pub fn gazette_issue(mut self, issue: &str) -> Self {
        self.gazette_issue = non_blank(issue);
        self
    }

    /// True when no criterion has been set.
    pub fn is_empty(&self) -> bool {
        self.criteria().is_empty()
    }

    /// Build the query; an empty builder yields notices published today
    /// or later.
    pub fn build(&self) -> String {
        self.build_on(Local::now().date_naive())
    }

    /// Build the query with `today` as the fallback date.
    pub fn build_on(&self, today: NaiveDate) -> String {
        let criteria = self.criteria();
        if criteria.is_empty() {
            return format!("PD>={}", today.format("%Y%m%d"));
        }
        criteria.join(" AND ")
    }

    fn criteria(&self) -> Vec<String> {
        let mut parts = Vec::new();

        if let Some(ref text) = self.full_text {
            parts.push(format!("FT~({})", quoted(text)));
        }
        if let Some(ref region) = self.region {
            parts.push(format!("RC={}", quoted(region)));
        }
        if let Some(ref cpv) = self.cpv {
            parts.push(format!("PC={}", quoted(cpv)));
        }
        if let Some(ref cpv) = self.cpv_lot {
            parts.push(format!("classification-cpv-lot={}", quoted(cpv)));
        }
        if let Some(notice_type) = self.notice_type {
            parts.push(format!("notice-type={}", quoted(notice_type.as_str())));
        }
        if let Some(ref procedure) = self.procedure {
            parts.push(format!("PR={}", quoted(procedure)));
        }
        if let Some(ref nature) = self.contract_nature {
            parts.push(format!("NC={}", quoted(nature)));
        }
        if let Some(ref basis) = self.legal_basis {
            parts.push(format!("legal-basis-notice={}", quoted(basis)));
        }

        match (&self.published_from, &self.published_to) {
            (Some(from), Some(to)) => parts.push(format!("PD=[{} TO {}]", from, to)),
            (Some(from), None) => parts.push(format!("PD>={}", from)),
            (None, Some(to)) => parts.push(format!("PD<={}", to)),
            (None, None) => {}
        }
        if let Some(ref deadline) = self.deadline_to {
            parts.push(format!("deadline-receipt-tender-date-lot<={}", deadline));
        }

        if let Some(ref name) = self.buyer_name {
            parts.push(format!("AU={}", quoted(name)));
        }
        if let Some(ref country) = self.buyer_country {
            parts.push(format!("CY={}", quoted(country)));
        }
        if let Some(ref activity) = self.authority_activity {
            parts.push(format!("authority-main-activity={}", quoted(activity)));
        }
        if let Some(ref lot) = self.lot {
            parts.push(format!("lot-included-proc={}", quoted(lot)));
        }
        if let Some(ref number) = self.publication_number {
            parts.push(format!("ND={}", quoted(number)));
        }
        if let Some(ref issue) = self.gazette_issue {
            parts.push(format!("gazette-issue-id={}", quoted(issue)));
        }

        parts
    }
}

//! Gestational-age parsing and reconciliation
//!
//! Sonographic GA estimates are entered as `"<weeks>w<days>d"` strings, one
//! per biometric parameter. Reconciliation picks a single GA and derives the
//! estimated due date from it:
//!
//! - a CRL estimate below 14 weeks determines the GA alone
//! - otherwise the present biometric estimates are averaged
//! - with no usable estimate there is no GA and no EDD

use chrono::{Duration, Local, NaiveDate};
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Length of a pregnancy from LMP, in days
pub const TERM_DAYS: i64 = 280;

/// CRL dating applies below this GA (14 weeks)
pub const CRL_DATING_LIMIT_DAYS: u32 = 98;

static GA_PATTERN: OnceLock<Regex> = OnceLock::new();

fn ga_pattern() -> &'static Regex {
    GA_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d{1,2})\s*(?:w|\+)\s*(?:(\d)\s*d?)?\s*$")
            .expect("valid GA regex")
    })
}

/// Gestational age in whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GestationalAge {
    pub days: u32,
}

impl GestationalAge {
    pub fn from_days(days: u32) -> Self {
        Self { days }
    }

    /// Parses `"20w1d"`, `"20w"`, `"20 w 1 d"` or `"20+1"`
    ///
    /// Returns `None` for anything else, including a day part above 6.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = ga_pattern().captures(s)?;
        let weeks: u32 = caps.get(1)?.as_str().parse().ok()?;
        let days: u32 = match caps.get(2) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0,
        };
        if days > 6 {
            return None;
        }
        Some(Self::from_days(weeks * 7 + days))
    }

    /// Gestational age on `on` for a pregnancy with the given LMP
    pub fn from_lmp(lmp: NaiveDate, on: NaiveDate) -> Option<Self> {
        let days = (on - lmp).num_days();
        u32::try_from(days).ok().map(Self::from_days)
    }

    pub fn weeks(&self) -> u32 {
        self.days / 7
    }

    pub fn remainder_days(&self) -> u32 {
        self.days % 7
    }

    /// Due date for this GA measured on `exam_date`
    pub fn due_date(&self, exam_date: NaiveDate) -> Option<NaiveDate> {
        exam_date.checked_add_signed(Duration::days(TERM_DAYS - i64::from(self.days)))
    }
}

impl fmt::Display for GestationalAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}w{}d", self.weeks(), self.remainder_days())
    }
}

/// Arithmetic mean of several estimates, rounded to the nearest day
pub fn mean(estimates: &[GestationalAge]) -> Option<GestationalAge> {
    if estimates.is_empty() {
        return None;
    }
    let total: u64 = estimates.iter().map(|ga| u64::from(ga.days)).sum();
    let mean = (total as f64 / estimates.len() as f64).round();
    Some(GestationalAge::from_days(mean as u32))
}

/// Naegele's rule: LMP + 280 days
pub fn due_date_from_lmp(lmp: NaiveDate) -> Option<NaiveDate> {
    lmp.checked_add_signed(Duration::days(TERM_DAYS))
}

/// Parses an ISO (`2024-01-31`) or day-first (`31/01/2024`) date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// How the final GA was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatingMethod {
    /// First-trimester crown-rump length
    Crl,
    /// Mean of this many biometric estimates
    Biometry(usize),
}

impl fmt::Display for DatingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatingMethod::Crl => write!(f, "CRL"),
            DatingMethod::Biometry(1) => write!(f, "Single biometric estimate"),
            DatingMethod::Biometry(n) => write!(f, "Mean of {} biometric estimates", n),
        }
    }
}

/// Result of GA reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub ga: Option<GestationalAge>,
    pub edd: Option<NaiveDate>,
    pub method: Option<DatingMethod>,

    /// The EDD was computed from the current date because the exam date was
    /// missing or invalid
    pub exam_date_substituted: bool,
}

impl Reconciled {
    pub fn ga_string(&self) -> Option<String> {
        self.ga.map(|ga| ga.to_string())
    }

    pub fn edd_string(&self) -> Option<String> {
        self.edd.map(format_date)
    }
}

fn parse_estimate(raw: &str) -> Option<GestationalAge> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = GestationalAge::parse(raw);
    if parsed.is_none() {
        debug!("Dropping unparsable GA '{}'", raw);
    }
    parsed
}

/// Picks the final GA from a CRL estimate and the biometric estimates
pub fn final_age(
    crl: Option<&str>,
    biometry: &[&str],
) -> Option<(GestationalAge, DatingMethod)> {
    if let Some(crl) = crl.and_then(parse_estimate) {
        if crl.days < CRL_DATING_LIMIT_DAYS {
            return Some((crl, DatingMethod::Crl));
        }
        debug!("CRL GA {} is beyond first-trimester dating; ignoring it", crl);
    }
    let estimates: Vec<GestationalAge> = biometry.iter().filter_map(|s| parse_estimate(s)).collect();
    mean(&estimates).map(|ga| (ga, DatingMethod::Biometry(estimates.len())))
}

/// Reconciles GA estimates and derives the EDD, using `today` when the exam
/// date is missing or invalid
pub fn reconcile_on(
    crl: Option<&str>,
    biometry: &[&str],
    exam_date: Option<&str>,
    today: NaiveDate,
) -> Reconciled {
    let Some((ga, method)) = final_age(crl, biometry) else {
        return Reconciled {
            ga: None,
            edd: None,
            method: None,
            exam_date_substituted: false,
        };
    };

    let (date, substituted) = match exam_date.and_then(parse_date) {
        Some(date) => (date, false),
        None => {
            warn!(
                "Exam date {:?} missing or invalid; computing EDD from {}",
                exam_date,
                format_date(today)
            );
            (today, true)
        }
    };

    Reconciled {
        ga: Some(ga),
        edd: ga.due_date(date),
        method: Some(method),
        exam_date_substituted: substituted,
    }
}

/// Reconciles against the current local date
///
/// # Example
///
/// ```
/// use sonoreport_core::calc::gestational_age::reconcile;
///
/// let result = reconcile(Some("10w2d"), &["20w0d", "21w0d"], Some("2024-01-01"));
/// assert_eq!(result.ga_string().as_deref(), Some("10w2d"));
/// ```
pub fn reconcile(crl: Option<&str>, biometry: &[&str], exam_date: Option<&str>) -> Reconciled {
    reconcile_on(crl, biometry, exam_date, Local::now().date_naive())
}

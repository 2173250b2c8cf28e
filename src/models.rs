use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Applied,
    Rejected,
    Selected,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Applied, Status::Rejected, Status::Selected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Applied => "Applied",
            Status::Rejected => "Rejected",
            Status::Selected => "Selected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "applied" => Ok(Status::Applied),
            "rejected" => Ok(Status::Rejected),
            "selected" => Ok(Status::Selected),
            _ => Err(InputError::UnknownStatus(s.to_string())),
        }
    }
}

/// One tracked job application, as stored under the `jobData` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: i64,
    pub title: String,
    pub company: String,
    /// Annual CTC in lakhs. `None` means "not entered", which is not zero.
    #[serde(default)]
    pub ctc: Option<f64>,
    #[serde(default)]
    pub status: Status,
    #[cfg(feature = "notes")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl JobApplication {
    /// Compensation used for ordering; absent counts as zero.
    pub fn ctc_or_zero(&self) -> f64 {
        self.ctc.unwrap_or(0.0)
    }

    #[cfg(feature = "notes")]
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Everything the user fills in when adding an application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewApplication {
    pub title: String,
    pub company: String,
    pub ctc: Option<f64>,
    pub status: Status,
    #[cfg(feature = "notes")]
    pub note: Option<String>,
}

impl NewApplication {
    pub fn new(title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            ..Default::default()
        }
    }

    pub fn with_ctc(mut self, ctc: Option<f64>) -> Self {
        self.ctc = ctc;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    #[cfg(feature = "notes")]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub(crate) fn into_application(self, id: i64) -> JobApplication {
        JobApplication {
            id,
            title: self.title,
            company: self.company,
            ctc: self.ctc,
            status: self.status,
            #[cfg(feature = "notes")]
            note: self.note,
        }
    }
}

/// Status filter for the derived view. `All` disables status filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => *s == status,
        }
    }

    /// All -> Applied -> Rejected -> Selected -> All
    pub fn cycle(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(Status::Applied),
            StatusFilter::Only(Status::Applied) => StatusFilter::Only(Status::Rejected),
            StatusFilter::Only(Status::Rejected) => StatusFilter::Only(Status::Selected),
            StatusFilter::Only(Status::Selected) => StatusFilter::All,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(s) => s.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(InputError::UnknownSortOrder(s.to_string())),
        }
    }
}

/// Parses compensation as typed by the user.
///
/// Blank input means "not entered". Anything that is not a finite,
/// non-negative number is rejected instead of being coerced to zero.
pub fn parse_ctc(input: &str) -> Result<Option<f64>, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(InputError::NotANumber(trimmed.to_string()));
    }
    if value < 0.0 {
        return Err(InputError::Negative(value));
    }
    Ok(Some(value))
}

/// Formats compensation the way the tracker table shows it, e.g. `₹12.50 L`.
pub fn format_ctc(ctc: Option<f64>) -> String {
    let value = ctc.unwrap_or(0.0);
    let whole = value.floor();
    let cents = ((value - whole) * 100.0).round() as i64;
    // 12.999 rounds up into the next whole number
    let (whole, cents) = if cents >= 100 {
        (whole + 1.0, cents - 100)
    } else {
        (whole, cents)
    };
    format!("₹{}.{:02} L", whole as i64, cents)
}

//! Opportunity listings as published by the remote service.
//!
//! The client only ever holds a read-only, possibly stale snapshot. Deadlines
//! are fixed instants; a listing published with a calendar date closes at
//! midnight UTC of that date.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors for opportunity primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpportunityValidationError {
    /// Identifier was empty or padded with whitespace.
    InvalidId,
    /// Category did not name a known listing kind.
    UnknownCategory(String),
    /// Deadline was neither a calendar date nor an RFC 3339 timestamp.
    InvalidDeadline(String),
}

impl fmt::Display for OpportunityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "opportunity id must be a non-empty, unpadded string"),
            Self::UnknownCategory(raw) => write!(f, "unknown opportunity category: {raw}"),
            Self::InvalidDeadline(raw) => write!(f, "unrecognised deadline: {raw}"),
        }
    }
}

impl std::error::Error for OpportunityValidationError {}

/// Remote-assigned identifier of an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OpportunityId(String);

impl OpportunityId {
    /// Validate and construct an [`OpportunityId`].
    pub fn new(id: impl Into<String>) -> Result<Self, OpportunityValidationError> {
        let id = id.into();
        if id.is_empty() || id.trim() != id {
            return Err(OpportunityValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for OpportunityId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<OpportunityId> for String {
    fn from(value: OpportunityId) -> Self {
        value.0
    }
}

impl TryFrom<String> for OpportunityId {
    type Error = OpportunityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Kind of listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Study funding.
    Bursary,
    /// Fixed-term work placement.
    Internship,
    /// Graduate programme.
    Graduate,
    /// Workplace learning programme.
    Learnership,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Self; 4] = [
        Self::Bursary,
        Self::Internship,
        Self::Graduate,
        Self::Learnership,
    ];

    /// Wire name of the category.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bursary => "bursary",
            Self::Internship => "internship",
            Self::Graduate => "graduate",
            Self::Learnership => "learnership",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = OpportunityValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == raw)
            .ok_or_else(|| OpportunityValidationError::UnknownCategory(raw.to_owned()))
    }
}

/// Category selector used by the catalogue filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Keep every listing.
    #[default]
    All,
    /// Keep listings of exactly this category.
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = OpportunityValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "all" {
            return Ok(Self::All);
        }
        raw.parse().map(Self::Only)
    }
}

/// Funding breakdown; each component is a display string such as `R50,000`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Funding {
    /// Tuition cover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuition: Option<String>,
    /// Accommodation cover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<String>,
    /// Living allowance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowance: Option<String>,
}

impl Funding {
    /// Whether no component is present.
    pub fn is_empty(&self) -> bool {
        self.tuition.is_none() && self.accommodation.is_none() && self.allowance.is_none()
    }
}

/// Published listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    /// Listing identifier.
    pub id: OpportunityId,
    /// Title.
    pub title: String,
    /// Listing kind.
    pub category: Category,
    /// Organisation offering the opportunity.
    pub provider: String,
    /// Field of study targeted.
    pub field_of_study: String,
    /// Location.
    pub location: String,
    /// Funding breakdown.
    pub funding: Funding,
    /// Minimum average mark, as a percentage.
    pub minimum_average: Option<u8>,
    /// Closing instant.
    pub deadline: DateTime<Utc>,
    /// Ordered application questions.
    pub questions: Vec<String>,
    /// Names of documents applicants must upload.
    pub required_documents: Vec<String>,
    /// Free-form description.
    pub description: Option<String>,
}

impl Opportunity {
    /// Whether applications are still accepted at `now`.
    ///
    /// The deadline instant itself is still open.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.deadline
    }
}

/// Parse a remote deadline: a `YYYY-MM-DD` date (midnight UTC) or RFC 3339.
///
/// # Examples
/// ```
/// use portal_client::domain::parse_deadline;
///
/// let date_only = parse_deadline("2025-12-31").unwrap();
/// let explicit = parse_deadline("2025-12-31T00:00:00Z").unwrap();
/// assert_eq!(date_only, explicit);
/// ```
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, OpportunityValidationError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| OpportunityValidationError::InvalidDeadline(raw.to_owned()))
}

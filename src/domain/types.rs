//! Shared domain enums and column conventions.

use std::{fmt, str::FromStr};

use serde::Serialize;

use super::error::DomainError;

/// Lifecycle status stored on pages and page blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Archive,
    Draft,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Archive => "archive",
            RecordStatus::Draft => "draft",
        }
    }
}

/// Render a boolean as the `'Y'`/`'N'` flag used by the schema.
pub fn flag(value: bool) -> &'static str {
    if value { "Y" } else { "N" }
}

/// Parse a `'Y'`/`'N'` flag column. Anything other than `Y` is false.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("y")
}

/// Numeric page identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageId(i64);

impl PageId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for PageId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for PageId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|err| DomainError::validation(format!("invalid page id `{value}`: {err}")))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

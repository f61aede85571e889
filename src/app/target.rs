//! Snapshot target (year and month) and everything derived from it
//!
//! A run processes exactly one monthly snapshot. The target determines the
//! remote listing URL, the destination directory, the manifest location and
//! the database schema, so all of those are computed here and nowhere else.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use url::Url;

use crate::constants::{files, load};
use crate::errors::{ListingError, TargetError};

/// Earliest year accepted as a snapshot target
const MIN_YEAR: i32 = 2000;

/// Latest year accepted as a snapshot target
const MAX_YEAR: i32 = 9999;

/// Month names used for destination directories
const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// One monthly snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    year: i32,
    month: u32,
}

impl Target {
    /// Create a target from already parsed values
    pub fn new(year: i32, month: u32) -> Result<Self, TargetError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year)
            || NaiveDate::from_ymd_opt(year, month, 1).is_none()
        {
            return Err(TargetError::OutOfRange { year, month });
        }
        Ok(Self { year, month })
    }

    /// Parse a target from raw user input
    pub fn parse(year: &str, month: &str) -> Result<Self, TargetError> {
        let year_value = year
            .trim()
            .parse::<i32>()
            .map_err(|_| TargetError::InvalidYear {
                input: year.trim().to_string(),
            })?;
        let month_value = month
            .trim()
            .parse::<u32>()
            .map_err(|_| TargetError::InvalidMonth {
                input: month.trim().to_string(),
            })?;
        Self::new(year_value, month_value)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Localized, capitalized month name (e.g. "Março")
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// Remote directory listing for this snapshot, always with a trailing slash
    pub fn listing_url(&self, base_url: &str) -> Result<Url, ListingError> {
        let raw = format!(
            "{}/{:04}-{:02}/",
            base_url.trim_end_matches('/'),
            self.year,
            self.month
        );
        Url::parse(&raw).map_err(|_| ListingError::InvalidLink { href: raw })
    }

    /// Database schema holding this snapshot's tables
    pub fn schema_name(&self) -> String {
        format!("{}{:04}{:02}", load::SCHEMA_PREFIX, self.year, self.month)
    }

    /// Directory holding the corrected files and the manifest
    pub fn destination_dir(&self, root: &Path) -> PathBuf {
        root.join(format!("{:04}", self.year))
            .join(format!("{}. {}", self.month, self.month_name()))
    }

    /// Location of this snapshot's manifest
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        self.destination_dir(root).join(files::MANIFEST_FILE_NAME)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

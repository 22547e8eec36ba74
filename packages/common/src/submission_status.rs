#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::academic::ParseEnumError;

/// Hand-in status of a student's assignment submission.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
pub enum SubmissionStatus {
    /// Nothing handed in yet.
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Pending"))]
    Pending,
    /// A file was uploaded or the paper copy was collected.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Submitted"))]
    Submitted,
    /// Checked off by the professor.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Completed"))]
    Completed,
    /// Due date passed without a hand-in.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Missed"))]
    Missed,
}

impl SubmissionStatus {
    /// All possible status values.
    pub const ALL: &'static [SubmissionStatus] =
        &[Self::Pending, Self::Submitted, Self::Completed, Self::Missed];

    /// Statuses that count as handed in.
    pub const DONE: &'static [SubmissionStatus] = &[Self::Submitted, Self::Completed];

    /// Returns true for `Submitted` and `Completed`. These are terminal.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Submitted | Self::Completed)
    }

    /// Status to display for a submission on `today`.
    ///
    /// Pure: the stored status is never rewritten by a read. A done status is
    /// returned unchanged; otherwise an overdue submission without a file is
    /// `Missed`.
    pub fn effective(self, due_date: NaiveDate, has_file: bool, today: NaiveDate) -> Self {
        if self.is_done() {
            return self;
        }
        if due_date < today && !has_file {
            return Self::Missed;
        }
        self
    }

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Submitted => "Submitted",
            Self::Completed => "Completed",
            Self::Missed => "Missed",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Submitted" => Ok(Self::Submitted),
            "Completed" => Ok(Self::Completed),
            "Missed" => Ok(Self::Missed),
            _ => Err(ParseEnumError::new(
                "submission status",
                s,
                &["Pending", "Submitted", "Completed", "Missed"],
            )),
        }
    }
}

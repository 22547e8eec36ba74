#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing an invalid enumeration string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    invalid: String,
    valid: &'static [&'static str],
}

impl ParseEnumError {
    pub fn new(kind: &'static str, invalid: &str, valid: &'static [&'static str]) -> Self {
        Self {
            kind,
            invalid: invalid.to_string(),
            valid,
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid {} '{}'. Valid values: {}",
            self.kind,
            self.invalid,
            self.valid.join(", ")
        )
    }
}

impl std::error::Error for ParseEnumError {}

/// Lab group a student belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")
)]
pub enum GroupTag {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "A"))]
    A,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "B"))]
    B,
}

impl GroupTag {
    pub const ALL: &'static [GroupTag] = &[Self::A, Self::B];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupTag {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            _ => Err(ParseEnumError::new("group", s, &["A", "B"])),
        }
    }
}

/// Which part of the cohort an attendance session covers.
///
/// `All` is the default for theory lectures; `A`/`B` only narrow the cohort for
/// practical subjects.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")
)]
pub enum GroupQualifier {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "A"))]
    A,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "B"))]
    B,
    #[default]
    #[serde(rename = "ALL")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ALL"))]
    All,
}

impl GroupQualifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::All => "ALL",
        }
    }

    /// The single group this qualifier names, if any.
    pub fn group(&self) -> Option<GroupTag> {
        match self {
            Self::A => Some(GroupTag::A),
            Self::B => Some(GroupTag::B),
            Self::All => None,
        }
    }
}

impl fmt::Display for GroupQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupQualifier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "ALL" => Ok(Self::All),
            _ => Err(ParseEnumError::new("group qualifier", s, &["A", "B", "ALL"])),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
pub enum SubjectType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Theory"))]
    Theory,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Practical"))]
    Practical,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Theory => "Theory",
            Self::Practical => "Practical",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubjectType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Theory" => Ok(Self::Theory),
            "Practical" => Ok(Self::Practical),
            _ => Err(ParseEnumError::new(
                "subject type",
                s,
                &["Theory", "Practical"],
            )),
        }
    }
}

/// How an assignment is handed in.
///
/// Offline assignments are collected on paper and their status is marked by
/// staff or a CR; online ones are uploaded by the student.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")
)]
pub enum AssignmentType {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Online"))]
    Online,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Offline"))]
    Offline,
}

impl AssignmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }
}

impl fmt::Display for AssignmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Online" => Ok(Self::Online),
            "Offline" => Ok(Self::Offline),
            _ => Err(ParseEnumError::new(
                "assignment type",
                s,
                &["Online", "Offline"],
            )),
        }
    }
}

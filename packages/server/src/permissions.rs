use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const STUDENT_MANAGE: &str = "student:manage";
pub const STUDENT_LIST: &str = "student:list";
pub const PROFESSOR_MANAGE: &str = "professor:manage";
pub const SUBJECT_MANAGE: &str = "subject:manage";
pub const ATTENDANCE_MARK: &str = "attendance:mark";
pub const ATTENDANCE_EDIT: &str = "attendance:edit";
pub const ATTENDANCE_VIEW_ALL: &str = "attendance:view_all";
pub const REPORT_VIEW: &str = "report:view";
pub const ASSIGNMENT_CREATE: &str = "assignment:create";
pub const ASSIGNMENT_SUBMIT: &str = "assignment:submit";
pub const SUBMISSION_MARK: &str = "submission:mark";
pub const SUBMISSION_MARK_OFFLINE: &str = "submission:mark_offline";
pub const SUBMISSION_VIEW_ALL: &str = "submission:view_all";
pub const ANNOUNCEMENT_POST: &str = "announcement:post";
pub const ANNOUNCEMENT_POST_GROUP: &str = "announcement:post_group";
pub const DATA_PURGE: &str = "data:purge";

const STAFF: &[&str] = &[
    STUDENT_LIST,
    ATTENDANCE_VIEW_ALL,
    REPORT_VIEW,
    ASSIGNMENT_CREATE,
    SUBMISSION_MARK,
    SUBMISSION_VIEW_ALL,
];

const ADMIN_ONLY: &[&str] = &[
    STUDENT_MANAGE,
    PROFESSOR_MANAGE,
    SUBJECT_MANAGE,
    ATTENDANCE_EDIT,
    DATA_PURGE,
    ANNOUNCEMENT_POST,
    ANNOUNCEMENT_POST_GROUP,
];

const STUDENT: &[&str] = &[ASSIGNMENT_SUBMIT];

const CLASS_REPRESENTATIVE: &[&str] = &[
    ATTENDANCE_MARK,
    SUBMISSION_MARK_OFFLINE,
    ANNOUNCEMENT_POST_GROUP,
    STUDENT_LIST,
];

/// Kind of account a principal logged in with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Professor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professor => "professor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = common::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "professor" => Ok(Self::Professor),
            "admin" => Ok(Self::Admin),
            _ => Err(common::ParseEnumError::new(
                "role",
                s,
                &["student", "professor", "admin"],
            )),
        }
    }
}

/// Permissions granted at login. `is_cr` only matters for students.
pub fn permissions_for(role: Role, is_cr: bool) -> Vec<String> {
    let tables: &[&[&str]] = match role {
        Role::Admin => &[ADMIN_ONLY, STAFF],
        Role::Professor => &[STAFF],
        Role::Student if is_cr => &[STUDENT, CLASS_REPRESENTATIVE],
        Role::Student => &[STUDENT],
    };
    let mut permissions: Vec<String> = Vec::new();
    for perm in tables.iter().flat_map(|t| t.iter()) {
        if !permissions.iter().any(|p| p == perm) {
            permissions.push((*perm).to_string());
        }
    }
    permissions
}

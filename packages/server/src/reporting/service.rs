use std::collections::{BTreeSet, HashMap, HashSet};

use common::SubmissionStatus;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};

use super::stats::{SubjectTally, Tally, tally_by_subject};
use crate::entity::{assignment, assignment_submission, attendance_record, attendance_session, subject};

/// Everything the report of one student shows.
#[derive(Debug, Clone)]
pub struct StudentReport {
    pub attendance: Tally,
    pub attendance_by_subject: Vec<SubjectTally>,
    pub assignments: Tally,
    pub assignments_by_subject: Vec<SubjectTally>,
}

/// Read-only aggregation over the attendance ledger and submissions.
pub struct ReportService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ReportService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Classes attended out of the classes the student has a record for.
    pub async fn attendance_summary(&self, student_id: i32) -> Result<Tally, DbErr> {
        let total = attendance_record::Entity::find()
            .filter(attendance_record::Column::StudentId.eq(student_id))
            .count(self.conn)
            .await?;
        let attended = attendance_record::Entity::find()
            .filter(attendance_record::Column::StudentId.eq(student_id))
            .filter(attendance_record::Column::Present.eq(true))
            .count(self.conn)
            .await?;
        Ok(Tally::new(attended, total))
    }

    /// Per-subject attendance; subjects without any record are left out.
    pub async fn attendance_by_subject(&self, student_id: i32) -> Result<Vec<SubjectTally>, DbErr> {
        let marks: Vec<(i32, bool)> = attendance_record::Entity::find()
            .select_only()
            .column(attendance_record::Column::SessionId)
            .column(attendance_record::Column::Present)
            .filter(attendance_record::Column::StudentId.eq(student_id))
            .into_tuple()
            .all(self.conn)
            .await?;
        if marks.is_empty() {
            return Ok(Vec::new());
        }

        let session_ids: BTreeSet<i32> = marks.iter().map(|(id, _)| *id).collect();
        let session_subjects: HashMap<i32, i32> = attendance_session::Entity::find()
            .select_only()
            .column(attendance_session::Column::Id)
            .column(attendance_session::Column::SubjectId)
            .filter(attendance_session::Column::Id.is_in(session_ids))
            .into_tuple::<(i32, i32)>()
            .all(self.conn)
            .await?
            .into_iter()
            .collect();

        let rows: Vec<(i32, bool)> = marks
            .into_iter()
            .filter_map(|(session_id, present)| {
                session_subjects.get(&session_id).map(|s| (*s, present))
            })
            .collect();
        let names = self.subject_names(rows.iter().map(|(s, _)| *s)).await?;
        Ok(tally_by_subject(rows, &names))
    }

    /// Assignments handed in (`Submitted` or `Completed`) out of all assignments.
    pub async fn assignment_summary(&self, student_id: i32) -> Result<Tally, DbErr> {
        let total = assignment::Entity::find().count(self.conn).await?;
        let done = assignment_submission::Entity::find()
            .filter(assignment_submission::Column::StudentId.eq(student_id))
            .filter(
                assignment_submission::Column::Status
                    .is_in(SubmissionStatus::DONE.iter().copied()),
            )
            .count(self.conn)
            .await?;
        Ok(Tally::new(done, total))
    }

    /// Per-subject assignment completion; subjects without assignments are left out.
    pub async fn assignment_by_subject(&self, student_id: i32) -> Result<Vec<SubjectTally>, DbErr> {
        let assignments: Vec<(i32, i32)> = assignment::Entity::find()
            .select_only()
            .column(assignment::Column::Id)
            .column(assignment::Column::SubjectId)
            .into_tuple()
            .all(self.conn)
            .await?;
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let done: HashSet<i32> = assignment_submission::Entity::find()
            .select_only()
            .column(assignment_submission::Column::AssignmentId)
            .filter(assignment_submission::Column::StudentId.eq(student_id))
            .filter(
                assignment_submission::Column::Status
                    .is_in(SubmissionStatus::DONE.iter().copied()),
            )
            .into_tuple::<i32>()
            .all(self.conn)
            .await?
            .into_iter()
            .collect();

        let rows: Vec<(i32, bool)> = assignments
            .into_iter()
            .map(|(assignment_id, subject_id)| (subject_id, done.contains(&assignment_id)))
            .collect();
        let names = self.subject_names(rows.iter().map(|(s, _)| *s)).await?;
        Ok(tally_by_subject(rows, &names))
    }

    pub async fn student_report(&self, student_id: i32) -> Result<StudentReport, DbErr> {
        Ok(StudentReport {
            attendance: self.attendance_summary(student_id).await?,
            attendance_by_subject: self.attendance_by_subject(student_id).await?,
            assignments: self.assignment_summary(student_id).await?,
            assignments_by_subject: self.assignment_by_subject(student_id).await?,
        })
    }

    async fn subject_names(
        &self,
        ids: impl Iterator<Item = i32>,
    ) -> Result<HashMap<i32, String>, DbErr> {
        let ids: BTreeSet<i32> = ids.collect();
        let names = subject::Entity::find()
            .select_only()
            .column(subject::Column::Id)
            .column(subject::Column::Name)
            .filter(subject::Column::Id.is_in(ids))
            .into_tuple::<(i32, String)>()
            .all(self.conn)
            .await?;
        Ok(names.into_iter().collect())
    }
}

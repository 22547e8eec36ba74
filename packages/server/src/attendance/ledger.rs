use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use common::{GroupQualifier, GroupTag, SubjectType};
use sea_orm::sea_query::{LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::cohort::cohort_group;
use super::error::LedgerError;
use crate::entity::{attendance_record, attendance_session, professor, student, subject};

/// Natural key of an attendance session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKey {
    pub subject_id: i32,
    pub professor_id: i32,
    pub date: NaiveDate,
    pub group: GroupQualifier,
}

/// A roster submission for one session.
#[derive(Debug, Clone)]
pub struct MarkRequest {
    pub key: SessionKey,
    pub subject_type: SubjectType,
    /// Student (CR) who took the roll call.
    pub recorded_by: Option<i32>,
    /// IDs of the students present. Everyone else in the cohort is absent.
    pub present: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct MarkOutcome {
    pub session: attendance_session::Model,
    /// `false` when an existing session was reused and its roster replaced.
    pub created: bool,
    pub cohort_size: usize,
    pub present_count: usize,
}

/// New presence (and optionally note) for one record.
#[derive(Debug, Clone)]
pub struct RecordEdit {
    pub record_id: i32,
    pub present: bool,
    /// `None` leaves the note alone, `Some(None)` clears it.
    pub note: Option<Option<String>>,
}

/// Filters for session search. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub professor_id: Option<i32>,
    pub subject_id: Option<i32>,
    pub date: Option<NaiveDate>,
    pub subject_type: Option<SubjectType>,
    pub group: Option<GroupQualifier>,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session: attendance_session::Model,
    pub present: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReportRow {
    pub record_id: i32,
    pub student_id: i32,
    pub roll: String,
    pub name: String,
    pub group: GroupTag,
    pub present: bool,
    pub note: Option<String>,
}

/// One of a student's own attendance rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentAttendanceRow {
    pub session_id: i32,
    pub date: NaiveDate,
    pub subject_id: i32,
    pub subject_name: String,
    pub subject_type: SubjectType,
    pub professor_name: String,
    pub group: GroupQualifier,
    pub present: bool,
    pub note: Option<String>,
}

pub struct AttendanceLedger<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> AttendanceLedger<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Record a roster for a session, replacing any roster recorded before
    /// for the same key.
    ///
    /// Must run inside a transaction: the session row stays locked until
    /// commit, so concurrent markings of the same key serialize.
    pub async fn mark(&self, req: &MarkRequest) -> Result<MarkOutcome, LedgerError> {
        let cohort = self.cohort(req.subject_type, req.key.group).await?;
        let present: BTreeSet<i32> = req.present.iter().copied().collect();

        let members: HashSet<i32> = cohort.iter().copied().collect();
        let outside: Vec<i32> = present
            .iter()
            .filter(|id| !members.contains(id))
            .copied()
            .collect();
        if !outside.is_empty() {
            return Err(LedgerError::Validation(format!(
                "Students {outside:?} are not in the cohort of this session"
            )));
        }

        let (session, created) = self
            .resolve_or_create(&req.key, req.subject_type, req.recorded_by)
            .await?;
        if !created {
            let removed = self.clear_records(session.id).await?;
            tracing::debug!(session_id = session.id, removed, "Cleared previous roster");
        }
        let present_count = self.populate_records(session.id, &cohort, &present).await?;

        Ok(MarkOutcome {
            session,
            created,
            cohort_size: cohort.len(),
            present_count,
        })
    }

    /// IDs of the students a session with this subject type and group covers,
    /// in ID order.
    pub async fn cohort(
        &self,
        subject_type: SubjectType,
        group: GroupQualifier,
    ) -> Result<Vec<i32>, DbErr> {
        let mut query = student::Entity::find()
            .select_only()
            .column(student::Column::Id)
            .order_by_asc(student::Column::Id);
        if let Some(tag) = cohort_group(subject_type, group) {
            query = query.filter(student::Column::GroupTag.eq(tag));
        }
        query.into_tuple::<i32>().all(self.conn).await
    }

    /// Find the session for `key`, creating it if absent, and lock its row.
    ///
    /// Returns the session and whether it was created by this call. A reused
    /// session keeps its subject type snapshot and CR attribution.
    pub async fn resolve_or_create(
        &self,
        key: &SessionKey,
        subject_type: SubjectType,
        recorded_by: Option<i32>,
    ) -> Result<(attendance_session::Model, bool), DbErr> {
        let now = Utc::now();
        let candidate = attendance_session::ActiveModel {
            subject_id: Set(key.subject_id),
            professor_id: Set(key.professor_id),
            date: Set(key.date),
            group_qualifier: Set(key.group),
            subject_type: Set(subject_type),
            recorded_by_cr_id: Set(recorded_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = match attendance_session::Entity::insert(candidate)
            .on_conflict(
                OnConflict::columns([
                    attendance_session::Column::SubjectId,
                    attendance_session::Column::ProfessorId,
                    attendance_session::Column::Date,
                    attendance_session::Column::GroupQualifier,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await
        {
            Ok(rows) => rows > 0,
            Err(DbErr::RecordNotInserted) => false,
            Err(e) => return Err(e),
        };

        let session = attendance_session::Entity::find()
            .filter(attendance_session::Column::SubjectId.eq(key.subject_id))
            .filter(attendance_session::Column::ProfessorId.eq(key.professor_id))
            .filter(attendance_session::Column::Date.eq(key.date))
            .filter(attendance_session::Column::GroupQualifier.eq(key.group))
            .lock(LockType::Update)
            .one(self.conn)
            .await?
            .ok_or_else(|| {
                DbErr::RecordNotFound("attendance session missing after upsert".to_string())
            })?;

        if created {
            return Ok((session, true));
        }

        let mut active = session.into_active_model();
        active.updated_at = Set(now);
        let session = active.update(self.conn).await?;
        Ok((session, false))
    }

    /// Delete every record of a session. Returns the number removed.
    pub async fn clear_records(&self, session_id: i32) -> Result<u64, DbErr> {
        let result = attendance_record::Entity::delete_many()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Insert one record per cohort student. Returns how many are present.
    pub async fn populate_records(
        &self,
        session_id: i32,
        cohort: &[i32],
        present: &BTreeSet<i32>,
    ) -> Result<usize, DbErr> {
        if cohort.is_empty() {
            return Ok(0);
        }

        let records = cohort.iter().map(|&student_id| attendance_record::ActiveModel {
            session_id: Set(session_id),
            student_id: Set(student_id),
            present: Set(present.contains(&student_id)),
            note: Set(None),
            ..Default::default()
        });
        attendance_record::Entity::insert_many(records)
            .exec_without_returning(self.conn)
            .await?;

        Ok(cohort.iter().filter(|id| present.contains(id)).count())
    }

    pub async fn find_session(&self, session_id: i32) -> Result<attendance_session::Model, LedgerError> {
        attendance_session::Entity::find_by_id(session_id)
            .one(self.conn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("Attendance session not found".into()))
    }

    /// Apply presence edits to records of one session.
    ///
    /// Either every edit applies or none does: a record ID that does not
    /// belong to the session fails the whole call before anything is written.
    pub async fn edit_records(
        &self,
        session_id: i32,
        edits: &[RecordEdit],
    ) -> Result<Vec<SessionReportRow>, LedgerError> {
        let session = attendance_session::Entity::find_by_id(session_id)
            .lock(LockType::Update)
            .one(self.conn)
            .await?
            .ok_or_else(|| LedgerError::NotFound("Attendance session not found".into()))?;

        let ids: Vec<i32> = edits.iter().map(|e| e.record_id).collect();
        let records: HashMap<i32, attendance_record::Model> = attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .filter(attendance_record::Column::Id.is_in(ids.clone()))
            .lock(LockType::Update)
            .all(self.conn)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let missing: Vec<i32> = ids
            .iter()
            .filter(|id| !records.contains_key(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(LedgerError::NotFound(format!(
                "Records {missing:?} not found in session {session_id}"
            )));
        }

        for edit in edits {
            let Some(record) = records.get(&edit.record_id) else {
                continue;
            };
            let mut active = record.clone().into_active_model();
            active.present = Set(edit.present);
            if let Some(note) = &edit.note {
                active.note = Set(note.clone());
            }
            active.update(self.conn).await?;
        }

        let mut active = session.into_active_model();
        active.updated_at = Set(Utc::now());
        active.update(self.conn).await?;

        Ok(self.session_report(session_id).await?)
    }

    /// Records of a session in creation order, joined with the student.
    pub async fn session_report(&self, session_id: i32) -> Result<Vec<SessionReportRow>, DbErr> {
        let records = attendance_record::Entity::find()
            .filter(attendance_record::Column::SessionId.eq(session_id))
            .order_by_asc(attendance_record::Column::Id)
            .all(self.conn)
            .await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let student_ids: Vec<i32> = records.iter().map(|r| r.student_id).collect();
        let students: HashMap<i32, student::Model> = student::Entity::find()
            .filter(student::Column::Id.is_in(student_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        Ok(records
            .into_iter()
            .filter_map(|r| {
                let s = students.get(&r.student_id)?;
                Some(SessionReportRow {
                    record_id: r.id,
                    student_id: s.id,
                    roll: s.roll.clone(),
                    name: s.name.clone(),
                    group: s.group_tag,
                    present: r.present,
                    note: r.note,
                })
            })
            .collect())
    }

    /// Sessions matching `filter`, ordered by group qualifier, then newest first.
    pub async fn search_sessions(&self, filter: &SessionFilter) -> Result<Vec<SessionSummary>, DbErr> {
        let mut query = attendance_session::Entity::find();
        if let Some(id) = filter.professor_id {
            query = query.filter(attendance_session::Column::ProfessorId.eq(id));
        }
        if let Some(id) = filter.subject_id {
            query = query.filter(attendance_session::Column::SubjectId.eq(id));
        }
        if let Some(date) = filter.date {
            query = query.filter(attendance_session::Column::Date.eq(date));
        }
        if let Some(subject_type) = filter.subject_type {
            query = query.filter(attendance_session::Column::SubjectType.eq(subject_type));
        }
        if let Some(group) = filter.group {
            query = query.filter(attendance_session::Column::GroupQualifier.eq(group));
        }

        let sessions = query
            .order_by_asc(attendance_session::Column::GroupQualifier)
            .order_by_desc(attendance_session::Column::Date)
            .order_by_asc(attendance_session::Column::Id)
            .all(self.conn)
            .await?;
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let session_ids: Vec<i32> = sessions.iter().map(|s| s.id).collect();
        let marks: Vec<(i32, bool)> = attendance_record::Entity::find()
            .select_only()
            .column(attendance_record::Column::SessionId)
            .column(attendance_record::Column::Present)
            .filter(attendance_record::Column::SessionId.is_in(session_ids))
            .into_tuple()
            .all(self.conn)
            .await?;

        let mut counts: HashMap<i32, (u64, u64)> = HashMap::new();
        for (session_id, present) in marks {
            let entry = counts.entry(session_id).or_default();
            entry.1 += 1;
            if present {
                entry.0 += 1;
            }
        }

        Ok(sessions
            .into_iter()
            .map(|session| {
                let (present, total) = counts.get(&session.id).copied().unwrap_or_default();
                SessionSummary {
                    session,
                    present,
                    total,
                }
            })
            .collect())
    }

    /// A student's own records joined with session details, newest first.
    pub async fn student_history(&self, student_id: i32) -> Result<Vec<StudentAttendanceRow>, DbErr> {
        let records = attendance_record::Entity::find()
            .filter(attendance_record::Column::StudentId.eq(student_id))
            .all(self.conn)
            .await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let session_ids: Vec<i32> = records.iter().map(|r| r.session_id).collect();
        let sessions: HashMap<i32, attendance_session::Model> = attendance_session::Entity::find()
            .filter(attendance_session::Column::Id.is_in(session_ids))
            .all(self.conn)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let subject_ids: BTreeSet<i32> = sessions.values().map(|s| s.subject_id).collect();
        let subject_names: HashMap<i32, String> = subject::Entity::find()
            .select_only()
            .column(subject::Column::Id)
            .column(subject::Column::Name)
            .filter(subject::Column::Id.is_in(subject_ids))
            .into_tuple::<(i32, String)>()
            .all(self.conn)
            .await?
            .into_iter()
            .collect();

        let professor_ids: BTreeSet<i32> = sessions.values().map(|s| s.professor_id).collect();
        let professor_names: HashMap<i32, String> = professor::Entity::find()
            .select_only()
            .column(professor::Column::Id)
            .column(professor::Column::Name)
            .filter(professor::Column::Id.is_in(professor_ids))
            .into_tuple::<(i32, String)>()
            .all(self.conn)
            .await?
            .into_iter()
            .collect();

        let mut rows: Vec<StudentAttendanceRow> = records
            .into_iter()
            .filter_map(|r| {
                let session = sessions.get(&r.session_id)?;
                Some(StudentAttendanceRow {
                    session_id: session.id,
                    date: session.date,
                    subject_id: session.subject_id,
                    subject_name: subject_names
                        .get(&session.subject_id)
                        .cloned()
                        .unwrap_or_default(),
                    subject_type: session.subject_type,
                    professor_name: professor_names
                        .get(&session.professor_id)
                        .cloned()
                        .unwrap_or_default(),
                    group: session.group_qualifier,
                    present: r.present,
                    note: r.note,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.session_id.cmp(&a.session_id)));
        Ok(rows)
    }
}

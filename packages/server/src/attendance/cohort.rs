use common::{GroupQualifier, GroupTag, SubjectType};

/// The single group a session is restricted to, or `None` for the whole cohort.
///
/// Only practical sessions are split by lab group; a theory lecture always
/// covers every student even if a group was supplied.
pub fn cohort_group(subject_type: SubjectType, qualifier: GroupQualifier) -> Option<GroupTag> {
    match subject_type {
        SubjectType::Practical => qualifier.group(),
        SubjectType::Theory => None,
    }
}

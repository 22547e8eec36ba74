use std::collections::{BTreeMap, HashMap};

/// Count of hits (classes attended, assignments done) out of a total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub hits: u64,
    pub total: u64,
}

impl Tally {
    pub fn new(hits: u64, total: u64) -> Self {
        Self { hits, total }
    }

    pub fn record(&mut self, hit: bool) {
        self.total += 1;
        if hit {
            self.hits += 1;
        }
    }

    pub fn percentage(&self) -> f64 {
        percentage(self.hits, self.total)
    }
}

/// `part / whole` as a percentage rounded to one decimal, `0.0` when `whole` is zero.
///
/// Exact halves round to the even digit, so 1 of 16 is `6.2`.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round_ties_even() / 10.0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectTally {
    pub subject_id: i32,
    pub subject_name: String,
    pub tally: Tally,
}

/// Group `(subject_id, hit)` rows into one tally per subject.
///
/// Only subjects that appear in `rows` are returned, ordered by name (ties by
/// ID).
pub fn tally_by_subject<I>(rows: I, names: &HashMap<i32, String>) -> Vec<SubjectTally>
where
    I: IntoIterator<Item = (i32, bool)>,
{
    let mut tallies: BTreeMap<i32, Tally> = BTreeMap::new();
    for (subject_id, hit) in rows {
        tallies.entry(subject_id).or_default().record(hit);
    }

    let mut out: Vec<SubjectTally> = tallies
        .into_iter()
        .map(|(subject_id, tally)| SubjectTally {
            subject_id,
            subject_name: names.get(&subject_id).cloned().unwrap_or_default(),
            tally,
        })
        .collect();
    out.sort_by(|a, b| {
        a.subject_name
            .cmp(&b.subject_name)
            .then(a.subject_id.cmp(&b.subject_id))
    });
    out
}

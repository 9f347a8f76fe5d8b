use crate::index::ImageCatalog;
use crate::model::{Choice, ImageKind, ReasonTag, ResponseRecord};
use serde::{Deserialize, Serialize};

/// How a single response counts towards the preference tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Preferred(ImageKind),
    NoPreference,
    /// The chosen image is not in the index.
    Unclassified,
}

pub fn classify(catalog: &ImageCatalog, record: &ResponseRecord) -> Outcome {
    match record.chosen {
        Choice::NoPreference => Outcome::NoPreference,
        Choice::A | Choice::B => record
            .chosen_image()
            .and_then(|img| catalog.kind_of(img))
            .map(Outcome::Preferred)
            .unwrap_or(Outcome::Unclassified),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceTally {
    pub original: u64,
    pub refactored: u64,
    pub no_preference: u64,
    pub unclassified: u64,
}

impl PreferenceTally {
    pub fn add(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Preferred(ImageKind::Original) => self.original += 1,
            Outcome::Preferred(ImageKind::Refactored) => self.refactored += 1,
            Outcome::NoPreference => self.no_preference += 1,
            Outcome::Unclassified => self.unclassified += 1,
        }
    }

    pub fn classified(&self) -> u64 {
        self.original + self.refactored + self.no_preference
    }
}

/// Per-tag counts in vocabulary order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCounts {
    pub concise: u64,
    pub readable: u64,
    pub maintainable: u64,
}

impl ReasonCounts {
    pub fn bump(&mut self, tag: ReasonTag) {
        match tag {
            ReasonTag::Concise => self.concise += 1,
            ReasonTag::Readable => self.readable += 1,
            ReasonTag::Maintainable => self.maintainable += 1,
        }
    }

    pub fn get(&self, tag: ReasonTag) -> u64 {
        match tag {
            ReasonTag::Concise => self.concise,
            ReasonTag::Readable => self.readable,
            ReasonTag::Maintainable => self.maintainable,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ReasonTag, u64)> + '_ {
        ReasonTag::ALL.into_iter().map(move |t| (t, self.get(t)))
    }

    pub fn total(&self) -> u64 {
        self.concise + self.readable + self.maintainable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceReport {
    pub responses: u64,
    pub tally: PreferenceTally,
    pub original_reasons: ReasonCounts,
    pub refactored_reasons: ReasonCounts,
}

impl PreferenceReport {
    pub fn reasons_for(&self, kind: ImageKind) -> &ReasonCounts {
        match kind {
            ImageKind::Original => &self.original_reasons,
            ImageKind::Refactored => &self.refactored_reasons,
        }
    }
}

/// One pass over the responses: preference counts and reason tags.
///
/// Reasons only count for `A`/`B` answers with a non-empty reason field whose
/// chosen image is in the index; tags outside the vocabulary are ignored.
pub fn aggregate_preferences<'a, I>(catalog: &ImageCatalog, records: I) -> PreferenceReport
where
    I: IntoIterator<Item = &'a ResponseRecord>,
{
    let mut report = PreferenceReport::default();

    for record in records {
        report.responses += 1;
        let outcome = classify(catalog, record);
        report.tally.add(outcome);

        if outcome == Outcome::Unclassified {
            tracing::debug!(
                event = "response_unclassified",
                submission_id = %record.submission_id,
                pair = %record.pair,
                image = record.chosen_image().unwrap_or("")
            );
        }

        let Outcome::Preferred(kind) = outcome else {
            continue;
        };
        if record.reason.trim().is_empty() {
            continue;
        }
        let bucket = match kind {
            ImageKind::Original => &mut report.original_reasons,
            ImageKind::Refactored => &mut report.refactored_reasons,
        };
        for tag in ReasonTag::parse_list(&record.reason) {
            bucket.bump(tag);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SurveyIndexEntry;

    fn catalog() -> ImageCatalog {
        ImageCatalog::from_entries(&[
            SurveyIndexEntry {
                original_image: "o1.png".into(),
                refactored_image: "r1.png".into(),
            },
            SurveyIndexEntry {
                original_image: "o2.png".into(),
                refactored_image: "r2.png".into(),
            },
        ])
    }

    fn rec(a: &str, b: &str, chosen: Choice, reason: &str) -> ResponseRecord {
        ResponseRecord {
            submission_id: "s".into(),
            pair: "pair_1".into(),
            image_a: a.into(),
            image_b: b.into(),
            chosen,
            reason: reason.into(),
        }
    }

    #[test]
    fn no_preference_only_bumps_its_counter() {
        let rows = vec![rec("o1.png", "r1.png", Choice::NoPreference, "concise")];
        let report = aggregate_preferences(&catalog(), &rows);
        assert_eq!(report.tally.no_preference, 1);
        assert_eq!(report.tally.original, 0);
        assert_eq!(report.tally.refactored, 0);
        assert_eq!(report.original_reasons.total() + report.refactored_reasons.total(), 0);
    }

    #[test]
    fn membership_not_column_decides_kind() {
        let rows = vec![
            rec("o1.png", "r1.png", Choice::A, ""),
            rec("r2.png", "o2.png", Choice::A, ""),
            rec("r1.png", "o1.png", Choice::B, ""),
            rec("o2.png", "r2.png", Choice::B, ""),
        ];
        let report = aggregate_preferences(&catalog(), &rows);
        assert_eq!(report.tally.original, 2);
        assert_eq!(report.tally.refactored, 2);
        assert_eq!(report.tally.classified(), 4);
    }

    #[test]
    fn reasons_filter_vocabulary_and_bucket_by_chosen_kind() {
        let rows = vec![
            rec("o1.png", "r1.png", Choice::B, "concise;bogus;readable"),
            rec("o1.png", "r1.png", Choice::A, "Maintainable"),
            rec("o1.png", "r1.png", Choice::A, "   "),
        ];
        let report = aggregate_preferences(&catalog(), &rows);
        assert_eq!(
            report.refactored_reasons,
            ReasonCounts {
                concise: 1,
                readable: 1,
                maintainable: 0
            }
        );
        assert_eq!(report.original_reasons.maintainable, 1);
        assert_eq!(report.original_reasons.total(), 1);
    }

    #[test]
    fn images_outside_index_are_unclassified() {
        let rows = vec![rec("x.png", "r1.png", Choice::A, "concise")];
        let report = aggregate_preferences(&catalog(), &rows);
        assert_eq!(report.tally.unclassified, 1);
        assert_eq!(report.tally.classified(), 0);
        assert_eq!(report.refactored_reasons.total(), 0);
        assert_eq!(report.responses, 1);
    }

    #[test]
    fn reason_counts_iterate_in_vocabulary_order() {
        let counts = ReasonCounts {
            concise: 3,
            readable: 1,
            maintainable: 2,
        };
        let tags: Vec<_> = counts.iter().collect();
        assert_eq!(
            tags,
            vec![
                (ReasonTag::Concise, 3),
                (ReasonTag::Readable, 1),
                (ReasonTag::Maintainable, 2)
            ]
        );
    }
}

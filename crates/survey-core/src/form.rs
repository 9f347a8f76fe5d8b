//! Validation of a posted survey form into log records.

use crate::errors::ValidationError;
use crate::model::{Choice, DemographicRecord, ImagePair, ReasonTag, ResponseRecord};

pub const EXPERIENCE_FIELD: &str = "experience";
pub const SKILL_FIELD: &str = "python_skill";

pub fn choice_field(idx: usize) -> String {
    format!("pair_{idx}")
}

pub fn reason_field(idx: usize) -> String {
    format!("reason_{idx}[]")
}

/// A validated submission: one demographics row plus one response per pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub submission_id: String,
    pub demographics: DemographicRecord,
    pub responses: Vec<ResponseRecord>,
}

pub fn new_submission_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Builds a submission from raw form fields, all-or-nothing.
///
/// `fields` may repeat keys (checkbox groups). Every pair needs an `A` or `B`
/// answer and both demographic questions must be filled in.
pub fn parse_submission(
    fields: &[(String, String)],
    pairs: &[ImagePair],
    submission_id: String,
) -> Result<Submission, ValidationError> {
    let first = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
    };

    let mut responses = Vec::with_capacity(pairs.len());
    for (i, pair) in pairs.iter().enumerate() {
        let raw = match first(&choice_field(i)) {
            Some(v) if !v.is_empty() => v,
            _ => return Err(ValidationError::MissingAnswer { pair: i + 1 }),
        };
        let chosen = match Choice::parse(raw) {
            Some(c @ (Choice::A | Choice::B)) => c,
            _ => {
                return Err(ValidationError::InvalidChoice {
                    pair: i + 1,
                    value: raw.to_string(),
                })
            }
        };

        let key = reason_field(i);
        let mut tags: Vec<ReasonTag> = fields
            .iter()
            .filter(|(k, _)| *k == key)
            .filter_map(|(_, v)| ReasonTag::parse(v))
            .collect();
        tags.sort();
        tags.dedup();

        responses.push(ResponseRecord {
            submission_id: submission_id.clone(),
            pair: format!("pair_{}", i + 1),
            image_a: pair.image_a.clone(),
            image_b: pair.image_b.clone(),
            chosen,
            reason: ReasonTag::join(&tags),
        });
    }

    let experience = match first(EXPERIENCE_FIELD) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            return Err(ValidationError::MissingDemographic {
                field: "years of experience",
            })
        }
    };
    let skill = match first(SKILL_FIELD) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => {
            return Err(ValidationError::MissingDemographic {
                field: "Python familiarity",
            })
        }
    };

    Ok(Submission {
        demographics: DemographicRecord {
            submission_id: submission_id.clone(),
            experience_years: experience,
            python_skill_level: skill,
        },
        responses,
        submission_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(n: usize) -> Vec<ImagePair> {
        (0..n)
            .map(|i| ImagePair {
                image_a: format!("o{i}.png"),
                image_b: format!("r{i}.png"),
            })
            .collect()
    }

    fn field(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn complete_form_produces_one_row_per_pair() {
        let fields = vec![
            field("experience", "4"),
            field("python_skill", "expert"),
            field("pair_0", "A"),
            field("reason_0[]", "readable"),
            field("reason_0[]", "concise"),
            field("pair_1", "B"),
        ];
        let sub = parse_submission(&fields, &pairs(2), "sid".into()).unwrap();
        assert_eq!(sub.responses.len(), 2);
        assert_eq!(sub.responses[0].pair, "pair_1");
        assert_eq!(sub.responses[0].reason, "concise;readable");
        assert_eq!(sub.responses[1].chosen, Choice::B);
        assert_eq!(sub.responses[1].reason, "");
        assert_eq!(sub.demographics.experience_years, "4");
        assert!(sub.responses.iter().all(|r| r.submission_id == "sid"));
    }

    #[test]
    fn unanswered_pair_rejects_whole_form() {
        let fields = vec![
            field("experience", "4"),
            field("python_skill", "expert"),
            field("pair_0", "A"),
        ];
        let err = parse_submission(&fields, &pairs(2), "sid".into()).unwrap_err();
        assert_eq!(err, ValidationError::MissingAnswer { pair: 2 });
    }

    #[test]
    fn no_preference_is_not_accepted_from_the_form() {
        let fields = vec![
            field("experience", "4"),
            field("python_skill", "expert"),
            field("pair_0", "C"),
        ];
        let err = parse_submission(&fields, &pairs(1), "sid".into()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidChoice { pair: 1, .. }));
    }

    #[test]
    fn missing_demographics_are_rejected() {
        let fields = vec![field("pair_0", "A"), field("python_skill", "beginner")];
        let err = parse_submission(&fields, &pairs(1), "sid".into()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingDemographic { .. }));

        let fields = vec![field("pair_0", "A"), field("experience", "2"), field("python_skill", " ")];
        let err = parse_submission(&fields, &pairs(1), "sid".into()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingDemographic { .. }));
    }

    #[test]
    fn unknown_reason_values_are_dropped() {
        let fields = vec![
            field("experience", "1"),
            field("python_skill", "beginner"),
            field("pair_0", "B"),
            field("reason_0[]", "<script>"),
            field("reason_0[]", "maintainable"),
        ];
        let sub = parse_submission(&fields, &pairs(1), new_submission_id()).unwrap();
        assert_eq!(sub.responses[0].reason, "maintainable");
    }
}

use crate::analysis::{DemographicsSummary, PreferenceReport};
use crate::model::{ExperienceBand, ImageKind, SkillLevel};
use std::fmt::Write;

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn format_preferences(report: &PreferenceReport) -> String {
    let t = &report.tally;
    let mut s = String::new();
    let _ = writeln!(s, "Responses: {}", report.responses);
    let _ = writeln!(s, "No Preference: {}", t.no_preference);
    let _ = writeln!(s, "Original Image Count: {}", t.original);
    let _ = writeln!(s, "Refactored Image Count: {}", t.refactored);
    if t.unclassified > 0 {
        let _ = writeln!(s, "Unclassified (image not in index): {}", t.unclassified);
    }

    for (kind, title) in [
        (ImageKind::Refactored, "Refactored Image Reason Counts:"),
        (ImageKind::Original, "Original Image Reason Counts:"),
    ] {
        let _ = writeln!(s, "\n{}", title);
        for (tag, n) in report.reasons_for(kind).iter() {
            let _ = writeln!(s, "- {}: {}", capitalize(tag.as_str()), n);
        }
    }
    s
}

pub fn format_demographics(summary: &DemographicsSummary) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "Respondents: {}", summary.respondents);

    let _ = write!(s, "\n{:<22}", "experience_level");
    for skill in SkillLevel::ALL {
        let _ = write!(s, "{:>14}", skill.as_str());
    }
    s.push('\n');
    for band in ExperienceBand::KNOWN {
        let _ = write!(s, "{:<22}", band.as_str());
        for skill in SkillLevel::ALL {
            let _ = write!(s, "{:>14}", summary.crosstab.get(band, skill));
        }
        s.push('\n');
    }

    let _ = writeln!(s, "\nCount by Experience Level:");
    for band in ExperienceBand::KNOWN {
        let _ = writeln!(s, "- {}: {}", band.label(), summary.band_count(band));
    }
    let _ = writeln!(s, "\nCount by Python Skill Level:");
    for skill in SkillLevel::ALL {
        let _ = writeln!(s, "- {}: {}", skill.label(), summary.skill_count(skill));
    }

    if summary.unknown_experience > 0 || summary.missing_skill > 0 {
        let _ = writeln!(
            s,
            "\nExcluded from table: {} unknown experience, {} missing skill level",
            summary.unknown_experience, summary.missing_skill
        );
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_text_lists_all_tags() {
        let mut report = PreferenceReport::default();
        report.tally.refactored = 4;
        report.refactored_reasons.concise = 2;
        let text = format_preferences(&report);
        assert!(text.contains("Refactored Image Count: 4"));
        assert!(text.contains("- Concise: 2"));
        assert!(text.contains("- Maintainable: 0"));
        assert!(!text.contains("Unclassified"));
    }

    #[test]
    fn demographics_text_has_table_rows() {
        let mut summary = DemographicsSummary::default();
        summary.crosstab.counts[2][2] = 3;
        summary.by_band = [0, 0, 3];
        summary.unknown_experience = 1;
        let text = format_demographics(&summary);
        assert!(text.contains("Senior"));
        assert!(text.contains("- Senior (7+ years): 3"));
        assert!(text.contains("1 unknown experience"));
    }
}

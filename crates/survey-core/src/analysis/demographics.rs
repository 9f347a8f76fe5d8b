use crate::model::{DemographicRecord, ExperienceBand, SkillLevel};
use serde::{Deserialize, Serialize};

/// Experience band × skill level counts, always all nine cells.
///
/// Rows follow `ExperienceBand::KNOWN`, columns follow `SkillLevel::ALL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTab {
    pub counts: [[u64; 3]; 3],
}

impl CrossTab {
    pub fn get(&self, band: ExperienceBand, skill: SkillLevel) -> u64 {
        band.index()
            .map(|row| self.counts[row][skill.index()])
            .unwrap_or(0)
    }

    fn bump(&mut self, band: ExperienceBand, skill: SkillLevel) {
        if let Some(row) = band.index() {
            self.counts[row][skill.index()] += 1;
        }
    }

    pub fn max(&self) -> u64 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Cells as `(band, skill, count)` in table order.
    pub fn cells(&self) -> impl Iterator<Item = (ExperienceBand, SkillLevel, u64)> + '_ {
        ExperienceBand::KNOWN.into_iter().flat_map(move |band| {
            SkillLevel::ALL
                .into_iter()
                .map(move |skill| (band, skill, self.get(band, skill)))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicsSummary {
    pub respondents: u64,
    pub crosstab: CrossTab,
    /// Respondents per known band, whatever their skill answer.
    pub by_band: [u64; 3],
    /// Respondents per skill level, whatever their band.
    pub by_skill: [u64; 3],
    pub unknown_experience: u64,
    pub missing_skill: u64,
}

impl DemographicsSummary {
    pub fn band_count(&self, band: ExperienceBand) -> u64 {
        band.index().map(|i| self.by_band[i]).unwrap_or(self.unknown_experience)
    }

    pub fn skill_count(&self, skill: SkillLevel) -> u64 {
        self.by_skill[skill.index()]
    }
}

pub fn summarize_demographics<'a, I>(records: I) -> DemographicsSummary
where
    I: IntoIterator<Item = &'a DemographicRecord>,
{
    let mut summary = DemographicsSummary::default();

    for rec in records {
        summary.respondents += 1;
        let band = rec.band();
        let skill = rec.skill();

        match band.index() {
            Some(i) => summary.by_band[i] += 1,
            None => summary.unknown_experience += 1,
        }
        match skill {
            Some(s) => {
                summary.by_skill[s.index()] += 1;
                summary.crosstab.bump(band, s);
            }
            None => summary.missing_skill += 1,
        }
    }

    summary
}

use serde::{Deserialize, Serialize};

/// One row of the survey index: the same snippet before and after refactoring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurveyIndexEntry {
    pub original_image: String,
    pub refactored_image: String,
}

/// A pair as displayed to a participant, in A/B order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePair {
    pub image_a: String,
    pub image_b: String,
}

impl ImagePair {
    pub fn from_entry(entry: &SurveyIndexEntry, swap: bool) -> Self {
        if swap {
            Self {
                image_a: entry.refactored_image.clone(),
                image_b: entry.original_image.clone(),
            }
        } else {
            Self {
                image_a: entry.original_image.clone(),
                image_b: entry.refactored_image.clone(),
            }
        }
    }

    pub fn image_for(&self, choice: Choice) -> Option<&str> {
        match choice {
            Choice::A => Some(&self.image_a),
            Choice::B => Some(&self.image_b),
            Choice::NoPreference => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    /// Reserved: the form never offers it, but the log format does.
    #[serde(rename = "C")]
    NoPreference,
}

impl Choice {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" => Some(Choice::A),
            "B" => Some(Choice::B),
            "C" => Some(Choice::NoPreference),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::NoPreference => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonTag {
    Concise,
    Readable,
    Maintainable,
}

impl ReasonTag {
    pub const ALL: [ReasonTag; 3] = [ReasonTag::Concise, ReasonTag::Readable, ReasonTag::Maintainable];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Some(ReasonTag::Concise),
            "readable" => Some(ReasonTag::Readable),
            "maintainable" => Some(ReasonTag::Maintainable),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonTag::Concise => "concise",
            ReasonTag::Readable => "readable",
            ReasonTag::Maintainable => "maintainable",
        }
    }

    /// Checkbox label shown on the form.
    pub fn label(&self) -> &'static str {
        match self {
            ReasonTag::Concise => "More concise",
            ReasonTag::Readable => "More readable",
            ReasonTag::Maintainable => "Easier to maintain",
        }
    }

    /// Splits a `;`-joined reason field, keeping only known tags.
    pub fn parse_list(raw: &str) -> Vec<ReasonTag> {
        raw.split(';').filter_map(ReasonTag::parse).collect()
    }

    pub fn join(tags: &[ReasonTag]) -> String {
        tags.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(";")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl SkillLevel {
    pub const ALL: [SkillLevel; 3] = [SkillLevel::Beginner, SkillLevel::Intermediate, SkillLevel::Expert];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(SkillLevel::Beginner),
            "intermediate" => Some(SkillLevel::Intermediate),
            "expert" => Some(SkillLevel::Expert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Expert => "expert",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Beginner",
            SkillLevel::Intermediate => "Intermediate",
            SkillLevel::Expert => "Expert",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            SkillLevel::Beginner => 0,
            SkillLevel::Intermediate => 1,
            SkillLevel::Expert => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExperienceBand {
    Junior,
    Mid,
    Senior,
    Unknown,
}

impl ExperienceBand {
    /// Bands in chart order. `Unknown` is reported separately.
    pub const KNOWN: [ExperienceBand; 3] = [ExperienceBand::Junior, ExperienceBand::Mid, ExperienceBand::Senior];

    pub fn from_years(years: u64) -> Self {
        match years {
            0..=2 => ExperienceBand::Junior,
            3..=6 => ExperienceBand::Mid,
            _ => ExperienceBand::Senior,
        }
    }

    /// Best-effort classification of the raw survey answer.
    ///
    /// Integers and integral decimals (`"5.0"`) are accepted; anything else,
    /// including negative numbers, is `Unknown`.
    pub fn classify(raw: &str) -> Self {
        parse_years(raw)
            .map(ExperienceBand::from_years)
            .unwrap_or(ExperienceBand::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceBand::Junior => "Junior",
            ExperienceBand::Mid => "Mid",
            ExperienceBand::Senior => "Senior",
            ExperienceBand::Unknown => "Unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExperienceBand::Junior => "Junior (0–3 years)",
            ExperienceBand::Mid => "Mid (3–7 years)",
            ExperienceBand::Senior => "Senior (7+ years)",
            ExperienceBand::Unknown => "Unknown",
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            ExperienceBand::Junior => Some(0),
            ExperienceBand::Mid => Some(1),
            ExperienceBand::Senior => Some(2),
            ExperienceBand::Unknown => None,
        }
    }
}

fn parse_years(raw: &str) -> Option<u64> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<u64>() {
        return Some(n);
    }
    let f: f64 = s.parse().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        Some(f as u64)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Original,
    Refactored,
}

/// One row of the responses log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseRecord {
    pub submission_id: String,
    pub pair: String,
    #[serde(rename = "image_A")]
    pub image_a: String,
    #[serde(rename = "image_B")]
    pub image_b: String,
    pub chosen: Choice,
    /// `;`-joined reason tags; may be empty.
    pub reason: String,
}

impl ResponseRecord {
    pub fn chosen_image(&self) -> Option<&str> {
        match self.chosen {
            Choice::A => Some(&self.image_a),
            Choice::B => Some(&self.image_b),
            Choice::NoPreference => None,
        }
    }
}

/// One row of the demographics log. Answers are kept as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemographicRecord {
    pub submission_id: String,
    #[serde(default)]
    pub experience_years: String,
    #[serde(default)]
    pub python_skill_level: String,
}

impl DemographicRecord {
    pub fn band(&self) -> ExperienceBand {
        ExperienceBand::classify(&self.experience_years)
    }

    pub fn skill(&self) -> Option<SkillLevel> {
        SkillLevel::parse(&self.python_skill_level)
    }
}

//! Bar chart layouts for the survey summaries and their PNG rendering.
//!
//! Layouts are plain data (bars, heights, y-axis ceiling) so they can be
//! checked without a drawing backend; `render` hands them to plotters.

use crate::analysis::{CrossTab, DemographicsSummary, PreferenceReport, PreferenceTally, ReasonCounts};
use crate::errors::{SurveyError, SurveyResult};
use crate::model::{ExperienceBand, ImageKind, SkillLevel};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn to_plotters(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }
}

pub const BEGINNER_BLUE: Rgb = Rgb(0x14, 0x6e, 0xb4);
pub const INTERMEDIATE_YELLOW: Rgb = Rgb(0xff, 0xcc, 0x00);
pub const EXPERT_RED: Rgb = Rgb(0xd6, 0x2d, 0x20);
pub const BAND_TEAL: Rgb = Rgb(0x00, 0xb3, 0xb3);
pub const DEFAULT_BLUE: Rgb = Rgb(0x1f, 0x77, 0xb4);
pub const REFACTORED_TEAL: Rgb = Rgb(0x00, 0x80, 0x80);
pub const ORIGINAL_ORANGE: Rgb = Rgb(0xff, 0xa5, 0x00);

pub fn skill_color(skill: SkillLevel) -> Rgb {
    match skill {
        SkillLevel::Beginner => BEGINNER_BLUE,
        SkillLevel::Intermediate => INTERMEDIATE_YELLOW,
        SkillLevel::Expert => EXPERT_RED,
    }
}

/// Space above the tallest bar for its value label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Headroom {
    /// Ceiling is `max + max * f`.
    Fraction(f64),
    /// Ceiling is `max + n`.
    Absolute(f64),
}

/// Y-axis ceiling for a chart whose tallest value is `max`.
///
/// Never below 1 so an all-zero chart still has a drawable range.
pub fn y_ceiling(max: u64, headroom: Headroom) -> f64 {
    let max = max as f64;
    let ceiling = match headroom {
        Headroom::Fraction(f) => max + f * max,
        Headroom::Absolute(n) => max + n,
    };
    ceiling.max(1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: u64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub bars: Vec<Bar>,
    pub headroom: Headroom,
    pub size: (u32, u32),
}

impl BarChart {
    pub fn y_max(&self) -> f64 {
        let max = self.bars.iter().map(|b| b.value).max().unwrap_or(0);
        y_ceiling(max, self.headroom)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Rgb,
    /// One value per group.
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBarChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub legend_title: String,
    pub groups: Vec<String>,
    pub series: Vec<Series>,
    pub headroom: Headroom,
    /// Drawn height of zero-valued bars so they stay visible.
    pub zero_height: f64,
    pub bar_width: f64,
    pub size: (u32, u32),
}

impl GroupedBarChart {
    pub fn y_max(&self) -> f64 {
        let max = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .max()
            .unwrap_or(0);
        y_ceiling(max, self.headroom)
    }

    pub fn drawn_height(&self, value: u64) -> f64 {
        if value == 0 {
            self.zero_height
        } else {
            value as f64
        }
    }

    /// Centre of bar `series` within `group`.
    pub fn bar_center(&self, group: usize, series: usize) -> f64 {
        let n = self.series.len() as f64;
        group as f64 + (series as f64 - (n - 1.0) / 2.0) * self.bar_width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Bar(BarChart),
    Grouped(GroupedBarChart),
}

/// A chart and the fixed file name it is written to.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFile {
    pub file_name: &'static str,
    pub chart: Chart,
}

pub const USER_PREFERENCES_PNG: &str = "user_preferences.png";
pub const REFACTORED_REASONS_PNG: &str = "refactored_reason_counts.png";
pub const ORIGINAL_REASONS_PNG: &str = "original_reason_counts.png";
pub const GROUPED_SKILL_PNG: &str = "grouped_python_skill_by_experience.png";
pub const COUNT_BY_EXPERIENCE_PNG: &str = "count_by_experience_level.png";
pub const COUNT_BY_SKILL_PNG: &str = "count_by_python_skill_level.png";

pub fn preference_chart(tally: &PreferenceTally) -> BarChart {
    let bar = |label: &str, value| Bar {
        label: label.to_string(),
        value,
        color: DEFAULT_BLUE,
    };
    BarChart {
        title: "User Preferences for Code Images".into(),
        x_desc: "Choice".into(),
        y_desc: "Number of Selections".into(),
        bars: vec![
            bar("Original Code", tally.original),
            bar("Refactored Code", tally.refactored),
            bar("No Preference", tally.no_preference),
        ],
        headroom: Headroom::Absolute(10.0),
        size: (800, 500),
    }
}

pub fn reason_chart(kind: ImageKind, counts: &ReasonCounts) -> BarChart {
    let (title, color) = match kind {
        ImageKind::Refactored => ("Refactored Code - Reason Counts", REFACTORED_TEAL),
        ImageKind::Original => ("Original Code - Reason Counts", ORIGINAL_ORANGE),
    };
    BarChart {
        title: title.into(),
        x_desc: "Reason".into(),
        y_desc: "Count".into(),
        bars: counts
            .iter()
            .map(|(tag, value)| Bar {
                label: tag.as_str().to_string(),
                value,
                color,
            })
            .collect(),
        headroom: Headroom::Absolute(5.0),
        size: (700, 500),
    }
}

pub fn grouped_skill_chart(crosstab: &CrossTab) -> GroupedBarChart {
    GroupedBarChart {
        title: "Python Skill Levels by Experience".into(),
        x_desc: "Experience Level".into(),
        y_desc: "Count".into(),
        legend_title: "Python Skill Level".into(),
        groups: ExperienceBand::KNOWN
            .iter()
            .map(|b| b.label().to_string())
            .collect(),
        series: SkillLevel::ALL
            .iter()
            .map(|&skill| Series {
                name: skill.label().to_string(),
                color: skill_color(skill),
                values: ExperienceBand::KNOWN
                    .iter()
                    .map(|&band| crosstab.get(band, skill))
                    .collect(),
            })
            .collect(),
        headroom: Headroom::Fraction(0.2),
        zero_height: 0.2,
        bar_width: 0.25,
        size: (1000, 600),
    }
}

pub fn band_count_chart(summary: &DemographicsSummary) -> BarChart {
    BarChart {
        title: "Count by Experience Level".into(),
        x_desc: "Experience Level".into(),
        y_desc: "Count".into(),
        bars: ExperienceBand::KNOWN
            .iter()
            .map(|&band| Bar {
                label: band.as_str().to_string(),
                value: summary.band_count(band),
                color: BAND_TEAL,
            })
            .collect(),
        headroom: Headroom::Fraction(0.15),
        size: (800, 500),
    }
}

pub fn skill_count_chart(summary: &DemographicsSummary) -> BarChart {
    BarChart {
        title: "Count by Python Skill Level".into(),
        x_desc: "Python Skill Level".into(),
        y_desc: "Count".into(),
        bars: SkillLevel::ALL
            .iter()
            .map(|&skill| Bar {
                label: skill.label().to_string(),
                value: summary.skill_count(skill),
                color: skill_color(skill),
            })
            .collect(),
        headroom: Headroom::Fraction(0.15),
        size: (800, 500),
    }
}

pub fn preference_charts(report: &PreferenceReport) -> Vec<ChartFile> {
    vec![
        ChartFile {
            file_name: USER_PREFERENCES_PNG,
            chart: Chart::Bar(preference_chart(&report.tally)),
        },
        ChartFile {
            file_name: REFACTORED_REASONS_PNG,
            chart: Chart::Bar(reason_chart(ImageKind::Refactored, &report.refactored_reasons)),
        },
        ChartFile {
            file_name: ORIGINAL_REASONS_PNG,
            chart: Chart::Bar(reason_chart(ImageKind::Original, &report.original_reasons)),
        },
    ]
}

pub fn demographics_charts(summary: &DemographicsSummary) -> Vec<ChartFile> {
    vec![
        ChartFile {
            file_name: GROUPED_SKILL_PNG,
            chart: Chart::Grouped(grouped_skill_chart(&summary.crosstab)),
        },
        ChartFile {
            file_name: COUNT_BY_EXPERIENCE_PNG,
            chart: Chart::Bar(band_count_chart(summary)),
        },
        ChartFile {
            file_name: COUNT_BY_SKILL_PNG,
            chart: Chart::Bar(skill_count_chart(summary)),
        },
    ]
}

/// Renders every chart into `out_dir`, returning the written paths.
pub fn render_all(files: &[ChartFile], out_dir: &Path) -> SurveyResult<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    let mut written = Vec::with_capacity(files.len());
    for f in files {
        let path = out_dir.join(f.file_name);
        render(&f.chart, &path)?;
        tracing::info!(event = "chart_written", path = %path.display());
        written.push(path);
    }
    Ok(written)
}

pub fn render(chart: &Chart, path: &Path) -> SurveyResult<()> {
    match chart {
        Chart::Bar(c) => render_bar(c, path),
        Chart::Grouped(c) => render_grouped(c, path),
    }
}

const BAR_WIDTH: f64 = 0.6;

fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if i < 0.0 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

fn value_label_style() -> TextStyle<'static> {
    TextStyle::from(("sans-serif", 15).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom))
}

fn render_bar(chart: &BarChart, path: &Path) -> SurveyResult<()> {
    let root = BitMapBackend::new(path, chart.size).into_drawing_area();
    root.fill(&WHITE).map_err(SurveyError::chart)?;

    let n = chart.bars.len().max(1);
    let y_max = chart.y_max();
    let labels: Vec<String> = chart.bars.iter().map(|b| b.label.clone()).collect();
    let x_range = -0.5f64..(n as f64 - 0.5);

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, 0f64..y_max)
        .map_err(SurveyError::chart)?;

    let fmt = |x: &f64| category_label(&labels, *x);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&fmt)
        .x_desc(chart.x_desc.as_str())
        .y_desc(chart.y_desc.as_str())
        .draw()
        .map_err(SurveyError::chart)?;

    ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
        let x = i as f64;
        Rectangle::new(
            [(x - BAR_WIDTH / 2.0, 0.0), (x + BAR_WIDTH / 2.0, bar.value as f64)],
            bar.color.to_plotters().filled(),
        )
    }))
    .map_err(SurveyError::chart)?;

    let offset = y_max * 0.01;
    let style = value_label_style();
    ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
        Text::new(
            bar.value.to_string(),
            (i as f64, bar.value as f64 + offset),
            style.clone(),
        )
    }))
    .map_err(SurveyError::chart)?;

    root.present().map_err(SurveyError::chart)?;
    Ok(())
}

fn render_grouped(chart: &GroupedBarChart, path: &Path) -> SurveyResult<()> {
    let root = BitMapBackend::new(path, chart.size).into_drawing_area();
    root.fill(&WHITE).map_err(SurveyError::chart)?;

    let n = chart.groups.len().max(1);
    let y_max = chart.y_max();
    let x_range = -0.5f64..(n as f64 - 0.5);

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x_range, 0f64..y_max)
        .map_err(SurveyError::chart)?;

    let fmt = |x: &f64| category_label(&chart.groups, *x);
    ctx.configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&fmt)
        .x_desc(chart.x_desc.as_str())
        .y_desc(chart.y_desc.as_str())
        .draw()
        .map_err(SurveyError::chart)?;

    let half = chart.bar_width / 2.0;
    let offset = y_max * 0.01;
    let style = value_label_style();

    for (s, series) in chart.series.iter().enumerate() {
        let color = series.color.to_plotters();
        ctx.draw_series(series.values.iter().enumerate().map(|(g, &v)| {
            let x = chart.bar_center(g, s);
            Rectangle::new(
                [(x - half, 0.0), (x + half, chart.drawn_height(v))],
                color.filled(),
            )
        }))
        .map_err(SurveyError::chart)?
        .label(series.name.as_str())
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));

        ctx.draw_series(series.values.iter().enumerate().map(|(g, &v)| {
            Text::new(
                v.to_string(),
                (chart.bar_center(g, s), chart.drawn_height(v) + offset),
                style.clone(),
            )
        }))
        .map_err(SurveyError::chart)?;
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(SurveyError::chart)?;

    root.present().map_err(SurveyError::chart)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DemographicsSummary;

    #[test]
    fn ceilings_follow_headroom_policy() {
        assert!((y_ceiling(10, Headroom::Fraction(0.2)) - 12.0).abs() < 1e-9);
        assert!((y_ceiling(20, Headroom::Fraction(0.15)) - 23.0).abs() < 1e-9);
        assert!((y_ceiling(7, Headroom::Absolute(10.0)) - 17.0).abs() < 1e-9);
        assert!((y_ceiling(0, Headroom::Fraction(0.2)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn grouped_chart_draws_zero_as_sliver_but_labels_zero() {
        let mut summary = DemographicsSummary::default();
        summary.crosstab.counts[0] = [4, 0, 1];
        let chart = grouped_skill_chart(&summary.crosstab);

        assert_eq!(chart.groups[0], "Junior (0–3 years)");
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[1].name, "Intermediate");
        assert_eq!(chart.series[1].values, vec![0, 0, 0]);
        assert_eq!(chart.series[1].color, INTERMEDIATE_YELLOW);
        assert!((chart.drawn_height(0) - 0.2).abs() < 1e-9);
        assert!((chart.drawn_height(4) - 4.0).abs() < 1e-9);
        assert!((chart.y_max() - 4.8).abs() < 1e-9);
    }

    #[test]
    fn grouped_bars_are_centred_on_their_group() {
        let chart = grouped_skill_chart(&CrossTab::default());
        assert!((chart.bar_center(1, 0) - 0.75).abs() < 1e-9);
        assert!((chart.bar_center(1, 1) - 1.0).abs() < 1e-9);
        assert!((chart.bar_center(1, 2) - 1.25).abs() < 1e-9);
    }

    #[test]
    fn preference_and_reason_charts_have_fixed_order() {
        let mut report = PreferenceReport::default();
        report.tally.original = 3;
        report.tally.refactored = 9;
        report.refactored_reasons.readable = 2;

        let files = preference_charts(&report);
        let names: Vec<_> = files.iter().map(|f| f.file_name).collect();
        assert_eq!(
            names,
            vec![USER_PREFERENCES_PNG, REFACTORED_REASONS_PNG, ORIGINAL_REASONS_PNG]
        );

        let Chart::Bar(pref) = &files[0].chart else {
            panic!("expected bar chart");
        };
        let values: Vec<_> = pref.bars.iter().map(|b| b.value).collect();
        assert_eq!(values, vec![3, 9, 0]);
        assert!((pref.y_max() - 19.0).abs() < 1e-9);

        let Chart::Bar(reasons) = &files[1].chart else {
            panic!("expected bar chart");
        };
        let labels: Vec<_> = reasons.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["concise", "readable", "maintainable"]);
        assert!((reasons.y_max() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn demographic_totals_feed_single_series_charts() {
        let summary = DemographicsSummary {
            by_band: [2, 5, 1],
            by_skill: [1, 1, 6],
            ..Default::default()
        };
        let band = band_count_chart(&summary);
        assert_eq!(band.bars.iter().map(|b| b.value).collect::<Vec<_>>(), vec![2, 5, 1]);
        assert!((band.y_max() - 5.75).abs() < 1e-9);
        let skill = skill_count_chart(&summary);
        assert_eq!(skill.bars[2].color, EXPERT_RED);
        assert_eq!(demographics_charts(&summary).len(), 3);
    }

    #[test]
    fn category_labels_map_key_points() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert_eq!(category_label(&labels, 1.0), "b");
        assert_eq!(category_label(&labels, -0.4), "a");
        assert_eq!(category_label(&labels, 5.0), "");
    }

    #[test]
    fn render_all_writes_every_png() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut report = PreferenceReport::default();
        report.tally.refactored = 3;
        report.tally.original = 1;
        report.refactored_reasons.bump(crate::model::ReasonTag::Concise);
        let mut summary = DemographicsSummary::default();
        summary.crosstab.counts[1] = [0, 2, 1];
        summary.by_band = [0, 3, 0];
        summary.by_skill = [0, 2, 1];

        let mut files = preference_charts(&report);
        files.extend(demographics_charts(&summary));
        let out = dir.path().join("charts");
        let written = render_all(&files, &out)?;

        assert_eq!(written.len(), 6);
        for path in &written {
            let bytes = std::fs::read(path)?;
            assert!(bytes.starts_with(b"\x89PNG"), "{} is not a png", path.display());
        }
        assert!(out.join(USER_PREFERENCES_PNG).exists());
        assert!(out.join(GROUPED_SKILL_PNG).exists());
        Ok(())
    }
}

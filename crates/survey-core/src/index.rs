//! Survey index loading and pair sampling.

use crate::errors::{SurveyError, SurveyResult};
use crate::model::{ImageKind, ImagePair, SurveyIndexEntry};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub fn load_index(path: &Path) -> SurveyResult<Vec<SurveyIndexEntry>> {
    let bytes = std::fs::read(path).map_err(|source| SurveyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_index(&bytes)
}

pub fn parse_index(bytes: &[u8]) -> SurveyResult<Vec<SurveyIndexEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut entries = Vec::new();
    for row in rdr.deserialize() {
        let entry: SurveyIndexEntry = row?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Draws `n` distinct entries, in random order.
///
/// When `n` equals the population size every entry is used exactly once.
pub fn sample_entries<'a, R: Rng + ?Sized>(
    entries: &'a [SurveyIndexEntry],
    n: usize,
    rng: &mut R,
    source: &Path,
) -> SurveyResult<Vec<&'a SurveyIndexEntry>> {
    if entries.len() < n {
        return Err(SurveyError::InsufficientPairs {
            path: source.to_path_buf(),
            found: entries.len(),
            required: n,
        });
    }
    Ok(entries.choose_multiple(rng, n).collect())
}

/// Samples `n` pairs and orients each one for display.
pub fn sample_pairs<R: Rng + ?Sized>(
    entries: &[SurveyIndexEntry],
    n: usize,
    randomize_sides: bool,
    rng: &mut R,
    source: &Path,
) -> SurveyResult<Vec<ImagePair>> {
    let sampled = sample_entries(entries, n, rng, source)?;
    Ok(sampled
        .into_iter()
        .map(|entry| {
            let swap = randomize_sides && rng.gen_bool(0.5);
            ImagePair::from_entry(entry, swap)
        })
        .collect())
}

/// Which image names are originals and which are refactorings.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    original: HashSet<String>,
    refactored: HashSet<String>,
}

impl ImageCatalog {
    pub fn from_entries(entries: &[SurveyIndexEntry]) -> Self {
        let mut catalog = Self::default();
        for e in entries {
            catalog.original.insert(e.original_image.clone());
            catalog.refactored.insert(e.refactored_image.clone());
        }
        catalog
    }

    /// Originals take precedence when a name appears in both sets.
    pub fn kind_of(&self, image: &str) -> Option<ImageKind> {
        if self.original.contains(image) {
            Some(ImageKind::Original)
        } else if self.refactored.contains(image) {
            Some(ImageKind::Refactored)
        } else {
            None
        }
    }

    pub fn original_count(&self) -> usize {
        self.original.len()
    }

    pub fn refactored_count(&self) -> usize {
        self.refactored.len()
    }

    /// Names listed as both original and refactored.
    pub fn overlapping(&self) -> Vec<String> {
        let mut both: Vec<String> = self
            .original
            .intersection(&self.refactored)
            .cloned()
            .collect();
        both.sort();
        both
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexIssues {
    pub entries: usize,
    pub duplicate_images: Vec<String>,
    pub overlapping_images: Vec<String>,
    pub missing_images: Vec<PathBuf>,
    pub too_few_pairs: Option<usize>,
}

impl IndexIssues {
    pub fn is_clean(&self) -> bool {
        self.duplicate_images.is_empty()
            && self.overlapping_images.is_empty()
            && self.missing_images.is_empty()
            && self.too_few_pairs.is_none()
    }
}

/// Checks an index against the membership invariant and the image directory.
pub fn check_index(entries: &[SurveyIndexEntry], image_dir: &Path, num_pairs: usize) -> IndexIssues {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut missing = Vec::new();

    for e in entries {
        for name in [&e.original_image, &e.refactored_image] {
            if !seen.insert(name.as_str()) && !duplicates.contains(name) {
                duplicates.push(name.clone());
            }
            let p = image_dir.join(name);
            if !p.is_file() {
                missing.push(p);
            }
        }
    }

    IndexIssues {
        entries: entries.len(),
        duplicate_images: duplicates,
        overlapping_images: ImageCatalog::from_entries(entries).overlapping(),
        missing_images: missing,
        too_few_pairs: (entries.len() < num_pairs).then_some(entries.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entries(n: usize) -> Vec<SurveyIndexEntry> {
        (0..n)
            .map(|i| SurveyIndexEntry {
                original_image: format!("orig_{i}.png"),
                refactored_image: format!("ref_{i}.png"),
            })
            .collect()
    }

    #[test]
    fn full_population_sample_uses_every_row_once() {
        let all = entries(10);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = sample_entries(&all, 10, &mut rng, Path::new("idx.csv")).unwrap();
        assert_eq!(picked.len(), 10);
        let unique: HashSet<_> = picked.iter().map(|e| e.original_image.as_str()).collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn short_index_is_rejected() {
        let all = entries(9);
        let mut rng = StdRng::seed_from_u64(7);
        let err = sample_entries(&all, 10, &mut rng, Path::new("idx.csv")).unwrap_err();
        match err {
            SurveyError::InsufficientPairs { found, required, .. } => {
                assert_eq!((found, required), (9, 10));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sample_has_no_repeats() {
        let all = entries(40);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let picked = sample_entries(&all, 10, &mut rng, Path::new("idx.csv")).unwrap();
            let unique: HashSet<_> = picked.iter().map(|e| e.original_image.as_str()).collect();
            assert_eq!(unique.len(), 10);
        }
    }

    #[test]
    fn fixed_sides_keep_original_on_a() {
        let all = entries(5);
        let mut rng = StdRng::seed_from_u64(3);
        let pairs = sample_pairs(&all, 5, false, &mut rng, Path::new("idx.csv")).unwrap();
        assert!(pairs.iter().all(|p| p.image_a.starts_with("orig_")));
    }

    #[test]
    fn parse_index_ignores_extra_columns() {
        let raw = b"original_image,refactored_image,notes\na.png, b.png ,x\n";
        let parsed = parse_index(raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].refactored_image, "b.png");
    }

    #[test]
    fn catalog_reports_overlap_and_kinds() {
        let mut all = entries(2);
        all.push(SurveyIndexEntry {
            original_image: "shared.png".into(),
            refactored_image: "shared.png".into(),
        });
        let catalog = ImageCatalog::from_entries(&all);
        assert_eq!(catalog.kind_of("ref_1.png"), Some(ImageKind::Refactored));
        assert_eq!(catalog.kind_of("shared.png"), Some(ImageKind::Original));
        assert_eq!(catalog.kind_of("nope.png"), None);
        assert_eq!(catalog.overlapping(), vec!["shared.png".to_string()]);
    }
}

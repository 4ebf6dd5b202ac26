//! HRIR measurement records and the dataset directory loader
//!
//! The loader walks `<root>/<group>/<file>.json` (plus JSON files directly
//! under `root`) and parses one subject per file. Files that fail to open or
//! parse are returned as [`LoadFailure`]s next to the subjects that loaded.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::AnalysisError;

/// Dense 3D impulse-response grid indexed `[azimuth][elevation][sample]`
#[derive(Debug, Clone, PartialEq)]
pub struct HrirGrid {
    data: Vec<f64>,
    azimuths: usize,
    elevations: usize,
    samples: usize,
}

impl HrirGrid {
    /// Build a grid from flat row-major data
    pub fn from_flat(
        data: Vec<f64>,
        azimuths: usize,
        elevations: usize,
        samples: usize,
    ) -> Result<Self, AnalysisError> {
        if data.len() != azimuths * elevations * samples {
            return Err(AnalysisError::DatasetStructure(format!(
                "Grid data has {} values, shape {}x{}x{} needs {}",
                data.len(),
                azimuths,
                elevations,
                samples,
                azimuths * elevations * samples
            )));
        }
        Ok(Self {
            data,
            azimuths,
            elevations,
            samples,
        })
    }

    /// Build a grid from nested vectors, rejecting ragged input
    pub fn from_nested(nested: Vec<Vec<Vec<f64>>>) -> Result<Self, AnalysisError> {
        let azimuths = nested.len();
        let elevations = nested.first().map(|e| e.len()).unwrap_or(0);
        let samples = nested
            .first()
            .and_then(|e| e.first())
            .map(|s| s.len())
            .unwrap_or(0);

        let mut data = Vec::with_capacity(azimuths * elevations * samples);
        for (a, row) in nested.into_iter().enumerate() {
            if row.len() != elevations {
                return Err(AnalysisError::DatasetStructure(format!(
                    "Ragged grid: azimuth {} has {} elevations, expected {}",
                    a,
                    row.len(),
                    elevations
                )));
            }
            for (e, slice) in row.into_iter().enumerate() {
                if slice.len() != samples {
                    return Err(AnalysisError::DatasetStructure(format!(
                        "Ragged grid: azimuth {} elevation {} has {} samples, expected {}",
                        a,
                        e,
                        slice.len(),
                        samples
                    )));
                }
                data.extend(slice);
            }
        }

        Ok(Self {
            data,
            azimuths,
            elevations,
            samples,
        })
    }

    /// Grid shape as (azimuths, elevations, samples)
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.azimuths, self.elevations, self.samples)
    }

    /// Impulse response at one (azimuth, elevation) cell
    pub fn slice(&self, azimuth: usize, elevation: usize) -> Option<&[f64]> {
        if azimuth >= self.azimuths || elevation >= self.elevations {
            return None;
        }
        let start = (azimuth * self.elevations + elevation) * self.samples;
        Some(&self.data[start..start + self.samples])
    }
}

/// One measurement session
#[derive(Debug, Clone)]
pub struct Subject {
    /// Subject id, second underscore-delimited token of `name`
    pub id: u32,

    /// Subject name (e.g. "subject_003_hrir")
    pub name: String,

    /// Left-ear impulse responses
    pub hrir_left: HrirGrid,

    /// Right-ear impulse responses
    pub hrir_right: HrirGrid,
}

impl Subject {
    /// Create a subject, parsing its id from `name`
    pub fn new(name: &str, hrir_left: HrirGrid, hrir_right: HrirGrid) -> Result<Self, AnalysisError> {
        let id = parse_subject_id(name)?;
        Ok(Self {
            id,
            name: name.to_string(),
            hrir_left,
            hrir_right,
        })
    }
}

/// Parse the id out of a `"<prefix>_<id>_<suffix>"` subject name
///
/// # Example
///
/// ```
/// use xfeed_dsp::io::dataset::parse_subject_id;
///
/// assert_eq!(parse_subject_id("subject_003_hrir").unwrap(), 3);
/// assert!(parse_subject_id("subject").is_err());
/// ```
pub fn parse_subject_id(name: &str) -> Result<u32, AnalysisError> {
    let token = name.split('_').nth(1).ok_or_else(|| {
        AnalysisError::InvalidInput(format!(
            "Subject name '{}' has no '_<id>' token",
            name
        ))
    })?;
    token.trim().parse::<u32>().map_err(|_| {
        AnalysisError::InvalidInput(format!(
            "Subject name '{}': '{}' is not an integer id",
            name, token
        ))
    })
}

/// A file the loader could not turn into a subject
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LoadFailure {
    /// File path
    pub path: PathBuf,

    /// Why it failed
    pub reason: String,
}

/// Loader output
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    /// Subjects in path order
    pub subjects: Vec<Subject>,

    /// Files that could not be loaded
    pub failures: Vec<LoadFailure>,
}

#[derive(Deserialize)]
struct SubjectFile {
    name: String,
    hrir_l: Vec<Vec<Vec<f64>>>,
    hrir_r: Vec<Vec<Vec<f64>>>,
}

/// Parse one subject file
pub fn load_subject_file(path: &Path) -> Result<Subject, AnalysisError> {
    let text = std::fs::read_to_string(path)?;
    let file: SubjectFile = serde_json::from_str(&text)?;
    let left = HrirGrid::from_nested(file.hrir_l)?;
    let right = HrirGrid::from_nested(file.hrir_r)?;
    Subject::new(&file.name, left, right)
}

/// Walk a dataset directory and load every subject file
///
/// Candidates are `*.json` entries directly under `root` or one directory
/// below it, selected by extension alone. Only a missing or unreadable `root`
/// is an error. Walk errors and candidates that fail to load are collected
/// in [`LoadedDataset::failures`].
pub fn load_dataset(root: &Path) -> Result<LoadedDataset, AnalysisError> {
    std::fs::read_dir(root).map_err(|e| AnalysisError::Io(format!("{}: {}", root.display(), e)))?;

    let mut dataset = LoadedDataset::default();
    let mut paths = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .max_depth(2)
        .sort_by_file_name();

    for entry in walker {
        match entry {
            Ok(entry) => {
                // Depth-1 directories are subject groups, walked into
                if entry.depth() == 1 && entry.file_type().is_dir() {
                    continue;
                }
                if has_json_extension(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                log::warn!("Failed to read {}: {}", path.display(), e);
                dataset.failures.push(LoadFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    log::debug!("Found {} candidate subject files under {}", paths.len(), root.display());

    for path in paths {
        match load_subject_file(&path) {
            Ok(subject) => dataset.subjects.push(subject),
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
                dataset.failures.push(LoadFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    log::debug!(
        "Collected {} subject files ({} failed)",
        dataset.subjects.len(),
        dataset.failures.len()
    );

    Ok(dataset)
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn grid_json(azimuths: usize, elevations: usize, samples: usize) -> serde_json::Value {
        let nested: Vec<Vec<Vec<f64>>> = (0..azimuths)
            .map(|a| {
                (0..elevations)
                    .map(|e| (0..samples).map(|s| (a * 100 + e * 10 + s) as f64).collect())
                    .collect()
            })
            .collect();
        serde_json::json!(nested)
    }

    #[test]
    fn test_parse_subject_id() {
        assert_eq!(parse_subject_id("subject_003_hrir").unwrap(), 3);
        assert_eq!(parse_subject_id("s_165").unwrap(), 165);
        assert!(parse_subject_id("subject").is_err());
        assert!(parse_subject_id("subject_abc_hrir").is_err());
        assert!(parse_subject_id("subject_-4_hrir").is_err());
    }

    #[test]
    fn test_grid_slice_indexing() {
        let nested: Vec<Vec<Vec<f64>>> =
            serde_json::from_value(grid_json(3, 2, 4)).unwrap();
        let grid = HrirGrid::from_nested(nested).unwrap();
        assert_eq!(grid.shape(), (3, 2, 4));
        assert_eq!(grid.slice(2, 1).unwrap(), &[210.0, 211.0, 212.0, 213.0]);
        assert_eq!(grid.slice(0, 0).unwrap()[3], 3.0);
        assert!(grid.slice(3, 0).is_none());
        assert!(grid.slice(0, 2).is_none());
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let nested = vec![vec![vec![0.0; 4]], vec![vec![0.0; 3]]];
        let err = HrirGrid::from_nested(nested).unwrap_err();
        assert!(matches!(err, AnalysisError::DatasetStructure(_)));

        let nested = vec![vec![vec![0.0; 4], vec![0.0; 4]], vec![vec![0.0; 4]]];
        assert!(HrirGrid::from_nested(nested).is_err());
    }

    #[test]
    fn test_from_flat_length_check() {
        assert!(HrirGrid::from_flat(vec![0.0; 24], 2, 3, 4).is_ok());
        assert!(HrirGrid::from_flat(vec![0.0; 23], 2, 3, 4).is_err());
    }

    #[test]
    fn test_load_dataset_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("subject_003");
        fs::create_dir(&group).unwrap();

        let good = serde_json::json!({
            "name": "subject_003_hrir",
            "hrir_l": grid_json(2, 2, 4),
            "hrir_r": grid_json(2, 2, 4),
        });
        fs::write(group.join("hrir_final.json"), good.to_string()).unwrap();
        fs::write(group.join("broken.json"), "{ not json").unwrap();
        fs::write(group.join("notes.txt"), "ignored").unwrap();

        let bad_name = serde_json::json!({
            "name": "nameless",
            "hrir_l": grid_json(1, 1, 2),
            "hrir_r": grid_json(1, 1, 2),
        });
        fs::write(dir.path().join("loose.json"), bad_name.to_string()).unwrap();

        let dataset = load_dataset(dir.path()).unwrap();
        assert_eq!(dataset.subjects.len(), 1);
        assert_eq!(dataset.subjects[0].id, 3);
        assert_eq!(dataset.subjects[0].hrir_left.shape(), (2, 2, 4));

        assert_eq!(dataset.failures.len(), 2);
        let failed: Vec<String> = dataset
            .failures
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(failed.contains(&"broken.json".to_string()));
        assert!(failed.contains(&"loose.json".to_string()));
    }

    #[test]
    fn test_load_dataset_reports_non_file_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("subject_004");
        fs::create_dir(&group).unwrap();
        fs::create_dir(group.join("hrir_final.json")).unwrap();

        let dataset = load_dataset(dir.path()).unwrap();
        assert!(dataset.subjects.is_empty());
        assert_eq!(dataset.failures.len(), 1);
        assert_eq!(dataset.failures[0].path, group.join("hrir_final.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_load_dataset_reports_broken_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("subject_003");
        fs::create_dir(&group).unwrap();
        let link = group.join("hrir_final.json");
        std::os::unix::fs::symlink(dir.path().join("missing.json"), &link).unwrap();

        let dataset = load_dataset(dir.path()).unwrap();
        assert!(dataset.subjects.is_empty());
        assert_eq!(dataset.failures.len(), 1);
        assert_eq!(dataset.failures[0].path, link);
    }

    #[test]
    fn test_load_dataset_ignores_deeper_levels() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("group").join("deeper");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("broken.json"), "{").unwrap();

        let dataset = load_dataset(dir.path()).unwrap();
        assert!(dataset.subjects.is_empty());
        assert!(dataset.failures.is_empty());
    }

    #[test]
    fn test_load_dataset_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dataset(&dir.path().join("absent"));
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}

//! Feature-index → physical parameter name map

use std::collections::HashMap;
use std::path::Path;

use crate::error::AnalysisError;

/// CIPIC anthropometric parameters x1..x17, in column order
const CIPIC_NAMES: [&str; 17] = [
    "head width",
    "head height",
    "head depth",
    "pinna offset down",
    "pinna offset back",
    "neck width",
    "neck height",
    "neck depth",
    "torso top width",
    "torso top height",
    "torso top depth",
    "shoulder width",
    "head offset forward",
    "height",
    "seated height",
    "head circumference",
    "shoulder circumference",
];

/// Human-readable names for anthropometric feature indices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureNames {
    names: HashMap<usize, String>,
}

impl FeatureNames {
    /// Names of the CIPIC anthropometric columns
    pub fn cipic() -> Self {
        Self {
            names: CIPIC_NAMES
                .iter()
                .enumerate()
                .map(|(i, name)| (i, name.to_string()))
                .collect(),
        }
    }

    /// Parse a JSON object keyed by feature index (`{"0": "head width"}`)
    pub fn from_json_str(text: &str) -> Result<Self, AnalysisError> {
        let raw: HashMap<String, String> = serde_json::from_str(text)?;
        let mut names = HashMap::with_capacity(raw.len());
        for (key, name) in raw {
            let index = key.trim().parse::<usize>().map_err(|_| {
                AnalysisError::Parse(format!("Name map key '{}' is not a feature index", key))
            })?;
            names.insert(index, name);
        }
        Ok(Self { names })
    }

    /// Load a name map from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self, AnalysisError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Set the name of one feature
    pub fn insert(&mut self, index: usize, name: &str) {
        self.names.insert(index, name.to_string());
    }

    /// Name of `index`, falling back to `"feature <index>"`
    pub fn name(&self, index: usize) -> String {
        self.names
            .get(&index)
            .cloned()
            .unwrap_or_else(|| format!("feature {}", index))
    }
}

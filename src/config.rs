//! YAML run configuration and the conformation list.
//!
//! ```yaml
//! common:
//!   debug: false
//!   working: /data/output
//!   class: building
//!   category: roof
//! prepare:
//!   dataset: /data/dataset
//!   conformation: conformation.txt
//!   split_seed: 42
//!   split_prop: [0.7, 0.2]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::PrepError;
use crate::geo::Epsg;
use crate::split::SplitProportions;

const DEFAULT_LABEL_FILE: &str = "label/label.geojson";

/// Whole configuration file. Sections other than these two are ignored so
/// one file can drive several tools.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub common: CommonConfig,
    #[serde(alias = "prepare.py")]
    pub prepare: PrepareConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommonConfig {
    /// Write the intermediate tile, fragment and link layers.
    #[serde(default)]
    pub debug: bool,
    /// Output root directory; created when missing.
    pub working: PathBuf,
    /// Supercategory of the single object category.
    pub class: String,
    /// Name of the single object category.
    pub category: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PrepareConfig {
    pub dataset: PathBuf,
    /// Conformation list, relative to `dataset` unless absolute.
    pub conformation: PathBuf,
    pub split_seed: u32,
    /// `[train, test]`. A third value (the validation share) is accepted and
    /// ignored: validation always takes the remainder.
    pub split_prop: Vec<f64>,
    /// Clip labels to tile extents before linking. Disable when the label
    /// file already holds per-tile fragments.
    #[serde(default = "default_true")]
    pub clip_labels: bool,
    /// Label file inside each `{project}/{region}/{year}/{epsg}` directory.
    #[serde(default = "default_label_file")]
    pub label_file: PathBuf,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub license: LicenseConfig,
}

/// Document `info` strings. The year comes from the conformation entry.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetadataConfig {
    pub version: String,
    pub description: String,
    pub contributor: String,
    pub url: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            description: "STDL dataset".to_string(),
            contributor: "STDL".to_string(),
            url: "N/A".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LicenseConfig {
    pub name: String,
    pub url: String,
}

impl Default for LicenseConfig {
    fn default() -> Self {
        Self {
            name: "On Demand (STDL)".to_string(),
            url: "N/A".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_label_file() -> PathBuf {
    PathBuf::from(DEFAULT_LABEL_FILE)
}

impl Config {
    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, PrepError> {
        let text = fs::read_to_string(path).map_err(|e| {
            PrepError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_yaml_str(&text).map_err(|source| PrepError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded configuration {:?}", config);
        Ok(config)
    }

    /// Parses without validating.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Checks values that parse but cannot drive a run.
    pub fn validate(&self) -> Result<(), PrepError> {
        if self.common.working.as_os_str().is_empty() {
            return Err(PrepError::Configuration(
                "common.working must not be empty".to_string(),
            ));
        }
        if self.common.category.trim().is_empty() {
            return Err(PrepError::Configuration(
                "common.category must not be empty".to_string(),
            ));
        }
        self.proportions()?;
        Ok(())
    }

    pub fn proportions(&self) -> Result<SplitProportions, PrepError> {
        match self.prepare.split_prop.as_slice() {
            [train, test] | [train, test, _] => SplitProportions::new(*train, *test),
            other => Err(PrepError::Configuration(format!(
                "prepare.split_prop needs 2 values, found {}",
                other.len()
            ))),
        }
    }

    pub fn conformation_path(&self) -> PathBuf {
        self.prepare.dataset.join(&self.prepare.conformation)
    }

    /// Checks the dataset layout and reads the conformation list.
    pub fn read_conformation(&self) -> Result<Vec<ConformationEntry>, PrepError> {
        if !self.prepare.dataset.is_dir() {
            return Err(PrepError::Configuration(format!(
                "dataset root directory not found: {}",
                self.prepare.dataset.display()
            )));
        }
        let path = self.conformation_path();
        let text = fs::read_to_string(&path).map_err(|e| {
            PrepError::Configuration(format!(
                "cannot read conformation file {}: {e}",
                path.display()
            ))
        })?;
        parse_conformation(&text)
    }
}

/// One dataset slice: the labels of one survey and the tiles covering it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConformationEntry {
    pub project: String,
    pub region: String,
    pub year: u32,
    pub epsg: Epsg,
    pub tile_source: String,
    pub tile_level: String,
}

impl ConformationEntry {
    /// `{dataset}/{project}/{region}/{year}/{epsg}`
    fn base(&self, dataset: &Path) -> PathBuf {
        dataset
            .join(&self.project)
            .join(&self.region)
            .join(self.year.to_string())
            .join(self.epsg.code().to_string())
    }

    pub fn label_path(&self, dataset: &Path, label_file: &Path) -> PathBuf {
        self.base(dataset).join(label_file)
    }

    pub fn tile_dir(&self, dataset: &Path) -> PathBuf {
        self.base(dataset)
            .join("tile")
            .join(&self.tile_source)
            .join("geotiff")
            .join(&self.tile_level)
    }

    /// Name of the output directory of this entry.
    pub fn slug(&self) -> String {
        format!(
            "{}_{}_{}_{}_{}_{}",
            self.project,
            self.region,
            self.year,
            self.epsg.code(),
            self.tile_source,
            self.tile_level
        )
    }
}

/// Parses a conformation list.
///
/// Blank lines and lines starting with `#` or `%` are skipped; every other
/// line holds `project region year epsg tile_source tile_level`.
pub fn parse_conformation(text: &str) -> Result<Vec<ConformationEntry>, PrepError> {
    let mut entries = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('%') {
            continue;
        }
        entries.push(parse_conformation_line(line, line_no + 1)?);
    }

    Ok(entries)
}

fn parse_conformation_line(line: &str, line_no: usize) -> Result<ConformationEntry, PrepError> {
    let invalid = |message: String| {
        PrepError::Configuration(format!("conformation line {line_no}: {message}"))
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    let [project, region, year, epsg, tile_source, tile_level] = fields.as_slice() else {
        return Err(invalid(format!(
            "expected 6 fields, found {}",
            fields.len()
        )));
    };

    let year = year
        .parse::<u32>()
        .map_err(|_| invalid(format!("invalid year '{year}'")))?;
    let epsg = epsg
        .parse::<Epsg>()
        .map_err(|_| invalid(format!("invalid EPSG code '{epsg}'")))?;

    Ok(ConformationEntry {
        project: project.to_string(),
        region: region.to_string(),
        year,
        epsg,
        tile_source: tile_source.to_string(),
        tile_level: tile_level.to_string(),
    })
}

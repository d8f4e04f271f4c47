//! Test harness for isolated test execution.
//!
//! `TestHarness` owns a temporary config directory, writes the JSON tables into it,
//! and builds classifiers, extractors, and pipelines from what it wrote.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use apptrack::classifier::{Classifier, ClassifierSettings};
use apptrack::config::{load_patterns, ConfigPaths, PatternConfig};
use apptrack::extractor::CompanyExtractor;
use apptrack::ml::MessagePredictor;
use apptrack::Pipeline;

use super::builders::{CompaniesBuilder, PatternsBuilder};

/// The tables shipped with the crate.
pub fn shipped_config_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("config")
}

pub fn shipped_patterns() -> Arc<PatternConfig> {
    let config = load_patterns(&ConfigPaths::in_dir(shipped_config_dir()))
        .expect("Shipped config should load");
    Arc::new(config)
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_dir = temp_dir.path().join("config");
        std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        Self {
            temp_dir,
            config_dir,
        }
    }

    /// Write both required tables.
    pub fn with_config(self, patterns: &PatternsBuilder, companies: &CompaniesBuilder) -> Self {
        self.write_file("patterns.json", &patterns.to_json());
        self.write_file("companies.json", &companies.to_json());
        self
    }

    /// Write a raw file into the config directory.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.config_dir.join(name);
        std::fs::write(&path, content).expect("Failed to write config file");
        path
    }

    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths::in_dir(&self.config_dir)
    }

    pub fn load(&self) -> Arc<PatternConfig> {
        Arc::new(load_patterns(&self.paths()).expect("Failed to load config"))
    }

    pub fn classifier(&self, predictor: Arc<dyn MessagePredictor>) -> Classifier {
        Classifier::new(self.load(), predictor, ClassifierSettings::default())
    }

    pub fn extractor(&self) -> CompanyExtractor {
        CompanyExtractor::new(self.load())
    }

    pub fn pipeline(&self, predictor: Arc<dyn MessagePredictor>) -> Pipeline {
        Pipeline::from_config(self.load(), predictor, ClassifierSettings::default())
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }
}

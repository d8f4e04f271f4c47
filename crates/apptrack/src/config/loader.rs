use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::info;

use crate::config::patterns::PatternConfig;
use crate::config::schema::{CompaniesFile, DomainMapFile, PatternsFile};
use crate::error::ConfigError;

pub const PATTERNS_FILE: &str = "patterns.json";
pub const COMPANIES_FILE: &str = "companies.json";
pub const DOMAIN_MAP_FILE: &str = "domain_to_company.json";

/// Locations of the pattern and company tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub patterns: PathBuf,
    pub companies: PathBuf,
    /// Legacy flat domain map. Read only when set.
    pub domain_map: Option<PathBuf>,
}

impl ConfigPaths {
    /// Standard file names inside `dir`. The legacy map is picked up only if it exists.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let domain_map = dir.join(DOMAIN_MAP_FILE);
        Self {
            patterns: dir.join(PATTERNS_FILE),
            companies: dir.join(COMPANIES_FILE),
            domain_map: domain_map.is_file().then_some(domain_map),
        }
    }
}

/// Reads and compiles all tables. Missing or malformed files are fatal;
/// individual bad regexes are skipped.
pub fn load_patterns(paths: &ConfigPaths) -> Result<PatternConfig, ConfigError> {
    let patterns: PatternsFile = read_json(&paths.patterns)?;
    let companies: CompaniesFile = read_json(&paths.companies)?;
    let legacy = match &paths.domain_map {
        Some(path) => Some(read_json::<DomainMapFile>(path)?),
        None => None,
    };

    let config = PatternConfig::build(patterns, companies, legacy)?;

    info!(
        patterns = %paths.patterns.display(),
        labels = config.label_rules().len(),
        compiled = config.pattern_count(),
        skipped = config.warnings().len(),
        known_companies = config.known_companies().len(),
        "Pattern tables loaded"
    );

    Ok(config)
}

pub fn load_patterns_from_str(
    patterns: &str,
    companies: &str,
    domain_map: Option<&str>,
) -> Result<PatternConfig, ConfigError> {
    let patterns: PatternsFile = parse_json(patterns, Path::new(PATTERNS_FILE))?;
    let companies: CompaniesFile = parse_json(companies, Path::new(COMPANIES_FILE))?;
    let legacy = domain_map
        .map(|content| parse_json::<DomainMapFile>(content, Path::new(DOMAIN_MAP_FILE)))
        .transpose()?;

    PatternConfig::build(patterns, companies, legacy)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_json(&content, path)
}

fn parse_json<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::ParseJson {
        path: path.to_path_buf(),
        source: e,
    })
}

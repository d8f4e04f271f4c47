pub mod loader;
pub mod patterns;
pub mod schema;

pub use loader::{load_patterns, load_patterns_from_str, ConfigPaths};
pub use patterns::{compile_pattern, LabelRule, PatternConfig, PatternWarning};
pub use schema::{CompaniesFile, DomainMapFile, PatternsFile};

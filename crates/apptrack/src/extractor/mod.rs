pub mod company;
pub mod job;

pub use company::{CompanyExtraction, CompanyExtractor, ExtractionSource, DEFAULT_SUBJECT_PATTERNS};
pub use job::{extract_job_id, extract_job_title};

pub mod domain;
pub mod merge;
pub mod stage;
pub mod verdict;

pub use domain::extract_domain;
pub use merge::validate_report;
pub use stage::Validator;
pub use verdict::normalize_verdict;

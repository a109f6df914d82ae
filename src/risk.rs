mod merge;
mod source;


pub use merge::{build_risk_rows, filter_tests, merge_rows, selected_names};
pub use source::{HeaderMap, RiskColumn, SourceRiskRow, header_key, read_source_rows};

pub mod config;
pub mod correct;
pub mod history;
pub mod infer;
pub mod issue;
pub mod log;
pub mod quiz;
pub mod report;
pub mod resolve;
pub mod tokenize;

pub use correct::{apply_issues, build_correct_tokens, corrected_sentence};
pub use infer::{infer_issue, DiffSpan};
pub use issue::Issue;
pub use resolve::ensure_indexed_issues;
pub use tokenize::tokenize;

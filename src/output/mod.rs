mod json;
mod rules;
mod summary;

pub use json::{render_report, write_report};
pub use rules::format_rules;
pub use summary::{format_summary, print_summary};

mod builder;
mod types;

pub use builder::{drill_down_url, ReportBuilder};
pub use types::*;

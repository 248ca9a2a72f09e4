//! Pattern and report import/export.
//!
//! The table codec is deliberately narrow: a case-sensitive `x,y,delay` CSV
//! in, the same shape out, and a fixed-format text report. File-path loaders
//! wrap the string codecs with context for the caller.

pub mod csv;
pub mod report;

pub use self::csv::{
    load_pattern_file, pattern_from_csv, pattern_to_csv, save_pattern_file, template_pattern,
};
pub use self::report::{render_report, report_to_json};

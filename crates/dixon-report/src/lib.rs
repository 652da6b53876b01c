//! Curation reports over the canonical database.
//!
//! Both reports are CSV files; an existing report file is left untouched.

#![deny(unsafe_code)]

mod common;
mod dixon_counts;
mod swap_template;

pub use crate::common::{
    DIXON_COUNTS_FILE, REPORT_SITES, ReportOutcome, SWAP_TEMPLATE_FILE, render_csv,
};
pub use crate::dixon_counts::{DixonCount, count_dixons, render_dixon_counts, write_dixon_counts};
pub use crate::swap_template::{
    SwapTemplateRow, render_swap_template, swap_template_rows, write_swap_template,
};

//! Library side of the `dixon` command-line tool.

#![deny(unsafe_code)]

pub mod logging;
pub mod settings;

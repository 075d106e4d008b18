//! `hc`: command-line tools over `hc-runtime`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod session;

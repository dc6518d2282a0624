//! `tdreport` - Technical Director shift report server
//!
//! This library stores submitted shift report forms as pretty-printed JSON
//! files, lists and serves them back, and exposes the whole thing over a
//! small HTTP API.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod activity;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod server;
pub mod store;

pub use activity::{ActivityLog, EntryKind};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{ReportRecord, SavedReport, StoredReport};
pub use server::{build_router, serve, AppState};
pub use store::{ReportRepository, ReportStore};

//! Backend of the record annotator: filterable record tables, highlight
//! terms, canned report generation, ratings and spreadsheet import for the
//! "data rows" and "applications" review screens.

pub mod commands;
pub mod config;
pub mod error;
pub mod facet;
pub mod filter;
pub mod highlight;
pub mod import;
pub mod logging;
pub mod rating;
pub mod record;
pub mod report;
pub mod session;

#[cfg(feature = "desktop")]
mod desktop;

#[cfg(feature = "desktop")]
pub use desktop::run;

pub use config::AnnotatorConfig;
pub use error::{AnnotatorError, Result};
pub use session::{AppState, ViewKind, ViewSession};

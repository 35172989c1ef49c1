//! Core library for the seatable-sync command line application.
//!
//! The tool performs a full clear-and-reload sync of Excel workbook sheets
//! into SeaTable tables, driven by JSON sync profiles. The modules are
//! structured to keep responsibilities narrow and composable: profile schema
//! and loading in [`config`], cell coercion in [`coerce`], row mapping in
//! [`transform`], chunked remote writes in [`batch`], per-table orchestration
//! in [`sync`], profile discovery and selection in [`profiles`], and the IO
//! adapters in [`io`] and [`seatable`].

pub mod batch;
pub mod coerce;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod profiles;
pub mod seatable;
pub mod sync;
pub mod transform;

pub use error::{Result, SyncError};

#![warn(clippy::all, missing_docs)]

//! Core domain logic for the armylist roster builder.
//!
//! This crate hosts the catalog ingestion, the army composition rules
//! engine, configuration handling, and the save/export layers used by the
//! terminal UI and any future frontends.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod export;
pub mod manifest;
pub mod models;
pub mod save;

pub use catalog::{Catalog, CatalogStore, Faction};
pub use config::AppConfig;
pub use engine::{Command, Outcome, Roster, RosterError, RosterStore, RuleBook, Verdict};
pub use export::ExportPayload;
pub use manifest::CatalogManifest;
pub use save::SaveManager;

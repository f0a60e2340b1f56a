//! SipControl core library
//!
//! Headless core of the SipControl personal drink tracker: the persistence
//! layer, the application state controller, export/import, and the PIN
//! gate utilities. A rendering shell embeds [`app::AppState`] and
//! subscribes to [`changes::ChangeBus`] to stay current.

pub mod app;
pub mod changes;
pub mod config;
pub mod crypto;
pub mod database;
pub mod date;
pub mod error;
pub mod services;

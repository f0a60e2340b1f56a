//! Services module
//!
//! Business logic services mediating between the rendering surface and the
//! repository. Together they form the application state controller.

pub mod backup;
pub mod drinks;
pub mod events;
pub mod settings;

pub use backup::{BackupService, ExportPayload, ImportSummary};
pub use drinks::DrinksService;
pub use events::{EventsService, QuickAdd};
pub use settings::SettingsService;

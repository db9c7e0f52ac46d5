mod engine;
mod error;
mod types;

pub use engine::{Engine, Session};
pub use error::{EditError, EditErrorCode};
pub use types::{
    ArchiveLayout, ChangeRecord, MODEL_SETTINGS_MEMBER, SETTINGS_MEMBER, SaveOptions, SaveReport,
};

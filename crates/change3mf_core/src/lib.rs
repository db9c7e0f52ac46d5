pub mod archive;
pub mod core_api;
pub mod model_settings;
pub mod modifications;
pub mod settings;

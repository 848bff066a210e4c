pub mod api;
pub mod app_config;
pub mod export;
pub mod interpreter;
pub mod logging;
pub mod priorities;

pub use api::*;
pub use app_config::*;
pub use export::*;
pub use interpreter::*;
pub use logging::*;
pub use priorities::*;

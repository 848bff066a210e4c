pub mod correction_service;
pub mod rule_service;
pub mod search_service;

pub use correction_service::*;
pub use rule_service::*;
pub use search_service::*;

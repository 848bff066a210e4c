//! # Alchemist Testing Utils
//!
//! 各crate测试共用的工具：内存中的解释器mock、原始记录构建器，
//! 以及一组带有已知问题的示例数据。
//!
//! ```toml
//! [dev-dependencies]
//! alchemist-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

pub use builders::*;
pub use helpers::*;
pub use mocks::*;

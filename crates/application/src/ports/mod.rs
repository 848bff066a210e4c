//! 应用层依赖的外部接口
//!
//! - `interpreter.rs` - 自然语言到JSON的解释器

pub mod interpreter;

pub use interpreter::*;

//! # Core Module / 核心模块
//!
//! This module contains the execution engine of Itom Runner: the value model,
//! variable interpolation, the per-test context, command resolution, the
//! block interpreter, macro expansion and the suite driver.
//!
//! 此模块包含 Itom Runner 的执行引擎：值模型、变量插值、每个测试的上下文、
//! 命令解析、块解释器、宏展开以及套件驱动。

pub mod blocks;
pub mod command;
pub mod content;
pub mod context;
pub mod document;
pub mod error;
pub mod interpolate;
pub mod macros;
pub mod models;
pub mod services;
pub mod suite;
pub mod value;

// Re-exports
pub use content::{Content, Encoding};
pub use context::Context;
pub use error::{DocumentError, EngineError};
pub use models::{SuiteReport, TestReport};
pub use services::ServiceRegistry;
pub use suite::Suite;
pub use value::CanonicalValue;

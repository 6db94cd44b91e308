//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for Itom Runner:
//! project configuration, the HTTP and SQLite backends, file system
//! discovery, and i18n support.
//!
//! 此模块为 Itom Runner 提供基础设施服务：
//! 项目配置、HTTP 与 SQLite 后端、文件系统发现以及国际化支持。

pub mod config;
pub mod fs;
pub mod http;
pub mod sql;

// Re-export i18n functions for easier access
pub use rust_i18n::t;

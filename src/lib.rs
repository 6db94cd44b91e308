//! # Itom Runner Library / Itom Runner 库
//!
//! This library provides the core functionality for the Itom tool, a
//! declarative integration-test engine. Suites are TOML documents made of
//! assign, command and expected blocks that run against HTTP and SQL services.
//!
//! 此库为 Itom 工具提供核心功能，这是一个声明式的集成测试引擎。
//! 套件是由赋值、命令和期望块组成的 TOML 文档，针对 HTTP 与 SQL 服务运行。
//!
//! ## Modules / 模块
//!
//! - `core` - Values, context, blocks, macros and the suite engine
//! - `infra` - Project configuration, service backends and file system discovery
//! - `reporting` - Console report of a run
//! - `cli` / `commands` - Command-line interface and subcommands
//!
//! - `core` - 值、上下文、块、宏和套件引擎
//! - `infra` - 项目配置、服务后端和文件系统发现
//! - `reporting` - 运行的控制台报告
//! - `cli` / `commands` - 命令行接口和子命令

pub mod cli;
pub mod commands;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::{CanonicalValue, Content, Context, Suite, models};

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    let lang = if available_locales.contains(&locale.as_str()) {
        &locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");

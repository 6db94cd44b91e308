//! # Reporting Module / 报告模块
//!
//! This module handles the display of test verdicts. It prints colorful,
//! formatted progress and failure details to the console with
//! internationalization support.
//!
//! 此模块处理测试结论的显示。它在控制台打印彩色格式化的进度与失败详情，支持国际化。

pub mod console;

// Re-export common reporting types
pub use console::ConsoleReporter;

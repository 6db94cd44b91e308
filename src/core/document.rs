//! # Suite Document Module / 套件文档模块
//!
//! The serde model of a suite file. Elements are kept as loose attribute
//! bags here; [`crate::core::blocks::parse_element`] turns them into typed
//! blocks.
//!
//! 套件文件的 serde 模型。元素在这里保持为松散的属性集合，
//! 由 [`crate::core::blocks::parse_element`] 转换为类型化的块。

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::DocumentError;

/// One `assign`, `command`, `expected` or `macro` element.
/// Which attributes matter depends on `kind`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ElementDef {
    pub kind: String,
    /// `assign`: target variable.
    #[serde(default)]
    pub var: Option<String>,
    /// `assign`: literal value.
    #[serde(default, rename = "const")]
    pub constant: Option<String>,
    /// `assign`: path into the current content. `expected`: path to compare.
    #[serde(default)]
    pub section: Option<String>,
    /// `assign`: strftime pattern.
    #[serde(default)]
    pub date: Option<String>,
    /// `command`: executor type, e.g. `http.get.json`.
    #[serde(default, rename = "type")]
    pub command_type: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// `command`: request body or SQL statement. `expected`: expected value.
    #[serde(default)]
    pub body: Option<String>,
    /// `expected`: description, or the expected value when `body` is absent.
    #[serde(default)]
    pub that: Option<String>,
    /// `macro`: referenced macro name.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MacroDef {
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<ElementDef>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TestDef {
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<ElementDef>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TestsDef {
    /// Keep running a test's blocks after its first failure.
    #[serde(default, alias = "continueOnFail")]
    pub continue_on_fail: bool,
    #[serde(default)]
    pub cases: Vec<TestDef>,
}

/// The whole suite file.
/// 整个套件文件。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SuiteDocument {
    #[serde(default)]
    pub macros: Vec<MacroDef>,
    #[serde(default)]
    pub tests: TestsDef,
}

impl SuiteDocument {
    pub fn parse(source: &str) -> Result<Self, DocumentError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read suite file: {}", path.display()))?;
        Self::parse(&source)
            .with_context(|| format!("Failed to parse suite file: {}", path.display()))
    }
}

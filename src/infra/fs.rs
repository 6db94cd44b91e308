//! # File System Operations Module / 文件系统操作模块
//!
//! Discovers categories and suite files under the tests directory, and
//! scaffolds new projects.
//!
//! 在测试目录下发现分类和套件文件，并为新项目生成脚手架。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of suite documents.
pub const SUITE_EXTENSION: &str = "toml";

/// A category directory and the suite files inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub path: PathBuf,
    /// Suite file names, sorted.
    pub suites: Vec<String>,
}

/// Lists the categories of `tests_dir` in name order. Each category is a
/// sub-directory; its suites are the `*.toml` files it contains.
///
/// 按名称顺序列出 `tests_dir` 中的分类。每个分类是一个子目录，
/// 其套件为其中包含的 `*.toml` 文件。
pub fn discover(tests_dir: &Path) -> Result<Vec<Category>> {
    if !is_directory(tests_dir) {
        return Ok(Vec::new());
    }

    let mut categories = Vec::new();
    for name in sorted_entries(tests_dir, |path| path.is_dir())? {
        let path = tests_dir.join(&name);
        let suites = sorted_entries(&path, |p| {
            p.is_file() && p.extension().is_some_and(|ext| ext == SUITE_EXTENSION)
        })?;
        categories.push(Category { name, path, suites });
    }
    Ok(categories)
}

fn sorted_entries<F>(dir: &Path, keep: F) -> Result<Vec<String>>
where
    F: Fn(&Path) -> bool,
{
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if !keep(&path) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

/// Checks if a path exists and is a directory.
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Writes `content` to `path`, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write file: {}", path.display()))
}

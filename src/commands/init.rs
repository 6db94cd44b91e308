//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command of the Itom CLI, which scaffolds
//! a project model file, a reset script and one example suite.
//!
//! 此模块实现 Itom CLI 的 `init` 命令，用于生成项目模型文件、重置脚本和一个示例套件。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::path::Path;

use crate::infra::{config::DEFAULT_CONFIG_FILE, fs, t};

const CONFIG_TEMPLATE: &str = r#"# Integration test model / 集成测试模型
description = "Integration Tests: $project"
tests_dir = "integration-tests"

[properties]
project = "example"
api_host = { default = "localhost", env = "API_HOST" }
api_port = { default = "8080", env = "API_PORT" }

# REST service reached by `http.*` commands / `http.*` 命令访问的 REST 服务
[services.api]
driver = "http.rest"
schema = "http"
host = "$api_host"
port = "$api_port"
# reset = "/test/reset"

# Database reached by `sql.*` commands / `sql.*` 命令访问的数据库
[services.db]
driver = "database.sqlite"
path = "itom.sqlite"
reset = "fixtures/reset.sql"
"#;

const RESET_TEMPLATE: &str = r#"DROP TABLE IF EXISTS users;
CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
INSERT INTO users (name) VALUES ('alice'), ('bob');
"#;

const SUITE_TEMPLATE: &str = r#"[[macros]]
name = "count-users"

[[macros.blocks]]
kind = "command"
type = "sql.query"
service = "db"
body = "SELECT COUNT(*) AS total FROM users"

[tests]
continue_on_fail = false

[[tests.cases]]
name = "seeded users are visible"

[[tests.cases.blocks]]
kind = "macro"
name = "count-users"

[[tests.cases.blocks]]
kind = "expected"
section = "0/total"
that = "two seeded users"
body = "2"

[[tests.cases]]
name = "insert adds a user"

[[tests.cases.blocks]]
kind = "assign"
var = "name"
const = "carol"

[[tests.cases.blocks]]
kind = "command"
type = "sql.exec"
service = "db"
body = "INSERT INTO users (name) VALUES ('$name')"

[[tests.cases.blocks]]
kind = "expected"
section = "changes"
body = "1"

[[tests.cases.blocks]]
kind = "macro"
name = "count-users"

[[tests.cases.blocks]]
kind = "expected"
section = "0/total"
body = "3"
"#;

/// Scaffolds a project in `project_dir`.
///
/// An existing model file is only replaced with `force` or after the user
/// confirms the prompt.
///
/// 在 `project_dir` 中生成项目脚手架。已有的模型文件只有在指定 `force` 或用户确认后才会被替换。
pub fn run_init(project_dir: &Path, force: bool) -> Result<()> {
    let config_path = project_dir.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() && !force {
        let overwrite = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("init.overwrite_prompt", path = config_path.display()).to_string())
            .default(false)
            .interact()
            .context(t!("init.prompt_failed").to_string())?;
        if !overwrite {
            println!("{}", t!("init.aborted").yellow());
            return Ok(());
        }
    }

    let files = [
        (config_path, CONFIG_TEMPLATE),
        (project_dir.join("fixtures").join("reset.sql"), RESET_TEMPLATE),
        (
            project_dir
                .join("integration-tests")
                .join("010-example")
                .join("010-smoke.toml"),
            SUITE_TEMPLATE,
        ),
    ];
    for (path, content) in &files {
        fs::write_file(path, content)?;
        println!("{}", t!("init.created", path = path.display()).green());
    }
    println!("{}", t!("init.next_steps"));
    Ok(())
}

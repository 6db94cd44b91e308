//! # Suite and Test Driver / 套件与测试驱动
//!
//! Builds macros and tests from a [`SuiteDocument`] and executes the tests
//! strictly in order. Within a test, blocks run in order and stop at the
//! first failure unless the suite sets `continue_on_fail`.
//!
//! 根据 [`SuiteDocument`] 构建宏和测试，并严格按顺序执行测试。
//! 在一个测试内部，块按顺序运行，并在第一次失败时停止（除非套件设置了 `continue_on_fail`）。

use indexmap::IndexMap;
use log::debug;

use crate::core::blocks::Block;
use crate::core::context::Context;
use crate::core::document::SuiteDocument;
use crate::core::error::{DocumentError, EngineError};
use crate::core::macros::{Macro, MacroExpander};
use crate::core::models::TestReport;
use crate::core::services::ServiceRegistry;

/// One test: a name and its flattened blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Test {
    pub name: String,
    pub blocks: Vec<Block>,
}

impl Test {
    /// Runs the test on a fresh context. Fixtures are reset first.
    ///
    /// Assertion failures and unknown command types end up in the report;
    /// backend errors are returned and abort the run.
    ///
    /// 在全新的上下文中运行测试，并先重置测试数据。
    /// 断言失败和未知命令类型会写入报告；后端错误会被返回并中止运行。
    pub async fn execute(
        &self,
        services: &ServiceRegistry,
        continue_on_fail: bool,
    ) -> Result<TestReport, EngineError> {
        services.prepare().await?;

        let mut context = Context::new();
        let mut warnings = Vec::new();
        for block in &self.blocks {
            block.execute(&mut context, services, &mut warnings).await?;
            if context.is_failed() && !continue_on_fail {
                break;
            }
        }
        Ok(TestReport::from_context(&self.name, &context, warnings))
    }
}

/// A parsed suite with its macros and the tests left after skipping.
/// 已解析的套件，包含其宏以及跳过后剩余的测试。
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub macros: IndexMap<String, Macro>,
    pub tests: Vec<Test>,
    pub continue_on_fail: bool,
}

impl Suite {
    /// Builds a suite. All macros are flattened before any test is built; the
    /// first `skip_first` test definitions are dropped without being parsed.
    ///
    /// 构建套件。所有宏在构建任何测试之前展开；前 `skip_first` 个测试定义会被直接丢弃，不做解析。
    pub fn build(document: &SuiteDocument, skip_first: usize) -> Result<Self, DocumentError> {
        let mut expander = MacroExpander::new(&document.macros)?;
        expander.expand_all()?;

        let mut tests = Vec::with_capacity(document.tests.cases.len().saturating_sub(skip_first));
        for (index, definition) in document.tests.cases.iter().enumerate() {
            if index < skip_first {
                debug!("skipping test '{}'", definition.name);
                continue;
            }
            tests.push(Test {
                name: definition.name.clone(),
                blocks: expander.flatten(&definition.blocks, &definition.name)?,
            });
        }

        Ok(Self {
            macros: expander.into_macros(),
            tests,
            continue_on_fail: document.tests.continue_on_fail,
        })
    }

    /// Parses and builds a suite from TOML source.
    pub fn parse(source: &str, skip_first: usize) -> Result<Self, DocumentError> {
        Self::build(&SuiteDocument::parse(source)?, skip_first)
    }

    /// Checks that every command names a configured service of the right kind.
    /// 检查每个命令引用的服务均已配置且类型正确。
    pub fn check_services(&self, services: &ServiceRegistry) -> Result<(), DocumentError> {
        for test in &self.tests {
            for block in &test.blocks {
                let Block::Command(command) = block else {
                    continue;
                };
                let Some(kind) = command.executor().service_kind() else {
                    continue;
                };
                let matches = services
                    .get(&command.service)
                    .is_some_and(|service| service.kind() == kind);
                if !matches {
                    return Err(DocumentError::UnknownService {
                        test: test.name.clone(),
                        service: command.service.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Executes every test in order. `on_test` sees each report as soon as
    /// the test finishes; a failing test does not stop the suite.
    ///
    /// 按顺序执行每个测试。`on_test` 在每个测试结束后立即收到报告；失败的测试不会停止套件。
    pub async fn execute<F>(
        &self,
        services: &ServiceRegistry,
        mut on_test: F,
    ) -> Result<Vec<TestReport>, EngineError>
    where
        F: FnMut(&TestReport),
    {
        let mut reports = Vec::with_capacity(self.tests.len());
        for test in &self.tests {
            let report = test.execute(services, self.continue_on_fail).await?;
            on_test(&report);
            reports.push(report);
        }
        Ok(reports)
    }
}

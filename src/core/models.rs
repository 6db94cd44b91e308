//! # Report Models Module / 报告模型模块
//!
//! The data the engine hands to reporters: one [`TestReport`] per executed
//! test, grouped into [`SuiteReport`]s.
//!
//! 引擎交给报告器的数据：每个已执行测试对应一个 [`TestReport`]，并按 [`SuiteReport`] 分组。

use serde::{Deserialize, Serialize};

use crate::core::context::Context;

/// What a reader needs to see why a test failed.
/// 读者了解测试失败原因所需的信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub expected_description: String,
    pub expected_pretty: String,
    /// Pretty form of the current content at the time of failure.
    pub received_pretty: String,
}

/// The outcome of one test.
/// 单个测试的结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub name: String,
    pub passed: bool,
    pub warnings: Vec<String>,
    pub on_fail: Option<FailureDetail>,
}

impl TestReport {
    /// Builds the report from a finished context. The verdict is exactly
    /// whether the context holds a failure.
    pub fn from_context(name: &str, context: &Context, warnings: Vec<String>) -> Self {
        let on_fail = context.failure().map(|expected| FailureDetail {
            expected_description: expected.description().to_string(),
            expected_pretty: expected.pretty(),
            received_pretty: context
                .current()
                .map(|content| content.pretty())
                .unwrap_or_else(|| "null".to_string()),
        });
        Self {
            name: name.to_string(),
            passed: on_fail.is_none(),
            warnings,
            on_fail,
        }
    }

    pub fn is_failure(&self) -> bool {
        !self.passed
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub category: String,
    pub suite: String,
    pub tests: Vec<TestReport>,
}

impl SuiteReport {
    pub fn failed(&self) -> usize {
        self.tests.iter().filter(|t| t.is_failure()).count()
    }

    pub fn passed(&self) -> usize {
        self.tests.len() - self.failed()
    }
}

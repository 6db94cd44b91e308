//! # Execution Context / 执行上下文
//!
//! Per-test mutable state: the variable mapping, the current content with the
//! history of earlier contents, and the terminal failure slot.
//!
//! 每个测试的可变状态：变量映射、当前内容及其历史记录，以及终止性的失败槽位。

use crate::core::content::Content;
use crate::core::interpolate::{self, Variables};

#[derive(Debug, Default)]
pub struct Context {
    variables: Variables,
    current: Option<Content>,
    history: Vec<Content>,
    failure: Option<Content>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Renders `template` against this test's variables.
    pub fn apply_variables(&self, template: &str) -> String {
        interpolate::interpolate(template, &self.variables)
    }

    /// Replaces the current content, moving the previous one into the history.
    /// 替换当前内容，并将之前的内容移入历史记录。
    pub fn update(&mut self, content: Content) {
        if let Some(previous) = self.current.replace(content) {
            self.history.push(previous);
        }
    }

    pub fn current(&self) -> Option<&Content> {
        self.current.as_ref()
    }

    /// Earlier contents, oldest first.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Records a failure. The first failure is kept; later calls are ignored.
    /// 记录失败。保留第一次失败，后续调用将被忽略。
    pub fn fail(&mut self, expected: Content) {
        if self.failure.is_none() {
            self.failure = Some(expected);
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<&Content> {
        self.failure.as_ref()
    }
}

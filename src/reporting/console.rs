//! # Console Reporting Module / 控制台报告模块
//!
//! This module renders run progress and test verdicts to the console: a
//! header, one line per category, suite and test, failure details with the
//! expected and received payloads, and a closing summary.
//!
//! 此模块在控制台中渲染运行进度和测试结论：标题、每个分类/套件/测试一行、
//! 包含期望与实际负载的失败详情，以及最终摘要。
//!
//! # Output Format / 输出格式
//! ```text
//!                                                            Integration Tests: /srv/app/integration-tests
//!                                                                                     10.18.26 14:03:11
//!
//! Test                                                                              Warning      State
//! --------------------------------------------------------------------------------------------------------
//!
//! 010-users
//!     010-crud.toml
//!         create user                                                                            OK
//!         delete user                                                                   1      FAIL
//! ```

use chrono::Local;
use colored::*;
use std::io::{self, Write};

use crate::core::models::{SuiteReport, TestReport};
use crate::infra::t;

const LINE_WIDTH: usize = 104;
const STATUS_WIDTH: usize = 18;

/// Streams the report of a run. Warnings raised outside a test are buffered
/// and printed with the header or the next test.
///
/// 流式输出一次运行的报告。测试之外产生的警告会被缓存，并随标题或下一个测试一起打印。
pub struct ConsoleReporter<W: Write = io::Stdout> {
    out: W,
    header: String,
    header_printed: bool,
    warnings: Vec<String>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(header: impl Into<String>) -> Self {
        Self::new(io::stdout(), header)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, header: impl Into<String>) -> Self {
        Self {
            out,
            header: header.into(),
            header_printed: false,
            warnings: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Queues a warning for the next printed block.
    pub fn warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn category(&mut self, name: &str, empty: bool) -> io::Result<()> {
        self.print_header()?;
        writeln!(self.out)?;
        if empty {
            writeln!(self.out, "{}", t!("report.category_empty", name = name).yellow())
        } else {
            writeln!(self.out, "{}", name.bold())
        }
    }

    pub fn suite(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "    {}", name.cyan())
    }

    /// Prints the verdict line of a test, plus warnings and failure details when present.
    /// 打印测试的结论行，并在存在时打印警告和失败详情。
    pub fn test(&mut self, report: &TestReport) -> io::Result<()> {
        self.warnings.extend(report.warnings.iter().cloned());

        let state = if report.passed {
            format!("{:>10}", t!("report.status_ok")).green()
        } else {
            format!("{:>10}", t!("report.status_fail")).red().bold()
        };
        let warning_count = if self.warnings.is_empty() {
            " ".to_string()
        } else {
            self.warnings.len().to_string()
        };
        let name_width = LINE_WIDTH - STATUS_WIDTH;
        writeln!(
            self.out,
            "{:<name_width$} {:>7}{}",
            format!("        {}", report.name),
            warning_count.yellow(),
            state
        )?;

        if report.passed && self.warnings.is_empty() {
            return Ok(());
        }

        self.full_line()?;
        self.print_warnings()?;
        if let Some(failure) = &report.on_fail {
            writeln!(self.out)?;
            writeln!(
                self.out,
                "{}",
                t!("report.expected", description = failure.expected_description).red()
            )?;
            writeln!(self.out, "{}", failure.expected_pretty)?;
            writeln!(self.out)?;
            writeln!(self.out, "{}", t!("report.received").yellow())?;
            writeln!(self.out, "{}", failure.received_pretty)?;
            writeln!(self.out)?;
        }
        self.full_line()
    }

    /// Prints totals over every suite of the run.
    /// 打印本次运行所有套件的汇总。
    pub fn summary(&mut self, suites: &[SuiteReport]) -> io::Result<()> {
        self.print_header()?;
        let passed: usize = suites.iter().map(SuiteReport::passed).sum();
        let failed: usize = suites.iter().map(SuiteReport::failed).sum();

        writeln!(self.out)?;
        self.full_line()?;
        let line = t!(
            "report.summary",
            suites = suites.len(),
            passed = passed,
            failed = failed
        );
        if failed == 0 {
            writeln!(self.out, "{}", line.green().bold())
        } else {
            writeln!(self.out, "{}", line.red().bold())
        }
    }

    /// Prints the header once, together with any pending warnings.
    pub fn print_header(&mut self) -> io::Result<()> {
        if self.header_printed {
            return Ok(());
        }
        self.header_printed = true;

        writeln!(self.out)?;
        writeln!(self.out, "{:>LINE_WIDTH$}", self.header)?;
        writeln!(
            self.out,
            "{:>LINE_WIDTH$}",
            Local::now().format("%m.%d.%y %H:%M:%S").to_string()
        )?;
        self.print_warnings()?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{:<width$} {}",
            t!("report.column_test"),
            t!("report.column_state"),
            width = LINE_WIDTH - STATUS_WIDTH
        )?;
        self.full_line()
    }

    fn print_warnings(&mut self) -> io::Result<()> {
        if self.warnings.is_empty() {
            return Ok(());
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}", t!("report.warnings").yellow())?;
        writeln!(self.out)?;
        for (i, warning) in self.warnings.drain(..).enumerate() {
            writeln!(self.out, "{:4}. {}", i + 1, warning)?;
        }
        Ok(())
    }

    fn full_line(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "-".repeat(LINE_WIDTH))
    }
}

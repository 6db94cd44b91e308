//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command of the Itom CLI: it loads the
//! project model, connects the services, builds every selected suite, and
//! then executes the suites in category order while streaming the report.
//!
//! 此模块实现 Itom CLI 的 `run` 命令：加载项目模型、连接服务、构建所有选中的套件，
//! 然后按分类顺序执行套件并流式输出报告。

use anyhow::{Context, Result, bail};
use log::debug;
use std::io::Write;
use std::path::PathBuf;

use crate::{
    core::{ServiceRegistry, Suite, SuiteReport, document::SuiteDocument},
    infra::{
        config::{RunConfig, RunFilter},
        fs, t,
    },
    reporting::ConsoleReporter,
};

/// Arguments of the `run` command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub project_dir: PathBuf,
    pub config: PathBuf,
    pub category: Option<String>,
    pub suite: Option<String>,
    pub skip_first: usize,
    pub defines: Vec<(String, String)>,
}

/// A suite that was parsed and validated, waiting to run.
struct PlannedSuite {
    category: String,
    name: String,
    suite: Suite,
}

/// Executes the run command with the provided arguments.
///
/// # Returns
/// An error if the configuration or a suite is invalid, if a backend fails,
/// or if at least one test failed.
pub async fn execute(args: RunArgs) -> Result<()> {
    let filter = RunFilter {
        category: args.category,
        suite: args.suite,
        skip_first: args.skip_first,
    };
    let config = RunConfig::load(&args.project_dir, &args.config, &args.defines, filter)?;
    let registry = config.build_registry()?;

    let mut reporter = ConsoleReporter::stdout(config.description.clone());
    let suites = run_suites(&config, &registry, &mut reporter).await?;
    reporter.summary(&suites)?;

    let failed: usize = suites.iter().map(SuiteReport::failed).sum();
    if failed > 0 {
        bail!("{}", t!("run.tests_failed", count = failed));
    }
    Ok(())
}

/// Builds all selected suites, then executes them in order.
///
/// Every suite is parsed and checked against the registry before the first
/// test runs, so a malformed document never leaves a run half done.
///
/// 构建所有选中的套件，然后按顺序执行。在第一个测试运行之前，每个套件都会被解析并对照注册表进行检查，
/// 因此格式错误的文档不会导致运行只完成一半。
pub async fn run_suites<W: Write>(
    config: &RunConfig,
    registry: &ServiceRegistry,
    reporter: &mut ConsoleReporter<W>,
) -> Result<Vec<SuiteReport>> {
    let categories = fs::discover(&config.tests_dir)?;
    if categories.is_empty() {
        reporter.warning(t!("run.tests_dir_empty", path = config.tests_dir.display()));
        reporter.print_header()?;
        return Ok(Vec::new());
    }

    let filter = &config.filter;
    let mut planned: Vec<(String, bool, Vec<PlannedSuite>)> = Vec::new();
    for category in categories.iter().filter(|c| filter.enabled_category(&c.name)) {
        let mut suites = Vec::new();
        for suite_name in category.suites.iter().filter(|s| filter.enabled_suite(s)) {
            let path = category.path.join(suite_name);
            let document = SuiteDocument::load(&path)?;
            let suite = Suite::build(&document, filter.skip_first())
                .with_context(|| format!("Invalid suite {}", path.display()))?;
            suite
                .check_services(registry)
                .with_context(|| format!("Invalid suite {}", path.display()))?;
            debug!("planned {} with {} tests", path.display(), suite.tests.len());
            suites.push(PlannedSuite {
                category: category.name.clone(),
                name: suite_name.clone(),
                suite,
            });
        }
        planned.push((category.name.clone(), category.suites.is_empty(), suites));
    }

    let mut reports = Vec::new();
    for (category, empty, suites) in planned {
        reporter.category(&category, empty)?;
        for planned_suite in suites {
            reporter.suite(&planned_suite.name)?;
            let mut output = Ok(());
            let tests = planned_suite
                .suite
                .execute(registry, |report| {
                    if output.is_ok() {
                        output = reporter.test(report);
                    }
                })
                .await
                .with_context(|| {
                    t!(
                        "run.fatal_error",
                        category = planned_suite.category,
                        suite = planned_suite.name
                    )
                    .to_string()
                })?;
            output?;
            reports.push(SuiteReport {
                category: planned_suite.category,
                suite: planned_suite.name,
                tests,
            });
        }
    }
    Ok(reports)
}

//! # Block Types Module / 块类型模块
//!
//! The executable statements of a test: `Assign`, `Command` and `Expected`,
//! plus a no-op placeholder for element kinds the engine does not know.
//! Each block reads and updates the test's [`Context`].
//!
//! 测试的可执行语句：`Assign`、`Command` 和 `Expected`，
//! 以及用于未知元素类型的空操作占位符。每个块读取并更新测试的 [`Context`]。

use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

use crate::core::command::{self, CommandExecutor, CommandRequest};
use crate::core::content::{Content, Encoding};
use crate::core::context::Context;
use crate::core::document::ElementDef;
use crate::core::error::{DocumentError, EngineError};
use crate::core::services::ServiceRegistry;

/// Where an `assign` takes its value from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignSource {
    /// An interpolated literal.
    Const(String),
    /// A section of the current content.
    Section(String),
    /// The current local time under an interpolated strftime pattern.
    Date(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assign {
    pub var: String,
    pub source: AssignSource,
}

impl Assign {
    pub fn execute(&self, context: &mut Context) {
        let value = match &self.source {
            AssignSource::Const(literal) => context.apply_variables(literal),
            AssignSource::Section(path) => {
                let path = context.apply_variables(path);
                context
                    .current()
                    .map(|content| content.section(&path))
                    .unwrap_or_default()
                    .to_variable_string()
            }
            AssignSource::Date(pattern) => format_now(&context.apply_variables(pattern)),
        };
        debug!("assign ${} = {value:?}", self.var);
        context.set_variable(self.var.clone(), value);
    }
}

/// Formats the local time. Patterns chrono cannot parse are stored verbatim.
fn format_now(pattern: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        warn!("invalid date pattern '{pattern}', storing it unformatted");
        return pattern.to_string();
    }
    Local::now().format_with_items(items.into_iter()).to_string()
}

/// Calls a backend and makes its result the current content.
/// 调用后端，并将其结果设为当前内容。
#[derive(Clone)]
pub struct CommandBlock {
    pub command_type: String,
    pub service: String,
    pub path: String,
    pub body: String,
    executor: Arc<dyn CommandExecutor>,
}

impl fmt::Debug for CommandBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBlock")
            .field("command_type", &self.command_type)
            .field("service", &self.service)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CommandBlock {
    fn eq(&self, other: &Self) -> bool {
        self.command_type == other.command_type
            && self.service == other.service
            && self.path == other.path
            && self.body == other.body
    }
}

impl CommandBlock {
    pub fn new(command_type: &str, service: &str, path: &str, body: &str) -> Self {
        Self {
            command_type: command_type.to_string(),
            service: service.to_string(),
            path: path.to_string(),
            body: body.to_string(),
            executor: command::resolve(command_type),
        }
    }

    pub fn executor(&self) -> &dyn CommandExecutor {
        self.executor.as_ref()
    }

    /// Executes the command and always updates the current content, even when
    /// the executor fails, so a following `expected` has something to examine.
    /// Unknown command types fail the test; backend errors are returned.
    ///
    /// 执行命令并始终更新当前内容（即使执行器失败），以便后续的 `expected` 有内容可检查。
    /// 未知命令类型使测试失败；后端错误则直接返回。
    pub async fn execute(
        &self,
        context: &mut Context,
        services: &ServiceRegistry,
        warnings: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        let path = context.apply_variables(&self.path);
        let body = context.apply_variables(&self.body);
        let description = format!(
            "Type: {} Service: {} Path: {}",
            self.command_type, self.service, path
        );
        let request = CommandRequest {
            service: &self.service,
            path: &path,
            body: &body,
        };

        match self.executor.execute(request, services).await {
            Ok(outcome) => {
                warnings.extend(outcome.warnings);
                context.update(Content::new(description, outcome.encoding, outcome.raw));
                Ok(())
            }
            Err(error) if error.is_test_level() => {
                context.update(Content::new(description, Encoding::Raw, None));
                context.fail(Content::new(
                    error.to_string(),
                    Encoding::Raw,
                    Some("a command type starting with 'http' or 'sql'".to_string()),
                ));
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

/// Compares a section of the current content with an expected JSON-like value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expected {
    pub description: Option<String>,
    pub section: String,
    pub value: String,
}

impl Expected {
    pub fn execute(&self, context: &mut Context) {
        let section = context.apply_variables(&self.section);
        let body = context.apply_variables(&self.value);
        let description = match &self.description {
            Some(that) => context.apply_variables(that),
            None => format!("section {section}"),
        };

        let expected = Content::json(description, body);
        let actual = context
            .current()
            .map(|content| content.section(&section))
            .unwrap_or_default();

        if actual != *expected.value() {
            debug!("expected {} but got {}", expected.value(), actual);
            context.fail(expected);
        }
    }
}

/// One executable statement.
/// 一条可执行语句。
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Assign(Assign),
    Command(CommandBlock),
    Expected(Expected),
    /// An element of unknown kind; executing it does nothing.
    Noop(String),
}

impl Block {
    pub async fn execute(
        &self,
        context: &mut Context,
        services: &ServiceRegistry,
        warnings: &mut Vec<String>,
    ) -> Result<(), EngineError> {
        match self {
            Block::Assign(assign) => assign.execute(context),
            Block::Command(command) => command.execute(context, services, warnings).await?,
            Block::Expected(expected) => expected.execute(context),
            Block::Noop(kind) => debug!("skipping unrecognized element '{kind}'"),
        }
        Ok(())
    }
}

/// A parsed element: either a block or a reference to a macro.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Block(Block),
    MacroRef(String),
}

/// Turns one document element into a block or a macro reference.
/// 将一个文档元素转换为块或宏引用。
pub fn parse_element(def: &ElementDef) -> Result<Element, DocumentError> {
    let element = match def.kind.as_str() {
        "assign" => Element::Block(Block::Assign(parse_assign(def)?)),
        "command" => Element::Block(Block::Command(parse_command(def)?)),
        "expected" => Element::Block(Block::Expected(parse_expected(def))),
        "macro" => Element::MacroRef(required(def, "name", &def.name)?.to_string()),
        other => Element::Block(Block::Noop(other.to_string())),
    };
    Ok(element)
}

fn parse_assign(def: &ElementDef) -> Result<Assign, DocumentError> {
    let var = required(def, "var", &def.var)?.to_string();
    // An empty constant is a valid way to clear a variable.
    let source = if let Some(literal) = &def.constant {
        AssignSource::Const(literal.to_string())
    } else if let Some(path) = non_empty(&def.section) {
        AssignSource::Section(path.to_string())
    } else if let Some(pattern) = non_empty(&def.date) {
        AssignSource::Date(pattern.to_string())
    } else {
        return Err(DocumentError::MissingAttribute {
            element: def.kind.clone(),
            attribute: "const|section|date",
        });
    };
    Ok(Assign { var, source })
}

fn parse_command(def: &ElementDef) -> Result<CommandBlock, DocumentError> {
    let command_type = required(def, "type", &def.command_type)?;
    let service = def.service.as_deref().unwrap_or_default();
    let block = CommandBlock::new(
        command_type,
        service,
        def.path.as_deref().unwrap_or_default(),
        def.body.as_deref().unwrap_or_default(),
    );
    if block.executor().service_kind().is_some() && service.trim().is_empty() {
        return Err(DocumentError::MissingAttribute {
            element: def.kind.clone(),
            attribute: "service",
        });
    }
    Ok(block)
}

fn parse_expected(def: &ElementDef) -> Expected {
    let section = def.section.clone().unwrap_or_else(|| "/".to_string());
    match non_empty(&def.body) {
        Some(body) => Expected {
            description: def.that.clone(),
            section,
            value: body.to_string(),
        },
        None => Expected {
            description: None,
            section,
            value: def.that.clone().unwrap_or_default(),
        },
    }
}

fn required<'a>(
    def: &ElementDef,
    attribute: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, DocumentError> {
    non_empty(value).ok_or_else(|| DocumentError::MissingAttribute {
        element: def.kind.clone(),
        attribute,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

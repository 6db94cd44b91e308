//! # Macro Expansion Module / 宏展开模块
//!
//! Macros are named block lists that tests and other macros splice in by
//! reference. Every macro is flattened once: nested references are replaced
//! by the referenced blocks, so no reference survives expansion.
//!
//! Macros resolve by name regardless of where they appear in the document.
//! Undefined names and reference cycles are construction errors.
//!
//! 宏是具名的块列表，测试和其他宏可以通过引用将其拼接进来。
//! 每个宏只展开一次：嵌套引用被替换为被引用的块，展开后不会残留任何引用。
//! 宏按名称解析，与其在文档中的位置无关；未定义的名称和循环引用属于构建错误。

use indexmap::IndexMap;
use log::debug;

use crate::core::blocks::{self, Block, Element};
use crate::core::document::{ElementDef, MacroDef};
use crate::core::error::DocumentError;

/// A fully flattened macro.
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: String,
    pub blocks: Vec<Block>,
}

/// Resolves macro definitions and flattens element lists that reference them.
/// 解析宏定义，并展开引用宏的元素列表。
#[derive(Debug)]
pub struct MacroExpander<'a> {
    definitions: IndexMap<&'a str, &'a MacroDef>,
    resolved: IndexMap<String, Macro>,
    in_progress: Vec<String>,
}

impl<'a> MacroExpander<'a> {
    pub fn new(definitions: &'a [MacroDef]) -> Result<Self, DocumentError> {
        let mut by_name = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            if by_name.insert(definition.name.as_str(), definition).is_some() {
                return Err(DocumentError::DuplicateMacro {
                    name: definition.name.clone(),
                });
            }
        }
        Ok(Self {
            definitions: by_name,
            resolved: IndexMap::new(),
            in_progress: Vec::new(),
        })
    }

    /// Flattens every definition, in document order.
    pub fn expand_all(&mut self) -> Result<(), DocumentError> {
        let names: Vec<&'a str> = self.definitions.keys().copied().collect();
        for name in names {
            self.resolve(name, name)?;
        }
        Ok(())
    }

    /// Parses `elements` in order, splicing in the blocks of referenced macros.
    /// `owner` names the test or macro the elements belong to, for errors.
    ///
    /// 按顺序解析 `elements`，并拼接被引用宏的块。`owner` 用于错误信息中标识所属的测试或宏。
    pub fn flatten(
        &mut self,
        elements: &[ElementDef],
        owner: &str,
    ) -> Result<Vec<Block>, DocumentError> {
        let mut flat = Vec::with_capacity(elements.len());
        for element in elements {
            match blocks::parse_element(element)? {
                Element::Block(block) => flat.push(block),
                Element::MacroRef(name) => flat.extend(self.resolve(&name, owner)?),
            }
        }
        Ok(flat)
    }

    fn resolve(&mut self, name: &str, referenced_from: &str) -> Result<Vec<Block>, DocumentError> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(done.blocks.clone());
        }
        if let Some(start) = self.in_progress.iter().position(|n| n == name) {
            let mut chain = self.in_progress[start..].to_vec();
            chain.push(name.to_string());
            return Err(DocumentError::MacroCycle {
                name: name.to_string(),
                chain: chain.join(" -> "),
            });
        }
        let definition = *self
            .definitions
            .get(name)
            .ok_or_else(|| DocumentError::UndefinedMacro {
                name: name.to_string(),
                referenced_from: referenced_from.to_string(),
            })?;

        self.in_progress.push(name.to_string());
        let flattened = self.flatten(&definition.blocks, name);
        self.in_progress.pop();
        let blocks = flattened?;

        debug!("macro '{name}' expands to {} blocks", blocks.len());
        self.resolved.insert(
            name.to_string(),
            Macro {
                name: name.to_string(),
                blocks: blocks.clone(),
            },
        );
        Ok(blocks)
    }

    /// The flattened macros, in the order they were resolved.
    pub fn into_macros(self) -> IndexMap<String, Macro> {
        self.resolved
    }
}

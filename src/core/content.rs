//! # Content Module / 内容模块
//!
//! `Content` wraps one observed payload (a command result or an expected value)
//! together with a description and its canonical decoded form.
//!
//! `Content` 封装一个观察到的负载（命令结果或期望值），
//! 以及描述信息和其规范解码形式。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::value::{self, CanonicalValue};

/// How a raw payload is interpreted.
/// 原始负载的解释方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Decoded with the JSON-like policy of [`value::decode`].
    Json,
    /// Kept as a plain string.
    #[default]
    Raw,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Json => write!(f, "json"),
            Encoding::Raw => write!(f, "raw"),
        }
    }
}

/// An immutable payload with its decoded value, computed once on construction.
/// 不可变的负载及其解码值，在构造时计算一次。
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    description: String,
    encoding: Encoding,
    raw: Option<String>,
    decoded: CanonicalValue,
}

impl Content {
    pub fn new(description: impl Into<String>, encoding: Encoding, raw: Option<String>) -> Self {
        let decoded = match encoding {
            Encoding::Json => value::decode(raw.as_deref()),
            Encoding::Raw => raw
                .as_ref()
                .map(|r| CanonicalValue::String(r.clone()))
                .unwrap_or_default(),
        };
        Self {
            description: description.into(),
            encoding,
            raw,
            decoded,
        }
    }

    /// Shorthand for a JSON-encoded payload.
    pub fn json(description: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::new(description, Encoding::Json, Some(raw.into()))
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn value(&self) -> &CanonicalValue {
        &self.decoded
    }

    /// See [`CanonicalValue::section`].
    pub fn section(&self, path: &str) -> CanonicalValue {
        self.decoded.section(path)
    }

    pub fn pretty(&self) -> String {
        self.decoded.pretty()
    }
}

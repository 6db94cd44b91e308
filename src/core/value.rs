//! # Canonical Value Module / 规范值模块
//!
//! This module defines the typed representation every response payload and
//! every expected value is decoded into, together with the total decoding
//! policy and `/`-delimited section addressing.
//!
//! 此模块定义了所有响应负载和期望值解码后的类型化表示，
//! 以及完整的解码策略和以 `/` 分隔的片段寻址。

use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use std::fmt;

/// The decoded form of a payload.
/// 负载的解码形式。
#[derive(Debug, Clone, Default)]
pub enum CanonicalValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<CanonicalValue>),
    Map(IndexMap<String, CanonicalValue>),
}

/// One step of a section path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A purely numeric segment. Keeps its text so it can also address map keys like `"1"`.
    Index(i64, String),
    Key(String),
}

impl PathSegment {
    fn parse(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(index) => PathSegment::Index(index, token.to_string()),
            Err(_) => PathSegment::Key(token.to_string()),
        }
    }
}

/// Splits a section path on `/`, dropping blank segments.
/// 按 `/` 拆分片段路径，并丢弃空白片段。
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    path.split('/')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(PathSegment::parse)
        .collect()
}

/// Decodes a raw payload under the JSON-like policy.
///
/// The order of the checks matters and decoding never fails:
/// 1. no payload, or a blank one (e.g. a `204 No Content` body) → `Null`
/// 2. `[]` → empty sequence
/// 3. `null` (any case) → `Null`
/// 4. a structured document that parses to something other than `null`
/// 5. scalar fallback: `true`/`false` (any case), integer, finite float, string
///
/// 按照类 JSON 策略解码原始负载。检查顺序很重要，且解码永远不会失败。
pub fn decode(raw: Option<&str>) -> CanonicalValue {
    let Some(raw) = raw else {
        return CanonicalValue::Null;
    };

    let data = raw.trim();
    if data.is_empty() {
        return CanonicalValue::Null;
    }
    if data == "[]" {
        return CanonicalValue::Sequence(Vec::new());
    }

    let lowered = data.to_lowercase();
    if lowered == "null" {
        return CanonicalValue::Null;
    }

    if let Ok(parsed) = serde_json::from_str::<JsonValue>(data) {
        if !parsed.is_null() {
            return CanonicalValue::from(parsed);
        }
    }

    match lowered.as_str() {
        "false" => return CanonicalValue::Bool(false),
        "true" => return CanonicalValue::Bool(true),
        _ => {}
    }
    if let Ok(integer) = data.parse::<i64>() {
        return CanonicalValue::Integer(integer);
    }
    if let Ok(float) = data.parse::<f64>() {
        // "inf" and "NaN" parse as floats but are words in a response body.
        if float.is_finite() {
            return CanonicalValue::Float(float);
        }
    }
    CanonicalValue::String(data.to_string())
}

impl CanonicalValue {
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            CanonicalValue::Bool(_)
                | CanonicalValue::Integer(_)
                | CanonicalValue::Float(_)
                | CanonicalValue::String(_)
        )
    }

    /// `null` and empty containers count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            CanonicalValue::Null => true,
            CanonicalValue::Sequence(items) => items.is_empty(),
            CanonicalValue::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Extracts the value at `path`.
    ///
    /// An empty path or `/` yields the whole value. Paths into scalars, into
    /// empty values, or through missing keys yield `Null`; lookups never fail.
    ///
    /// 提取 `path` 处的值。空路径或 `/` 返回整个值；
    /// 进入标量、空值或缺失键的路径返回 `Null`，查找永远不会失败。
    pub fn section(&self, path: &str) -> CanonicalValue {
        let path = path.trim();
        if path.is_empty() || path == "/" {
            return self.clone();
        }
        if self.is_empty() || self.is_scalar() {
            return CanonicalValue::Null;
        }

        parse_path(path)
            .iter()
            .try_fold(self, |current, segment| current.child(segment))
            .cloned()
            .unwrap_or(CanonicalValue::Null)
    }

    fn child(&self, segment: &PathSegment) -> Option<&CanonicalValue> {
        match (self, segment) {
            (CanonicalValue::Sequence(items), PathSegment::Index(index, _)) => {
                usize::try_from(*index).ok().and_then(|i| items.get(i))
            }
            (CanonicalValue::Map(entries), PathSegment::Index(_, key))
            | (CanonicalValue::Map(entries), PathSegment::Key(key)) => entries.get(key),
            _ => None,
        }
    }

    /// The string form stored in a variable mapping.
    /// 存入变量映射时使用的字符串形式。
    pub fn to_variable_string(&self) -> String {
        match self {
            CanonicalValue::Null => String::new(),
            CanonicalValue::String(s) => s.clone(),
            CanonicalValue::Sequence(_) | CanonicalValue::Map(_) => self.to_json().to_string(),
            other => other.to_string(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            CanonicalValue::Null => JsonValue::Null,
            CanonicalValue::Bool(b) => JsonValue::Bool(*b),
            CanonicalValue::Integer(i) => JsonValue::Number(Number::from(*i)),
            CanonicalValue::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CanonicalValue::String(s) => JsonValue::String(s.clone()),
            CanonicalValue::Sequence(items) => {
                JsonValue::Array(items.iter().map(CanonicalValue::to_json).collect())
            }
            CanonicalValue::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Human-readable rendering used in failure reports: scalars verbatim,
    /// containers as indented JSON.
    ///
    /// 失败报告中使用的可读渲染：标量原样输出，容器输出为缩进的 JSON。
    pub fn pretty(&self) -> String {
        match self {
            CanonicalValue::Sequence(_) | CanonicalValue::Map(_) => {
                serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| self.to_string())
            }
            other => other.to_string(),
        }
    }
}

impl From<JsonValue> for CanonicalValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => CanonicalValue::Null,
            JsonValue::Bool(b) => CanonicalValue::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => CanonicalValue::Integer(i),
                None => CanonicalValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => CanonicalValue::String(s),
            JsonValue::Array(items) => {
                CanonicalValue::Sequence(items.into_iter().map(CanonicalValue::from).collect())
            }
            JsonValue::Object(entries) => CanonicalValue::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, CanonicalValue::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Structural equality for assertions.
///
/// Integers and floats compare numerically; maps compare key-wise without
/// regard to key order; every other pairing requires the same variant.
///
/// 断言使用的结构相等：整数与浮点数按数值比较；映射按键比较且不考虑键顺序；
/// 其他组合要求变体相同。
impl PartialEq for CanonicalValue {
    fn eq(&self, other: &Self) -> bool {
        use CanonicalValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => (*a as f64) == *b,
            (String(a), String(b)) => a == b,
            (Sequence(a), Sequence(b)) => a == b,
            (Map(a), Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| b.get(key).is_some_and(|v| v == value))
            }
            _ => false,
        }
    }
}

impl fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalValue::Null => write!(f, "null"),
            CanonicalValue::Bool(b) => write!(f, "{b}"),
            CanonicalValue::Integer(i) => write!(f, "{i}"),
            CanonicalValue::Float(x) => write!(f, "{x}"),
            CanonicalValue::String(s) => write!(f, "{s}"),
            CanonicalValue::Sequence(_) | CanonicalValue::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

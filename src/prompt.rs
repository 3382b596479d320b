//! Parse annotation text into prompt, negative prompt and parameters.
//!
//! The annotation convention, as written by the generator:
//!
//! ```text
//! parameters                                 ← optional keyword line
//! a lighthouse on a cliff, stormy sea        ← positive prompt (may span lines)
//! Negative prompt: blurry, lowres            ← negative prompt (may span lines)
//! Steps: 30, Sampler: Euler a, CFG scale: 7  ← parameter lines, `key: value`
//! Lora hashes: {"detail": "abc123"}
//! ```
//!
//! Labels are matched case-insensitively. Every part is optional: a
//! missing negative prompt leaves it empty, a missing `Steps:` line leaves
//! the parameters empty. Parsing never fails; lines that don't look like
//! `key: value` are dropped, and values that look like JSON but don't
//! decode are kept as plain text.
//!
//! Going the other way, [`ParsedPrompt::to_annotation`] rebuilds the flat
//! text from (possibly edited) fields, with parameters as `key: value`
//! lines: `Steps` first, the rest sorted by key.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Producing tool. Fixed until other conventions are recognized.
pub const TOOL: &str = "AUTOMATIC1111";

static KEYWORD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:parameters)[\s\x00]*").expect("valid regex"));
static NEGATIVE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n?negative prompt:").expect("valid regex"));
static STEPS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\n?steps:").expect("valid regex"));
static PROMPT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:prompt:)").expect("valid regex"));
static PARAM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_ ]+):\s*(.+)$").expect("valid regex"));
static PARAM_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_ ]+$").expect("valid regex"));

/// A parameter edit that would not survive being written and read back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("parameter key '{0}' may only contain letters, digits, '_' and spaces")]
    BadKey(String),
    #[error("'{0}' is the negative prompt label, not a parameter")]
    ReservedKey(String),
    #[error("parameter '{0}' has an empty value")]
    EmptyValue(String),
    #[error("parameter '{0}' must fit on one line")]
    MultiLineValue(String),
}

/// Check that `key: value` would parse back as the same parameter.
///
/// Both sides are trimmed first, as [`ParsedPrompt::set_param`] does.
pub fn check_param(key: &str, value: &str) -> Result<(), ParamError> {
    let key = key.trim();
    let value = value.trim();
    if !PARAM_KEY.is_match(key) {
        return Err(ParamError::BadKey(key.to_string()));
    }
    if key.eq_ignore_ascii_case("negative prompt") {
        return Err(ParamError::ReservedKey(key.to_string()));
    }
    if value.is_empty() {
        return Err(ParamError::EmptyValue(key.to_string()));
    }
    if value.contains(['\n', '\r']) {
        return Err(ParamError::MultiLineValue(key.to_string()));
    }
    Ok(())
}

/// A parameter value: plain text, or JSON when the text decoded as such.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Json(serde_json::Value),
}

impl ParamValue {
    /// Values starting with `[` or `{` are tried as JSON first.
    pub fn from_raw(raw: &str) -> Self {
        if raw.starts_with('[') || raw.starts_with('{') {
            if let Ok(value) = serde_json::from_str(raw) {
                return Self::Json(value);
            }
        }
        Self::Text(raw.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Json(_) => None,
        }
    }
}

/// Text as-is; JSON re-serialized compactly so it parses back the same.
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Structured annotation, the editable state for one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedPrompt {
    pub prompt: String,
    pub negative: String,
    /// Keys are unique and kept sorted, which is also the display order.
    pub params: BTreeMap<String, ParamValue>,
    pub tool: &'static str,
    /// Reserved for a model-variant marker; never detected yet.
    pub sdxl: bool,
}

impl Default for ParsedPrompt {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative: String::new(),
            params: BTreeMap::new(),
            tool: TOOL,
            sdxl: false,
        }
    }
}

impl ParsedPrompt {
    /// Parse annotation text. `None` (nothing found) gives empty fields.
    pub fn from_raw(raw: Option<&str>) -> Self {
        raw.map(parse).unwrap_or_default()
    }

    /// Parameters as `key: value` lines, sorted by key.
    pub fn param_lines(&self) -> Vec<String> {
        self.params
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect()
    }

    pub fn param_text(&self) -> String {
        self.param_lines().join("\n")
    }

    /// Set a parameter from its textual form (JSON-looking text is decoded).
    ///
    /// Rejects anything [`parse`] could not read back from the annotation.
    pub fn set_param(&mut self, key: &str, raw_value: &str) -> Result<(), ParamError> {
        check_param(key, raw_value)?;
        self.params
            .insert(key.trim().to_string(), ParamValue::from_raw(raw_value.trim()));
        Ok(())
    }

    pub fn remove_param(&mut self, key: &str) -> Option<ParamValue> {
        self.params.remove(key.trim())
    }

    /// Replace all parameters with the ones in edited `key: value` text.
    pub fn replace_params_from_text(&mut self, text: &str) {
        self.params = parse_param_lines(text);
    }

    /// Flatten back into annotation text.
    ///
    /// The `Steps` line goes first: the parser starts the parameter block
    /// there, so a key sorting before it would otherwise be read back as
    /// part of the negative prompt.
    pub fn to_annotation(&self) -> String {
        let (steps, rest): (Vec<_>, Vec<_>) = self
            .params
            .iter()
            .partition(|(key, _)| key.eq_ignore_ascii_case("steps"));
        let lines: Vec<String> = steps
            .into_iter()
            .chain(rest)
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        compose(&self.prompt, &self.negative, &lines.join("\n"))
    }

    pub fn is_empty(&self) -> bool {
        self.prompt.is_empty() && self.negative.is_empty() && self.params.is_empty()
    }
}

/// Split annotation text into its parts.
pub fn parse(raw: &str) -> ParsedPrompt {
    let raw = KEYWORD_LINE.replace(raw, "");
    let raw: &str = &raw;

    let neg_idx = NEGATIVE_LABEL.find(raw).map(|m| m.start());
    let steps_idx = STEPS_LABEL.find(raw).map(|m| m.start());

    let positive = match neg_idx {
        Some(n) => &raw[..n],
        None => raw,
    };
    let prompt = PROMPT_LABEL.replace(positive, "").trim().to_string();

    let negative = match (neg_idx, steps_idx) {
        (Some(n), Some(s)) if s > n => strip_negative_label(&raw[n..s]),
        (Some(n), _) => strip_negative_label(&raw[n..]),
        (None, _) => String::new(),
    };

    let settings = steps_idx.map_or("", |s| raw[s..].trim());

    ParsedPrompt {
        prompt,
        negative,
        params: parse_param_lines(settings),
        ..ParsedPrompt::default()
    }
}

fn strip_negative_label(section: &str) -> String {
    NEGATIVE_LABEL.replace(section, "").trim().to_string()
}

/// Collect `key: value` lines. Anything else is skipped; later keys win.
pub fn parse_param_lines(text: &str) -> BTreeMap<String, ParamValue> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter_map(|line| PARAM_LINE.captures(line))
        .map(|caps| (caps[1].to_string(), ParamValue::from_raw(&caps[2])))
        .collect()
}

/// Assemble annotation text from edited fields.
///
/// The negative prompt and parameter block are only emitted when non-empty.
pub fn compose(prompt: &str, negative: &str, param_text: &str) -> String {
    let mut out = prompt.to_string();
    if !negative.is_empty() {
        out.push_str("\nNegative prompt: ");
        out.push_str(negative);
    }
    if !param_text.is_empty() {
        out.push('\n');
        out.push_str(param_text);
    }
    out
}

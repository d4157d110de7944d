//! Token interpolation for filtered resources.
//!
//! Tokens are written between delimiters: `@key@` with the default delimiter,
//! `${key}` with the `${*}` form. Known keys are replaced by their property
//! value, unknown keys are left untouched. A token preceded by the escape
//! string is emitted literally without the escape.

use crate::error::{ItfError, Result, ResultExt};
use crate::project::ProjectModel;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Delimiter used when none is configured.
pub const DEFAULT_DELIMITER: &str = "@";

const KEY_PATTERN: &str = r"[A-Za-z0-9_.\-]+";

/// Begin and end marker of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    pub begin: String,
    pub end: String,
}

impl Delimiter {
    /// Parse `@` (same marker on both sides) or `begin*end` such as `${*}`.
    ///
    /// # Errors
    ///
    /// Returns [`ItfError::Config`] for an empty delimiter or an empty side.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ItfError::Config("delimiter must not be empty".to_string()));
        }
        match spec.split_once('*') {
            Some((begin, end)) if !begin.is_empty() && !end.is_empty() => Ok(Self {
                begin: begin.to_string(),
                end: end.to_string(),
            }),
            Some(_) => Err(ItfError::Config(format!(
                "delimiter '{spec}' needs text on both sides of '*'"
            ))),
            None => Ok(Self {
                begin: spec.to_string(),
                end: spec.to_string(),
            }),
        }
    }
}

/// Replaces delimited tokens with property values.
#[derive(Debug, Clone)]
pub struct Interpolator {
    pattern: Regex,
    delimiters: usize,
    properties: BTreeMap<String, String>,
}

impl Interpolator {
    /// # Errors
    ///
    /// Returns [`ItfError::Config`] when no delimiter is given or the token
    /// pattern cannot be compiled.
    pub fn new(
        delimiters: &[Delimiter],
        escape_string: Option<&str>,
        properties: BTreeMap<String, String>,
    ) -> Result<Self> {
        if delimiters.is_empty() {
            return Err(ItfError::Config("at least one delimiter is required".to_string()));
        }

        let escape = escape_string
            .filter(|e| !e.is_empty())
            .map(|e| format!("(?P<esc{{i}}>{})?", regex::escape(e)));
        let alternatives: Vec<String> = delimiters
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let esc = escape
                    .as_deref()
                    .map(|e| e.replace("{i}", &i.to_string()))
                    .unwrap_or_default();
                format!(
                    "{esc}{}(?P<key{i}>{KEY_PATTERN}){}",
                    regex::escape(&d.begin),
                    regex::escape(&d.end)
                )
            })
            .collect();

        let pattern = Regex::new(&alternatives.join("|"))
            .map_err(|err| ItfError::Config(format!("invalid delimiter pattern: {err}")))?;
        Ok(Self {
            pattern,
            delimiters: delimiters.len(),
            properties,
        })
    }

    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Interpolate every token of `text`.
    #[must_use]
    pub fn interpolate(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, |caps: &Captures<'_>| self.replacement(caps))
            .into_owned()
    }

    fn replacement(&self, caps: &Captures<'_>) -> String {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        for i in 0..self.delimiters {
            let Some(key) = caps.name(&format!("key{i}")) else {
                continue;
            };
            if let Some(esc) = caps.name(&format!("esc{i}")) {
                return whole[esc.len()..].to_string();
            }
            return self
                .properties
                .get(key.as_str())
                .cloned()
                .unwrap_or_else(|| whole.to_string());
        }
        whole.to_string()
    }
}

/// Built-in properties derived from the project descriptor.
#[must_use]
pub fn project_properties(model: &ProjectModel) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    if let Some(group_id) = model.effective_group_id() {
        props.insert("project.groupId".to_string(), group_id.to_string());
    }
    if let Some(artifact_id) = &model.artifact_id {
        props.insert("project.artifactId".to_string(), artifact_id.clone());
    }
    if let Some(version) = model.effective_version() {
        props.insert("project.version".to_string(), version.to_string());
    }
    if let Some(name) = &model.name {
        props.insert("project.name".to_string(), name.clone());
    }
    for (key, value) in &model.properties {
        props.insert(key.clone(), value.clone());
    }
    props
}

/// Read a `key=value` (or `key: value`) properties file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_properties_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path).with_path("read filter file", path)?;
    Ok(parse_properties(&contents))
}

/// Parse properties text; `#` and `!` start comment lines.
#[must_use]
pub fn parse_properties(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(['=', ':'])?;
            let key = line[..split].trim();
            (!key.is_empty()).then(|| (key.to_string(), line[split + 1..].trim().to_string()))
        })
        .collect()
}

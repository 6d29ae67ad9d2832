//! Value templates for INI patches.
//!
//! `$name` is replaced by the substitution of that name, `\X` emits `X`
//! literally, and every other character is copied as is.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::error::{Error, Result};

/// Named values available to templates during one patch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: BTreeMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Display) {
        self.values.insert(name.into(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Expand `template` against `substitutions`.
pub fn expand(template: &str, substitutions: &Substitutions) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        match c {
            '\\' => {
                let mut chars = rest[1..].chars();
                match chars.next() {
                    Some(escaped) => {
                        out.push(escaped);
                        rest = chars.as_str();
                    }
                    None => {
                        out.push('\\');
                        rest = "";
                    }
                }
            }
            '$' => {
                let name_len = rest[1..]
                    .find(|c: char| !is_word_char(c))
                    .unwrap_or(rest.len() - 1);
                if name_len == 0 {
                    out.push('$');
                    rest = &rest[1..];
                    continue;
                }
                let name = &rest[1..1 + name_len];
                let value = substitutions
                    .get(name)
                    .ok_or_else(|| Error::MissingSubstitution {
                        name: name.to_string(),
                        template: template.to_string(),
                    })?;
                out.push_str(value);
                rest = &rest[1 + name_len..];
            }
            _ => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
    Ok(out)
}

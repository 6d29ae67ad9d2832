//! Verify-then-rewrite patching of INI style script files.
//!
//! Every rule names a `[section]`, a `key`, the value the key must currently
//! have, and a template for its new value. A patch run streams the file once,
//! rewriting matching lines and copying everything else, then checks that
//! every rule was hit.

mod lines;
mod template;

pub use template::{Substitutions, expand};

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, Cursor, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use lines::{Lines, sniff_line_ending};

/// How far ahead, in characters, to look for the file's line terminator.
pub const LINE_ENDING_READ_AHEAD: usize = 512;

/// Longest UTF-8 encoding of one character.
const MAX_CHAR_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IniRule {
    pub section: String,
    pub key: String,
    pub expected: String,
    pub template: String,
}

impl IniRule {
    /// New line for a key currently holding `actual`.
    ///
    /// Returns `None` when the key already holds the expanded template, which
    /// leaves the rule unapplied for this run.
    fn rewrite(&self, actual: &str, substitutions: &Substitutions) -> Result<Option<String>> {
        if actual == self.expected {
            let value = expand(&self.template, substitutions)?;
            return Ok(Some(format!("{}={}", self.key, value)));
        }
        match expand(&self.template, substitutions) {
            Ok(value) if actual == value => Ok(None),
            _ => Err(Error::ValueMismatch {
                section: self.section.clone(),
                key: self.key.clone(),
                expected: self.expected.clone(),
                actual: actual.to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.section, self.key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IniPatcher {
    sections: BTreeMap<String, BTreeMap<String, IniRule>>,
}

impl IniPatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        expected: impl Into<String>,
        template: impl Into<String>,
    ) -> Result<()> {
        let rule = IniRule {
            section: section.into(),
            key: key.into(),
            expected: expected.into(),
            template: template.into(),
        };
        let keys = self.sections.entry(rule.section.clone()).or_default();
        if keys.contains_key(&rule.key) {
            return Err(Error::DuplicateRule {
                section: rule.section,
                key: rule.key,
            });
        }
        keys.insert(rule.key.clone(), rule);
        Ok(())
    }

    pub fn rules(&self) -> impl Iterator<Item = &IniRule> {
        self.sections.values().flat_map(BTreeMap::values)
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy `input` to `output`, rewriting every line a rule applies to.
    ///
    /// All output lines are terminated with the first terminator found in the
    /// input, including the last line.
    pub fn patch<R: Read, W: Write>(
        &self,
        mut input: R,
        mut output: W,
        substitutions: &Substitutions,
    ) -> Result<()> {
        let head_limit = LINE_ENDING_READ_AHEAD * MAX_CHAR_WIDTH;
        let mut head = Vec::with_capacity(head_limit);
        (&mut input)
            .take(head_limit as u64)
            .read_to_end(&mut head)?;
        let window = char_prefix(&head, LINE_ENDING_READ_AHEAD);
        let line_ending =
            sniff_line_ending(window).ok_or(Error::UnknownLineEnding(LINE_ENDING_READ_AHEAD))?;

        let mut lines = Lines::new(BufReader::new(Cursor::new(head).chain(input)));
        let mut applied = BTreeSet::new();
        let mut keys: Option<&BTreeMap<String, IniRule>> = None;

        while let Some(line) = lines.next_line()? {
            let mut rewritten = None;
            if let Some(name) = parse_section(&line) {
                keys = self.sections.get(name);
            } else if let Some((rules, (key, value))) = keys.zip(parse_key_value(&line)) {
                if let Some(rule) = rules.get(key) {
                    match rule.rewrite(value, substitutions)? {
                        Some(new_line) => {
                            debug!("[{}] {} -> {}", rule.section, line, new_line);
                            applied.insert((rule.section.as_str(), rule.key.as_str()));
                            rewritten = Some(new_line);
                        }
                        None => debug!("[{}] {} is already patched", rule.section, line),
                    }
                }
            }

            output.write_all(rewritten.as_deref().unwrap_or(&line).as_bytes())?;
            output.write_all(line_ending.as_bytes())?;
        }
        output.flush()?;

        let missing: Vec<String> = self
            .rules()
            .filter(|rule| !applied.contains(&(rule.section.as_str(), rule.key.as_str())))
            .map(IniRule::describe)
            .collect();
        if !missing.is_empty() {
            return Err(Error::UnappliedPatches(missing));
        }
        Ok(())
    }

    /// [`patch`](Self::patch) over in-memory text.
    pub fn patch_str(&self, input: &str, substitutions: &Substitutions) -> Result<String> {
        let mut output = Vec::with_capacity(input.len());
        self.patch(input.as_bytes(), &mut output, substitutions)?;
        String::from_utf8(output).map_err(|e| Error::EncodingError(e.to_string()))
    }
}

/// The bytes of the first `chars` characters of UTF-8 `bytes`.
fn char_prefix(bytes: &[u8], chars: usize) -> &[u8] {
    let end = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b & 0xc0 != 0x80)
        .nth(chars)
        .map_or(bytes.len(), |(i, _)| i);
    &bytes[..end]
}

/// `[name]` with a non-empty name free of `]`.
fn parse_section(line: &str) -> Option<&str> {
    let name = line.strip_prefix('[')?.strip_suffix(']')?;
    if name.is_empty() || name.contains(']') {
        return None;
    }
    Some(name)
}

/// `key=value` where key is one or more word characters.
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some((key, value))
}

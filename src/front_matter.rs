//! Markdown front matter module
//!
//! A document is front matter between a leading `---` line and the next
//! `---` line, followed by the body. Front matter is kept line by line so that
//! comments, blank lines and untouched entries render back exactly as read.
//! Only `key: value` lines are interpreted.

use crate::record::{Record, RecordAccessor};
use crate::signature::SIGNATURE_KEYS;

const OPENING: &str = "---\n";
const CLOSING: &str = "\n---\n";

/// One line of front matter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterLine {
    /// `key: value` line
    Entry {
        key: String,
        value: String,
        raw: String,
    },
    /// Comment, blank line, or anything without a colon
    Other(String),
}

impl FrontMatterLine {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return FrontMatterLine::Other(line.to_string());
        }
        match trimmed.split_once(':') {
            Some((key, value)) => FrontMatterLine::Entry {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
                raw: line.to_string(),
            },
            None => FrontMatterLine::Other(line.to_string()),
        }
    }

    fn raw(&self) -> &str {
        match self {
            FrontMatterLine::Entry { raw, .. } => raw,
            FrontMatterLine::Other(raw) => raw,
        }
    }
}

/// Parsed front matter block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    lines: Vec<FrontMatterLine>,
}

impl FrontMatter {
    /// Parse the text between the delimiters
    pub fn parse(text: &str) -> Self {
        let lines = if text.is_empty() {
            Vec::new()
        } else {
            text.split('\n').map(FrontMatterLine::parse).collect()
        };
        Self { lines }
    }

    /// Value of the last entry with exactly this key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries()
            .filter(|(k, _)| *k == key)
            .last()
            .map(|(_, v)| v)
    }

    /// Update the last entry with this key, or append a new one
    ///
    /// An entry that already holds `value` keeps its original formatting.
    pub fn set(&mut self, key: &str, value: &str) {
        let position = self.lines.iter().rposition(|line| {
            matches!(line, FrontMatterLine::Entry { key: k, .. } if k == key)
        });
        if let Some(i) = position {
            if let FrontMatterLine::Entry { value: current, .. } = &self.lines[i] {
                if current == value {
                    return;
                }
            }
        }

        let updated = FrontMatterLine::Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: format!("{}: {}", key, value),
        };
        match position {
            Some(i) => self.lines[i] = updated,
            None => self.lines.push(updated),
        }
    }

    /// Entries as `(key, value)` pairs in order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            FrontMatterLine::Entry { key, value, .. } => Some((key.as_str(), value.as_str())),
            FrontMatterLine::Other(_) => None,
        })
    }

    pub fn lines(&self) -> &[FrontMatterLine] {
        &self.lines
    }

    /// Whether there is at least one `key: value` entry
    pub fn has_entries(&self) -> bool {
        self.entries().next().is_some()
    }

    /// Entries as a [`Record`]; a repeated key keeps its last value
    pub fn to_record(&self) -> Record {
        Record::from_pairs(self.entries())
    }

    /// Copy the signature fields of `record` into this front matter
    ///
    /// Keys are matched by exact name: existing entries are updated in place,
    /// missing ones are appended.
    pub fn apply_signature(&mut self, record: &Record) {
        for key in SIGNATURE_KEYS {
            if let Some(value) = record.get(key) {
                self.set(key, value);
            }
        }
    }

    /// Rename every entry with key `from` to `to`, keeping the rest of each line
    ///
    /// Returns `false` when `from` is missing or `to` already exists.
    pub fn rename_key(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.get(to).is_some() || self.get(from).is_none() {
            return false;
        }
        for line in &mut self.lines {
            if let FrontMatterLine::Entry { key, raw, .. } = line {
                if key == from {
                    *raw = raw.replacen(from, to, 1);
                    *key = to.to_string();
                }
            }
        }
        true
    }

    /// Render the lines back to text (without delimiters)
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(FrontMatterLine::raw)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RecordAccessor for FrontMatter {
    fn get_exact(&self, key: &str) -> Option<&str> {
        self.get(key)
    }

    fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (key, _) in self.entries() {
            if !names.contains(&key) {
                names.push(key);
            }
        }
        names
    }
}

/// Markdown document split into front matter and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownDocument {
    pub front_matter: FrontMatter,
    pub body: String,
}

impl MarkdownDocument {
    /// Split a document; `None` when it has no front matter block
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with(OPENING) {
            return None;
        }
        // an empty block closes right after the opening line
        let close = text[OPENING.len() - 1..].find(CLOSING)? + OPENING.len() - 1;
        let front = if close < OPENING.len() {
            ""
        } else {
            &text[OPENING.len()..close]
        };
        let body = &text[close + CLOSING.len()..];

        Some(Self {
            front_matter: FrontMatter::parse(front),
            body: body.to_string(),
        })
    }

    /// Reassemble the document
    pub fn render(&self) -> String {
        format!(
            "{}{}{}{}",
            OPENING,
            self.front_matter.render(),
            CLOSING,
            self.body
        )
    }
}

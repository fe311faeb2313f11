use serde::{Deserialize, Serialize};

/// Label used when a response could not be turned into a cause list at all.
pub const UNPARSED_SOURCE: &str = "UNPARSED_RESPONSE";

/// One case in a bench: its serial as printed and its case number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub serial: String,
    pub case_number: String,
}

impl Entry {
    pub fn new(serial: impl Into<String>, case_number: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            case_number: case_number.into(),
        }
    }
}

/// A bench or court sitting and the cases listed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Bench/court number exactly as extracted
    pub number: Option<String>,
    pub name: String,
    pub entries: Vec<Entry>,
}

impl Group {
    pub fn new(number: Option<String>, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Append `entry` unless an identical (serial, case number) pair is already present.
    /// Returns whether the entry was added.
    pub fn push_unique(&mut self, entry: Entry) -> bool {
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Court or list name
    pub source: String,
    /// Listing date, format kept as extracted
    pub date: String,
    pub groups: Vec<Group>,
    /// Set when the result is a parse-failure placeholder rather than a real answer
    #[serde(default)]
    pub degraded: bool,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self {
            source: String::new(),
            date: String::new(),
            groups: Vec::new(),
            degraded: false,
        }
    }

    /// Placeholder returned when nothing usable could be parsed.
    pub fn degraded() -> Self {
        Self {
            source: UNPARSED_SOURCE.to_string(),
            date: String::new(),
            groups: Vec::new(),
            degraded: true,
        }
    }

    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Zero groups reported by a response that parsed cleanly.
    pub fn is_confirmed_empty(&self) -> bool {
        self.groups.is_empty() && !self.degraded
    }

    pub fn entry_count(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }
}

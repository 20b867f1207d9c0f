use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive integer range one output column may take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRange {
    pub name: String,
    pub min: u32,
    pub max: u32,
}

impl ComponentRange {
    pub fn new(name: impl Into<String>, min: u32, max: u32) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.min <= value && value <= self.max
    }

    /// Number of distinct values in the range.
    pub fn size(&self) -> u64 {
        u64::from(self.max.saturating_sub(self.min)) + 1
    }
}

/// Ordered component ranges a total is split across. Fixed for a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentSpec {
    components: Vec<ComponentRange>,
}

impl ComponentSpec {
    pub fn new(components: Vec<ComponentRange>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[ComponentRange] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.name.as_str())
    }

    /// Smallest and largest totals any decomposition can reach, saturating at `u32::MAX`.
    pub fn reachable_range(&self) -> (u32, u32) {
        self.components
            .iter()
            .fold((0u32, 0u32), |(lo, hi), c| {
                (lo.saturating_add(c.min), hi.saturating_add(c.max))
            })
    }

    /// Like [`reachable_range`](Self::reachable_range), but `None` when a bound overflows `u32`.
    pub fn checked_reachable_range(&self) -> Option<(u32, u32)> {
        self.components.iter().try_fold((0u32, 0u32), |(lo, hi), c| {
            Some((lo.checked_add(c.min)?, hi.checked_add(c.max)?))
        })
    }

    /// Size of the full search space (product of range sizes).
    pub fn combinations(&self) -> u64 {
        self.components
            .iter()
            .fold(1u64, |acc, c| acc.saturating_mul(c.size()))
    }
}

impl Default for ComponentSpec {
    fn default() -> Self {
        Self::new(vec![
            ComponentRange::new("Mark1", 0, 1),
            ComponentRange::new("Mark2", 0, 5),
            ComponentRange::new("Mark3", 0, 3),
            ComponentRange::new("Mark4", 0, 2),
            ComponentRange::new("Mark5", 0, 1),
        ])
    }
}

/// One value per component, in component order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub values: Vec<u32>,
}

impl Decomposition {
    /// Widened so values near `u32::MAX` cannot wrap.
    pub fn sum(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }

    /// True when every value lies in its range and the values add up to `total`.
    pub fn satisfies(&self, spec: &ComponentSpec, total: u32) -> bool {
        self.values.len() == spec.len()
            && self
                .values
                .iter()
                .zip(spec.components())
                .all(|(v, c)| c.contains(*v))
            && self.sum() == u64::from(total)
    }
}

/// Raw contents of a row's total cell before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum TotalCell {
    Missing,
    Number(f64),
    Text(String),
}

impl TotalCell {
    /// Classify free text the way a spreadsheet cell would be read.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return TotalCell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => TotalCell::Number(value),
            _ => TotalCell::Text(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputRow {
    /// 1-based data row index, header excluded.
    pub row: usize,
    pub total: TotalCell,
}

impl InputRow {
    pub fn new(row: usize, total: TotalCell) -> Self {
        Self { row, total }
    }
}

/// A row whose total passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRow {
    pub row: usize,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub row: usize,
    pub total: u32,
    pub decomposition: Decomposition,
}

/// Header names plus the rows read from an input spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSheet {
    pub headers: Vec<String>,
    pub rows: Vec<InputRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    Missing,
    OutOfRange(f64),
    NotANumber(String),
    NotAnInteger(f64),
}

/// A validation finding for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    pub row: usize,
    pub kind: IssueKind,
}

impl RowIssue {
    pub fn missing(row: usize) -> Self {
        Self {
            row,
            kind: IssueKind::Missing,
        }
    }

    pub fn out_of_range(row: usize, value: f64) -> Self {
        Self {
            row,
            kind: IssueKind::OutOfRange(value),
        }
    }

    pub fn not_a_number(row: usize, text: impl Into<String>) -> Self {
        Self {
            row,
            kind: IssueKind::NotANumber(text.into()),
        }
    }

    pub fn not_an_integer(row: usize, value: f64) -> Self {
        Self {
            row,
            kind: IssueKind::NotAnInteger(value),
        }
    }
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Missing => write!(f, "Row {}: Total is missing", self.row),
            IssueKind::OutOfRange(value) => write!(f, "Row {}: Total = {}", self.row, value),
            IssueKind::NotANumber(text) => {
                write!(f, "Row {}: Total = '{}' is not a number", self.row, text)
            }
            IssueKind::NotAnInteger(value) => {
                write!(f, "Row {}: Total = {} is not a whole number", self.row, value)
            }
        }
    }
}

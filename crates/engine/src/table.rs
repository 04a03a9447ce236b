//! In-memory table model shared by the loader, the engine and the encoder.
//!
//! Columns are positional: a table is an ordered list of header labels plus
//! rows of the same width. Labels are kept exactly as the source file had
//! them, duplicates included.

use std::fmt;

use serde::Serialize;

use crate::error::ConsolidateError;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Empty cell in the source file.
    Blank,
    /// No partner row in the user data; written by the engine only.
    Missing,
}

impl Value {
    /// Wrap a raw text field, mapping the empty string to `Blank`.
    pub fn from_text(s: &str) -> Self {
        if s.is_empty() {
            Value::Blank
        } else {
            Value::Text(s.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// True for `Blank`, `Missing` and empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Blank | Value::Missing => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Join key rendering. `None` for values that never match.
    pub fn key_text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(self.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => {
                // Integers without decimals
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Blank | Value::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Which of the two inputs a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    BadResponses,
    UserData,
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadResponses => write!(f, "bad responses"),
            Self::UserData => write!(f, "user data"),
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ConsolidateError> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(ConsolidateError::Processing(format!(
                "row {} has {} value(s), expected {}",
                idx + 1,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows as a new table (preview).
    pub fn head(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

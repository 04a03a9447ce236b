use serde::{Deserialize, Serialize};

use crate::error::ConsolidateError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Positional column mapping and join options.
///
/// Defaults reproduce the layout the survey exports use: the bad responses
/// key in column A; reference, email, Lucid reference and country in columns
/// B, C, F and H of the user data export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    /// Which user data column the bad responses key is matched against.
    pub key: KeyMode,
    pub on_duplicate: DuplicatePolicy,
    pub bad_responses: BadResponseColumns,
    pub user_data: UserDataColumns,
    pub output: OutputNames,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            key: KeyMode::Email,
            on_duplicate: DuplicatePolicy::FanOut,
            bad_responses: BadResponseColumns::default(),
            user_data: UserDataColumns::default(),
            output: OutputNames::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Key mode + duplicate policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Match on the user reference column.
    Reference,
    /// Match on the email column.
    Email,
}

impl KeyMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reference => "user reference",
            Self::Email => "email",
        }
    }
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// What to do when a key occurs on more than one user data row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// One output row per matching user data row.
    FanOut,
    /// Only the first matching user data row (file order).
    FirstMatch,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FanOut => write!(f, "fan_out"),
            Self::FirstMatch => write!(f, "first_match"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column positions (0-based)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BadResponseColumns {
    pub key: usize,
}

impl Default for BadResponseColumns {
    fn default() -> Self {
        Self { key: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserDataColumns {
    pub reference: usize,
    pub email: usize,
    pub lucid_reference: usize,
    pub country: usize,
}

impl Default for UserDataColumns {
    fn default() -> Self {
        Self {
            reference: 1,
            email: 2,
            lucid_reference: 5,
            country: 7,
        }
    }
}

impl UserDataColumns {
    /// Minimum column count the user data table must have.
    pub fn required(&self) -> usize {
        self.reference
            .max(self.email)
            .max(self.lucid_reference)
            .max(self.country)
            + 1
    }
}

// ---------------------------------------------------------------------------
// Output names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputNames {
    pub reference: String,
    pub email: String,
    pub lucid_reference: String,
    pub country: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            reference: "User_REF".into(),
            email: "Email".into(),
            lucid_reference: "Lucid_Reference".into(),
            country: "Country".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Carried columns
// ---------------------------------------------------------------------------

/// A user data field the engine can attach to bad responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Reference,
    Email,
    LucidReference,
    Country,
}

impl UserField {
    pub const ALL: [UserField; 4] = [
        UserField::Reference,
        UserField::Email,
        UserField::LucidReference,
        UserField::Country,
    ];
}

impl std::fmt::Display for UserField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "User REF"),
            Self::Email => write!(f, "Email"),
            Self::LucidReference => write!(f, "Lucid Reference"),
            Self::Country => write!(f, "Country"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MappingConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConsolidateError> {
        let config: MappingConfig =
            toml::from_str(input).map_err(|e| ConsolidateError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConsolidateError> {
        toml::to_string_pretty(self).map_err(|e| ConsolidateError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConsolidateError> {
        // User data positions must be distinct
        let mut seen: Vec<(UserField, usize)> = Vec::new();
        for field in UserField::ALL {
            let idx = self.user_column(field);
            if let Some((other, _)) = seen.iter().find(|(_, i)| *i == idx) {
                return Err(ConsolidateError::Config(format!(
                    "user_data.{} and user_data.{} both point at column index {idx}",
                    config_key(*other),
                    config_key(field),
                )));
            }
            seen.push((field, idx));
        }

        for field in UserField::ALL {
            if self.output_name(field).trim().is_empty() {
                return Err(ConsolidateError::Config(format!(
                    "output.{} must not be empty",
                    config_key(field)
                )));
            }
        }

        Ok(())
    }

    /// The user data field the join key is read from.
    pub fn key_field(&self) -> UserField {
        match self.key {
            KeyMode::Reference => UserField::Reference,
            KeyMode::Email => UserField::Email,
        }
    }

    /// Fields carried onto each bad response, in output order.
    /// The join key field is excluded: its values already sit in the
    /// bad responses key column.
    pub fn carried_fields(&self) -> Vec<UserField> {
        let key = self.key_field();
        UserField::ALL.into_iter().filter(|f| *f != key).collect()
    }

    pub fn user_column(&self, field: UserField) -> usize {
        match field {
            UserField::Reference => self.user_data.reference,
            UserField::Email => self.user_data.email,
            UserField::LucidReference => self.user_data.lucid_reference,
            UserField::Country => self.user_data.country,
        }
    }

    pub fn output_name(&self, field: UserField) -> &str {
        match field {
            UserField::Reference => &self.output.reference,
            UserField::Email => &self.output.email,
            UserField::LucidReference => &self.output.lucid_reference,
            UserField::Country => &self.output.country,
        }
    }
}

fn config_key(field: UserField) -> &'static str {
    match field {
        UserField::Reference => "reference",
        UserField::Email => "email",
        UserField::LucidReference => "lucid_reference",
        UserField::Country => "country",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

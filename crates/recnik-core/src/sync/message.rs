//! Changeset document types
//!
//! The remote publishes a single JSON document:
//!
//! ```text
//! { "version": 3, "entries": [
//!     { "action": "update", "id": 42, "english_def": "a dwelling" },
//!     { "action": "add", "cyrillic_word": "кућа", "latin_word": "kuća", ... },
//!     { "action": "delete", "id": 17 } ] }
//! ```
//!
//! Every per-variant field is optional. `null` and a missing key mean the
//! same thing: the field is not supplied.

use serde::{Deserialize, Serialize};

use crate::models::Script;

/// A versioned, ordered list of changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    /// Monotonically increasing changeset version
    pub version: i64,
    /// Changes, applied in array order
    #[serde(default)]
    pub entries: Vec<Change>,
}

impl Changeset {
    /// Parse a changeset from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// What a change does to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Add,
    Update,
    Delete,
}

/// Field within a script variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Word,
    Part,
    Definition,
    Example,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Word, Field::Part, Field::Definition, Field::Example];

    fn column_suffix(self) -> &'static str {
        match self {
            Field::Word => "word",
            Field::Part => "part",
            Field::Definition => "def",
            Field::Example => "example",
        }
    }
}

/// Column name in the `words` table for a script/field pair
pub fn column_name(script: Script, field: Field) -> String {
    format!("{}_{}", script.column_prefix(), field.column_suffix())
}

/// A single add/update/delete record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub action: ChangeAction,
    /// Target row; required for update and delete, ignored for add
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub cyrillic_word: Option<String>,
    #[serde(default)]
    pub cyrillic_part: Option<String>,
    #[serde(default)]
    pub cyrillic_def: Option<String>,
    #[serde(default)]
    pub cyrillic_example: Option<String>,

    #[serde(default)]
    pub latin_word: Option<String>,
    #[serde(default)]
    pub latin_part: Option<String>,
    #[serde(default)]
    pub latin_def: Option<String>,
    #[serde(default)]
    pub latin_example: Option<String>,

    #[serde(default)]
    pub english_word: Option<String>,
    #[serde(default)]
    pub english_part: Option<String>,
    #[serde(default)]
    pub english_def: Option<String>,
    #[serde(default)]
    pub english_example: Option<String>,
}

impl Change {
    /// Create a change with no fields supplied
    pub fn new(action: ChangeAction, id: Option<i64>) -> Self {
        Self {
            action,
            id,
            cyrillic_word: None,
            cyrillic_part: None,
            cyrillic_def: None,
            cyrillic_example: None,
            latin_word: None,
            latin_part: None,
            latin_def: None,
            latin_example: None,
            english_word: None,
            english_part: None,
            english_def: None,
            english_example: None,
        }
    }

    pub fn add() -> Self {
        Self::new(ChangeAction::Add, None)
    }

    pub fn update(id: i64) -> Self {
        Self::new(ChangeAction::Update, Some(id))
    }

    pub fn delete(id: i64) -> Self {
        Self::new(ChangeAction::Delete, Some(id))
    }

    /// Builder-style setter for one field
    pub fn with(mut self, script: Script, field: Field, value: impl Into<String>) -> Self {
        *self.slot_mut(script, field) = Some(value.into());
        self
    }

    /// Supplied value for a field, if any
    pub fn get(&self, script: Script, field: Field) -> Option<&str> {
        self.slot(script, field).as_deref()
    }

    /// Supplied fields as `(column, value)` pairs, in column order
    pub fn supplied(&self) -> Vec<(String, &str)> {
        let mut fields = Vec::new();
        for script in Script::ALL {
            for field in Field::ALL {
                if let Some(value) = self.get(script, field) {
                    fields.push((column_name(script, field), value));
                }
            }
        }
        fields
    }

    /// Value to write on insert: supplied value or empty string
    pub fn value_or_empty(&self, script: Script, field: Field) -> &str {
        self.get(script, field).unwrap_or("")
    }

    fn slot(&self, script: Script, field: Field) -> &Option<String> {
        match (script, field) {
            (Script::Cyrillic, Field::Word) => &self.cyrillic_word,
            (Script::Cyrillic, Field::Part) => &self.cyrillic_part,
            (Script::Cyrillic, Field::Definition) => &self.cyrillic_def,
            (Script::Cyrillic, Field::Example) => &self.cyrillic_example,
            (Script::Latin, Field::Word) => &self.latin_word,
            (Script::Latin, Field::Part) => &self.latin_part,
            (Script::Latin, Field::Definition) => &self.latin_def,
            (Script::Latin, Field::Example) => &self.latin_example,
            (Script::English, Field::Word) => &self.english_word,
            (Script::English, Field::Part) => &self.english_part,
            (Script::English, Field::Definition) => &self.english_def,
            (Script::English, Field::Example) => &self.english_example,
        }
    }

    fn slot_mut(&mut self, script: Script, field: Field) -> &mut Option<String> {
        match (script, field) {
            (Script::Cyrillic, Field::Word) => &mut self.cyrillic_word,
            (Script::Cyrillic, Field::Part) => &mut self.cyrillic_part,
            (Script::Cyrillic, Field::Definition) => &mut self.cyrillic_def,
            (Script::Cyrillic, Field::Example) => &mut self.cyrillic_example,
            (Script::Latin, Field::Word) => &mut self.latin_word,
            (Script::Latin, Field::Part) => &mut self.latin_part,
            (Script::Latin, Field::Definition) => &mut self.latin_def,
            (Script::Latin, Field::Example) => &mut self.latin_example,
            (Script::English, Field::Word) => &mut self.english_word,
            (Script::English, Field::Part) => &mut self.english_part,
            (Script::English, Field::Definition) => &mut self.english_def,
            (Script::English, Field::Example) => &mut self.english_example,
        }
    }
}

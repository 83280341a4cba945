//! Add / edit / delete dialog.
//!
//! `Closed -> {Add, Edit, Delete} -> Closed`. Each open dialog remembers the
//! table it acts on, so a row picked from any listing is written back to its own
//! table.

use serde_json::Value;
use std::fmt;

use crate::client::AdminHttpClient;
use crate::error::{AdminError, Result};
use crate::normalize::normalize_payload;
use crate::record::{field_text, record_id, FieldRules, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Add,
    Edit,
    Delete,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DialogKind::Add => "add",
            DialogKind::Edit => "edit",
            DialogKind::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Dialog {
    #[default]
    Closed,
    Add {
        table: String,
        fields: Vec<String>,
        form: Record,
    },
    Edit {
        table: String,
        id: String,
        fields: Vec<String>,
        form: Record,
    },
    Delete {
        table: String,
        id: String,
    },
}

impl Dialog {
    /// Fields are guessed from the first row of the table, the form starts empty.
    pub fn add(table: &str, first_row: Option<&Record>, rules: &FieldRules) -> Self {
        let fields = first_row
            .map(|row| rules.form_fields(row.keys()))
            .unwrap_or_default();
        Dialog::Add {
            table: table.to_string(),
            fields,
            form: Record::new(),
        }
    }

    /// Form seeded with a copy of the whole row; system fields are sent back untouched.
    pub fn edit(table: &str, row: &Record, rules: &FieldRules) -> Result<Self> {
        let id = record_id(row).ok_or(AdminError::MissingId)?;
        Ok(Dialog::Edit {
            table: table.to_string(),
            id,
            fields: rules.form_fields(row.keys()),
            form: row.clone(),
        })
    }

    pub fn delete(table: &str, row: &Record) -> Result<Self> {
        let id = record_id(row).ok_or(AdminError::MissingId)?;
        Ok(Dialog::Delete {
            table: table.to_string(),
            id,
        })
    }

    pub fn kind(&self) -> Option<DialogKind> {
        match self {
            Dialog::Closed => None,
            Dialog::Add { .. } => Some(DialogKind::Add),
            Dialog::Edit { .. } => Some(DialogKind::Edit),
            Dialog::Delete { .. } => Some(DialogKind::Delete),
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Dialog::Closed)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Dialog::Closed => "",
            Dialog::Add { .. } => "Add New Record",
            Dialog::Edit { .. } => "Edit Record",
            Dialog::Delete { .. } => "Confirm Delete",
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Dialog::Closed => None,
            Dialog::Add { table, .. } | Dialog::Edit { table, .. } | Dialog::Delete { table, .. } => {
                Some(table.as_str())
            }
        }
    }

    pub fn fields(&self) -> &[String] {
        match self {
            Dialog::Add { fields, .. } | Dialog::Edit { fields, .. } => fields.as_slice(),
            _ => &[],
        }
    }

    pub fn field_text(&self, key: &str) -> String {
        match self {
            Dialog::Add { form, .. } | Dialog::Edit { form, .. } => {
                form.get(key).map(field_text).unwrap_or_default()
            }
            _ => String::new(),
        }
    }

    /// Typed input replaces the field with a string value. Ignored outside add/edit.
    pub fn set_field(&mut self, key: &str, text: impl Into<String>) {
        if let Dialog::Add { form, .. } | Dialog::Edit { form, .. } = self {
            form.insert(key.to_string(), Value::String(text.into()));
        }
    }

    /// The request this dialog submits, payload already normalized.
    pub fn mutation(&self) -> Option<Mutation> {
        match self {
            Dialog::Closed => None,
            Dialog::Add { table, form, .. } => Some(Mutation::Create {
                table: table.clone(),
                payload: normalize_payload(form.clone()),
            }),
            Dialog::Edit { table, id, form, .. } => Some(Mutation::Update {
                table: table.clone(),
                id: id.clone(),
                payload: normalize_payload(form.clone()),
            }),
            Dialog::Delete { table, id } => Some(Mutation::Delete {
                table: table.clone(),
                id: id.clone(),
            }),
        }
    }
}

/// A single write against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create { table: String, payload: Record },
    Update { table: String, id: String, payload: Record },
    Delete { table: String, id: String },
}

impl Mutation {
    pub fn kind(&self) -> DialogKind {
        match self {
            Mutation::Create { .. } => DialogKind::Add,
            Mutation::Update { .. } => DialogKind::Edit,
            Mutation::Delete { .. } => DialogKind::Delete,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Mutation::Create { table, .. } | Mutation::Update { table, .. } | Mutation::Delete { table, .. } => {
                table.as_str()
            }
        }
    }

    pub async fn execute(&self, client: &AdminHttpClient) -> Result<()> {
        match self {
            Mutation::Create { table, payload } => client.create(table, payload).await,
            Mutation::Update { table, id, payload } => client.update(table, id, payload).await,
            Mutation::Delete { table, id } => client.delete(table, id).await,
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self.kind() {
            DialogKind::Add => "Record added successfully",
            DialogKind::Edit => "Record updated successfully",
            DialogKind::Delete => "Record deleted successfully",
        }
    }

    pub fn failure_message(&self) -> String {
        format!("Failed to {} record", self.kind())
    }
}

//! Command handlers for each application panel.
//!
//! Every handler takes a [`crate::context::SessionContext`] plus validated
//! input and returns a `Result`. Handlers never touch presentation state.

pub mod dashboard;
pub mod finances;
pub mod glossary;
pub mod grimoire;
pub mod lunar;
pub mod obsessions;
pub mod rituals;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
  Error, Result,
  list::{Fields, ListRecord},
};

/// Serialise a typed record body into list-record fields.
fn to_fields<T: Serialize>(body: &T) -> Result<Fields> {
  match serde_json::to_value(body)? {
    Value::Object(fields) => Ok(fields),
    _ => Err(Error::invalid_field("record", "must serialise to an object")),
  }
}

/// Read a list record back as a typed body.
fn from_record<T: DeserializeOwned>(record: &ListRecord) -> Result<T> {
  Ok(serde_json::from_value(Value::Object(record.fields.clone()))?)
}

/// The trimmed value, or [`Error::EmptyField`] when nothing is left.
fn required(value: &str, name: &'static str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyField(name));
  }
  Ok(trimmed.to_owned())
}

/// Like [`required`], but blank input means "absent".
fn optional(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn required_trims_and_rejects_blank() {
    assert_eq!(required("  word ", "name").unwrap(), "word");
    assert!(matches!(required(" \n", "name"), Err(Error::EmptyField("name"))));
  }

  #[test]
  fn optional_treats_blank_as_absent() {
    assert_eq!(optional(Some("  ")), None);
    assert_eq!(optional(None), None);
    assert_eq!(optional(Some(" x ")).as_deref(), Some("x"));
  }
}

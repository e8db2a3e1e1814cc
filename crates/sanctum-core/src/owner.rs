//! Owner identity.
//!
//! The identity provider hands the application an opaque, stable string per
//! session. Nothing here interprets it beyond requiring it to be non-empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.trim().is_empty() {
      return Err(Error::EmptyField("owner id"));
    }
    Ok(Self(id))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for OwnerId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::new(s) }
}

impl From<OwnerId> for String {
  fn from(id: OwnerId) -> Self { id.0 }
}

impl fmt::Display for OwnerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_owner_is_rejected() {
    assert!(matches!(OwnerId::new("  "), Err(Error::EmptyField(_))));
    assert_eq!(OwnerId::new("u-1").unwrap().as_str(), "u-1");
  }
}

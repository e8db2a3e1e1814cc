//! Daily singleton records: at most one per owner, kind and calendar day.
//!
//! A daily record is created once (get-or-create) and afterwards only mutated
//! in place through a [`PayloadPatch`]. Daily records are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, day::DayKey, owner::OwnerId};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Which daily collection a record lives in.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DailyKind {
  /// The dashboard's affirmation of the day.
  Dashboard,
  /// The daily energy/mood cycle log.
  LunarOs,
}

// ─── Payload components ──────────────────────────────────────────────────────

/// An integer rating in `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Level(u8);

impl Level {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 10;

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Level {
  type Error = Error;

  fn try_from(v: i64) -> Result<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&v) {
      Ok(Self(v as u8))
    } else {
      Err(Error::InvalidLevel(v))
    }
  }
}

impl From<Level> for u8 {
  fn from(l: Level) -> Self { l.0 }
}

impl Default for Level {
  fn default() -> Self { Self(5) }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Mood {
  #[default]
  Focused,
  Creative,
  Withdrawn,
  Expansive,
  Irritable,
  Calm,
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// The content of a daily record. The variant must agree with the record's
/// [`DailyKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DailyPayload {
  Affirmation {
    affirmation:  String,
    acknowledged: bool,
  },
  Cycle {
    energy:   Level,
    creative: Level,
    social:   Level,
    mood:     Mood,
    notes:    String,
  },
}

impl DailyPayload {
  /// The kind this payload belongs to.
  pub fn kind(&self) -> DailyKind {
    match self {
      Self::Affirmation { .. } => DailyKind::Dashboard,
      Self::Cycle { .. } => DailyKind::LunarOs,
    }
  }

  /// Fail with [`Error::PayloadMismatch`] unless this payload belongs to
  /// `expected`.
  pub fn ensure_kind(&self, expected: DailyKind) -> Result<()> {
    let found = self.kind();
    if found != expected {
      return Err(Error::PayloadMismatch { expected, found });
    }
    Ok(())
  }
}

/// The fields of a cycle log entry as submitted by the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleEntry {
  pub energy:   Level,
  pub creative: Level,
  pub social:   Level,
  pub mood:     Mood,
  pub notes:    String,
}

impl From<CycleEntry> for DailyPayload {
  fn from(e: CycleEntry) -> Self {
    DailyPayload::Cycle {
      energy:   e.energy,
      creative: e.creative,
      social:   e.social,
      mood:     e.mood,
      notes:    e.notes,
    }
  }
}

impl From<CycleEntry> for PayloadPatch {
  fn from(e: CycleEntry) -> Self {
    PayloadPatch::Cycle {
      energy:   Some(e.energy),
      creative: Some(e.creative),
      social:   Some(e.social),
      mood:     Some(e.mood),
      notes:    Some(e.notes),
    }
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial payload. `None` fields leave the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayloadPatch {
  Affirmation {
    #[serde(default)]
    affirmation:  Option<String>,
    #[serde(default)]
    acknowledged: Option<bool>,
  },
  Cycle {
    #[serde(default)]
    energy:   Option<Level>,
    #[serde(default)]
    creative: Option<Level>,
    #[serde(default)]
    social:   Option<Level>,
    #[serde(default)]
    mood:     Option<Mood>,
    #[serde(default)]
    notes:    Option<String>,
  },
}

impl PayloadPatch {
  pub fn acknowledge() -> Self {
    Self::Affirmation { affirmation: None, acknowledged: Some(true) }
  }

  pub fn kind(&self) -> DailyKind {
    match self {
      Self::Affirmation { .. } => DailyKind::Dashboard,
      Self::Cycle { .. } => DailyKind::LunarOs,
    }
  }

  /// Merge into `payload`. On a kind mismatch `payload` is left unchanged.
  pub fn apply(self, payload: &mut DailyPayload) -> Result<()> {
    match (self, payload) {
      (
        Self::Affirmation { affirmation, acknowledged },
        DailyPayload::Affirmation { affirmation: a, acknowledged: k },
      ) => {
        if let Some(v) = affirmation {
          *a = v;
        }
        if let Some(v) = acknowledged {
          *k = v;
        }
        Ok(())
      }
      (
        Self::Cycle { energy, creative, social, mood, notes },
        DailyPayload::Cycle {
          energy: e,
          creative: c,
          social: s,
          mood: m,
          notes: n,
        },
      ) => {
        if let Some(v) = energy {
          *e = v;
        }
        if let Some(v) = creative {
          *c = v;
        }
        if let Some(v) = social {
          *s = v;
        }
        if let Some(v) = mood {
          *m = v;
        }
        if let Some(v) = notes {
          *n = v;
        }
        Ok(())
      }
      (patch, payload) => Err(Error::PayloadMismatch {
        expected: payload.kind(),
        found:    patch.kind(),
      }),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
  pub owner_id:   OwnerId,
  pub kind:       DailyKind,
  pub day_key:    DayKey,
  pub payload:    DailyPayload,
  /// Store-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
  /// Store-assigned on every update.
  pub updated_at: DateTime<Utc>,
}

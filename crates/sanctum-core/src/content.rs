//! Immutable content tables and the deterministic per-day selector.
//!
//! Content (affirmations, journal prompts, ritual seeds, categories) is data,
//! not code: it is parsed once at startup from a TOML resource into a
//! [`ContentCatalog`] and shared read-only afterwards.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const BUILTIN_CATALOG: &str = include_str!("../content/default.toml");

// ─── ContentTable ────────────────────────────────────────────────────────────

/// A fixed, ordered, non-empty table of content items.
#[derive(Debug, Clone)]
pub struct ContentTable<T> {
  items: Vec<T>,
}

impl<T> ContentTable<T> {
  /// Fails with [`Error::Configuration`] when `items` is empty.
  pub fn new(items: Vec<T>) -> Result<Self> {
    if items.is_empty() {
      return Err(Error::Configuration("content table is empty".into()));
    }
    Ok(Self { items })
  }

  /// The item for day-of-year `day`: index `day mod N`.
  ///
  /// No randomness and no hidden state, so the same day always selects the
  /// same item across restarts.
  pub fn select(&self, day: u32) -> &T {
    &self.items[day as usize % self.items.len()]
  }

  /// Never zero.
  #[allow(clippy::len_without_is_empty)]
  pub fn len(&self) -> usize { self.items.len() }

  pub fn iter(&self) -> std::slice::Iter<'_, T> { self.items.iter() }

  pub fn contains(&self, item: &T) -> bool
  where
    T: PartialEq,
  {
    self.items.contains(item)
  }
}

impl<'a, T> IntoIterator for &'a ContentTable<T> {
  type Item = &'a T;
  type IntoIter = std::slice::Iter<'a, T>;

  fn into_iter(self) -> Self::IntoIter { self.items.iter() }
}

// ─── Catalog entry types ─────────────────────────────────────────────────────

/// How often a ritual recurs.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Schedule {
  Daily,
  Weekly,
  Monthly,
}

/// A ritual inserted into an owner's empty ritual list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RitualSeed {
  pub name:     String,
  /// `HH:MM`; untimed rituals sort last in an agenda.
  #[serde(default)]
  pub time:     Option<String>,
  pub schedule: Schedule,
}

/// A lexicon entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
  pub term:       String,
  pub definition: String,
}

// ─── ContentCatalog ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawCatalog {
  affirmations:           Vec<String>,
  journal_prompts:        Vec<String>,
  ritual_seeds:           Vec<RitualSeed>,
  glossary_terms:         Vec<GlossaryTerm>,
  obsession_categories:   Vec<String>,
  expense_categories:     Vec<String>,
  #[serde(default)]
  justification_required: Vec<String>,
}

/// Every content table the application reads, loaded once at startup.
#[derive(Debug, Clone)]
pub struct ContentCatalog {
  pub affirmations:           ContentTable<String>,
  pub journal_prompts:        ContentTable<String>,
  pub ritual_seeds:           ContentTable<RitualSeed>,
  pub glossary_terms:         ContentTable<GlossaryTerm>,
  pub obsession_categories:   ContentTable<String>,
  pub expense_categories:     ContentTable<String>,
  /// Expense categories whose transactions must carry a justification.
  pub justification_required: Vec<String>,
}

impl ContentCatalog {
  /// The catalog compiled into the binary.
  pub fn builtin() -> Result<Self> { Self::from_toml(BUILTIN_CATALOG) }

  /// Parse a catalog from TOML. Any empty table is a configuration error.
  pub fn from_toml(source: &str) -> Result<Self> {
    let raw: RawCatalog = toml::from_str(source)
      .map_err(|e| Error::Configuration(format!("content catalog: {e}")))?;

    Ok(Self {
      affirmations:           table("affirmations", raw.affirmations)?,
      journal_prompts:        table("journal_prompts", raw.journal_prompts)?,
      ritual_seeds:           table("ritual_seeds", raw.ritual_seeds)?,
      glossary_terms:         table("glossary_terms", raw.glossary_terms)?,
      obsession_categories:   table("obsession_categories", raw.obsession_categories)?,
      expense_categories:     table("expense_categories", raw.expense_categories)?,
      justification_required: raw.justification_required,
    })
  }
}

fn table<T>(name: &str, items: Vec<T>) -> Result<ContentTable<T>> {
  ContentTable::new(items)
    .map_err(|_| Error::Configuration(format!("content table `{name}` is empty")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn selects_day_mod_len() {
    let t = ContentTable::new(vec!["A", "B", "C"]).unwrap();
    assert_eq!(*t.select(7), "B");
    assert_eq!(*t.select(10), "B");
    assert_eq!(*t.select(3), "A");
    assert_eq!(*t.select(366), "A");
  }

  #[test]
  fn congruent_days_select_the_same_item() {
    let t = ContentTable::new((0..7).collect::<Vec<u32>>()).unwrap();
    for d1 in 1..=366u32 {
      let d2 = d1 + 7 * 3;
      assert_eq!(t.select(d1), t.select(d2));
    }
  }

  #[test]
  fn empty_table_is_a_configuration_error() {
    let err = ContentTable::<String>::new(vec![]).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
  }

  #[test]
  fn builtin_catalog_loads() {
    let catalog = ContentCatalog::builtin().unwrap();
    assert_eq!(catalog.affirmations.len(), 5);
    assert_eq!(catalog.ritual_seeds.len(), 22);
    assert_eq!(catalog.glossary_terms.len(), 3);
    assert!(catalog.expense_categories.contains(&"Flow".to_owned()));
    assert_eq!(catalog.justification_required, ["Ritual & Aesthetic", "Flow"]);

    let untimed = catalog
      .ritual_seeds
      .iter()
      .filter(|s| s.time.is_none())
      .count();
    assert_eq!(untimed, 13);
  }

  #[test]
  fn catalog_with_empty_table_is_rejected() {
    let source = r#"
      affirmations = []
      journal_prompts = ["p"]
      ritual_seeds = [{ name = "r", schedule = "daily" }]
      glossary_terms = [{ term = "t", definition = "d" }]
      obsession_categories = ["c"]
      expense_categories = ["e"]
    "#;
    let err = ContentCatalog::from_toml(source).unwrap_err();
    assert!(
      matches!(&err, Error::Configuration(m) if m.contains("affirmations")),
      "{err}"
    );
  }

  #[test]
  fn malformed_catalog_is_a_configuration_error() {
    let err = ContentCatalog::from_toml("affirmations = 3").unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
  }
}

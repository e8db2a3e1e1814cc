//! The lexicon: built-in terms merged with the owner's own definitions.

use serde::Deserialize;

use super::{from_record, required, to_fields};
use crate::{
  Result,
  content::{ContentCatalog, GlossaryTerm},
  context::SessionContext,
  list::{Collection, ListRecord},
  store::DocumentStore,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTerm {
  pub term:       String,
  pub definition: String,
}

pub async fn add_term<S: DocumentStore>(
  ctx: &SessionContext<S>,
  term: NewTerm,
) -> Result<ListRecord> {
  let body = GlossaryTerm {
    term:       required(&term.term, "term")?,
    definition: required(&term.definition, "definition")?,
  };
  ctx.create_record(Collection::Glossary, to_fields(&body)?).await
}

/// Built-in and user terms sorted by term, keeping those whose term contains
/// `search` (case-insensitive). Records that are not well-formed terms are
/// skipped.
pub fn lexicon(catalog: &ContentCatalog, user: &[ListRecord], search: &str) -> Vec<GlossaryTerm> {
  let needle = search.trim().to_lowercase();
  let mut terms: Vec<GlossaryTerm> = catalog
    .glossary_terms
    .iter()
    .cloned()
    .chain(user.iter().filter_map(|r| from_record::<GlossaryTerm>(r).ok()))
    .filter(|t| t.term.to_lowercase().contains(&needle))
    .collect();
  terms.sort_by(|a, b| {
    a.term
      .to_lowercase()
      .cmp(&b.term.to_lowercase())
      .then_with(|| a.term.cmp(&b.term))
  });
  terms
}

pub async fn lookup<S: DocumentStore>(
  ctx: &SessionContext<S>,
  search: &str,
) -> Result<Vec<GlossaryTerm>> {
  let user = ctx.records(Collection::Glossary, None).await?;
  Ok(lexicon(ctx.catalog(), &user, search))
}

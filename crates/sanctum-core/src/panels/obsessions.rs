//! Obsession cartography: named fixations filed under a fixed category set.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{required, to_fields};
use crate::{
  Error, Result,
  context::SessionContext,
  list::{Collection, ListRecord},
  store::DocumentStore,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewObsession {
  pub name:     String,
  pub category: String,
}

pub async fn add_obsession<S: DocumentStore>(
  ctx: &SessionContext<S>,
  obsession: NewObsession,
) -> Result<ListRecord> {
  let name = required(&obsession.name, "name")?;
  if !ctx.catalog().obsession_categories.contains(&obsession.category) {
    return Err(Error::invalid_field(
      "category",
      format!("unknown obsession category {:?}", obsession.category),
    ));
  }

  let fields = to_fields(&NewObsession { name, category: obsession.category })?;
  ctx.create_record(Collection::Obsessions, fields).await
}

pub async fn delete_obsession<S: DocumentStore>(ctx: &SessionContext<S>, id: Uuid) -> Result<()> {
  ctx.delete_record(Collection::Obsessions, id).await
}

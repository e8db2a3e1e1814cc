//! The altar ledger: signed transactions and the running balance.

use serde::{Deserialize, Serialize};

use super::{optional, required, to_fields};
use crate::{
  Error, Result,
  context::SessionContext,
  list::{Collection, ListRecord, Ordering},
  store::DocumentStore,
};

/// Category recorded for every income transaction.
pub const INCOME_CATEGORY: &str = "Income";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransactionKind {
  Expense,
  Income,
}

/// A transaction as submitted. `amount` is a magnitude; the sign is derived
/// from `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
  pub description:   String,
  pub amount:        f64,
  #[serde(rename = "type")]
  pub kind:          TransactionKind,
  #[serde(default)]
  pub category:      Option<String>,
  #[serde(default)]
  pub justification: Option<String>,
}

#[derive(Serialize)]
struct TransactionFields {
  description:   String,
  amount:        f64,
  #[serde(rename = "type")]
  kind:          TransactionKind,
  category:      String,
  #[serde(skip_serializing_if = "Option::is_none")]
  justification: Option<String>,
}

pub async fn add_transaction<S: DocumentStore>(
  ctx: &SessionContext<S>,
  tx: NewTransaction,
) -> Result<ListRecord> {
  let description = required(&tx.description, "description")?;
  if !tx.amount.is_finite() || tx.amount <= 0.0 {
    return Err(Error::invalid_field("amount", "must be a positive number"));
  }
  let justification = optional(tx.justification.as_deref());

  let (amount, category) = match tx.kind {
    TransactionKind::Income => (tx.amount, INCOME_CATEGORY.to_owned()),
    TransactionKind::Expense => {
      let category = tx.category.ok_or(Error::EmptyField("category"))?;
      let catalog = ctx.catalog();
      if !catalog.expense_categories.contains(&category) {
        return Err(Error::invalid_field(
          "category",
          format!("unknown expense category {category:?}"),
        ));
      }
      if catalog.justification_required.contains(&category) && justification.is_none() {
        return Err(Error::EmptyField("justification"));
      }
      (-tx.amount, category)
    }
  };

  let fields = to_fields(&TransactionFields {
    description,
    amount,
    kind: tx.kind,
    category,
    justification,
  })?;
  ctx.create_record(Collection::Finances, fields).await
}

/// All transactions, newest first.
pub async fn transactions<S: DocumentStore>(ctx: &SessionContext<S>) -> Result<Vec<ListRecord>> {
  ctx.records(Collection::Finances, Some(&Ordering::newest_first())).await
}

/// Sum of all signed amounts.
pub fn balance(records: &[ListRecord]) -> f64 {
  records.iter().filter_map(|r| r.f64_field("amount")).sum()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::panels::testing::session;

  fn expense(amount: f64, category: &str, justification: Option<&str>) -> NewTransaction {
    NewTransaction {
      description: "candles".into(),
      amount,
      kind: TransactionKind::Expense,
      category: Some(category.into()),
      justification: justification.map(Into::into),
    }
  }

  #[tokio::test]
  async fn signs_follow_the_transaction_kind() {
    let ctx = session();
    let income = NewTransaction {
      description: "commission".into(),
      amount: 100.0,
      kind: TransactionKind::Income,
      category: Some("Stability".into()),
      justification: None,
    };
    let stored = add_transaction(&ctx, income).await.unwrap();
    assert_eq!(stored.str_field("category"), Some(INCOME_CATEGORY));

    add_transaction(&ctx, expense(30.5, "Stability", None)).await.unwrap();

    let all = transactions(&ctx).await.unwrap();
    assert_eq!(balance(&all), 69.5);
  }

  #[tokio::test]
  async fn flagged_categories_need_a_justification() {
    let ctx = session();
    let err = add_transaction(&ctx, expense(12.0, "Flow", Some("  "))).await.unwrap_err();
    assert!(matches!(err, Error::EmptyField("justification")));

    let ok = add_transaction(&ctx, expense(12.0, "Flow", Some("signal upgrade")))
      .await
      .unwrap();
    assert_eq!(ok.str_field("justification"), Some("signal upgrade"));
    assert_eq!(ok.f64_field("amount"), Some(-12.0));
  }

  #[tokio::test]
  async fn amounts_must_be_positive_magnitudes() {
    let ctx = session();
    for amount in [0.0, -3.0, f64::NAN] {
      let err = add_transaction(&ctx, expense(amount, "Stability", None)).await.unwrap_err();
      assert!(err.is_validation(), "{amount}");
    }
    assert!(transactions(&ctx).await.unwrap().is_empty());
  }
}

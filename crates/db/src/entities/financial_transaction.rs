//! `SeaORM` Entity for the `financial_transaction` table.
//!
//! One row per committed mutation. A transfer sets both `from_id` and
//! `to_id`; a credit only `to_id`; a debit only `from_id`, with a negative
//! `amount`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "financial_transaction")]
pub struct Model {
    /// Idempotency key of the mutation.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub description: String,
    pub amount: i64,
    pub from_id: Option<Uuid>,
    pub to_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::FromId",
        to = "super::account::Column::Id"
    )]
    FromAccount,
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::ToId",
        to = "super::account::Column::Id"
    )]
    ToAccount,
}

impl ActiveModelBehavior for ActiveModel {}

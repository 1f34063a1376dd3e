use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A client installation, naturally keyed by (`mac`, `hostname`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub mac: String,

    pub hostname: String,

    pub key_code: Option<String>,

    pub active: bool,

    pub activated_at: Option<DateTimeUtc>,

    pub expires_at: Option<DateTimeUtc>,

    pub added_by: Option<i32>,

    pub created_at: DateTimeUtc,
}

impl Model {
    #[must_use]
    pub fn is_expired(&self, now: DateTimeUtc) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Active and not past its expiry.
    #[must_use]
    pub fn is_usable(&self, now: DateTimeUtc) -> bool {
        self.active && !self.is_expired(now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! SeaORM entity model used by the database session store.
//!
//! Maps the `clients` table: one row per client address holding the last
//! renewal time (`cntime`) and the renewal counter (`cn`).

use sea_orm::entity::prelude::*;

/// Clients table entity model.
///
/// `cntime` is a `DATETIME` column. It is bound and read as
/// `YYYY-MM-DD HH:MM:SS` text so that zero dates and other garbage in an
/// existing table surface as unparsable values instead of decode errors.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Client address, primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub ip: String,
    /// Last renewal timestamp
    #[sea_orm(column_type = "DateTime", nullable)]
    pub cntime: Option<String>,
    /// Renewal counter
    pub cn: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QuerySelect, Schema,
};

use crate::error_handling::types::StorageError;
use crate::storage::db_entities::{ActiveModel, Column, Entity};
use crate::storage::storage_trait::SessionStore;
use crate::storage::types::{format_timestamp, parse_timestamp, Session, BASE_COUNTER};

/// Session store backed by an SQL database through SeaORM.
///
/// The adapter is driven synchronously by its host, so the store owns a
/// current-thread runtime and blocks on every query. The connection is opened
/// lazily on first use, reused afterwards and checked with a ping before each
/// operation; a dead connection gets exactly one reconnect attempt.
///
/// `cntime` is written as `YYYY-MM-DD HH:MM:SS` (UTC) and read back cast to
/// text, so the column may be a `DATETIME` as well as a text column.
pub struct DatabaseSessionStore {
    rt: tokio::runtime::Runtime,
    url: String,
    conn: Mutex<Option<DatabaseConnection>>,
    connects: AtomicUsize,
}

/// A `clients` row with `cntime` as text.
#[derive(Debug, FromQueryResult)]
struct ClientRow {
    ip: String,
    cntime: Option<String>,
    cn: i64,
}

impl DatabaseSessionStore {
    /// Prepares a store for `url` without connecting yet.
    pub fn new(url: impl Into<String>) -> Result<Self, StorageError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                error!("Failed to build storage runtime: {}", e);
                StorageError::ConnectionFailed
            })?;
        Ok(Self {
            rt,
            url: url.into(),
            conn: Mutex::new(None),
            connects: AtomicUsize::new(0),
        })
    }

    /// Connection attempts made so far, successful or not.
    pub fn connection_attempts(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn connect(&self) -> Result<DatabaseConnection, StorageError> {
        let attempt = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Connecting to session store (attempt {})", attempt);
        self.rt.block_on(async {
            let db = Database::connect(self.url.as_str()).await.map_err(|e| {
                error!("DB connection failed: {}", e);
                StorageError::ConnectionFailed
            })?;
            let backend = db.get_database_backend();
            let schema = Schema::new(backend);
            let mut stmt = schema.create_table_from_entity(Entity);
            stmt.if_not_exists();
            db.execute(backend.build(&stmt)).await.map_err(|e| {
                error!("Failed to create clients table: {}", e);
                StorageError::WriteFailed
            })?;
            Ok(db)
        })
    }

    fn with_connection<T>(
        &self,
        op: impl FnOnce(&DatabaseConnection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self.conn.lock().map_err(|_| {
            error!("Session store connection lock poisoned");
            StorageError::ConnectionFailed
        })?;

        let alive = match guard.as_ref() {
            Some(db) => self.rt.block_on(db.ping()).is_ok(),
            None => false,
        };
        if !alive {
            if guard.take().is_some() {
                warn!("Session store connection lost, reconnecting");
            }
            *guard = Some(self.connect()?);
            info!("Session store connected");
        }

        match guard.as_ref() {
            Some(db) => op(db),
            None => Err(StorageError::ConnectionFailed),
        }
    }
}

impl SessionStore for DatabaseSessionStore {
    fn lookup(&self, client_key: &str) -> Result<Option<Session>, StorageError> {
        self.with_connection(|db| {
            let row = self
                .rt
                .block_on(
                    Entity::find()
                        .select_only()
                        .column(Column::Ip)
                        .column_as(Expr::cust("CAST(cntime AS CHAR)"), "cntime")
                        .column(Column::Cn)
                        .filter(Column::Ip.eq(client_key))
                        .into_model::<ClientRow>()
                        .one(db),
                )
                .map_err(|e| {
                    error!("Failed to look up client {}: {}", client_key, e);
                    StorageError::ReadFailed
                })?;
            let Some(row) = row else {
                return Ok(None);
            };
            match row.cntime.as_deref().and_then(parse_timestamp) {
                Some(last_seen) => Ok(Some(Session {
                    client_key: row.ip,
                    last_seen,
                    sequence_counter: row.cn,
                })),
                None => {
                    warn!(
                        "Client {} has an unusable timestamp {:?}, treating as new",
                        client_key, row.cntime
                    );
                    Ok(None)
                }
            }
        })
    }

    fn insert(&self, client_key: &str, now: DateTime<Utc>) -> Result<(), StorageError> {
        self.with_connection(|db| {
            let model = ActiveModel {
                ip: Set(client_key.to_owned()),
                cntime: Set(Some(format_timestamp(now))),
                cn: Set(BASE_COUNTER),
            };
            self.rt
                .block_on(
                    Entity::insert(model)
                        .on_conflict(
                            OnConflict::column(Column::Ip)
                                .update_columns([Column::Cntime, Column::Cn])
                                .to_owned(),
                        )
                        .exec_without_returning(db),
                )
                .map_err(|e| {
                    error!("Failed to insert client {}: {}", client_key, e);
                    StorageError::WriteFailed
                })?;
            debug!("Inserted session for {}", client_key);
            Ok(())
        })
    }

    fn touch(
        &self,
        client_key: &str,
        counter: i64,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.with_connection(|db| {
            let result = self
                .rt
                .block_on(
                    Entity::update_many()
                        .col_expr(Column::Cntime, Expr::value(format_timestamp(now)))
                        .col_expr(Column::Cn, Expr::value(counter))
                        .filter(Column::Ip.eq(client_key))
                        .exec(db),
                )
                .map_err(|e| {
                    error!("Failed to update client {}: {}", client_key, e);
                    StorageError::WriteFailed
                })?;
            if result.rows_affected == 0 {
                warn!("No session row to update for {}", client_key);
            }
            Ok(())
        })
    }
}

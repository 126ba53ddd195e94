use crate::schema;
use crate::schema::drafts::dsl as drafts_dsl;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use flow_sync::{DraftMedium, DraftStore, SyncError};
use log::debug;
use std::sync::Arc;
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;
/// Medio de borradores sobre SQLite. Una fila por clave `wf:draft:{flowId}`
/// con el JSON del borrador en `payload`.
pub struct DieselDraftMedium {
  pool: Arc<DbPool>,
}
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::drafts)]
struct DraftRow {
  pub draft_key: String,
  pub payload: String,
  pub updated_at_ts: i64,
}
impl DieselDraftMedium {
  /// Abre (o crea) la base y aplica las migraciones embebidas.
  pub fn new(database_url: &str) -> Result<Self, SyncError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder().max_size(4)
                              .build(manager)
                              .map_err(|e| SyncError::Storage(format!("no se pudo crear el pool de conexiones: {}", e)))?;
    let medium = DieselDraftMedium { pool: Arc::new(pool) };
    let mut c = medium.conn()?;
    let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut c);
    let _ = diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(&mut c);
    c.run_pending_migrations(MIGRATIONS)
     .map_err(|e| SyncError::Storage(format!("migraciones: {}", e)))?;
    debug!("medio de borradores listo en {}", database_url);
    Ok(medium)
  }
  fn conn(&self) -> Result<DbConn, SyncError> {
    self.pool.get().map_err(|e| SyncError::Storage(format!("pool: {}", e)))
  }
  /// Marca de tiempo (ms desde epoch) de la última escritura de `key`.
  pub fn stamp_of(&self, key: &str) -> Result<Option<i64>, SyncError> {
    let mut conn = self.conn()?;
    map_db_err(drafts_dsl::drafts.filter(drafts_dsl::draft_key.eq(key))
                                 .select(drafts_dsl::updated_at_ts)
                                 .first::<i64>(&mut conn)
                                 .optional())
  }

  /// Número de borradores guardados (útil para inspección y pruebas).
  pub fn count(&self) -> Result<i64, SyncError> {
    let mut conn = self.conn()?;
    map_db_err(drafts_dsl::drafts.count().get_result(&mut conn))
  }
}
fn map_db_err<T>(res: std::result::Result<T, diesel::result::Error>) -> Result<T, SyncError> {
  res.map_err(|e| SyncError::Storage(format!("db: {}", e)))
}
fn now_ts() -> i64 {
  Utc::now().timestamp_millis()
}
impl DraftMedium for DieselDraftMedium {
  fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
    let mut conn = self.conn()?;
    map_db_err(drafts_dsl::drafts.filter(drafts_dsl::draft_key.eq(key))
                                 .select(drafts_dsl::payload)
                                 .first::<String>(&mut conn)
                                 .optional())
  }
  fn put(&self, key: &str, value: &str) -> Result<(), SyncError> {
    let mut conn = self.conn()?;
    let row = DraftRow { draft_key: key.to_string(), payload: value.to_string(), updated_at_ts: now_ts() };
    map_db_err(diesel::replace_into(drafts_dsl::drafts).values(&row).execute(&mut conn))?;
    Ok(())
  }
  fn remove(&self, key: &str) -> Result<(), SyncError> {
    let mut conn = self.conn()?;
    map_db_err(diesel::delete(drafts_dsl::drafts.filter(drafts_dsl::draft_key.eq(key))).execute(&mut conn))?;
    Ok(())
  }
}

pub const DEFAULT_DRAFT_DB_URL: &str = "stepflow-drafts.db";

/// Construye el almacén de borradores a partir del entorno (`DRAFT_DB_URL`).
/// Sin variable se usa un fichero SQLite local en el directorio actual.
pub fn new_draft_repo_from_env() -> Result<DraftStore<DieselDraftMedium>, SyncError> {
  dotenvy::dotenv().ok();
  let url = std::env::var("DRAFT_DB_URL").unwrap_or_else(|_| DEFAULT_DRAFT_DB_URL.to_string());
  let medium = DieselDraftMedium::new(&url)?;
  Ok(DraftStore::new(medium))
}

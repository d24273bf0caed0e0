use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use strum::EnumString;

use crate::core::config;
use crate::core::error::{store_unavailable, AppError, AppResult};
use crate::core::types::{Plan, ProfileDefaults, UserProfile};
use crate::storage::migrations::run_migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Profile attributes that can be changed through [`ProfileStore::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ProfileField {
    Plan,
    Counter,
    Language,
}

/// Create a new database connection pool
///
/// Every connection gets a busy timeout; the schema is migrated on the first one.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
pub fn create_pool(database_path: &str) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(config::store::busy_timeout()));
    let pool = Pool::builder()
        .max_size(config::store::POOL_SIZE)
        .build(manager)
        .map_err(store_unavailable)?;

    let mut conn = pool.get().map_err(store_unavailable)?;
    run_migrations(&mut conn).map_err(|e| AppError::StoreUnavailable(format!("{:#}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection goes back to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    pool.get().map_err(store_unavailable)
}

/// One row per user in the `users` table.
///
/// Every read goes to SQLite; nothing is cached in memory. All statements are
/// parameterized.
#[derive(Clone)]
pub struct ProfileStore {
    pool: DbPool,
}

impl ProfileStore {
    /// Opens (and migrates) the database at `database_path`.
    pub fn open(database_path: &str) -> AppResult<Self> {
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }
        Ok(Self::from_pool(create_pool(database_path)?))
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> AppResult<DbConnection> {
        get_connection(&self.pool)
    }

    /// Inserts a profile with `defaults` unless the id already has one.
    ///
    /// Returns `true` when a row was created. Calling it again never changes
    /// an existing row.
    pub fn upsert(&self, id: i64, defaults: &ProfileDefaults) -> AppResult<bool> {
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO users (id, plan, counter, language) VALUES (?1, ?2, ?3, ?4)",
                params![id, defaults.plan, defaults.counter, defaults.language],
            )
            .map_err(store_unavailable)?;
        if inserted > 0 {
            log::info!("Created profile for user {}", id);
        }
        Ok(inserted > 0)
    }

    /// Reads the profile of `id`.
    ///
    /// # Errors
    /// `NotFound` if the user never started the bot.
    pub fn get(&self, id: i64) -> AppResult<UserProfile> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, plan, counter, language FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(UserProfile {
                    id: row.get(0)?,
                    plan: row.get(1)?,
                    counter: row.get(2)?,
                    language: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(store_unavailable)?
        .ok_or(AppError::NotFound(id))
    }

    /// Sets a single attribute from its textual value.
    ///
    /// # Errors
    /// * `InvalidField` - `field` is not `plan`, `counter` or `language`, or the value does not fit it
    /// * `NotFound` - no row for `id`
    pub fn update(&self, id: i64, field: &str, value: &str) -> AppResult<()> {
        let field: ProfileField = field
            .parse()
            .map_err(|_| AppError::InvalidField(field.to_string()))?;

        let conn = self.conn()?;
        let changed = match field {
            ProfileField::Plan => {
                let plan: Plan = value.parse().map_err(AppError::InvalidField)?;
                conn.execute("UPDATE users SET plan = ?1 WHERE id = ?2", params![plan, id])
            }
            ProfileField::Counter => {
                let counter: i64 = value
                    .parse()
                    .map_err(|_| AppError::InvalidField(format!("counter = '{}'", value)))?;
                conn.execute("UPDATE users SET counter = ?1 WHERE id = ?2", params![counter, id])
            }
            ProfileField::Language => {
                if value.trim().is_empty() {
                    return Err(AppError::InvalidField("language = ''".to_string()));
                }
                conn.execute("UPDATE users SET language = ?1 WHERE id = ?2", params![value, id])
            }
        }
        .map_err(store_unavailable)?;

        if changed == 0 {
            return Err(AppError::NotFound(id));
        }
        log::debug!("User {}: {:?} = {}", id, field, value);
        Ok(())
    }

    /// Sets the language code of `id`.
    pub fn set_language(&self, id: i64, language: &str) -> AppResult<()> {
        self.update(id, "language", language)
    }

    /// Decrements the usage counter in one statement and returns the new value.
    ///
    /// There is no floor: the counter goes below zero.
    pub fn decrement_counter(&self, id: i64) -> AppResult<i64> {
        let conn = self.conn()?;
        conn.query_row(
            "UPDATE users SET counter = counter - 1 WHERE id = ?1 RETURNING counter",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(store_unavailable)?
        .ok_or(AppError::NotFound(id))
    }

    /// Number of stored profiles.
    pub fn count(&self) -> AppResult<i64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(store_unavailable)
    }
}

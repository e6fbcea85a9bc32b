use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::{IdIssuer, ProductId};
use crate::config::DatabaseConfig;
use crate::error::IssuanceError;

/// Idle connections kept for reuse.
const MAX_IDLE: usize = 8;

#[derive(Debug, Clone)]
pub struct IssuerOptions {
    pub table: String,
    /// Bound on one attempt, from checkout to the returned key.
    ///
    /// SQLite's busy wait stops at three quarters of this so a locked store
    /// normally reports `Busy` first. An insert still running when the bound
    /// fires may commit anyway; its id is then never handed out.
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl IssuerOptions {
    fn busy_timeout(&self) -> Duration {
        self.timeout * 3 / 4
    }
}

impl From<&DatabaseConfig> for IssuerOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            table: config.table.clone(),
            timeout: config.timeout(),
            max_attempts: config.max_attempts,
            retry_delay: config.retry_delay(),
        }
    }
}

/// Issues ids from an `INTEGER PRIMARY KEY AUTOINCREMENT` column.
///
/// Each id is the key generated by a single `INSERT ... RETURNING id`, so ids
/// stay distinct across issuers sharing the file and across restarts.
/// Concurrent calls each check out their own connection; the store's own
/// locking is the only coordination between them.
#[derive(Clone)]
pub struct SqliteIdIssuer {
    path: Arc<str>,
    idle: Arc<Mutex<Vec<Connection>>>,
    insert_sql: Arc<str>,
    options: IssuerOptions,
}

impl SqliteIdIssuer {
    /// Opens an existing store. The file and table must already exist.
    pub fn open(config: &DatabaseConfig) -> Result<Self, IssuanceError> {
        Self::with_options(&config.path, IssuerOptions::from(config))
    }

    pub fn with_options(path: &str, options: IssuerOptions) -> Result<Self, IssuanceError> {
        if !is_identifier(&options.table) {
            return Err(IssuanceError::InvalidTableName(options.table));
        }
        let conn = connect(path, options.busy_timeout())?;

        let insert_sql = format!("INSERT INTO {} (source_label) VALUES (?1) RETURNING id", options.table);
        // Fails here, not on first use, when the table or column is missing.
        conn.prepare_cached(&insert_sql)?;

        Ok(Self {
            path: path.into(),
            idle: Arc::new(Mutex::new(vec![conn])),
            insert_sql: insert_sql.into(),
            options,
        })
    }

    fn checkout(&self) -> Option<Connection> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop()
    }

    async fn issue_once(&self, label: &str) -> Result<ProductId, IssuanceError> {
        let idle = self.idle.clone();
        let pooled = self.checkout();
        let path = self.path.clone();
        let sql = self.insert_sql.clone();
        let busy = self.options.busy_timeout();
        let label = label.to_string();

        let attempt = tokio::task::spawn_blocking(move || {
            let conn = match pooled {
                Some(conn) => conn,
                None => connect(&path, busy)?,
            };
            let issued = insert(&conn, &sql, &label);
            checkin(&idle, conn);
            issued
        });

        timeout(self.options.timeout, attempt)
            .await
            .map_err(|_| IssuanceError::Timeout(self.options.timeout))?
            .map_err(|e| IssuanceError::Task(e.to_string()))?
    }
}

#[async_trait]
impl IdIssuer for SqliteIdIssuer {
    async fn issue(&self, source_label: &str) -> Result<ProductId, IssuanceError> {
        let label = source_label.trim();
        let max_attempts = self.options.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.issue_once(label).await {
                Ok(id) => {
                    debug!(id = id.get(), label, attempt, "id issued");
                    return Ok(id);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    warn!(label, attempt, error = %err, "transient issuance failure, retrying");
                    sleep(jittered(self.options.retry_delay)).await;
                    attempt += 1;
                }
                Err(err) if err.is_transient() => {
                    return Err(IssuanceError::Exhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Opens without `CREATE`: a missing file is an error, never a new store.
fn connect(path: &str, busy: Duration) -> Result<Connection, IssuanceError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)?;
    conn.busy_timeout(busy)?;
    Ok(conn)
}

fn checkin(idle: &Mutex<Vec<Connection>>, conn: Connection) {
    let mut idle = idle.lock().unwrap_or_else(PoisonError::into_inner);
    if idle.len() < MAX_IDLE {
        idle.push(conn);
    }
}

fn insert(conn: &Connection, sql: &str, label: &str) -> Result<ProductId, IssuanceError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let key: Option<i64> = stmt.query_row(params![label], |row| row.get(0)).optional()?;
    let key = key.ok_or(IssuanceError::NoGeneratedKey)?;
    ProductId::new(key).ok_or(IssuanceError::InvalidKey(key))
}

/// `base` spread over ±50%.
fn jittered(base: Duration) -> Duration {
    let millis = base.as_millis() as u64;
    if millis < 2 {
        return base;
    }
    let mut rng = StdRng::from_entropy();
    Duration::from_millis(rng.gen_range(millis / 2..=millis + millis / 2))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

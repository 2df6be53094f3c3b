//! libSQL backend. Everything the service persists lives in one local
//! database.
//!
//! Supports local file and in-memory databases. The signed-in session is
//! persisted in `settings` and mirrored in memory so `current_session()`
//! never touches the database.

use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use rand::Rng;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::directory::WorkerProfile;
use crate::error::{DatabaseError, ProviderError};
use crate::requests::{JobRequest, RequestStatus};
use crate::session::{Role, Session};
use crate::store::migrations;
use crate::store::traits::{IdentityProvider, ProfileStore, RequestStore};

/// Settings key holding the signed-in session.
const CURRENT_SESSION_KEY: &str = "current_session";

/// Accounts shorter than this are refused by the provider itself.
const PROVIDER_MIN_PASSWORD_LEN: usize = 6;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

const WORKER_COLUMNS: &str = "id, name, gender, work_type, institute, contact, location";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    email_pattern: Regex,
    current: RwLock<Option<Session>>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::open(db).await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        Self::open(db).await
    }

    async fn open(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        let email_pattern = Regex::new(EMAIL_PATTERN)
            .map_err(|e| DatabaseError::Pool(format!("Invalid email pattern: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
            email_pattern,
            current: RwLock::new(None),
        };
        migrations::run_migrations(&backend.conn).await?;
        backend.restore_session().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Settings ────────────────────────────────────────────────────

    pub async fn get_setting(&self, key: &str) -> Result<Option<Value>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT value FROM settings WHERE key = ?1", params![key])
            .await
            .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row.get(0).unwrap_or_else(|_| "null".to_string());
                Ok(Some(serde_json::from_str(&value_str).unwrap_or(Value::Null)))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_setting: {e}"))),
        }
    }

    pub async fn set_setting(&self, key: &str, value: &Value) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let value_str = serde_json::to_string(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, value_str, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_setting: {e}")))?;
        Ok(())
    }

    pub async fn delete_setting(&self, key: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM settings WHERE key = ?1", params![key])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_setting: {e}")))?;
        Ok(count > 0)
    }

    // ── Accounts ────────────────────────────────────────────────────

    /// Create an account with an explicit role and sign it in.
    ///
    /// `sign_up` always creates `Role::User`; worker accounts are created
    /// through here.
    pub async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<Session, ProviderError> {
        let email = email.trim();
        if !self.email_pattern.is_match(email) {
            return Err(ProviderError::Rejected("INVALID_EMAIL".into()));
        }
        if password.expose_secret().chars().count() < PROVIDER_MIN_PASSWORD_LEN {
            return Err(ProviderError::Rejected(format!(
                "WEAK_PASSWORD : Password should be at least {PROVIDER_MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.find_account(email).await.map_err(unavailable)?.is_some() {
            return Err(ProviderError::Rejected("EMAIL_EXISTS".into()));
        }

        let id = Uuid::new_v4().to_string();
        let salt = hex::encode(rand::thread_rng().r#gen::<[u8; 16]>());
        let hash = hash_password(&salt, password);
        let now = Utc::now().to_rfc3339();

        self.conn()
            .execute(
                "INSERT INTO accounts (id, email, password_hash, salt, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id.as_str(), email, hash, salt, role.as_str(), now],
            )
            .await
            .map_err(|e| {
                // Lost a race with a concurrent sign-up for the same email.
                if e.to_string().contains("UNIQUE") {
                    ProviderError::Rejected("EMAIL_EXISTS".into())
                } else {
                    unavailable(DatabaseError::Query(format!("create_account: {e}")))
                }
            })?;

        info!(user_id = %id, role = %role, "Account created");
        let session = Session::new(id, role);
        self.start_session(&session).await?;
        Ok(session)
    }

    async fn find_account(&self, email: &str) -> Result<Option<AccountRow>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, password_hash, salt, role FROM accounts WHERE email = ?1",
                params![email],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("find_account: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let role_str: String = row
                    .get(3)
                    .map_err(|e| DatabaseError::Query(format!("find_account: {e}")))?;
                Ok(Some(AccountRow {
                    id: row
                        .get(0)
                        .map_err(|e| DatabaseError::Query(format!("find_account: {e}")))?,
                    password_hash: row
                        .get(1)
                        .map_err(|e| DatabaseError::Query(format!("find_account: {e}")))?,
                    salt: row
                        .get(2)
                        .map_err(|e| DatabaseError::Query(format!("find_account: {e}")))?,
                    role: role_str.parse().map_err(DatabaseError::Serialization)?,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("find_account: {e}"))),
        }
    }

    async fn start_session(&self, session: &Session) -> Result<(), ProviderError> {
        let value = serde_json::to_value(session)
            .map_err(|e| unavailable(DatabaseError::Serialization(e.to_string())))?;
        self.set_setting(CURRENT_SESSION_KEY, &value)
            .await
            .map_err(unavailable)?;
        self.cache_session(Some(session.clone()));
        Ok(())
    }

    async fn restore_session(&self) -> Result<(), DatabaseError> {
        let Some(value) = self.get_setting(CURRENT_SESSION_KEY).await? else {
            return Ok(());
        };
        match serde_json::from_value::<Session>(value) {
            Ok(session) => {
                debug!(user_id = %session.user_id, "Persisted session found");
                self.cache_session(Some(session));
            }
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted session");
                self.delete_setting(CURRENT_SESSION_KEY).await?;
            }
        }
        Ok(())
    }

    fn cache_session(&self, session: Option<Session>) {
        match self.current.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

struct AccountRow {
    id: String,
    password_hash: String,
    salt: String,
    role: Role,
}

// ── Helper functions ────────────────────────────────────────────────

/// Hex SHA-256 of `salt || password`.
fn hash_password(salt: &str, password: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}

/// Storage trouble reaches the session layer as "provider unavailable".
fn unavailable(err: DatabaseError) -> ProviderError {
    ProviderError::Unavailable(err.to_string())
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| DatabaseError::Serialization(format!("bad timestamp {s:?}: {e}")))
}

fn str_to_request_status(s: &str) -> Result<RequestStatus, DatabaseError> {
    s.parse().map_err(DatabaseError::Serialization)
}

/// Column order matches WORKER_COLUMNS.
fn row_to_worker(row: &libsql::Row) -> Result<WorkerProfile, libsql::Error> {
    Ok(WorkerProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        gender: row.get(2)?,
        work_type: row.get(3)?,
        institute: row.get(4)?,
        contact: row.get(5)?,
        location: row.get(6)?,
    })
}

fn row_to_request(row: &libsql::Row) -> Result<JobRequest, DatabaseError> {
    let get = |idx: i32| -> Result<String, DatabaseError> {
        row.get::<String>(idx)
            .map_err(|e| DatabaseError::Query(format!("row_to_request: {e}")))
    };
    let id_str = get(0)?;
    Ok(JobRequest {
        id: Uuid::parse_str(&id_str).map_err(|e| DatabaseError::Serialization(e.to_string()))?,
        requester_id: get(1)?,
        target_worker_id: get(2)?,
        status: str_to_request_status(&get(3)?)?,
        created_at: parse_datetime(&get(4)?)?,
    })
}

// ── Trait implementations ───────────────────────────────────────────

#[async_trait]
impl IdentityProvider for LibSqlBackend {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, ProviderError> {
        let Some(account) = self.find_account(email.trim()).await.map_err(unavailable)? else {
            return Err(ProviderError::Rejected("EMAIL_NOT_FOUND".into()));
        };
        if hash_password(&account.salt, password) != account.password_hash {
            debug!(user_id = %account.id, "Password mismatch");
            return Err(ProviderError::Rejected("INVALID_PASSWORD".into()));
        }
        let session = Session::new(account.id, account.role);
        self.start_session(&session).await?;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Session, ProviderError> {
        self.create_account(email, password, Role::User).await
    }

    fn current_session(&self) -> Option<Session> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.delete_setting(CURRENT_SESSION_KEY)
            .await
            .map_err(unavailable)?;
        self.cache_session(None);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for LibSqlBackend {
    async fn list_workers(&self) -> Result<Vec<WorkerProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {WORKER_COLUMNS} FROM workers ORDER BY position ASC"),
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_workers: {e}")))?;

        let mut workers = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_workers: {e}")))?
        {
            workers.push(
                row_to_worker(&row).map_err(|e| DatabaseError::Query(format!("list_workers: {e}")))?,
            );
        }
        Ok(workers)
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Map<String, Value>>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT data FROM profiles WHERE id = ?1", params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let data: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;
                match serde_json::from_str::<Value>(&data)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?
                {
                    Value::Object(map) => Ok(Some(map)),
                    other => Err(DatabaseError::Serialization(format!(
                        "profile {id} is not an object: {other}"
                    ))),
                }
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_profile: {e}"))),
        }
    }

    async fn set_profile(&self, id: &str, fields: &Map<String, Value>) -> Result<(), DatabaseError> {
        let mut merged = self.get_profile(id).await?.unwrap_or_default();
        merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        let data = serde_json::to_string(&Value::Object(merged))
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        self.conn()
            .execute(
                "INSERT INTO profiles (id, data, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (id) DO UPDATE SET data = ?2, updated_at = ?3",
                params![id, data, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_profile: {e}")))?;

        debug!(profile_id = %id, fields = fields.len(), "Profile written");
        Ok(())
    }

    async fn upsert_worker(&self, worker: &WorkerProfile) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO workers (id, name, gender, work_type, institute, contact, location, position, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                         (SELECT COALESCE(MAX(position), -1) + 1 FROM workers), ?8)
                 ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    gender = excluded.gender,
                    work_type = excluded.work_type,
                    institute = excluded.institute,
                    contact = excluded.contact,
                    location = excluded.location,
                    updated_at = excluded.updated_at",
                params![
                    worker.id.as_str(),
                    worker.name.as_str(),
                    worker.gender.as_str(),
                    worker.work_type.as_str(),
                    worker.institute.as_str(),
                    worker.contact.as_str(),
                    worker.location.as_str(),
                    now
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_worker: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl RequestStore for LibSqlBackend {
    async fn save_request(&self, request: &JobRequest) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO job_requests (id, requester_id, target_worker_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    request.id.to_string(),
                    request.requester_id.as_str(),
                    request.target_worker_id.as_str(),
                    request.status.to_string(),
                    request.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_request: {e}")))?;

        info!(
            request_id = %request.id,
            worker = %request.target_worker_id,
            "Job request stored"
        );
        Ok(())
    }

    async fn requests_for_worker(&self, worker_id: &str) -> Result<Vec<JobRequest>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, requester_id, target_worker_id, status, created_at
                 FROM job_requests WHERE target_worker_id = ?1
                 ORDER BY created_at DESC",
                params![worker_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("requests_for_worker: {e}")))?;

        let mut requests = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("requests_for_worker: {e}")))?
        {
            requests.push(row_to_request(&row)?);
        }
        Ok(requests)
    }
}

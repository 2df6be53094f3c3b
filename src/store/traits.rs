//! Collaborator traits for the identity provider and the document stores.
//!
//! The core only ever talks to these traits. `LibSqlBackend` implements all
//! three for the bundled server; tests substitute stubs.

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::directory::WorkerProfile;
use crate::error::{DatabaseError, ProviderError};
use crate::requests::JobRequest;
use crate::session::Session;

/// Account authority: creates accounts and verifies credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and start a session.
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, ProviderError>;

    /// Create an account and start a session for it.
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Session, ProviderError>;

    /// Session left over from a previous run, if any. Never blocks.
    fn current_session(&self) -> Option<Session>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), ProviderError>;
}

/// Profile documents and the worker directory.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// All workers in directory order.
    async fn list_workers(&self) -> Result<Vec<WorkerProfile>, DatabaseError>;

    /// Fetch a profile document by id.
    async fn get_profile(&self, id: &str) -> Result<Option<Map<String, Value>>, DatabaseError>;

    /// Write (merge) fields into the profile document `id`.
    async fn set_profile(&self, id: &str, fields: &Map<String, Value>) -> Result<(), DatabaseError>;

    /// Insert or replace a worker directory entry.
    async fn upsert_worker(&self, worker: &WorkerProfile) -> Result<(), DatabaseError>;
}

/// Destination for created job requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn save_request(&self, request: &JobRequest) -> Result<(), DatabaseError>;

    /// Requests addressed to a worker, newest first.
    async fn requests_for_worker(&self, worker_id: &str) -> Result<Vec<JobRequest>, DatabaseError>;
}

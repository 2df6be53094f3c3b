//! Job request initiation, the guarded hand-off from directory to request store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::directory::can_request;
use crate::error::GuardError;

/// Minimal record asking `target_worker_id` to take a job from `requester_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIntent {
    pub requester_id: String,
    pub target_worker_id: String,
}

/// Create an intent, refusing self-requests.
pub fn create_request(
    requester_id: &str,
    target_worker_id: &str,
) -> Result<RequestIntent, GuardError> {
    if !can_request(requester_id, target_worker_id) {
        warn!(user_id = %requester_id, "Refused self job request");
        return Err(GuardError::SelfRequestNotAllowed);
    }
    info!(
        requester = %requester_id,
        worker = %target_worker_id,
        "Job request created"
    );
    Ok(RequestIntent {
        requester_id: requester_id.to_string(),
        target_worker_id: target_worker_id.to_string(),
    })
}

/// Lifecycle status of a stored request. Only creation is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// A request intent as handed to the request store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub id: Uuid,
    pub requester_id: String,
    pub target_worker_id: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl RequestIntent {
    /// Stamp the intent with an id and creation time.
    pub fn into_job_request(self) -> JobRequest {
        JobRequest {
            id: Uuid::new_v4(),
            requester_id: self.requester_id,
            target_worker_id: self.target_worker_id,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

//! Navigation intents: abstract "go to" events consumed by an external router.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::session::Role;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 64;

/// Named screens the router knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Destination {
    Welcome,
    Login,
    SignUp,
    Home,
    Profile,
    Settings,
    UserRequests,
    WorkerRequests,
    WorkerRegister,
    UserInbox,
    WorkerInbox,
    RequestJob {
        #[serde(rename = "workerId")]
        worker_id: String,
    },
}

impl Destination {
    /// Router path for this destination.
    pub fn route(&self) -> String {
        match self {
            Self::Welcome => "welcome".to_string(),
            Self::Login => "login".to_string(),
            Self::SignUp => "signup".to_string(),
            Self::Home => "home".to_string(),
            Self::Profile => "profile".to_string(),
            Self::Settings => "setting".to_string(),
            Self::UserRequests => "user_requests".to_string(),
            Self::WorkerRequests => "worker_requests".to_string(),
            Self::WorkerRegister => "worker_register".to_string(),
            Self::UserInbox => "user_inbox".to_string(),
            Self::WorkerInbox => "worker_inbox".to_string(),
            Self::RequestJob { worker_id } => format!("request_job/{worker_id}"),
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.route())
    }
}

/// A request to move the UI somewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationIntent {
    pub destination: Destination,
    /// Drop the back stack so "back" cannot return past this screen.
    pub clear_history: bool,
}

impl NavigationIntent {
    pub fn to(destination: Destination) -> Self {
        Self {
            destination,
            clear_history: false,
        }
    }

    pub fn replace_with(destination: Destination) -> Self {
        Self {
            destination,
            clear_history: true,
        }
    }
}

/// A labelled button on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HomeAction {
    pub label: &'static str,
    pub destination: Destination,
}

/// Role-specific home screen actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeActions {
    pub my_requests: HomeAction,
    pub secondary: HomeAction,
    pub inbox: Destination,
}

impl Role {
    /// Buttons and inbox route shown on the home screen for this role.
    pub fn home_actions(self) -> HomeActions {
        let my_requests = HomeAction {
            label: "My Requests",
            destination: Destination::UserRequests,
        };
        match self {
            Role::User => HomeActions {
                my_requests,
                secondary: HomeAction {
                    label: "Need Job?",
                    destination: Destination::WorkerRegister,
                },
                inbox: Destination::UserInbox,
            },
            Role::Worker => HomeActions {
                my_requests,
                secondary: HomeAction {
                    label: "Works",
                    destination: Destination::WorkerRequests,
                },
                inbox: Destination::WorkerInbox,
            },
        }
    }
}

/// Fan-out of navigation intents to any number of router clients.
pub struct NavigationBus {
    tx: broadcast::Sender<NavigationIntent>,
}

impl NavigationBus {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self { tx })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NavigationIntent> {
        self.tx.subscribe()
    }

    /// Publish an intent. Having no listeners is fine.
    pub fn publish(&self, intent: NavigationIntent) {
        debug!(
            destination = %intent.destination,
            clear_history = intent.clear_history,
            "Navigation intent"
        );
        let _ = self.tx.send(intent);
    }
}

//! Runs authentication tickets off the caller's task.

use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::AuthError;
use crate::navigation::{NavigationBus, NavigationIntent};

use super::machine::{AuthTicket, SessionMachine};

/// Run `ticket` on a spawned task and resolve it into `machine`.
///
/// Only a weak reference is held while the provider call is outstanding. If
/// the machine has been dropped by then, the outcome is discarded and the
/// task yields `None`. Otherwise it yields what `resolve` returned, and a
/// successful navigation is also published on `bus` when one is given.
pub fn spawn_ticket(
    machine: &Arc<Mutex<SessionMachine>>,
    ticket: AuthTicket,
    bus: Option<Arc<NavigationBus>>,
) -> JoinHandle<Option<Result<NavigationIntent, AuthError>>> {
    let weak: Weak<Mutex<SessionMachine>> = Arc::downgrade(machine);
    tokio::spawn(async move {
        let outcome = ticket.run().await;
        let Some(machine) = weak.upgrade() else {
            debug!(attempt = outcome.attempt, "Session machine gone, dropping outcome");
            return None;
        };
        let resolved = machine.lock().await.resolve(outcome);
        if let (Some(Ok(intent)), Some(bus)) = (&resolved, bus) {
            bus.publish(intent.clone());
        }
        resolved
    })
}

//! Authentication state and the machine that drives it.

pub mod classify;
pub mod driver;
pub mod form;
pub mod machine;
pub mod state;

pub use classify::classify;
pub use driver::spawn_ticket;
pub use machine::{AuthForm, AuthOutcome, AuthResult, AuthTicket, RetainedInput, SessionMachine};
pub use state::{Role, Session, SessionState};

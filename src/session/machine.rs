//! Session state machine.
//!
//! Submitting a form is split in two so that the machine is never borrowed
//! across a network call:
//!
//! 1. `submit_sign_in` / `submit_sign_up` validate locally and return an
//!    [`AuthTicket`], leaving the machine in `Authenticating`.
//! 2. The ticket is `run()` anywhere (it owns everything it needs) and the
//!    resulting [`AuthOutcome`] is fed back through [`SessionMachine::resolve`],
//!    which returns the navigation or the classified error for that attempt.
//!
//! While a ticket is outstanding, further submits are rejected. Outcomes
//! from anything but the current attempt are dropped.

use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_MIN_PASSWORD_LEN;
use crate::error::{AuthError, SubmitRejection};
use crate::navigation::{Destination, NavigationIntent};
use crate::store::{IdentityProvider, ProfileStore};

use super::classify::classify;
use super::form::{validate_sign_in, validate_sign_up};
use super::state::{Role, Session, SessionState};

/// Which authentication form the user is opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    SignUp,
}

/// Form input kept after a failure so the user can correct and resubmit.
#[derive(Debug)]
pub struct RetainedInput {
    pub name: Option<String>,
    pub email: String,
    pub password: SecretString,
}

/// An identity that was created but whose profile document never got written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrphanedAccount {
    session: Session,
    email: String,
}

enum AuthRequest {
    SignIn {
        email: String,
        password: SecretString,
    },
    SignUp {
        name: String,
        email: String,
        password: SecretString,
    },
    /// Identity exists already. The password is re-verified, then only the
    /// profile write is retried.
    RetryProfileWrite {
        session: Session,
        name: String,
        email: String,
        password: SecretString,
    },
}

/// Result of running a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    SignedIn(Session),
    Failed(AuthError),
    /// Account created, profile write failed.
    ProfileWriteFailed { session: Session, detail: String },
}

/// Completed network work, ready to be applied with `resolve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub attempt: u64,
    pub email: String,
    pub result: AuthResult,
}

/// One in-flight authentication attempt.
pub struct AuthTicket {
    attempt: u64,
    request: AuthRequest,
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
}

impl AuthTicket {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Perform the provider call(s).
    ///
    /// Sign-up writes the profile only after the identity call succeeded.
    pub async fn run(self) -> AuthOutcome {
        let attempt = self.attempt;
        match self.request {
            AuthRequest::SignIn { email, password } => {
                let result = match self.identity.sign_in(&email, &password).await {
                    Ok(session) => AuthResult::SignedIn(session),
                    Err(e) => {
                        debug!(error = %e, "Sign-in rejected by provider");
                        AuthResult::Failed(classify(&e))
                    }
                };
                AuthOutcome {
                    attempt,
                    email,
                    result,
                }
            }
            AuthRequest::SignUp {
                name,
                email,
                password,
            } => {
                let session = match self.identity.sign_up(&email, &password).await {
                    Ok(session) => session,
                    Err(e) => {
                        debug!(error = %e, "Sign-up rejected by provider");
                        return AuthOutcome {
                            attempt,
                            email,
                            result: AuthResult::Failed(classify(&e)),
                        };
                    }
                };
                let result = write_profile(self.profiles.as_ref(), session, &name, &email).await;
                AuthOutcome {
                    attempt,
                    email,
                    result,
                }
            }
            AuthRequest::RetryProfileWrite {
                session,
                name,
                email,
                password,
            } => {
                let result = match self.identity.sign_in(&email, &password).await {
                    Ok(verified) if verified.user_id == session.user_id => {
                        write_profile(self.profiles.as_ref(), verified, &name, &email).await
                    }
                    Ok(verified) => {
                        warn!(
                            expected = %session.user_id,
                            got = %verified.user_id,
                            "Re-verified identity does not match the pending account"
                        );
                        AuthResult::Failed(AuthError::InvalidCredentials)
                    }
                    Err(e) => {
                        debug!(error = %e, "Pending account rejected the retry password");
                        AuthResult::Failed(classify(&e))
                    }
                };
                AuthOutcome {
                    attempt,
                    email,
                    result,
                }
            }
        }
    }
}

/// Fields of a freshly created user profile document.
pub fn new_user_profile(user_id: &str, name: &str, email: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("id".into(), Value::String(user_id.to_string()));
    fields.insert("name".into(), Value::String(name.to_string()));
    fields.insert("email".into(), Value::String(email.to_string()));
    fields.insert("role".into(), Value::String(Role::User.as_str().to_string()));
    fields.insert("createdAt".into(), Value::String(Utc::now().to_rfc3339()));
    fields
}

async fn write_profile(
    profiles: &dyn ProfileStore,
    session: Session,
    name: &str,
    email: &str,
) -> AuthResult {
    let fields = new_user_profile(&session.user_id, name, email);
    match profiles.set_profile(&session.user_id, &fields).await {
        Ok(()) => AuthResult::SignedIn(session),
        Err(e) => {
            warn!(user_id = %session.user_id, error = %e, "Profile write failed after sign-up");
            AuthResult::ProfileWriteFailed {
                session,
                detail: e.to_string(),
            }
        }
    }
}

/// Owns the process-wide authentication state.
pub struct SessionMachine {
    state: SessionState,
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileStore>,
    min_password_len: usize,
    attempt: u64,
    retained: Option<RetainedInput>,
    orphaned: Option<OrphanedAccount>,
}

impl SessionMachine {
    /// Start in `Authenticated` if the provider still has a session.
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Self {
        let state = match identity.current_session() {
            Some(session) => {
                info!(user_id = %session.user_id, role = %session.role, "Restored existing session");
                SessionState::Authenticated(session)
            }
            None => SessionState::Unauthenticated,
        };
        Self {
            state,
            identity,
            profiles,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            attempt: 0,
            retained: None,
            orphaned: None,
        }
    }

    /// Builder: override the minimum sign-up password length.
    pub fn with_min_password_len(mut self, len: usize) -> Self {
        self.min_password_len = len;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.session()
    }

    /// Input from the last failed attempt.
    pub fn retained_input(&self) -> Option<&RetainedInput> {
        self.retained.as_ref()
    }

    /// Session of an account whose profile write failed, kept for a retry.
    pub fn orphaned_session(&self) -> Option<&Session> {
        self.orphaned.as_ref().map(|orphan| &orphan.session)
    }

    /// Opening a form while signed in skips straight to the directory.
    pub fn enter_form(&self, form: AuthForm) -> Option<NavigationIntent> {
        match self.state {
            SessionState::Authenticated(_) => {
                debug!(?form, "Already signed in, skipping form");
                Some(NavigationIntent::replace_with(Destination::Home))
            }
            _ => None,
        }
    }

    /// Validate and start a sign-in attempt.
    pub fn submit_sign_in(
        &mut self,
        email: &str,
        password: SecretString,
    ) -> Result<AuthTicket, SubmitRejection> {
        self.check_can_submit()?;

        let input = match validate_sign_in(email, &password) {
            Ok(input) => input,
            Err(reason) => {
                self.retain(None, email.trim(), password);
                return Err(self.fail(AuthError::ValidationFailed(reason)).into());
            }
        };

        self.retain(None, &input.email, password);
        let attempt = self.begin_attempt();
        Ok(AuthTicket {
            attempt,
            request: AuthRequest::SignIn {
                email: input.email,
                password: input.password,
            },
            identity: Arc::clone(&self.identity),
            profiles: Arc::clone(&self.profiles),
        })
    }

    /// Validate and start a sign-up attempt.
    ///
    /// If a previous sign-up for the same email created the account but
    /// failed to save the profile, the password is checked against that
    /// account and only the profile write is retried.
    pub fn submit_sign_up(
        &mut self,
        name: &str,
        email: &str,
        password: SecretString,
        confirm_password: SecretString,
    ) -> Result<AuthTicket, SubmitRejection> {
        self.check_can_submit()?;

        let input = match validate_sign_up(
            name,
            email,
            &password,
            &confirm_password,
            self.min_password_len,
        ) {
            Ok(input) => input,
            Err(reason) => {
                self.retain(Some(name.trim()), email.trim(), password);
                return Err(self.fail(AuthError::ValidationFailed(reason)).into());
            }
        };

        self.retain(Some(&input.name), &input.email, password);
        let attempt = self.begin_attempt();

        let request = match &self.orphaned {
            Some(orphan) if orphan.email.eq_ignore_ascii_case(&input.email) => {
                info!(user_id = %orphan.session.user_id, "Retrying profile write for existing account");
                AuthRequest::RetryProfileWrite {
                    session: orphan.session.clone(),
                    name: input.name,
                    email: input.email,
                    password: input.password,
                }
            }
            _ => AuthRequest::SignUp {
                name: input.name,
                email: input.email,
                password: input.password,
            },
        };

        Ok(AuthTicket {
            attempt,
            request,
            identity: Arc::clone(&self.identity),
            profiles: Arc::clone(&self.profiles),
        })
    }

    /// Apply a finished attempt.
    ///
    /// Returns `None` when the outcome is stale and was dropped, otherwise
    /// where to navigate or the error the attempt failed with.
    pub fn resolve(&mut self, outcome: AuthOutcome) -> Option<Result<NavigationIntent, AuthError>> {
        if !self.state.is_authenticating() || outcome.attempt != self.attempt {
            debug!(
                attempt = outcome.attempt,
                current = self.attempt,
                state = %self.state,
                "Discarding stale authentication outcome"
            );
            return None;
        }

        match outcome.result {
            AuthResult::SignedIn(session) => {
                info!(user_id = %session.user_id, role = %session.role, "Signed in");
                self.retained = None;
                self.orphaned = None;
                self.transition(SessionState::Authenticated(session));
                Some(Ok(NavigationIntent::replace_with(Destination::Home)))
            }
            AuthResult::Failed(err) => Some(Err(self.fail(err))),
            AuthResult::ProfileWriteFailed { session, detail } => {
                self.orphaned = Some(OrphanedAccount {
                    session,
                    email: outcome.email,
                });
                Some(Err(self.fail(AuthError::ProfileWriteFailed(detail))))
            }
        }
    }

    /// Run a ticket to completion and apply it.
    ///
    /// Holds `&mut self` for the whole call; event-loop hosts that need to
    /// stay responsive should use `submit_*` + `resolve` instead.
    pub async fn complete(&mut self, ticket: AuthTicket) -> Result<NavigationIntent, SubmitRejection> {
        let outcome = ticket.run().await;
        match self.resolve(outcome) {
            Some(resolved) => resolved.map_err(SubmitRejection::from),
            None => Err(AuthError::Unknown("attempt superseded".into()).into()),
        }
    }

    /// Submit and finish a sign-in in one call.
    pub async fn sign_in(
        &mut self,
        email: &str,
        password: SecretString,
    ) -> Result<NavigationIntent, SubmitRejection> {
        let ticket = self.submit_sign_in(email, password)?;
        self.complete(ticket).await
    }

    /// Submit and finish a sign-up in one call.
    pub async fn sign_up(
        &mut self,
        name: &str,
        email: &str,
        password: SecretString,
        confirm_password: SecretString,
    ) -> Result<NavigationIntent, SubmitRejection> {
        let ticket = self.submit_sign_up(name, email, password, confirm_password)?;
        self.complete(ticket).await
    }

    /// End the session and go back to the welcome screen.
    ///
    /// Returns `Ok(None)` when nobody is signed in.
    pub async fn sign_out(&mut self) -> Result<Option<NavigationIntent>, AuthError> {
        let Some(session) = self.state.session().cloned() else {
            return Ok(None);
        };
        self.identity.sign_out().await.map_err(|e| classify(&e))?;
        info!(user_id = %session.user_id, "Signed out");
        self.transition(SessionState::Unauthenticated);
        Ok(Some(NavigationIntent::replace_with(Destination::Welcome)))
    }

    fn check_can_submit(&self) -> Result<(), SubmitRejection> {
        if self.state.accepts_submit() {
            return Ok(());
        }
        if self.state.is_authenticating() {
            debug!(attempt = self.attempt, "Rejecting submit while authenticating");
            return Err(SubmitRejection::InFlight);
        }
        Err(SubmitRejection::AlreadyAuthenticated)
    }

    fn begin_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.transition(SessionState::Authenticating);
        self.attempt
    }

    fn retain(&mut self, name: Option<&str>, email: &str, password: SecretString) {
        self.retained = Some(RetainedInput {
            name: name.map(str::to_string),
            email: email.to_string(),
            password,
        });
    }

    fn fail(&mut self, err: AuthError) -> AuthError {
        warn!(kind = err.kind(), error = %err, "Authentication failed");
        self.transition(SessionState::Failed(err.clone()));
        err
    }

    fn transition(&mut self, to: SessionState) {
        debug!(from = %self.state, to = %to, attempt = self.attempt, "Session transition");
        self.state = to;
    }
}

impl std::fmt::Debug for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMachine")
            .field("state", &self.state)
            .field("attempt", &self.attempt)
            .field("orphaned", &self.orphaned)
            .finish_non_exhaustive()
    }
}

impl RetainedInput {
    /// Whether the retained password equals `candidate`.
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password.expose_secret() == candidate
    }
}

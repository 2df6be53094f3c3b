//! HTTP + WebSocket surface for the session machine and the worker directory.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::directory::{
    CardAction, DirectoryEngine, DirectoryView, FilterCriteria, WorkerProfile, fixtures,
};
use crate::error::{AuthError, DatabaseError, GuardError, SubmitRejection};
use crate::navigation::{HomeActions, NavigationBus, NavigationIntent};
use crate::requests::{JobRequest, create_request};
use crate::session::{AuthForm, AuthTicket, Session, SessionMachine, spawn_ticket};
use crate::store::{LibSqlBackend, ProfileStore, RequestStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<SessionMachine>>,
    pub profiles: Arc<dyn ProfileStore>,
    pub requests: Arc<dyn RequestStore>,
    pub navigation: Arc<NavigationBus>,
}

impl AppState {
    /// Wire every collaborator to the same libSQL backend.
    pub fn from_backend(backend: Arc<LibSqlBackend>, min_password_len: usize) -> Self {
        let machine = SessionMachine::new(backend.clone(), backend.clone())
            .with_min_password_len(min_password_len);
        Self {
            session: Arc::new(Mutex::new(machine)),
            profiles: backend.clone(),
            requests: backend,
            navigation: NavigationBus::new(),
        }
    }

    /// Open the configured database, seed it when asked, and wire the state.
    pub async fn open(config: &AppConfig) -> crate::error::Result<Self> {
        let backend = Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
        if config.seed_fixtures {
            fixtures::seed_if_empty(&*backend).await?;
        }
        Ok(Self::from_backend(backend, config.min_password_len))
    }
}

/// Build the Axum router with session, directory, and navigation routes.
pub fn app_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/session", get(get_session))
        .route("/api/session/sign-in", post(sign_in))
        .route("/api/session/sign-up", post(sign_up))
        .route("/api/session/sign-out", post(sign_out))
        .route("/api/session/enter/{form}", get(enter_form))
        .route("/api/workers", get(list_workers))
        .route("/api/workers/{id}/request", post(request_worker))
        .route("/ws/navigation", get(ws_handler))
        .with_state(state)
}

// ── Errors ──────────────────────────────────────────────────────────────

/// JSON error body: `{ "error": ..., "kind": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"error": self.message, "kind": self.kind})),
        )
            .into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccountNotFound => StatusCode::NOT_FOUND,
            AuthError::AccountAlreadyExists => StatusCode::CONFLICT,
            AuthError::NetworkUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::ProfileWriteFailed(_) | AuthError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<SubmitRejection> for ApiError {
    fn from(rejection: SubmitRejection) -> Self {
        match rejection {
            SubmitRejection::InFlight => {
                Self::new(StatusCode::CONFLICT, "in_flight", rejection.to_string())
            }
            SubmitRejection::AlreadyAuthenticated => Self::new(
                StatusCode::CONFLICT,
                "already_authenticated",
                rejection.to_string(),
            ),
            SubmitRejection::Failed(err) => err.into(),
        }
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::SelfRequestNotAllowed => Self::new(
                StatusCode::FORBIDDEN,
                "self_request_not_allowed",
                err.to_string(),
            ),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        error!(error = %err, "Database error in request handler");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "database", err.to_string())
    }
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "kaj-lagbe"
    }))
}

// ── Session ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorView {
    error: String,
    kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    state: &'static str,
    session: Option<Session>,
    error: Option<ErrorView>,
    home_actions: Option<HomeActions>,
    orphaned: bool,
    /// Input from the failed attempt, for pre-filling the form.
    retained_name: Option<String>,
    retained_email: Option<String>,
}

impl SessionView {
    fn of(machine: &SessionMachine) -> Self {
        let state = machine.state();
        let retained = state.error().and_then(|_| machine.retained_input());
        Self {
            state: state.phase(),
            session: state.session().cloned(),
            error: state.error().map(|err| ErrorView {
                error: err.to_string(),
                kind: err.kind(),
            }),
            home_actions: state.session().map(|s| s.role.home_actions()),
            orphaned: machine.orphaned_session().is_some(),
            retained_name: retained.and_then(|input| input.name.clone()),
            retained_email: retained.map(|input| input.email.clone()),
        }
    }
}

#[derive(Debug, Serialize)]
struct NavigationResponse {
    session: SessionView,
    navigation: Option<NavigationIntent>,
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
}

async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    let machine = state.session.lock().await;
    Json(SessionView::of(&machine))
}

async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    let ticket = state
        .session
        .lock()
        .await
        .submit_sign_in(&body.email, SecretString::from(body.password))?;
    finish_attempt(&state, ticket).await
}

async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    let ticket = state.session.lock().await.submit_sign_up(
        &body.name,
        &body.email,
        SecretString::from(body.password),
        SecretString::from(body.confirm_password),
    )?;
    finish_attempt(&state, ticket).await
}

/// Run the ticket without holding the machine lock, then report this
/// attempt's own result.
async fn finish_attempt(
    state: &AppState,
    ticket: AuthTicket,
) -> Result<Json<NavigationResponse>, ApiError> {
    let attempt = ticket.attempt();
    let resolved = spawn_ticket(&state.session, ticket, Some(state.navigation.clone()))
        .await
        .map_err(|e| {
            error!(attempt, error = %e, "Authentication task failed");
            ApiError::from(AuthError::Unknown(e.to_string()))
        })?;

    match resolved {
        Some(Ok(intent)) => {
            let machine = state.session.lock().await;
            Ok(Json(NavigationResponse {
                session: SessionView::of(&machine),
                navigation: Some(intent),
            }))
        }
        Some(Err(err)) => Err(err.into()),
        None => {
            warn!(attempt, "Attempt superseded");
            Err(SubmitRejection::InFlight.into())
        }
    }
}

async fn sign_out(State(state): State<AppState>) -> Result<Json<NavigationResponse>, ApiError> {
    let mut machine = state.session.lock().await;
    let intent = machine.sign_out().await?;
    if let Some(intent) = &intent {
        state.navigation.publish(intent.clone());
    }
    Ok(Json(NavigationResponse {
        session: SessionView::of(&machine),
        navigation: intent,
    }))
}

async fn enter_form(
    State(state): State<AppState>,
    Path(form): Path<String>,
) -> Result<Json<NavigationResponse>, ApiError> {
    let form = match form.as_str() {
        "login" => AuthForm::Login,
        "sign-up" | "sign_up" => AuthForm::SignUp,
        other => {
            return Err(ApiError::new(
                StatusCode::NOT_FOUND,
                "unknown_form",
                format!("Unknown form: {other}"),
            ));
        }
    };

    let machine = state.session.lock().await;
    let intent = machine.enter_form(form);
    if let Some(intent) = &intent {
        state.navigation.publish(intent.clone());
    }
    Ok(Json(NavigationResponse {
        session: SessionView::of(&machine),
        navigation: intent,
    }))
}

// ── Directory ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WorkersQuery {
    search: String,
    #[serde(alias = "work_type")]
    work_type: String,
    location: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkerCard {
    #[serde(flatten)]
    worker: WorkerProfile,
    is_self: bool,
    request: Option<NavigationIntent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkersResponse {
    workers: Vec<WorkerCard>,
    total: usize,
    empty: bool,
}

async fn list_workers(
    State(state): State<AppState>,
    Query(query): Query<WorkersQuery>,
) -> impl IntoResponse {
    let current_user = current_user_id(&state).await.unwrap_or_default();

    let mut engine = DirectoryEngine::new();
    engine.refresh(state.profiles.as_ref()).await;
    engine.set_filters(FilterCriteria {
        search_text: query.search,
        work_type: query.work_type,
        location: query.location,
    });

    let workers: Vec<WorkerCard> = match engine.view() {
        DirectoryView::Workers(visible) => visible
            .into_iter()
            .map(|worker| {
                let request = match engine.card_action(&current_user, worker) {
                    CardAction::RequestJob(intent) => Some(intent),
                    CardAction::SelfCard => None,
                };
                WorkerCard {
                    worker: worker.clone(),
                    is_self: request.is_none(),
                    request,
                }
            })
            .collect(),
        DirectoryView::Empty | DirectoryView::Loading => Vec::new(),
    };

    debug!(
        total = engine.snapshot().len(),
        visible = workers.len(),
        "Directory listed"
    );
    Json(WorkersResponse {
        empty: workers.is_empty(),
        total: engine.snapshot().len(),
        workers,
    })
}

async fn request_worker(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> Result<(StatusCode, Json<JobRequest>), ApiError> {
    let Some(requester) = current_user_id(&state).await else {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "unauthenticated",
            "Sign in to request a job",
        ));
    };

    let workers = state.profiles.list_workers().await?;
    if !workers.iter().any(|w| w.id == worker_id) {
        return Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "worker_not_found",
            format!("No worker with id {worker_id}"),
        ));
    }

    let request = create_request(&requester, &worker_id)?.into_job_request();
    state.requests.save_request(&request).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn current_user_id(state: &AppState) -> Option<String> {
    state
        .session
        .lock()
        .await
        .session()
        .map(|s| s.user_id.clone())
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("Navigation client connecting");
    ws.on_upgrade(|socket| handle_socket(socket, state.navigation))
}

async fn handle_socket(mut socket: WebSocket, navigation: Arc<NavigationBus>) {
    let mut rx = navigation.subscribe();
    info!("Navigation client connected");

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(intent) => {
                        if let Ok(json) = serde_json::to_string(&intent) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                debug!("Client disconnected during send");
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "Navigation client lagged behind broadcast");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Navigation channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Navigation client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("Navigation connection closed");
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::directory::fixtures::seed_workers;
    use crate::store::IdentityProvider;

    async fn test_app() -> (Router, Arc<LibSqlBackend>) {
        let backend = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        for worker in seed_workers() {
            backend.upsert_worker(&worker).await.unwrap();
        }
        let state = AppState::from_backend(backend.clone(), 6);
        (app_routes(state), backend)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn sign_up_rahim(app: &Router) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/api/session/sign-up",
            Some(serde_json::json!({
                "name": "Rahim",
                "email": "rahim@example.com",
                "password": "secret1",
                "confirmPassword": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    #[tokio::test]
    async fn health_ok() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn sign_up_signs_in_and_navigates_home() {
        let (app, backend) = test_app().await;
        let body = sign_up_rahim(&app).await;
        assert_eq!(body["navigation"]["destination"]["screen"], "home");
        assert_eq!(body["navigation"]["clearHistory"], true);

        let (_, session) = send(&app, "GET", "/api/session", None).await;
        assert_eq!(session["state"], "authenticated");
        assert_eq!(session["session"]["role"], "user");
        assert_eq!(session["homeActions"]["secondary"]["label"], "Need Job?");

        let user_id = session["session"]["userId"].as_str().unwrap();
        let profile = backend.get_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile["name"], "Rahim");
    }

    #[tokio::test]
    async fn blank_sign_in_is_bad_request() {
        let (app, _) = test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/session/sign-in",
            Some(serde_json::json!({"email": "", "password": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation_failed");
        assert_eq!(body["error"], "Please enter email and password");
    }

    #[tokio::test]
    async fn sign_in_error_statuses() {
        let (app, _) = test_app().await;
        sign_up_rahim(&app).await;
        send(&app, "POST", "/api/session/sign-out", None).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/session/sign-in",
            Some(serde_json::json!({"email": "nobody@example.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "account_not_found");

        let (status, body) = send(
            &app,
            "POST",
            "/api/session/sign-in",
            Some(serde_json::json!({"email": "rahim@example.com", "password": "wrong-pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "invalid_credentials");

        let (_, session) = send(&app, "GET", "/api/session", None).await;
        assert_eq!(session["state"], "failed");
        assert_eq!(session["retainedEmail"], "rahim@example.com");
        assert!(session["retainedName"].is_null());
        assert!(session.get("password").is_none());
        assert!(!session.to_string().contains("wrong-pw"));

        let (status, _) = send(
            &app,
            "POST",
            "/api/session/sign-in",
            Some(serde_json::json!({"email": "rahim@example.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_sign_up_conflicts() {
        let (app, _) = test_app().await;
        sign_up_rahim(&app).await;
        send(&app, "POST", "/api/session/sign-out", None).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/session/sign-up",
            Some(serde_json::json!({
                "name": "Rahim",
                "email": "rahim@example.com",
                "password": "secret1",
                "confirmPassword": "secret1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["kind"], "account_already_exists");
    }

    #[tokio::test]
    async fn enter_form_skips_when_signed_in() {
        let (app, _) = test_app().await;
        let (_, body) = send(&app, "GET", "/api/session/enter/login", None).await;
        assert!(body["navigation"].is_null());

        sign_up_rahim(&app).await;
        let (_, body) = send(&app, "GET", "/api/session/enter/sign-up", None).await;
        assert_eq!(body["navigation"]["destination"]["screen"], "home");

        let (status, _) = send(&app, "GET", "/api/session/enter/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn workers_filtered_by_query() {
        let (app, _) = test_app().await;

        let (_, all) = send(&app, "GET", "/api/workers", None).await;
        assert_eq!(all["workers"].as_array().unwrap().len(), 5);
        assert_eq!(all["total"], 5);

        let (_, some) = send(&app, "GET", "/api/workers?workType=an", None).await;
        let names: Vec<&str> = some["workers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Karima Begum", "Abdul Karim"]);

        let (_, none) = send(&app, "GET", "/api/workers?search=pilot", None).await;
        assert_eq!(none["empty"], true);
        assert_eq!(none["total"], 5);

        let (_, legacy) = send(&app, "GET", "/api/workers?work_type=mason", None).await;
        assert_eq!(legacy["workers"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn request_requires_session() {
        let (app, _) = test_app().await;
        let (status, body) = send(&app, "POST", "/api/workers/worker1/request", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthenticated");
    }

    #[tokio::test]
    async fn request_is_stored_and_self_request_refused() {
        let (app, backend) = test_app().await;
        sign_up_rahim(&app).await;

        let (status, body) = send(&app, "POST", "/api/workers/worker3/request", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["targetWorkerId"], "worker3");
        assert_eq!(backend.requests_for_worker("worker3").await.unwrap().len(), 1);

        let (status, _) = send(&app, "POST", "/api/workers/worker42/request", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // List the signed-in user as a worker too.
        let user_id = backend.current_session().unwrap().user_id;
        backend
            .upsert_worker(&WorkerProfile::new(&user_id, "Rahim", "Plumber", "Mirpur"))
            .await
            .unwrap();

        let (status, body) = send(&app, "POST", &format!("/api/workers/{user_id}/request"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["kind"], "self_request_not_allowed");

        let (_, listing) = send(&app, "GET", "/api/workers?search=plumber", None).await;
        let cards = listing["workers"].as_array().unwrap();
        assert_eq!(cards.len(), 2);
        let own = cards.iter().find(|c| c["id"] == user_id.as_str()).unwrap();
        assert_eq!(own["isSelf"], true);
        assert!(own["request"].is_null());
    }

    #[tokio::test]
    async fn failed_sign_up_keeps_name_and_email() {
        let (app, _) = test_app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/session/sign-up",
            Some(serde_json::json!({
                "name": " Rahim ",
                "email": "rahim@example.com",
                "password": "secret1",
                "confirmPassword": "secret2"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, session) = send(&app, "GET", "/api/session", None).await;
        assert_eq!(session["retainedName"], "Rahim");
        assert_eq!(session["retainedEmail"], "rahim@example.com");

        sign_up_rahim(&app).await;
        let (_, session) = send(&app, "GET", "/api/session", None).await;
        assert!(session["retainedEmail"].is_null());
    }

    #[tokio::test]
    async fn padded_password_signs_back_in() {
        let (app, _) = test_app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/session/sign-up",
            Some(serde_json::json!({
                "name": "Rahim",
                "email": "rahim@example.com",
                "password": " secret1 ",
                "confirmPassword": " secret1 "
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        send(&app, "POST", "/api/session/sign-out", None).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/session/sign-in",
            Some(serde_json::json!({"email": "rahim@example.com", "password": " secret1 "})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    #[tokio::test]
    async fn open_seeds_a_fresh_database_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            db_path: dir.path().join("data").join("kaj-lagbe.db"),
            ..AppConfig::default()
        };

        let state = AppState::open(&config).await.unwrap();
        assert_eq!(state.profiles.list_workers().await.unwrap().len(), 5);
        drop(state);

        let state = AppState::open(&config).await.unwrap();
        assert_eq!(state.profiles.list_workers().await.unwrap().len(), 5);

        let unseeded = AppConfig {
            db_path: dir.path().join("empty.db"),
            seed_fixtures: false,
            ..AppConfig::default()
        };
        let state = AppState::open(&unseeded).await.unwrap();
        assert!(state.profiles.list_workers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_reports_unusable_path_as_database_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let config = AppConfig {
            db_path: blocker.join("kaj-lagbe.db"),
            ..AppConfig::default()
        };

        let err = AppState::open(&config).await.err().unwrap();
        assert!(matches!(err, crate::error::Error::Database(_)));
    }

    #[tokio::test]
    async fn sign_out_returns_to_welcome() {
        let (app, _) = test_app().await;
        sign_up_rahim(&app).await;

        let (status, body) = send(&app, "POST", "/api/session/sign-out", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["navigation"]["destination"]["screen"], "welcome");
        assert_eq!(body["session"]["state"], "unauthenticated");
    }
}

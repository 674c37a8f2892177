//! REST API layer using Axum.
//!
//! Each handler decodes one request, makes exactly one store call and
//! encodes the result. Authentication and the admin check live in route
//! middleware; the active community comes from the optional `community`
//! query parameter.

use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::auth::bearer_token;
use crate::error::StoreError;
use crate::models::{
    AdminOverview, Announcement, BootstrapInfo, Community, CommunityMember, Course, CourseAccess,
    CreateAnnouncementRequest, CreateCommunityMemberRequest, CreateCommunityRequest, CreateCourseRequest,
    CreateInviteCodeRequest, CreateTestRequest, CreateToolRequest, DashboardResponse, InviteCode, LoginRequest,
    LoginResponse, SignupRequest, SubmitTestRequest, Test, TestAttempt, ToolResource, User,
};
use crate::store::Store;

/// Shared app state for REST handlers (Arc-wrapped for concurrency)
#[derive(Clone)]
pub struct AppState {
    store: Store,
}

/// Store failure rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::InvalidCredentials | StoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
        StoreError::Forbidden => StatusCode::FORBIDDEN,
        StoreError::CommunityNotFound
        | StoreError::CourseNotFound
        | StoreError::TestNotFound
        | StoreError::UserNotFound => StatusCode::NOT_FOUND,
        StoreError::SlugAlreadyExists | StoreError::MembershipAlreadyExists => StatusCode::CONFLICT,
        StoreError::DuplicateUsername
        | StoreError::DuplicateEmail
        | StoreError::InvalidInviteCode
        | StoreError::EmptySlug
        | StoreError::WrongTenant
        | StoreError::AnswerCountMismatch { .. }
        | StoreError::InvalidPassingScore
        | StoreError::InvalidTest(_) => StatusCode::BAD_REQUEST,
        StoreError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Deserialize, Default)]
pub struct CommunityQuery {
    pub community: Option<String>,
}

fn request_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned)
}

async fn auth_middleware(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> ApiResult<Response> {
    let token = request_token(&req);
    let user = state.store.authenticate(token.as_deref())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

async fn admin_middleware(State(state): State<Arc<AppState>>, mut req: Request, next: Next) -> ApiResult<Response> {
    let token = request_token(&req);
    let admin = state.store.require_admin(token.as_deref())?;
    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}

fn active_community(state: &AppState, user: &User, query: &CommunityQuery) -> ApiResult<Community> {
    state
        .store
        .accessible_community(user, query.community.as_deref())
        .ok_or(ApiError(StoreError::Forbidden))
}

/// Create Axum router with the platform endpoints
pub fn create_router(store: Store) -> Router {
    let state = Arc::new(AppState { store });

    let learner_routes = Router::new()
        .route("/api/dashboard", get(dashboard_handler))
        .route("/api/courses", get(courses_handler))
        .route("/api/tests", get(tests_handler))
        .route("/api/tools", get(tools_handler))
        .route("/api/announcements", get(announcements_handler))
        .route("/api/communities", get(communities_handler))
        .route("/api/tests/submit", post(submit_test_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/api/admin/overview", get(overview_handler))
        .route("/api/admin/invite-codes", post(create_invite_code_handler))
        .route("/api/admin/tools", post(create_tool_handler))
        .route("/api/admin/courses", post(create_course_handler))
        .route("/api/admin/tests", post(create_test_handler))
        .route("/api/admin/announcements", post(create_announcement_handler))
        .route("/api/admin/communities", post(create_community_handler))
        .route("/api/admin/community-members", post(create_member_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/bootstrap", get(bootstrap_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/signup", post(signup_handler))
        .merge(learner_routes)
        .merge(admin_routes)
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn bootstrap_handler(State(state): State<Arc<AppState>>) -> Json<BootstrapInfo> {
    Json(state.store.bootstrap_info())
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state.store.login(&payload.username, &payload.password)?;
    Ok(Json(LoginResponse::from(&user)))
}

async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    let user = state.store.signup(payload)?;
    Ok((StatusCode::CREATED, Json(LoginResponse::from(&user))))
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<CommunityQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let community = active_community(&state, &user, &query)?;
    Ok(Json(state.store.dashboard(&user, &community)))
}

async fn courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<CommunityQuery>,
) -> ApiResult<Json<Vec<CourseAccess>>> {
    let community = active_community(&state, &user, &query)?;
    Ok(Json(state.store.access_list(&user, community.id)))
}

async fn tests_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<CommunityQuery>,
) -> ApiResult<Json<Vec<Test>>> {
    let community = active_community(&state, &user, &query)?;
    Ok(Json(state.store.tests_in(community.id)))
}

async fn tools_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<CommunityQuery>,
) -> ApiResult<Json<Vec<ToolResource>>> {
    let community = active_community(&state, &user, &query)?;
    Ok(Json(state.store.tools_in(community.id)))
}

async fn announcements_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<CommunityQuery>,
) -> ApiResult<Json<Vec<Announcement>>> {
    let community = active_community(&state, &user, &query)?;
    Ok(Json(state.store.announcements_in(community.id)))
}

async fn communities_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Json<Vec<Community>> {
    Json(state.store.communities_for(&user))
}

async fn submit_test_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<CommunityQuery>,
    Json(payload): Json<SubmitTestRequest>,
) -> ApiResult<(StatusCode, Json<TestAttempt>)> {
    let community = active_community(&state, &user, &query)?;
    let attempt = state.store.submit_test(&user, payload, community.id)?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

// --- Admin handlers ---

async fn overview_handler(State(state): State<Arc<AppState>>) -> Json<AdminOverview> {
    Json(state.store.admin_overview())
}

async fn create_invite_code_handler(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Json(payload): Json<CreateInviteCodeRequest>,
) -> (StatusCode, Json<InviteCode>) {
    let invite = state.store.create_invite_code(payload.uses, admin.id);
    (StatusCode::CREATED, Json(invite))
}

async fn create_tool_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateToolRequest>,
) -> ApiResult<(StatusCode, Json<ToolResource>)> {
    Ok((StatusCode::CREATED, Json(state.store.add_tool(payload)?)))
}

async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    Ok((StatusCode::CREATED, Json(state.store.add_course(payload)?)))
}

async fn create_test_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTestRequest>,
) -> ApiResult<(StatusCode, Json<Test>)> {
    Ok((StatusCode::CREATED, Json(state.store.add_test(payload)?)))
}

async fn create_announcement_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> ApiResult<(StatusCode, Json<Announcement>)> {
    Ok((StatusCode::CREATED, Json(state.store.add_announcement(payload)?)))
}

async fn create_community_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCommunityRequest>,
) -> ApiResult<(StatusCode, Json<Community>)> {
    Ok((StatusCode::CREATED, Json(state.store.create_community(payload)?)))
}

async fn create_member_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCommunityMemberRequest>,
) -> ApiResult<(StatusCode, Json<CommunityMember>)> {
    Ok((StatusCode::CREATED, Json(state.store.add_member(payload)?)))
}

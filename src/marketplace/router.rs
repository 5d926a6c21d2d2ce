use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AvailabilityStatus, DomainName, TaskId, UserId};
use super::repository::{RepositoryError, TaskRepository, UserRepository};
use super::service::{MarketplaceError, MarketplaceService, NewTask, NewUser};

/// Router builder exposing the marketplace operations over HTTP.
pub fn marketplace_router<U, T>(service: Arc<MarketplaceService<U, T>>) -> Router
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    Router::new()
        .route("/api/v1/users", post(register_handler::<U, T>))
        .route(
            "/api/v1/users/:user_id/domains",
            get(domains_handler::<U, T>).post(add_domain_handler::<U, T>),
        )
        .route(
            "/api/v1/tasks",
            get(open_tasks_handler::<U, T>).post(create_task_handler::<U, T>),
        )
        .route("/api/v1/tasks/:task_id", get(task_detail_handler::<U, T>))
        .route(
            "/api/v1/users/:user_id/tasks",
            get(client_tasks_handler::<U, T>),
        )
        .route(
            "/api/v1/tasks/:task_id/applications",
            post(apply_handler::<U, T>),
        )
        .route(
            "/api/v1/tasks/:task_id/selection",
            post(select_handler::<U, T>),
        )
        .route(
            "/api/v1/tasks/:task_id/completion",
            post(complete_handler::<U, T>),
        )
        .route("/api/v1/tasks/:task_id/rating", post(rate_handler::<U, T>))
        .route(
            "/api/v1/tasks/:task_id/applicants",
            get(applicants_handler::<U, T>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddDomainRequest {
    pub(crate) domain: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenTasksQuery {
    pub(crate) domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) freelancer_id: UserId,
    #[serde(default = "default_availability")]
    pub(crate) availability_status: AvailabilityStatus,
}

fn default_availability() -> AvailabilityStatus {
    AvailabilityStatus::Available
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectRequest {
    pub(crate) client_id: UserId,
    pub(crate) freelancer_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompleteRequest {
    pub(crate) freelancer_id: UserId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateRequest {
    pub(crate) client_id: UserId,
    pub(crate) rating: u8,
}

pub(crate) async fn register_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    axum::Json(input): axum::Json<NewUser>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.register_user(input) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_domain_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(user_id): Path<String>,
    axum::Json(request): axum::Json<AddDomainRequest>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.add_domain(&UserId(user_id), &request.domain) {
        Ok(profile) => {
            let view = profile.summary_view(chrono::Utc::now());
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn domains_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(user_id): Path<String>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.freelancer_domains(&UserId(user_id)) {
        Ok(domains) => {
            let payload = json!({ "count": domains.len(), "domains": domains });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_task_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    axum::Json(input): axum::Json<NewTask>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.create_task(input) {
        Ok(task) => {
            let position = task.recommended_budget_range.classify(task.budget);
            let payload = json!({
                "task": task,
                "pricing_advice": {
                    "your_budget": task.budget,
                    "recommended_range": task.recommended_budget_range,
                    "position": position,
                    "note": position.advisory_note(),
                },
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn open_tasks_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Query(query): Query<OpenTasksQuery>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    let domain = query.domain.as_deref().map(DomainName::new);
    match service.open_tasks(domain.as_ref()) {
        Ok(tasks) => {
            let payload = json!({ "count": tasks.len(), "tasks": tasks });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn task_detail_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(task_id): Path<String>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.task_detail(&TaskId(task_id)) {
        Ok(task) => (StatusCode::OK, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn client_tasks_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(user_id): Path<String>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.client_tasks(&UserId(user_id)) {
        Ok(tasks) => {
            let payload = json!({ "count": tasks.len(), "tasks": tasks });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn apply_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(task_id): Path<String>,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.apply_to_task(
        &TaskId(task_id),
        &request.freelancer_id,
        request.availability_status,
    ) {
        Ok(task) => (StatusCode::CREATED, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn select_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(task_id): Path<String>,
    axum::Json(request): axum::Json<SelectRequest>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.select_freelancer(&TaskId(task_id), &request.client_id, &request.freelancer_id) {
        Ok(task) => (StatusCode::OK, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(task_id): Path<String>,
    axum::Json(request): axum::Json<CompleteRequest>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.complete_task(&TaskId(task_id), &request.freelancer_id) {
        Ok(task) => (StatusCode::OK, axum::Json(task)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rate_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(task_id): Path<String>,
    axum::Json(request): axum::Json<RateRequest>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    // Malformed ratings are rejected here; the reputation updater itself
    // trusts validated input.
    if !(1..=5).contains(&request.rating) {
        let payload = json!({ "error": "rating must be between 1 and 5" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    }

    match service.rate_task(&TaskId(task_id), &request.client_id, request.rating) {
        Ok(profile) => {
            let payload = json!({
                "rating": request.rating,
                "updated_domain_profile": profile,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn applicants_handler<U, T>(
    State(service): State<Arc<MarketplaceService<U, T>>>,
    Path(task_id): Path<String>,
) -> Response
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
{
    match service.top_applicants(&TaskId(task_id)) {
        Ok(applicants) => {
            let payload = json!({ "count": applicants.len(), "applicants": applicants });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: MarketplaceError) -> Response {
    let status = match &error {
        MarketplaceError::FreelancerNotFound
        | MarketplaceError::TaskNotFound
        | MarketplaceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        MarketplaceError::AlreadyApplied
        | MarketplaceError::AlreadyRated
        | MarketplaceError::DomainAlreadyRegistered(_)
        | MarketplaceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        MarketplaceError::NotTaskOwner
        | MarketplaceError::NotSelectedFreelancer
        | MarketplaceError::CompanyZoneRequirements { .. } => StatusCode::FORBIDDEN,
        MarketplaceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::coordinator::WorkflowCoordinator;
use super::domain::{Notification, NotificationId, OfferId, Student, StudentId};
use super::port::{PortError, RemotePort};
use super::saga::WorkflowTrace;
use super::session::{SessionId, SessionStore, SessionUser, SharedSession};
use super::state::OfferDetailState;
use crate::error::AppError;

/// Shared state behind the matching routes.
pub struct MatchingService<P> {
    pub coordinator: WorkflowCoordinator<P>,
    pub sessions: SessionStore,
}

impl<P> MatchingService<P>
where
    P: RemotePort + 'static,
{
    pub fn new(port: Arc<P>, max_sessions: usize, idle_ttl: Duration) -> Self {
        Self {
            coordinator: WorkflowCoordinator::new(port),
            sessions: SessionStore::new(max_sessions, idle_ttl),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct WorkflowResponse {
    pub state: OfferDetailState,
    pub steps: WorkflowTrace,
}

/// Respond outcome. `updated` is false when the response could not be stored.
#[derive(Debug, Serialize)]
pub struct RespondResponse {
    pub updated: bool,
    pub follow_up: Option<Notification>,
    pub state: OfferDetailState,
    pub steps: WorkflowTrace,
}

/// Router builder exposing the session-scoped workflow endpoints.
pub fn matching_router<P>(service: Arc<MatchingService<P>>) -> Router
where
    P: RemotePort + 'static,
{
    Router::new()
        .route("/api/v1/sessions", post(open_session_handler::<P>))
        .route(
            "/api/v1/sessions/:session_id",
            delete(close_session_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/state",
            get(state_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/inbox",
            get(inbox_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/students/:student_id",
            get(student_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/offers/:offer_id/load",
            post(load_offer_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/offers/:offer_id/check",
            post(check_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/offers/:offer_id/apply",
            post(apply_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/notifications/:notification_id/respond",
            post(respond_handler::<P>),
        )
        .route(
            "/api/v1/sessions/:session_id/notifications/:notification_id/status",
            post(status_handler::<P>),
        )
        .with_state(service)
}

fn workflow_response(state: &OfferDetailState, steps: WorkflowTrace) -> Json<WorkflowResponse> {
    Json(WorkflowResponse {
        state: state.clone(),
        steps,
    })
}

fn session<P>(
    service: &Arc<MatchingService<P>>,
    session_id: String,
) -> Result<SharedSession, AppError> {
    Ok(service.sessions.get(&SessionId(session_id))?)
}

fn student_only() -> AppError {
    AppError::Forbidden("this action requires a student session".to_string())
}

pub(crate) async fn open_session_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Json(user): Json<SessionUser>,
) -> Result<Response, AppError>
where
    P: RemotePort + 'static,
{
    let id = service.sessions.open(user)?;
    Ok((StatusCode::CREATED, Json(json!({ "session_id": id }))).into_response())
}

pub(crate) async fn close_session_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError>
where
    P: RemotePort + 'static,
{
    service.sessions.close(&SessionId(session_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn state_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path(session_id): Path<String>,
) -> Result<Json<OfferDetailState>, AppError>
where
    P: RemotePort + 'static,
{
    let session = session(&service, session_id)?;
    let context = session.lock().await;
    Ok(Json(context.offer_detail.clone()))
}

pub(crate) async fn inbox_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Notification>>, AppError>
where
    P: RemotePort + 'static,
{
    let user = session(&service, session_id)?.lock().await.user;
    let notifications = service.coordinator.inbox(user).await?;
    Ok(Json(notifications))
}

pub(crate) async fn student_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path((session_id, student_id)): Path<(String, u64)>,
) -> Result<Json<Student>, AppError>
where
    P: RemotePort + 'static,
{
    session(&service, session_id)?;
    let student = service
        .coordinator
        .student_profile(StudentId(student_id))
        .await?
        .ok_or(PortError::NotFound)?;
    Ok(Json(student))
}

pub(crate) async fn load_offer_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path((session_id, offer_id)): Path<(String, u64)>,
) -> Result<Json<WorkflowResponse>, AppError>
where
    P: RemotePort + 'static,
{
    let session = session(&service, session_id)?;
    let mut context = session.lock().await;
    let steps = service
        .coordinator
        .load_offer_with_company(&mut context.offer_detail, OfferId(offer_id))
        .await;
    Ok(workflow_response(&context.offer_detail, steps))
}

pub(crate) async fn check_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path((session_id, offer_id)): Path<(String, u64)>,
) -> Result<Json<WorkflowResponse>, AppError>
where
    P: RemotePort + 'static,
{
    let session = session(&service, session_id)?;
    let mut context = session.lock().await;
    let student_id = context.user.student().ok_or_else(student_only)?;
    let steps = service
        .coordinator
        .check_existing_application(&mut context.offer_detail, student_id, OfferId(offer_id))
        .await;
    Ok(workflow_response(&context.offer_detail, steps))
}

pub(crate) async fn apply_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path((session_id, offer_id)): Path<(String, u64)>,
) -> Result<Json<WorkflowResponse>, AppError>
where
    P: RemotePort + 'static,
{
    let session = session(&service, session_id)?;
    let mut context = session.lock().await;
    let student_id = context.user.student().ok_or_else(student_only)?;
    let report = service
        .coordinator
        .apply_to_offer(&mut context.offer_detail, student_id, OfferId(offer_id))
        .await;
    Ok(workflow_response(&context.offer_detail, report.trace))
}

/// Only the party a notification is addressed to may answer it.
pub(crate) async fn respond_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path((session_id, notification_id)): Path<(String, u64)>,
    Json(request): Json<RespondRequest>,
) -> Result<Json<RespondResponse>, AppError>
where
    P: RemotePort + 'static,
{
    let session = session(&service, session_id)?;
    let context = session.lock().await;
    let notification_id = NotificationId(notification_id);

    let notification = service
        .coordinator
        .notification(notification_id)
        .await?
        .ok_or(PortError::NotFound)?;
    let user = context.user;
    if !notification.addressed_to(user.recipient(), user.raw_id()) {
        warn!(%notification_id, ?user, "notification answered by a party it is not addressed to");
        return Err(AppError::Forbidden(format!(
            "notification {notification_id} is not addressed to this session"
        )));
    }

    let report = service
        .coordinator
        .respond_to_notification(notification_id, &request.status)
        .await;
    Ok(Json(RespondResponse {
        updated: report.updated,
        follow_up: report.follow_up,
        state: context.offer_detail.clone(),
        steps: report.trace,
    }))
}

pub(crate) async fn status_handler<P>(
    State(service): State<Arc<MatchingService<P>>>,
    Path((session_id, notification_id)): Path<(String, u64)>,
) -> Result<Json<WorkflowResponse>, AppError>
where
    P: RemotePort + 'static,
{
    let session = session(&service, session_id)?;
    let mut context = session.lock().await;
    let steps = service
        .coordinator
        .load_notification_status(&mut context.offer_detail, NotificationId(notification_id))
        .await;
    Ok(workflow_response(&context.offer_detail, steps))
}

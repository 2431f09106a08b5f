//! HTTP handlers: the HTML form workflow and the JSON API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::page::render_index;
use crate::store::{Todo, TodoStore, TodoUpdate};

/// Creates the application router.
pub fn create_router(store: Arc<TodoStore>) -> Router {
    Router::new()
        .route("/", get(index_handler).post(add_form_handler))
        .route("/toggle/:id", post(toggle_handler))
        .route("/delete/:id", post(delete_form_handler))
        .route("/update_todo/:id", post(update_details_handler))
        .route("/todos", get(list_handler).post(create_handler))
        .route("/todos/:id", put(update_handler).delete(delete_handler))
        .route("/export", get(list_handler))
        .route("/test", get(status_handler))
        .route("/reset-db", post(reset_handler))
        .fallback(not_found_handler)
        .with_state(store)
}

#[derive(Debug, Deserialize)]
struct TaskForm {
    task: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsForm {
    assignee: Option<String>,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateTodo {
    task: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

async fn index_handler(State(store): State<Arc<TodoStore>>) -> Html<String> {
    Html(render_index(&store.list(), None))
}

async fn add_form_handler(
    State(store): State<Arc<TodoStore>>,
    Form(form): Form<TaskForm>,
) -> Response {
    match form.task.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(task) => {
            let todo = store.create(task);
            info!("Created todo {} from form", todo.id);
            Redirect::to("/").into_response()
        }
        None => Html(render_index(&store.list(), Some("Task cannot be empty"))).into_response(),
    }
}

async fn toggle_handler(
    State(store): State<Arc<TodoStore>>,
    Path(id): Path<u64>,
) -> Result<Redirect, ApiError> {
    let todo = store.toggle(id).ok_or_else(ApiError::todo_not_found)?;
    info!("Todo {} is now {}", id, todo.status);
    Ok(Redirect::to("/"))
}

async fn delete_form_handler(
    State(store): State<Arc<TodoStore>>,
    Path(id): Path<u64>,
) -> Result<Redirect, ApiError> {
    if !store.delete(id) {
        return Err(ApiError::todo_not_found());
    }
    info!("Deleted todo {} from form", id);
    Ok(Redirect::to("/"))
}

async fn update_details_handler(
    State(store): State<Arc<TodoStore>>,
    Path(id): Path<u64>,
    Form(form): Form<DetailsForm>,
) -> Result<Redirect, ApiError> {
    store
        .update_details(id, form.assignee.as_deref(), form.notes.as_deref())
        .ok_or_else(ApiError::todo_not_found)?;
    Ok(Redirect::to("/"))
}

async fn list_handler(State(store): State<Arc<TodoStore>>) -> Json<Vec<Todo>> {
    Json(store.list())
}

async fn create_handler(
    State(store): State<Arc<TodoStore>>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let task = payload
        .task
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Task is required".to_string()))?;

    let todo = store.create(task);
    info!("Created todo {} via API", todo.id);
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_handler(
    State(store): State<Arc<TodoStore>>,
    Path(id): Path<u64>,
    payload: Result<Json<TodoUpdate>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    if store.get(id).is_none() {
        return Err(ApiError::todo_not_found());
    }

    let update = match payload {
        Ok(Json(update)) if !update.is_empty() => update,
        _ => return Err(ApiError::BadRequest("No data provided".to_string())),
    };

    store
        .update(id, update)
        .map(Json)
        .ok_or_else(ApiError::todo_not_found)
}

async fn delete_handler(
    State(store): State<Arc<TodoStore>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if store.delete(id) {
        info!("Deleted todo {} via API", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::todo_not_found())
    }
}

async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn reset_handler(State(store): State<Arc<TodoStore>>) -> Json<MessageResponse> {
    store.reset();
    info!("Database reset for testing");
    Json(MessageResponse {
        message: "Database reset successfully".to_string(),
    })
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// API error type, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl ApiError {
    fn todo_not_found() -> Self {
        ApiError::NotFound("Todo not found".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        error!("API error: {} - {}", status, message);

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

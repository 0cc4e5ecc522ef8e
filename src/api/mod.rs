pub mod extract;

use axum::{
    Form, Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;
use crate::views;

use self::extract::{PageId, RecordId, Submission};

const MAIN_JS: &str = include_str!("../../static/js/main.js");

#[derive(Debug, Serialize)]
pub struct TaskCreatedResponse {
    pub success: bool,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub success: bool,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub success: bool,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct TaskDeletedResponse {
    pub success: bool,
    pub task_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StudentDeletedResponse {
    pub success: bool,
    pub student_id: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/health", get(health))
        .route("/add", get(add_student_form).post(create_student))
        .route("/student/{id}", get(student_detail))
        .route("/student/{id}/add_task", post(create_task))
        .route("/student/{id}/delete", post(delete_student))
        .route("/task/{id}/toggle", post(toggle_task))
        .route("/task/{id}/delete", post(delete_task))
        .route("/task/{id}/edit", post(edit_task))
        .route("/static/js/main.js", get(main_js))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn main_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], MAIN_JS)
}

async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let students = repository::fetch_students_for_dashboard(&state.db).await?;
    let tasks = repository::fetch_tasks_for_dashboard(&state.db).await?;
    Ok(Html(views::dashboard_page(&students, &tasks)))
}

async fn student_detail(
    State(state): State<AppState>,
    PageId(id): PageId,
) -> Result<Html<String>, AppError> {
    let student = repository::find_student_by_id(&state.db, id)
        .await?
        .ok_or(AppError::PageNotFound)?;
    let tasks = repository::fetch_tasks_for_student(&state.db, id).await?;
    Ok(Html(views::student_detail_page(&student, &tasks)))
}

async fn add_student_form() -> Html<String> {
    Html(views::add_student_page())
}

async fn create_student(
    State(state): State<AppState>,
    Form(form): Form<NewStudentForm>,
) -> Result<Redirect, AppError> {
    let new = form.validate()?;
    let student = repository::insert_student(&state.db, new).await?;
    info!("created student {}", student.id);
    Ok(Redirect::to("/"))
}

async fn delete_student(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<StudentDeletedResponse>, AppError> {
    if !repository::delete_student(&state.db, id).await? {
        return Err(AppError::not_found("Student not found"));
    }
    info!("deleted student {} and its tasks", id);
    Ok(Json(StudentDeletedResponse {
        success: true,
        student_id: id,
    }))
}

async fn create_task(
    State(state): State<AppState>,
    RecordId(student_id): RecordId,
    submission: Submission<NewTaskForm>,
) -> Result<Response, AppError> {
    let student = repository::find_student_by_id(&state.db, student_id)
        .await?
        .ok_or_else(|| AppError::not_found("Student not found"))?;

    let new = submission.fields.validate(student.id)?;
    let task = repository::insert_task(&state.db, new).await?;
    info!("created task {} for student {}", task.id, student.id);

    if submission.wants_json {
        return Ok(Json(TaskCreatedResponse {
            success: true,
            task,
        })
        .into_response());
    }
    Ok(Redirect::to(&format!("/student/{}", student.id)).into_response())
}

async fn toggle_task(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<ToggleResponse>, AppError> {
    let task = repository::toggle_task(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    info!("task {} completed={}", task.id, task.completed);
    Ok(Json(ToggleResponse {
        success: true,
        completed: task.completed,
    }))
}

async fn edit_task(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    submission: Submission<EditTaskForm>,
) -> Result<Json<EditResponse>, AppError> {
    if repository::find_task_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::not_found("Task not found"));
    }

    let description = submission.fields.validate()?;
    let task = repository::update_task_description(&state.db, id, &description)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    info!("renamed task {}", task.id);
    Ok(Json(EditResponse {
        success: true,
        description: task.description,
    }))
}

async fn delete_task(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<Json<TaskDeletedResponse>, AppError> {
    if repository::find_task_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::not_found("Task not found"));
    }

    if !repository::delete_task(&state.db, id).await? {
        return Err(AppError::not_found("Task not found"));
    }
    info!("deleted task {}", id);
    Ok(Json(TaskDeletedResponse {
        success: true,
        task_id: id,
    }))
}

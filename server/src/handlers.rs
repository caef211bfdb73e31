// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::database;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use common::wire::{
    CreateDeadline, CreateItem, CreateNote, CreateSession, CreateSubject, DeadlineQuery,
    DeadlineRecord, ErrorBody, HealthStatus, ItemQuery, ItemRecord, NoteQuery, NoteRecord,
    ProgressStats, SessionQuery, SessionRecord, SubjectRecord, UpdateDeadline, UpdateItem,
    UpdateNote, UpdateSession,
};
use sqlx::SqlitePool;
use tracing::{debug, error, info};

fn require(value: &str, message: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        error!("Validation failed: {}", message);
        return Err(AppError::new(StatusCode::BAD_REQUEST, message));
    }
    Ok(())
}

// --- Study sessions ---

/// Handler for listing sessions, optionally within a date range.
pub async fn list_sessions(
    State(pool): State<SqlitePool>,
    Query(filter): Query<SessionQuery>,
) -> Result<Json<Vec<SessionRecord>>, AppError> {
    let sessions = database::get_sessions_from_db(&pool, &filter).await?;
    info!("Successfully retrieved {} sessions.", sessions.len());
    Ok(Json(sessions))
}

pub async fn get_session(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Json<SessionRecord>, AppError> {
    database::get_session_from_db(&pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Session", id))
}

/// Handler for creating a session. An end before the start is rejected.
pub async fn create_session(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateSession>,
) -> Result<(StatusCode, Json<SessionRecord>), AppError> {
    debug!("Received request to create session: {}", payload.title);
    require(&payload.title, "Title is required.")?;
    if payload.end_time < payload.start_time {
        error!(
            "Validation failed: session ends ({}) before it starts ({}).",
            payload.end_time, payload.start_time
        );
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "A session cannot end before it starts.",
        ));
    }

    let session = database::create_session_in_db(&pool, payload).await?;
    info!("Session created successfully with ID: {}", session.id);
    Ok((StatusCode::CREATED, Json(session)))
}

/// Handler for editing a session, including moving it to another slot.
pub async fn update_session(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(changes): Json<UpdateSession>,
) -> Result<Json<SessionRecord>, AppError> {
    debug!("Received request to update session {}", id);
    if let Some(title) = &changes.title {
        require(title, "Title is required.")?;
    }
    let session = database::update_session_in_db(&pool, id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Session", id))?;
    info!("Session {} updated.", id);
    Ok(Json(session))
}

pub async fn delete_session(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete session with ID: {}", id);
    if database::delete_session_from_db(&pool, id).await? {
        info!("Session with ID {} deleted successfully.", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Session", id))
    }
}

// --- Deadlines ---

pub async fn list_deadlines(
    State(pool): State<SqlitePool>,
    Query(filter): Query<DeadlineQuery>,
) -> Result<Json<Vec<DeadlineRecord>>, AppError> {
    let deadlines = database::get_deadlines_from_db(&pool, &filter).await?;
    info!("Successfully retrieved {} deadlines.", deadlines.len());
    Ok(Json(deadlines))
}

pub async fn get_deadline(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Json<DeadlineRecord>, AppError> {
    database::get_deadline_from_db(&pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Deadline", id))
}

pub async fn create_deadline(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateDeadline>,
) -> Result<(StatusCode, Json<DeadlineRecord>), AppError> {
    debug!("Received request to create deadline: {}", payload.title);
    require(&payload.title, "Title is required.")?;

    let deadline = database::create_deadline_in_db(&pool, payload).await?;
    info!("Deadline created successfully with ID: {}", deadline.id);
    Ok((StatusCode::CREATED, Json(deadline)))
}

pub async fn update_deadline(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(changes): Json<UpdateDeadline>,
) -> Result<Json<DeadlineRecord>, AppError> {
    if let Some(title) = &changes.title {
        require(title, "Title is required.")?;
    }
    let deadline = database::update_deadline_in_db(&pool, id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Deadline", id))?;
    info!("Deadline {} updated.", id);
    Ok(Json(deadline))
}

pub async fn delete_deadline(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete deadline with ID: {}", id);
    if database::delete_deadline_from_db(&pool, id).await? {
        info!("Deadline with ID {} deleted successfully.", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Deadline", id))
    }
}

// --- Study items ---

pub async fn list_items(
    State(pool): State<SqlitePool>,
    Query(filter): Query<ItemQuery>,
) -> Result<Json<Vec<ItemRecord>>, AppError> {
    let items = database::get_items_from_db(&pool, &filter).await?;
    info!("Successfully retrieved {} items.", items.len());
    Ok(Json(items))
}

pub async fn create_item(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateItem>,
) -> Result<(StatusCode, Json<ItemRecord>), AppError> {
    debug!("Received request to create item: {}", payload.title);
    require(&payload.title, "Title is required.")?;

    let item = database::create_item_in_db(&pool, payload).await?;
    info!("Item created successfully with ID: {}", item.id);
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for editing an item, which is also how completion is toggled.
pub async fn update_item(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(changes): Json<UpdateItem>,
) -> Result<Json<ItemRecord>, AppError> {
    if let Some(title) = &changes.title {
        require(title, "Title is required.")?;
    }
    let item = database::update_item_in_db(&pool, id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Item", id))?;
    info!("Item {} updated (completed: {}).", id, item.is_completed);
    Ok(Json(item))
}

pub async fn delete_item(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete item with ID: {}", id);
    if database::delete_item_from_db(&pool, id).await? {
        info!("Item with ID {} deleted successfully.", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Item", id))
    }
}

pub async fn item_progress(
    State(pool): State<SqlitePool>,
) -> Result<Json<ProgressStats>, AppError> {
    let progress = database::get_progress_from_db(&pool).await?;
    debug!(
        "Progress: {}/{} items completed.",
        progress.completed, progress.total
    );
    Ok(Json(progress))
}

// --- Notes ---

pub async fn list_notes(
    State(pool): State<SqlitePool>,
    Query(filter): Query<NoteQuery>,
) -> Result<Json<Vec<NoteRecord>>, AppError> {
    let notes = database::get_notes_from_db(&pool, &filter).await?;
    info!("Successfully retrieved {} notes.", notes.len());
    Ok(Json(notes))
}

pub async fn create_note(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateNote>,
) -> Result<(StatusCode, Json<NoteRecord>), AppError> {
    debug!("Received request to create note: {}", payload.title);
    require(&payload.title, "Title is required.")?;
    require(&payload.content, "Content is required.")?;

    let note = database::create_note_in_db(&pool, payload).await?;
    info!("Note created successfully with ID: {}", note.id);
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(changes): Json<UpdateNote>,
) -> Result<Json<NoteRecord>, AppError> {
    if let Some(content) = &changes.content {
        require(content, "Content is required.")?;
    }
    let note = database::update_note_in_db(&pool, id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Note", id))?;
    info!("Note {} updated.", id);
    Ok(Json(note))
}

pub async fn delete_note(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete note with ID: {}", id);
    if database::delete_note_from_db(&pool, id).await? {
        info!("Note with ID {} deleted successfully.", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Note", id))
    }
}

// --- Subjects ---

pub async fn list_subjects(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<SubjectRecord>>, AppError> {
    let subjects = database::get_subjects_from_db(&pool).await?;
    info!("Successfully retrieved {} subjects.", subjects.len());
    Ok(Json(subjects))
}

/// Handler for creating a subject. Names are unique.
pub async fn create_subject(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateSubject>,
) -> Result<(StatusCode, Json<SubjectRecord>), AppError> {
    debug!("Received request to create subject: {}", payload.name);
    require(&payload.name, "Name is required.")?;
    if database::subject_name_exists(&pool, &payload.name).await? {
        error!("Subject {} already exists.", payload.name);
        return Err(AppError::new(
            StatusCode::CONFLICT,
            &format!("Subject {} already exists.", payload.name),
        ));
    }

    let subject = database::create_subject_in_db(&pool, payload).await?;
    info!("Subject created successfully with ID: {}", subject.id);
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn delete_subject(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete subject with ID: {}", id);
    if database::delete_subject_from_db(&pool, id).await? {
        info!("Subject with ID {} deleted successfully.", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Subject", id))
    }
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Local::now().naive_local(),
    })
}

// --- Custom Error Handling ---

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    fn not_found(entity: &str, id: i64) -> Self {
        error!("{} with ID {} not found.", entity, id);
        Self::new(
            StatusCode::NOT_FOUND,
            &format!("{entity} with ID {id} not found."),
        )
    }
}

/// Allows converting an `anyhow::Error` (coming from `database.rs`)
/// into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self {
            code: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred.".to_string(),
        }
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        (
            self.code,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session_payload(title: &str, start_hour: u32, end_hour: u32) -> Json<CreateSession> {
        let day = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        Json(CreateSession {
            title: title.to_string(),
            description: None,
            subject: None,
            color: None,
            start_time: day.and_hms_opt(start_hour, 0, 0).unwrap(),
            end_time: day.and_hms_opt(end_hour, 0, 0).unwrap(),
            is_completed: None,
        })
    }

    #[tokio::test]
    async fn test_create_session_validation_empty_title() {
        // The validation fails before any DB access.
        let pool = database::connect_in_memory().await.unwrap();

        let err = create_session(State(pool), session_payload("   ", 9, 10))
            .await
            .unwrap_err();

        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Title is required.");
    }

    #[tokio::test]
    async fn test_create_session_rejects_reversed_interval() {
        let pool = database::connect_in_memory().await.unwrap();

        let err = create_session(State(pool), session_payload("Backwards", 10, 9))
            .await
            .unwrap_err();

        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("cannot end before it starts"));
    }

    #[tokio::test]
    async fn test_duplicate_subject_is_a_conflict() {
        let pool = database::connect_in_memory().await.unwrap();
        let payload = || {
            Json(CreateSubject {
                name: "Physics".into(),
                color: Some("orange".into()),
            })
        };

        let (status, _) = create_subject(State(pool.clone()), payload()).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let err = create_subject(State(pool), payload()).await.unwrap_err();
        assert_eq!(err.code, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_deleting_unknown_note_is_not_found() {
        let pool = database::connect_in_memory().await.unwrap();

        let err = delete_note(State(pool), Path(404)).await.unwrap_err();
        assert_eq!(err.code, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Note with ID 404 not found.");
    }
}

// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use axum::{
    routing::{delete, get, put},
    Router,
};
use sqlx::SqlitePool;

/// Creates and configures the application router.
pub fn create_router(pool: SqlitePool) -> Router {
    Router::new()
        // Time blocks, stored as absolute sessions
        .route(
            "/api/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session)
                .put(handlers::update_session)
                .delete(handlers::delete_session),
        )
        .route(
            "/api/deadlines",
            get(handlers::list_deadlines).post(handlers::create_deadline),
        )
        .route(
            "/api/deadlines/{id}",
            get(handlers::get_deadline)
                .put(handlers::update_deadline)
                .delete(handlers::delete_deadline),
        )
        // Checklist items; the static `progress` segment wins over `{id}`
        .route("/api/items", get(handlers::list_items).post(handlers::create_item))
        .route("/api/items/progress", get(handlers::item_progress))
        .route(
            "/api/items/{id}",
            put(handlers::update_item).delete(handlers::delete_item),
        )
        .route("/api/notes", get(handlers::list_notes).post(handlers::create_note))
        .route(
            "/api/notes/{id}",
            put(handlers::update_note).delete(handlers::delete_note),
        )
        .route(
            "/api/subjects",
            get(handlers::list_subjects).post(handlers::create_subject),
        )
        .route(
            "/api/subjects/{id}",
            delete(handlers::delete_subject),
        )
        .route("/api/health", get(handlers::health))
        // Adds the database pool to the application state
        .with_state(pool)
}

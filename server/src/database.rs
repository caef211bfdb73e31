// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use common::model::{Color, Priority};
use common::wire::{
    progress_percentage, CreateDeadline, CreateItem, CreateNote, CreateSession, CreateSubject,
    DeadlineQuery, DeadlineRecord, ItemQuery, ItemRecord, NoteQuery, NoteRecord, ProgressStats,
    SessionQuery, SessionRecord, SubjectProgress, SubjectRecord, UpdateDeadline, UpdateItem,
    UpdateNote, UpdateSession,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS study_sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NULL,
        subject TEXT NULL,
        color TEXT NOT NULL DEFAULT 'purple',
        start_time TIMESTAMP NOT NULL,
        end_time TIMESTAMP NOT NULL,
        is_completed BOOLEAN NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    );
    CREATE TABLE IF NOT EXISTS deadlines (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NULL,
        subject TEXT NULL,
        color TEXT NOT NULL DEFAULT 'orange',
        due_date TIMESTAMP NOT NULL,
        priority TEXT NOT NULL DEFAULT 'medium',
        is_completed BOOLEAN NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    );
    CREATE TABLE IF NOT EXISTS study_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NULL,
        subject TEXT NULL,
        is_completed BOOLEAN NOT NULL DEFAULT 0,
        "order" INTEGER NOT NULL DEFAULT 0,
        deadline_id INTEGER NULL REFERENCES deadlines(id),
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL,
        completed_at TIMESTAMP NULL
    );
    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        subject TEXT NULL,
        session_id INTEGER NULL REFERENCES study_sessions(id),
        show_date TIMESTAMP NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    );
    CREATE TABLE IF NOT EXISTS subjects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        color TEXT NOT NULL DEFAULT 'purple',
        created_at TIMESTAMP NOT NULL
    );
"#;

/// Wall-clock time used for every stored timestamp.
fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Establishes the database connection pool.
/// If the database (or its directory) does not exist, it creates it.
/// It also ensures every table has the correct schema.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if let Some(parent) = database_url
        .strip_prefix("sqlite://")
        .and_then(|path| Path::new(path).parent())
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }

    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    init_schema(&pool).await?;
    Ok(pool)
}

/// A private in-memory database. A single connection keeps every query on
/// the same memory database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory database")?;
    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to create tables")?;
    info!("Database tables are ready.");
    Ok(())
}

// --- Study sessions ---

/// Lists sessions ordered by start time, optionally restricted to those
/// starting at or after `start` and ending at or before `end`.
pub async fn get_sessions_from_db(
    pool: &SqlitePool,
    filter: &SessionQuery,
) -> Result<Vec<SessionRecord>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM study_sessions WHERE 1 = 1");
    if let Some(start) = filter.start {
        query.push(" AND start_time >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        query.push(" AND end_time <= ").push_bind(end);
    }
    query.push(" ORDER BY start_time ASC, id ASC");

    query
        .build_query_as::<SessionRecord>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve sessions from DB")
}

pub async fn get_session_from_db(pool: &SqlitePool, id: i64) -> Result<Option<SessionRecord>> {
    sqlx::query_as::<_, SessionRecord>("SELECT * FROM study_sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve session {id}"))
}

pub async fn create_session_in_db(
    pool: &SqlitePool,
    payload: CreateSession,
) -> Result<SessionRecord> {
    let created_at = now();
    let color = payload.color.unwrap_or_else(|| Color::Purple.to_string());
    debug!(
        "Insert session: title={}, start_time={}, end_time={}",
        payload.title, payload.start_time, payload.end_time
    );

    let id = sqlx::query(
        "INSERT INTO study_sessions (title, description, subject, color, start_time, end_time, is_completed, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.subject)
    .bind(&color)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.is_completed.unwrap_or(false))
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert session into DB")?
    .last_insert_rowid();

    Ok(SessionRecord {
        id,
        title: payload.title,
        description: payload.description,
        subject: payload.subject,
        color,
        start_time: payload.start_time,
        end_time: payload.end_time,
        is_completed: payload.is_completed.unwrap_or(false),
        created_at,
        updated_at: created_at,
    })
}

/// Applies a partial update. Returns `None` if no session has this id.
pub async fn update_session_in_db(
    pool: &SqlitePool,
    id: i64,
    changes: UpdateSession,
) -> Result<Option<SessionRecord>> {
    let Some(mut session) = get_session_from_db(pool, id).await? else {
        return Ok(None);
    };

    if let Some(title) = changes.title {
        session.title = title;
    }
    if changes.description.is_some() {
        session.description = changes.description;
    }
    if changes.subject.is_some() {
        session.subject = changes.subject;
    }
    if let Some(color) = changes.color {
        session.color = color;
    }
    if let Some(start_time) = changes.start_time {
        session.start_time = start_time;
    }
    if let Some(end_time) = changes.end_time {
        session.end_time = end_time;
    }
    if let Some(is_completed) = changes.is_completed {
        session.is_completed = is_completed;
    }
    session.updated_at = now();

    sqlx::query(
        "UPDATE study_sessions SET title = ?, description = ?, subject = ?, color = ?, start_time = ?, end_time = ?, is_completed = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&session.title)
    .bind(&session.description)
    .bind(&session.subject)
    .bind(&session.color)
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(session.is_completed)
    .bind(session.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update session {id}"))?;

    Ok(Some(session))
}

/// Returns true if a row was deleted.
pub async fn delete_session_from_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    delete_by_id(pool, "study_sessions", id).await
}

// --- Deadlines ---

pub async fn get_deadlines_from_db(
    pool: &SqlitePool,
    filter: &DeadlineQuery,
) -> Result<Vec<DeadlineRecord>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM deadlines WHERE 1 = 1");
    if let Some(completed) = filter.completed {
        query.push(" AND is_completed = ").push_bind(completed);
    }
    if let Some(subject) = &filter.subject {
        query.push(" AND subject = ").push_bind(subject.clone());
    }
    query.push(" ORDER BY due_date ASC, id ASC");

    query
        .build_query_as::<DeadlineRecord>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve deadlines from DB")
}

pub async fn get_deadline_from_db(pool: &SqlitePool, id: i64) -> Result<Option<DeadlineRecord>> {
    sqlx::query_as::<_, DeadlineRecord>("SELECT * FROM deadlines WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve deadline {id}"))
}

pub async fn create_deadline_in_db(
    pool: &SqlitePool,
    payload: CreateDeadline,
) -> Result<DeadlineRecord> {
    let created_at = now();
    let color = payload.color.unwrap_or_else(|| Color::Orange.to_string());
    let priority = payload
        .priority
        .unwrap_or_else(|| Priority::default().as_str().to_string());
    let is_completed = payload.is_completed.unwrap_or(false);

    let id = sqlx::query(
        "INSERT INTO deadlines (title, description, subject, color, due_date, priority, is_completed, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.subject)
    .bind(&color)
    .bind(payload.due_date)
    .bind(&priority)
    .bind(is_completed)
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert deadline into DB")?
    .last_insert_rowid();

    Ok(DeadlineRecord {
        id,
        title: payload.title,
        description: payload.description,
        subject: payload.subject,
        color,
        due_date: payload.due_date,
        priority,
        is_completed,
        created_at,
        updated_at: created_at,
    })
}

pub async fn update_deadline_in_db(
    pool: &SqlitePool,
    id: i64,
    changes: UpdateDeadline,
) -> Result<Option<DeadlineRecord>> {
    let Some(mut deadline) = get_deadline_from_db(pool, id).await? else {
        return Ok(None);
    };

    if let Some(title) = changes.title {
        deadline.title = title;
    }
    if changes.description.is_some() {
        deadline.description = changes.description;
    }
    if changes.subject.is_some() {
        deadline.subject = changes.subject;
    }
    if let Some(color) = changes.color {
        deadline.color = color;
    }
    if let Some(due_date) = changes.due_date {
        deadline.due_date = due_date;
    }
    if let Some(priority) = changes.priority {
        deadline.priority = priority;
    }
    if let Some(is_completed) = changes.is_completed {
        deadline.is_completed = is_completed;
    }
    deadline.updated_at = now();

    sqlx::query(
        "UPDATE deadlines SET title = ?, description = ?, subject = ?, color = ?, due_date = ?, priority = ?, is_completed = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&deadline.title)
    .bind(&deadline.description)
    .bind(&deadline.subject)
    .bind(&deadline.color)
    .bind(deadline.due_date)
    .bind(&deadline.priority)
    .bind(deadline.is_completed)
    .bind(deadline.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update deadline {id}"))?;

    Ok(Some(deadline))
}

pub async fn delete_deadline_from_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    delete_by_id(pool, "deadlines", id).await
}

// --- Study items ---

pub async fn get_items_from_db(pool: &SqlitePool, filter: &ItemQuery) -> Result<Vec<ItemRecord>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM study_items WHERE 1 = 1");
    if let Some(completed) = filter.completed {
        query.push(" AND is_completed = ").push_bind(completed);
    }
    if let Some(subject) = &filter.subject {
        query.push(" AND subject = ").push_bind(subject.clone());
    }
    if let Some(deadline_id) = filter.deadline_id {
        query.push(" AND deadline_id = ").push_bind(deadline_id);
    }
    query.push(r#" ORDER BY "order" ASC, created_at ASC, id ASC"#);

    query
        .build_query_as::<ItemRecord>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve items from DB")
}

pub async fn get_item_from_db(pool: &SqlitePool, id: i64) -> Result<Option<ItemRecord>> {
    sqlx::query_as::<_, ItemRecord>("SELECT * FROM study_items WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve item {id}"))
}

/// Inserts an item. Without an explicit order it goes after every
/// existing item.
pub async fn create_item_in_db(pool: &SqlitePool, payload: CreateItem) -> Result<ItemRecord> {
    let created_at = now();
    let order = match payload.order {
        Some(order) => order,
        None => {
            let max_order: i64 =
                sqlx::query_scalar(r#"SELECT COALESCE(MAX("order"), 0) FROM study_items"#)
                    .fetch_one(pool)
                    .await
                    .context("Failed to read the current item order")?;
            max_order + 1
        }
    };
    let is_completed = payload.is_completed.unwrap_or(false);
    let completed_at = is_completed.then_some(created_at);

    let id = sqlx::query(
        r#"INSERT INTO study_items (title, description, subject, is_completed, "order", deadline_id, created_at, updated_at, completed_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.subject)
    .bind(is_completed)
    .bind(order)
    .bind(payload.deadline_id)
    .bind(created_at)
    .bind(created_at)
    .bind(completed_at)
    .execute(pool)
    .await
    .context("Failed to insert item into DB")?
    .last_insert_rowid();

    Ok(ItemRecord {
        id,
        title: payload.title,
        description: payload.description,
        subject: payload.subject,
        is_completed,
        order,
        deadline_id: payload.deadline_id,
        created_at,
        updated_at: created_at,
        completed_at,
    })
}

/// Applies a partial update. Changing `is_completed` stamps or clears
/// `completed_at`.
pub async fn update_item_in_db(
    pool: &SqlitePool,
    id: i64,
    changes: UpdateItem,
) -> Result<Option<ItemRecord>> {
    let Some(mut item) = get_item_from_db(pool, id).await? else {
        return Ok(None);
    };
    let timestamp = now();

    if let Some(title) = changes.title {
        item.title = title;
    }
    if changes.description.is_some() {
        item.description = changes.description;
    }
    if changes.subject.is_some() {
        item.subject = changes.subject;
    }
    if let Some(order) = changes.order {
        item.order = order;
    }
    if changes.deadline_id.is_some() {
        item.deadline_id = changes.deadline_id;
    }
    if let Some(is_completed) = changes.is_completed {
        item.is_completed = is_completed;
        item.completed_at = is_completed.then_some(timestamp);
    }
    item.updated_at = timestamp;

    sqlx::query(
        r#"UPDATE study_items SET title = ?, description = ?, subject = ?, is_completed = ?, "order" = ?, deadline_id = ?, updated_at = ?, completed_at = ? WHERE id = ?"#,
    )
    .bind(&item.title)
    .bind(&item.description)
    .bind(&item.subject)
    .bind(item.is_completed)
    .bind(item.order)
    .bind(item.deadline_id)
    .bind(item.updated_at)
    .bind(item.completed_at)
    .bind(id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update item {id}"))?;

    Ok(Some(item))
}

pub async fn delete_item_from_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    delete_by_id(pool, "study_items", id).await
}

/// Completion statistics across all items and per named subject.
pub async fn get_progress_from_db(pool: &SqlitePool) -> Result<ProgressStats> {
    let rows: Vec<(Option<String>, i64, i64)> = sqlx::query_as(
        "SELECT subject, COUNT(id), COALESCE(SUM(CASE WHEN is_completed THEN 1 ELSE 0 END), 0) FROM study_items GROUP BY subject",
    )
    .fetch_all(pool)
    .await
    .context("Failed to compute item progress")?;

    let mut total = 0;
    let mut completed = 0;
    let mut by_subject = BTreeMap::new();
    for (subject, subject_total, subject_completed) in rows {
        total += subject_total;
        completed += subject_completed;
        if let Some(subject) = subject.filter(|s| !s.is_empty()) {
            by_subject.insert(
                subject,
                SubjectProgress {
                    total: subject_total,
                    completed: subject_completed,
                    percentage: progress_percentage(subject_completed, subject_total),
                },
            );
        }
    }

    Ok(ProgressStats {
        total,
        completed,
        percentage: progress_percentage(completed, total),
        by_subject,
    })
}

// --- Notes ---

/// Lists notes newest first. With `show_today`, notes scheduled for a
/// later date are hidden.
pub async fn get_notes_from_db(pool: &SqlitePool, filter: &NoteQuery) -> Result<Vec<NoteRecord>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM notes WHERE 1 = 1");
    if let Some(subject) = &filter.subject {
        query.push(" AND subject = ").push_bind(subject.clone());
    }
    if let Some(session_id) = filter.session_id {
        query.push(" AND session_id = ").push_bind(session_id);
    }
    if filter.show_today == Some(true) {
        query
            .push(" AND (show_date IS NULL OR date(show_date) <= date(")
            .push_bind(now().date())
            .push("))");
    }
    query.push(" ORDER BY created_at DESC, id DESC");

    query
        .build_query_as::<NoteRecord>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve notes from DB")
}

pub async fn get_note_from_db(pool: &SqlitePool, id: i64) -> Result<Option<NoteRecord>> {
    sqlx::query_as::<_, NoteRecord>("SELECT * FROM notes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve note {id}"))
}

pub async fn create_note_in_db(pool: &SqlitePool, payload: CreateNote) -> Result<NoteRecord> {
    let created_at = now();
    let id = sqlx::query(
        "INSERT INTO notes (title, content, subject, session_id, show_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(&payload.subject)
    .bind(payload.session_id)
    .bind(payload.show_date)
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert note into DB")?
    .last_insert_rowid();

    Ok(NoteRecord {
        id,
        title: payload.title,
        content: payload.content,
        subject: payload.subject,
        session_id: payload.session_id,
        show_date: payload.show_date,
        created_at,
        updated_at: created_at,
    })
}

pub async fn update_note_in_db(
    pool: &SqlitePool,
    id: i64,
    changes: UpdateNote,
) -> Result<Option<NoteRecord>> {
    let Some(mut note) = get_note_from_db(pool, id).await? else {
        return Ok(None);
    };

    if let Some(title) = changes.title {
        note.title = title;
    }
    if let Some(content) = changes.content {
        note.content = content;
    }
    if changes.subject.is_some() {
        note.subject = changes.subject;
    }
    if changes.session_id.is_some() {
        note.session_id = changes.session_id;
    }
    if changes.show_date.is_some() {
        note.show_date = changes.show_date;
    }
    note.updated_at = now();

    sqlx::query(
        "UPDATE notes SET title = ?, content = ?, subject = ?, session_id = ?, show_date = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&note.title)
    .bind(&note.content)
    .bind(&note.subject)
    .bind(note.session_id)
    .bind(note.show_date)
    .bind(note.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update note {id}"))?;

    Ok(Some(note))
}

pub async fn delete_note_from_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    delete_by_id(pool, "notes", id).await
}

// --- Subjects ---

pub async fn get_subjects_from_db(pool: &SqlitePool) -> Result<Vec<SubjectRecord>> {
    sqlx::query_as::<_, SubjectRecord>("SELECT * FROM subjects ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve subjects from DB")
}

pub async fn subject_name_exists(pool: &SqlitePool, name: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subjects WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .context("Failed to look up subject name")?;
    Ok(count > 0)
}

pub async fn create_subject_in_db(
    pool: &SqlitePool,
    payload: CreateSubject,
) -> Result<SubjectRecord> {
    let created_at = now();
    let color = payload.color.unwrap_or_else(|| Color::Purple.to_string());

    let id = sqlx::query("INSERT INTO subjects (name, color, created_at) VALUES (?, ?, ?)")
        .bind(&payload.name)
        .bind(&color)
        .bind(created_at)
        .execute(pool)
        .await
        .context("Failed to insert subject into DB")?
        .last_insert_rowid();

    Ok(SubjectRecord {
        id,
        name: payload.name,
        color,
        created_at,
    })
}

/// Deletes the subject row only. Items and deadlines that mention the
/// subject by name are left alone.
pub async fn delete_subject_from_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    delete_by_id(pool, "subjects", id).await
}

async fn delete_by_id(pool: &SqlitePool, table: &'static str, id: i64) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete row {id} from {table}"))?;

    let rows_affected = result.rows_affected();
    info!("Deleted {} rows with ID {} from {}", rows_affected, id, table);
    Ok(rows_affected > 0)
}

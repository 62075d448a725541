//! SQLite persistence. One `resumes` row per candidate keyed by mobile, plus
//! ordered `work_experiences` rows that cascade on delete.

use std::collections::HashMap;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::models::resume::{
    ResumeRecord, ResumeRow, ResumeUpdate, WorkExperience, WorkExperienceRow,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS resumes (
        mobile           TEXT PRIMARY KEY NOT NULL,
        name             TEXT NOT NULL DEFAULT '',
        email            TEXT NOT NULL DEFAULT '',
        graduation       TEXT NOT NULL DEFAULT '',
        skills           TEXT NOT NULL DEFAULT '[]',
        education        TEXT NOT NULL DEFAULT '[]',
        total_experience INTEGER NOT NULL DEFAULT 0,
        source_file      TEXT NOT NULL DEFAULT '',
        created_at       TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS work_experiences (
        mobile              TEXT NOT NULL REFERENCES resumes(mobile) ON DELETE CASCADE,
        position            INTEGER NOT NULL,
        company             TEXT NOT NULL DEFAULT '',
        role                TEXT NOT NULL DEFAULT '',
        duration            TEXT NOT NULL DEFAULT '',
        calculated_duration INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (mobile, position)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_resumes_created_at ON resumes (created_at)",
];

/// Opens (and creates if missing) the SQLite database at `database_url`.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database {database_url}");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("Failed to open SQLite database")?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Creates the tables if they do not exist yet. Safe to run on every start.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Schema migration failed")?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Inserted,
    /// A record with the same mobile already exists; nothing was written.
    Skipped,
}

#[derive(Debug, Default, Serialize)]
pub struct SaveReport {
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
}

/// Stored-record filters. Empty strings count as absent.
#[derive(Debug, Default)]
pub struct SearchFilter {
    pub name: Option<String>,
    pub company: Option<String>,
    pub graduation: Option<String>,
    pub created_since: Option<NaiveDate>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Inserts `record` unless its mobile is already stored. The resume row and
/// its experiences are written in one transaction.
pub async fn insert_resume(
    pool: &SqlitePool,
    record: &ResumeRecord,
    today: NaiveDate,
) -> sqlx::Result<SaveOutcome> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO resumes
            (mobile, name, email, graduation, skills, education,
             total_experience, source_file, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (mobile) DO NOTHING
        "#,
    )
    .bind(&record.mobile)
    .bind(&record.name)
    .bind(&record.email)
    .bind(&record.graduation)
    .bind(Json(&record.skills))
    .bind(Json(&record.education))
    .bind(record.total_experience)
    .bind(&record.source_file)
    .bind(today)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if inserted == 0 {
        info!("Skipped {}: mobile {} already stored", record.name, record.mobile);
        return Ok(SaveOutcome::Skipped);
    }

    insert_experience(&mut tx, &record.mobile, &record.experience).await?;
    tx.commit().await?;

    info!("Stored {} ({})", record.name, record.mobile);
    Ok(SaveOutcome::Inserted)
}

async fn insert_experience(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    mobile: &str,
    experience: &[WorkExperience],
) -> sqlx::Result<()> {
    for (position, e) in experience.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO work_experiences
                (mobile, position, company, role, duration, calculated_duration)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(mobile)
        .bind(position as i64)
        .bind(&e.company)
        .bind(&e.role)
        .bind(&e.duration)
        .bind(e.calculated_duration)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Inserts each record in order, reporting which mobiles were new.
pub async fn save_batch(
    pool: &SqlitePool,
    records: &[ResumeRecord],
    today: NaiveDate,
) -> sqlx::Result<SaveReport> {
    let mut report = SaveReport::default();
    for record in records {
        match insert_resume(pool, record, today).await? {
            SaveOutcome::Inserted => report.inserted.push(record.mobile.clone()),
            SaveOutcome::Skipped => report.skipped.push(record.mobile.clone()),
        }
    }
    Ok(report)
}

/// All stored records in insertion order.
pub async fn fetch_resumes(pool: &SqlitePool) -> sqlx::Result<Vec<ResumeRecord>> {
    search_resumes(pool, &SearchFilter::default()).await
}

pub async fn get_resume(pool: &SqlitePool, mobile: &str) -> sqlx::Result<Option<ResumeRecord>> {
    let row: Option<ResumeRow> = sqlx::query_as("SELECT * FROM resumes WHERE mobile = ?")
        .bind(mobile)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let mut experience = load_experience(pool, &[row.mobile.clone()]).await?;
    let jobs = experience.remove(&row.mobile).unwrap_or_default();
    Ok(Some(row.into_record(jobs)))
}

/// Replaces every editable field of a stored record. Returns `false` when
/// no record has that mobile.
pub async fn update_resume(
    pool: &SqlitePool,
    mobile: &str,
    update: &ResumeUpdate,
) -> sqlx::Result<bool> {
    let total: i64 = update.experience.iter().map(|e| e.calculated_duration).sum();
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE resumes
        SET name = ?, email = ?, graduation = ?, skills = ?, education = ?,
            total_experience = ?
        WHERE mobile = ?
        "#,
    )
    .bind(&update.name)
    .bind(&update.email)
    .bind(&update.graduation)
    .bind(Json(&update.skills))
    .bind(Json(&update.education))
    .bind(total)
    .bind(mobile)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM work_experiences WHERE mobile = ?")
        .bind(mobile)
        .execute(&mut *tx)
        .await?;
    insert_experience(&mut tx, mobile, &update.experience).await?;
    tx.commit().await?;

    info!("Updated {mobile}");
    Ok(true)
}

/// Deletes a record and, through the foreign key, its experiences.
pub async fn delete_resume(pool: &SqlitePool, mobile: &str) -> sqlx::Result<bool> {
    let deleted = sqlx::query("DELETE FROM resumes WHERE mobile = ?")
        .bind(mobile)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted > 0 {
        info!("Deleted {mobile}");
    }
    Ok(deleted > 0)
}

/// Stored records matching every non-empty filter. Text filters are
/// case-insensitive substring matches; `company` matches any experience.
pub async fn search_resumes(
    pool: &SqlitePool,
    filter: &SearchFilter,
) -> sqlx::Result<Vec<ResumeRecord>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT r.* FROM resumes r WHERE 1 = 1");

    if let Some(name) = non_empty(&filter.name) {
        qb.push(" AND r.name LIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(graduation) = non_empty(&filter.graduation) {
        qb.push(" AND r.graduation LIKE ")
            .push_bind(format!("%{graduation}%"));
    }
    if let Some(company) = non_empty(&filter.company) {
        qb.push(
            " AND EXISTS (SELECT 1 FROM work_experiences w \
             WHERE w.mobile = r.mobile AND w.company LIKE ",
        )
        .push_bind(format!("%{company}%"))
        .push(")");
    }
    if let Some(since) = filter.created_since {
        qb.push(" AND r.created_at >= ").push_bind(since);
    }
    qb.push(" ORDER BY r.rowid");

    let rows: Vec<ResumeRow> = qb.build_query_as().fetch_all(pool).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mobiles: Vec<String> = rows.iter().map(|r| r.mobile.clone()).collect();
    let mut experience = load_experience(pool, &mobiles).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let jobs = experience.remove(&row.mobile).unwrap_or_default();
            row.into_record(jobs)
        })
        .collect())
}

/// Experiences for the given mobiles, keyed by mobile, each list in
/// resume order.
async fn load_experience(
    pool: &SqlitePool,
    mobiles: &[String],
) -> sqlx::Result<HashMap<String, Vec<WorkExperience>>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT * FROM work_experiences WHERE mobile IN (");
    let mut separated = qb.separated(", ");
    for mobile in mobiles {
        separated.push_bind(mobile);
    }
    separated.push_unseparated(") ORDER BY mobile, position");

    let rows: Vec<WorkExperienceRow> = qb.build_query_as().fetch_all(pool).await?;
    let mut by_mobile: HashMap<String, Vec<WorkExperience>> = HashMap::new();
    for row in rows {
        by_mobile
            .entry(row.mobile.clone())
            .or_default()
            .push(row.into());
    }
    Ok(by_mobile)
}

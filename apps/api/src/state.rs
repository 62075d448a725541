use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::extract::FieldExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Field extraction backend, picked from `EXTRACTION_MODE` at startup.
    pub extractor: Arc<dyn FieldExtractor>,
}

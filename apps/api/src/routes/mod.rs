pub mod health;
pub mod resumes;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    response::Html,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// GET /
/// Single-page review UI: upload, edit the preview, save, browse stored records.
async fn index_handler() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health::health_handler))
        .route("/api/v1/uploads", post(uploads::handle_upload))
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list).post(resumes::handle_save),
        )
        .route("/api/v1/resumes/search", get(resumes::handle_search))
        .route("/api/v1/resumes/summary", get(resumes::handle_summary))
        .route("/api/v1/resumes/grouped", get(resumes::handle_grouped))
        .route(
            "/api/v1/resumes/:mobile",
            get(resumes::handle_get)
                .put(resumes::handle_update)
                .delete(resumes::handle_delete),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

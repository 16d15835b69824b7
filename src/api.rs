use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::task;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;
use uuid::Uuid;

use crate::{
    analytics::{self, Question},
    catalog, db,
    models::{PageRequest, ScoreKind},
    AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/stats", get(stats))
        .route("/v1/shows", get(list_shows))
        .route("/v1/shows/{id}", get(get_show))
        .route("/v1/genres", get(list_genres))
        .route("/v1/genres/{id}", get(get_genre))
        .route("/v1/companies", get(list_companies))
        .route("/v1/companies/{id}", get(get_company))
        .route("/v1/people", get(list_people))
        .route("/v1/people/{id}", get(get_person))
        .route("/v1/faq/{question}", get(faq))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: "NOT_FOUND",
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }

    fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            code: "INVALID_ARGUMENT",
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL",
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4().to_string();
        if self.status.is_server_error() {
            error!(trace_id = %trace_id, code = self.code, message = %self.message, "Request failed");
        }
        (
            self.status,
            Json(json!({
                "error": {
                    "code": self.code,
                    "message": self.message,
                    "traceId": trace_id,
                }
            })),
        )
            .into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_argument(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid_argument(rejection.body_text())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    q: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl ListQuery {
    fn to_page(&self, state: &AppState) -> PageRequest {
        let limit = self
            .limit
            .unwrap_or(state.config.page_size)
            .min(state.config.max_page_size);
        PageRequest::new(self.page.unwrap_or(1), limit, self.q.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FaqQuery {
    score: Option<String>,
}

/// Runs `read` against a fresh read-only handle on the blocking pool.
async fn read_catalog<T, F>(state: &AppState, read: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
{
    let db_path = state.config.db_path.clone();
    task::spawn_blocking(move || {
        let conn = db::open_read_only(&db_path)?;
        read(&conn)
    })
    .await
    .map_err(|err| ApiError::internal(format!("Catalog task failed: {err}")))?
    .map_err(|err| ApiError::internal(format!("{err:#}")))
}

fn found<T: Serialize>(value: Option<T>, what: &str, id: i64) -> Result<Json<T>, ApiError> {
    value
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No {what} with id {id}.")))
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true, "timestamp": Utc::now() }))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(read_catalog(&state, catalog::stats).await?))
}

pub async fn list_shows(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query?.to_page(&state);
    let shows = read_catalog(&state, move |conn| catalog::list_shows(conn, &page)).await?;
    Ok(Json(shows))
}

pub async fn get_show(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let show = read_catalog(&state, move |conn| catalog::get_show(conn, id)).await?;
    found(show, "show", id)
}

pub async fn list_genres(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query?.to_page(&state);
    let genres = read_catalog(&state, move |conn| catalog::list_genres(conn, &page)).await?;
    Ok(Json(genres))
}

pub async fn get_genre(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let genre = read_catalog(&state, move |conn| catalog::get_genre(conn, id)).await?;
    found(genre, "genre", id)
}

pub async fn list_companies(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query?.to_page(&state);
    let companies = read_catalog(&state, move |conn| catalog::list_companies(conn, &page)).await?;
    Ok(Json(companies))
}

pub async fn get_company(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let company = read_catalog(&state, move |conn| catalog::get_company(conn, id)).await?;
    found(company, "company", id)
}

pub async fn list_people(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query?.to_page(&state);
    let people = read_catalog(&state, move |conn| catalog::list_people(conn, &page)).await?;
    Ok(Json(people))
}

pub async fn get_person(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let person = read_catalog(&state, move |conn| catalog::get_person(conn, id)).await?;
    found(person, "person", id)
}

pub async fn faq(
    State(state): State<AppState>,
    question: Result<Path<String>, PathRejection>,
    query: Result<Query<FaqQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(slug) = question?;
    let Query(query) = query?;

    let question = Question::parse(&slug)
        .ok_or_else(|| ApiError::invalid_argument(format!("Unknown question `{slug}`.")))?;
    let kind = match query.score.as_deref() {
        None => ScoreKind::default(),
        Some(raw) => ScoreKind::parse(raw).ok_or_else(|| {
            ApiError::invalid_argument(format!("Unknown score `{raw}`; use meta or user."))
        })?,
    };

    let answer: Value =
        read_catalog(&state, move |conn| analytics::answer(conn, question, kind)).await?;
    Ok(Json(json!({
        "question": question.slug(),
        "score": kind.as_str(),
        "answer": answer,
    })))
}

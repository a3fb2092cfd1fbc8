//! Course endpoints

use std::sync::Arc;

use axum::{extract::State, routing::put, Json, Router};
use serde_json::{json, Value};

use crate::http::error::{ApiError, SERVER_ERROR};
use crate::http::extractors::{JsonBody, PathId};
use crate::http::server::AppState;
use crate::models::{CoursePayload, SqlParam};

const UPDATE_COURSE: &str = "update_course";
const DELETE_COURSE: &str = "delete_course";

/// PUT /api/courses/{id} - update name, language and price via `update_course`
async fn update_course(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<CoursePayload>,
) -> Result<Json<Value>, ApiError> {
    let mut params = vec![SqlParam::Int(id)];
    params.extend(payload.into_params());

    state
        .gateway
        .call(UPDATE_COURSE, params)
        .await
        .map_err(|e| ApiError::from_gateway(e, SERVER_ERROR))?;

    Ok(Json(json!({
        "message": format!("Cập nhật Khóa học ID {} thành công!", id)
    })))
}

/// DELETE /api/courses/{id} - delete via `delete_course` (refused while students are enrolled)
async fn delete_course(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
) -> Result<Json<Value>, ApiError> {
    state
        .gateway
        .call(DELETE_COURSE, vec![SqlParam::Int(id)])
        .await
        .map_err(|e| ApiError::from_gateway(e, SERVER_ERROR))?;

    Ok(Json(json!({
        "message": format!("Xóa Khóa học ID {} thành công!", id)
    })))
}

/// Course routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/courses/{id}", put(update_course).delete(delete_course))
}

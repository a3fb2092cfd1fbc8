//! User endpoints
//!
//! Each handler forwards to one stored routine. Only presence and integer
//! checks happen here; business rules live in the procedures.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::http::error::{ApiError, SERVER_ERROR};
use crate::http::extractors::{JsonBody, PathId};
use crate::http::server::AppState;
use crate::models::{IncomeQuery, SqlParam, TeacherCoursesQuery, UserPayload};

const INSERT_USER: &str = "insert_user";
const UPDATE_USER: &str = "update_user";
const DELETE_USER: &str = "delete_user";
const GET_TEACHER_COURSES: &str = "get_teacher_courses";
const CALCULATE_TEACHER_INCOME: &str = "calculate_teacher_income";

pub const USER_CREATED: &str = "Thêm người dùng thành công!";
pub const INVALID_TEACHER_ID: &str = "Lỗi: Teacher ID không hợp lệ.";
pub const INCOME_PARAMS_REQUIRED: &str =
    "Vui lòng cung cấp Teacher ID, Ngày bắt đầu và Ngày kết thúc hợp lệ.";
const COURSES_QUERY_FAILED: &str = "Lỗi máy chủ khi truy vấn dữ liệu.";
const INCOME_FAILED: &str = "Lỗi khi tính thu nhập.";

type Reply = Result<(StatusCode, Json<Value>), ApiError>;

fn message(status: StatusCode, text: String) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": text })))
}

/// POST /api/users - create a user via `insert_user`
async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Reply {
    state
        .gateway
        .call(INSERT_USER, payload.into_params())
        .await
        .map_err(|e| ApiError::from_gateway(e, SERVER_ERROR))?;

    Ok(message(StatusCode::CREATED, USER_CREATED.to_string()))
}

/// PUT /api/users/{id} - update a user via `update_user`
async fn update_user(
    State(state): State<Arc<AppState>>,
    PathId(id): PathId,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Reply {
    let mut params = vec![SqlParam::Int(id)];
    params.extend(payload.into_params());

    state
        .gateway
        .call(UPDATE_USER, params)
        .await
        .map_err(|e| ApiError::from_gateway(e, SERVER_ERROR))?;

    Ok(message(
        StatusCode::OK,
        format!("Cập nhật User ID {} thành công!", id),
    ))
}

/// DELETE /api/users/{id} - delete a user via `delete_user`
async fn delete_user(State(state): State<Arc<AppState>>, PathId(id): PathId) -> Reply {
    state
        .gateway
        .call(DELETE_USER, vec![SqlParam::Int(id)])
        .await
        .map_err(|e| ApiError::from_gateway(e, SERVER_ERROR))?;

    Ok(message(StatusCode::OK, format!("Xóa User ID {} thành công!", id)))
}

/// GET /api/users/courses/{teacherId}?maxPrice= - courses a teacher owns
async fn teacher_courses(
    State(state): State<Arc<AppState>>,
    Path(teacher_id): Path<String>,
    Query(query): Query<TeacherCoursesQuery>,
) -> Reply {
    let teacher_id = teacher_id
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation(INVALID_TEACHER_ID))?;

    let rows = state
        .gateway
        .call(
            GET_TEACHER_COURSES,
            vec![SqlParam::Int(teacher_id), SqlParam::Int(query.max_price())],
        )
        .await
        .map_err(|e| ApiError::from_gateway(e, COURSES_QUERY_FAILED))?;

    Ok((StatusCode::OK, Json(json!({ "data": rows }))))
}

/// GET /api/users/income/{teacherId}?startDate=&endDate= - income over a range
async fn teacher_income(
    State(state): State<Arc<AppState>>,
    Path(teacher_id): Path<String>,
    Query(query): Query<IncomeQuery>,
) -> Reply {
    let teacher_id = teacher_id.trim().parse::<i64>().ok();
    let (Some(teacher_id), Some((start, end))) = (teacher_id, query.range()) else {
        return Err(ApiError::validation(INCOME_PARAMS_REQUIRED));
    };

    let income = state
        .gateway
        .call_function(
            CALCULATE_TEACHER_INCOME,
            vec![SqlParam::Int(teacher_id), start.into(), end.into()],
        )
        .await
        .map_err(|e| ApiError::from_gateway(e, INCOME_FAILED))?;

    // No sales in range comes back as NULL (or an empty string)
    let income = match income {
        Value::Null => json!(0),
        Value::String(s) if s.is_empty() => json!(0),
        income => income,
    };
    Ok((StatusCode::OK, Json(json!({ "income": income }))))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", put(update_user).delete(delete_user))
        .route("/api/users/courses/{teacher_id}", get(teacher_courses))
        .route("/api/users/income/{teacher_id}", get(teacher_income))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    use crate::db::{DbError, MockResponse};
    use crate::http::extractors::INVALID_ID;
    use crate::http::server::testing::{app, send};
    use crate::models::Record;

    fn user_body() -> Value {
        json!({
            "email": "an@example.vn",
            "firstName": "An",
            "lastName": "Nguyen",
            "username": "annguyen",
            "password": "secret",
            "role": "teacher",
            "bankName": "VCB",
            "bankAccount": "0011223344"
        })
    }

    fn course_row(id: i64, price: i64) -> Record {
        let mut row = Record::new();
        row.insert("course_id".into(), json!(id));
        row.insert("name".into(), json!(format!("Khóa {}", id)));
        row.insert("price".into(), json!(price));
        row
    }

    #[tokio::test]
    async fn create_user_returns_201() {
        let (mock, app) = app();
        let (status, body) = send(&app, Method::POST, "/api/users", Some(user_body())).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "message": "Thêm người dùng thành công!" }));

        let statements = mock.statements();
        assert_eq!(statements[0].sql, "CALL insert_user(?, ?, ?, ?, ?, ?, ?, ?)");
        assert_eq!(statements[0].params[0], SqlParam::Text("an@example.vn".into()));
        assert_eq!(statements[0].params[7], SqlParam::Text("0011223344".into()));
    }

    #[tokio::test]
    async fn create_user_signal_is_400() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Error(DbError::server(
            "45000",
            "Email đã tồn tại",
        )));

        let (status, body) = send(&app, Method::POST, "/api/users", Some(user_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Email đã tồn tại" }));
    }

    #[tokio::test]
    async fn create_user_malformed_json_is_400() {
        let (mock, app) = app();
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/users")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        let response = tower::ServiceExt::oneshot(app, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(mock.statements().is_empty());
    }

    #[tokio::test]
    async fn update_user_prepends_id() {
        let (mock, app) = app();
        let (status, body) = send(&app, Method::PUT, "/api/users/12", Some(user_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Cập nhật User ID 12 thành công!");

        let statements = mock.statements();
        assert_eq!(statements[0].sql, "CALL update_user(?, ?, ?, ?, ?, ?, ?, ?, ?)");
        assert_eq!(statements[0].params[0], SqlParam::Int(12));
        assert_eq!(statements[0].params[1], SqlParam::Text("an@example.vn".into()));
    }

    #[tokio::test]
    async fn non_numeric_user_id_is_400() {
        let (mock, app) = app();
        let (status, body) = send(&app, Method::DELETE, "/api/users/abc", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_ID);
        assert!(mock.statements().is_empty());
    }

    #[tokio::test]
    async fn delete_user_success() {
        let (mock, app) = app();
        let (status, body) = send(&app, Method::DELETE, "/api/users/4", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Xóa User ID 4 thành công!");
        assert_eq!(mock.statements()[0].params, vec![SqlParam::Int(4)]);
    }

    #[tokio::test]
    async fn delete_user_twice_gives_same_error() {
        let (mock, app) = app();
        for _ in 0..2 {
            mock.add_response(MockResponse::Error(DbError::server(
                "45000",
                "Người dùng không tồn tại",
            )));
        }

        let first = send(&app, Method::DELETE, "/api/users/4", None).await;
        let second = send(&app, Method::DELETE, "/api/users/4", None).await;
        assert_eq!(first.0, StatusCode::BAD_REQUEST);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn delete_teacher_with_courses_is_400() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Error(DbError::server(
            "45000",
            "Không thể xóa giáo viên đang có khóa học",
        )));

        let (status, body) = send(&app, Method::DELETE, "/api/users/5", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Không thể xóa giáo viên đang có khóa học");
    }

    #[tokio::test]
    async fn teacher_courses_passes_max_price() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Rows(vec![course_row(1, 50), course_row(2, 100)]));

        let (status, body) =
            send(&app, Method::GET, "/api/users/courses/5?maxPrice=100", None).await;

        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r["price"].as_i64().unwrap() <= 100));

        let statements = mock.statements();
        assert_eq!(statements[0].sql, "CALL get_teacher_courses(?, ?)");
        assert_eq!(statements[0].params, vec![SqlParam::Int(5), SqlParam::Int(100)]);
    }

    #[tokio::test]
    async fn teacher_courses_default_max_price() {
        let (mock, app) = app();
        let (status, body) = send(&app, Method::GET, "/api/users/courses/5", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "data": [] }));
        assert_eq!(
            mock.statements()[0].params,
            vec![SqlParam::Int(5), SqlParam::Int(999_999)]
        );
    }

    #[tokio::test]
    async fn teacher_courses_max_price_prefix_and_zero() {
        let (mock, app) = app();
        for uri in [
            "/api/users/courses/5?maxPrice=12.5",
            "/api/users/courses/5?maxPrice=0",
            "/api/users/courses/5?maxPrice=abc",
        ] {
            let (status, _) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
        }

        let ceilings: Vec<SqlParam> = mock
            .statements()
            .into_iter()
            .map(|statement| statement.params[1].clone())
            .collect();
        assert_eq!(
            ceilings,
            vec![SqlParam::Int(12), SqlParam::Int(999_999), SqlParam::Int(999_999)]
        );
    }

    #[tokio::test]
    async fn teacher_courses_rejects_invalid_id_without_db() {
        let (mock, app) = app();
        for uri in ["/api/users/courses/-1", "/api/users/courses/0", "/api/users/courses/x"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, json!({ "error": "Lỗi: Teacher ID không hợp lệ." }));
        }
        assert!(mock.statements().is_empty());
    }

    #[tokio::test]
    async fn teacher_courses_connection_failure_is_500() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Error(DbError::Connection(
            "Connection refused".into(),
        )));

        let (status, body) = send(&app, Method::GET, "/api/users/courses/5", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Lỗi máy chủ khi truy vấn dữ liệu." }));
    }

    #[tokio::test]
    async fn income_success() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Scalar(json!(1500)));

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/income/3?startDate=2024-01-01&endDate=2024-12-31",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "income": 1500 }));

        let statements = mock.statements();
        assert_eq!(
            statements[0].sql,
            "SELECT calculate_teacher_income(?, ?, ?) AS result"
        );
        assert_eq!(
            statements[0].params,
            vec![
                SqlParam::Int(3),
                SqlParam::Text("2024-01-01".into()),
                SqlParam::Text("2024-12-31".into()),
            ]
        );
    }

    #[tokio::test]
    async fn income_sentinel_is_400() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Scalar(json!("Lỗi: invalid date range")));

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/income/3?startDate=2024-01-01&endDate=2024-12-31",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Lỗi: invalid date range" }));
    }

    #[tokio::test]
    async fn income_null_is_zero() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Scalar(Value::Null));

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/income/3?startDate=2024-01-01&endDate=2024-12-31",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "income": 0 }));
    }

    #[tokio::test]
    async fn income_empty_string_is_zero() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Scalar(json!("")));

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/income/3?startDate=2024-01-01&endDate=2024-12-31",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "income": 0 }));
    }

    #[tokio::test]
    async fn income_requires_dates_and_numeric_id() {
        let (mock, app) = app();
        for uri in [
            "/api/users/income/3",
            "/api/users/income/3?startDate=2024-01-01",
            "/api/users/income/abc?startDate=2024-01-01&endDate=2024-12-31",
        ] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], INCOME_PARAMS_REQUIRED);
        }
        assert!(mock.statements().is_empty());
    }

    #[tokio::test]
    async fn income_driver_failure_is_500() {
        let (mock, app) = app();
        mock.add_response(MockResponse::Error(DbError::Driver(
            "unexpected packet".into(),
        )));

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/income/3?startDate=2024-01-01&endDate=2024-12-31",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Lỗi khi tính thu nhập." }));
    }
}

//! API service routes

use auth::models::{LoginCredentials, Session, SessionToken};
use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::Datelike;
use media::ImageUpload;
use records::{
    export::{CSV_CONTENT_TYPE, export_filename, to_csv},
    models::{NewOperation, OperationPatch},
    query::{self, OperationFilter, paginate},
    stats::monthly_stats,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::require_session,
    models::{
        ImageUploadQuery, LoginResponse, MonthlyStatsQuery, OperationListQuery, SearchQuery,
        SessionResponse,
    },
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(
        (state.ingestor.policy().max_size as usize).saturating_add(1024 * 1024),
    );

    let protected_routes = Router::new()
        .route("/auth/me", get(current_session))
        .route("/auth/logout", post(logout))
        .route("/operations", get(list_operations).post(create_operation))
        .route("/operations/search", get(search_operations))
        .route("/operations/export", get(export_operations))
        .route(
            "/operations/:id",
            get(get_operation)
                .patch(update_operation)
                .delete(delete_operation),
        )
        .route("/stats/monthly", get(get_monthly_stats))
        .route(
            "/images",
            get(list_images).post(upload_image).layer(upload_limit),
        )
        .route("/images/:id", delete(delete_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "theatre-log-api"
    }))
}

fn session_response(state: &AppState, session: Session) -> SessionResponse {
    SessionResponse {
        expires_at: session.expires_at(state.sessions.ttl()),
        username: session.username,
        role: session.role,
        logged_in_at: session.logged_in_at,
    }
}

/// Start a session and hand out its bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    let (token, session) = state
        .sessions
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        token: token.to_string(),
        session: session_response(&state, session),
    }))
}

/// End the caller's session
pub async fn logout(
    State(state): State<AppState>,
    Extension(token): Extension<SessionToken>,
) -> ApiResult<impl IntoResponse> {
    state.sessions.logout(&token).await?;
    Ok(Json(json!({"message": "Logged out"})))
}

/// The live session
pub async fn current_session(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> impl IntoResponse {
    Json(session_response(&state, session))
}

/// List operations matching the filter, one page at a time
pub async fn list_operations(
    State(state): State<AppState>,
    Query(params): Query<OperationListQuery>,
) -> ApiResult<impl IntoResponse> {
    let (filter, page) = params.into_parts();
    let records = state.records.lock().await;
    let matching = query::filter(records.operations(), &filter);

    Ok(Json(paginate(matching, page)))
}

/// Record a new operation
pub async fn create_operation(
    State(state): State<AppState>,
    Json(payload): Json<NewOperation>,
) -> ApiResult<impl IntoResponse> {
    let mut records = state.records.lock().await;
    let record = records.add(payload).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Get an operation by ID
pub async fn get_operation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let record = state
        .records
        .lock()
        .await
        .get(id)
        .ok_or_else(|| ApiError::NotFound("Operation not found".to_string()))?;

    Ok(Json(record))
}

/// Apply a partial update to an operation
pub async fn update_operation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OperationPatch>,
) -> ApiResult<impl IntoResponse> {
    let mut records = state.records.lock().await;
    let record = records
        .update(id, payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("Operation not found".to_string()))?;

    Ok(Json(record))
}

/// Delete an operation by ID
pub async fn delete_operation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut records = state.records.lock().await;

    if records.delete(id).await? {
        Ok(Json(json!({"message": "Operation deleted successfully"})))
    } else {
        Err(ApiError::NotFound("Operation not found".to_string()))
    }
}

/// Free-text search across the text fields of every operation
pub async fn search_operations(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let records = state.records.lock().await;
    Ok(Json(query::search(records.operations(), &params.q)))
}

/// Download the matching operations as a CSV attachment
pub async fn export_operations(
    State(state): State<AppState>,
    Query(filter): Query<OperationFilter>,
) -> ApiResult<impl IntoResponse> {
    let rows = {
        let records = state.records.lock().await;
        query::filter(records.operations(), &filter)
    };

    let csv = to_csv(&rows).map_err(|e| {
        error!("Failed to export operations: {}", e);
        ApiError::InternalServerError
    })?;
    let filename = export_filename(state.clock.now().date_naive());

    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    ))
}

/// Totals for one month, defaulting to the current one
pub async fn get_monthly_stats(
    State(state): State<AppState>,
    Query(params): Query<MonthlyStatsQuery>,
) -> ApiResult<impl IntoResponse> {
    let today = state.clock.now().date_naive();
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or(today.month());

    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest(format!(
            "month must be between 1 and 12, got {}",
            month
        )));
    }

    let records = state.records.lock().await;
    Ok(Json(monthly_stats(records.operations(), year, month)))
}

/// List gallery images
pub async fn list_images(State(state): State<AppState>) -> impl IntoResponse {
    let images = state.records.lock().await.images();
    Json(images)
}

/// Upload one image as the raw request body
pub async fn upload_image(
    State(state): State<AppState>,
    Query(params): Query<ImageUploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();
    let name = params
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "image".to_string());

    let mut upload = ImageUpload::new(name, content_type, body.to_vec());
    if let Some(declared) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
    {
        upload.size = declared;
    }

    let mut records = state.records.lock().await;
    let image = state.ingestor.ingest(&mut records, upload).await?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// Delete an image by ID
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let mut records = state.records.lock().await;

    if records.delete_image(id).await? {
        Ok(Json(json!({"message": "Image deleted successfully"})))
    } else {
        Err(ApiError::NotFound("Image not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use auth::{AuthConfig, SessionGuard};
    use axum::{
        body::{Body, to_bytes},
        http::Request,
        response::Response,
    };
    use chrono::{Duration, TimeZone, Utc};
    use common::{
        blob_store::{BlobStore, MemoryBlobStore},
        clock::ManualClock,
    };
    use media::ImageIngestor;
    use records::RecordStore;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_app_with_clock() -> (Router, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 10, 1, 9, 0, 0).unwrap(),
        ));
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
        let records = RecordStore::load(blobs.clone(), clock.clone()).await.unwrap();
        let sessions = SessionGuard::offline(&AuthConfig::default(), blobs, clock.clone());

        let app = create_router(AppState::new(
            records,
            sessions,
            ImageIngestor::default(),
            clock.clone(),
        ));
        (app, clock)
    }

    async fn test_app() -> Router {
        test_app_with_clock().await.0
    }

    fn request(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        request(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        request(method, uri, token).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Log in with the demo credential and return the bearer token
    async fn login(app: &Router) -> String {
        let response = send(
            app,
            json_request(
                "POST",
                "/auth/login",
                None,
                json!({"username": "admin", "password": "admin123"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    fn appendectomy() -> Value {
        json!({
            "time": "08:30",
            "operation_type": "Appendectomy",
            "account_type": "insurance",
            "surgeon_name": "Dr. Salem",
            "anesthesiologist_name": "Dr. Noor",
            "theater_no": "2",
            "case_count": "3",
            "notes": ""
        })
    }

    #[tokio::test]
    async fn test_health_check_is_public() {
        let app = test_app().await;
        let response = send(&app, empty_request("GET", "/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_session() {
        let app = test_app().await;

        for uri in ["/operations", "/auth/me", "/stats/monthly", "/images"] {
            let response = send(&app, empty_request("GET", uri, None)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let response = send(&app, empty_request("POST", "/auth/logout", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_another_clients_login_does_not_authorize_anonymous_requests() {
        let app = test_app().await;
        let token = login(&app).await;

        let response = send(&app, empty_request("GET", "/operations", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let forged = "00000000000000000000000000000000";
        let response = send(&app, empty_request("GET", "/operations", Some(forged))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, empty_request("GET", "/operations", Some("not-a-token"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, empty_request("GET", "/operations", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_only_ends_the_callers_session() {
        let app = test_app().await;
        let first = login(&app).await;
        let second = login(&app).await;
        assert_ne!(first, second);

        let response = send(&app, empty_request("POST", "/auth/logout", Some(&first))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, empty_request("GET", "/operations", Some(&first))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, empty_request("GET", "/operations", Some(&second))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let (app, clock) = test_app_with_clock().await;
        let token = login(&app).await;

        clock.advance(Duration::hours(25));
        let response = send(&app, empty_request("GET", "/auth/me", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let app = test_app().await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/auth/login",
                None,
                json!({"username": "admin", "password": "nope"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            json_request(
                "POST",
                "/auth/login",
                None,
                json!({"username": " ", "password": "admin123"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_current_session() {
        let app = test_app().await;
        let token = login(&app).await;

        let response = send(&app, empty_request("GET", "/auth/me", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        assert_eq!(session["username"], "admin");
        assert_eq!(session["role"], "admin");
        assert_eq!(session["expires_at"], "2024-10-02T09:00:00Z");
    }

    #[tokio::test]
    async fn test_operation_lifecycle() {
        let app = test_app().await;
        let token = login(&app).await;
        let token = Some(token.as_str());

        let response = send(
            &app,
            json_request("POST", "/operations", token, appendectomy()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["case_count"], 3);
        assert_eq!(created["date"], "2024-10-01");
        let id = created["id"].as_str().unwrap().to_string();

        let page =
            body_json(send(&app, empty_request("GET", "/operations?limit=5", token)).await).await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["limit"], 5);

        let response = send(
            &app,
            json_request(
                "PATCH",
                &format!("/operations/{id}"),
                token,
                json!({"case_count": 5}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["case_count"], 5);

        let stats = body_json(
            send(
                &app,
                empty_request("GET", "/stats/monthly?year=2024&month=10", token),
            )
            .await,
        )
        .await;
        assert_eq!(stats["total_operations"], 1);
        assert_eq!(stats["total_cases"], 5);
        assert_eq!(stats["by_account_type"], json!({"insurance": 5}));

        let hits = body_json(
            send(
                &app,
                empty_request("GET", "/operations/search?q=salem", token),
            )
            .await,
        )
        .await;
        assert_eq!(hits.as_array().unwrap().len(), 1);

        let response = send(
            &app,
            empty_request("DELETE", &format!("/operations/{id}"), token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &app,
            empty_request("GET", &format!("/operations/{id}"), token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_filter_by_account_type() {
        let app = test_app().await;
        let token = login(&app).await;
        let token = Some(token.as_str());
        send(
            &app,
            json_request("POST", "/operations", token, appendectomy()),
        )
        .await;

        let page = body_json(
            send(
                &app,
                empty_request("GET", "/operations?account_type=private", token),
            )
            .await,
        )
        .await;
        assert_eq!(page["total"], 0);

        let page = body_json(
            send(
                &app,
                empty_request("GET", "/operations?account_type=insurance", token),
            )
            .await,
        )
        .await;
        assert_eq!(page["total"], 1);
    }

    #[tokio::test]
    async fn test_create_operation_with_missing_field_is_rejected() {
        let app = test_app().await;
        let token = login(&app).await;
        let token = Some(token.as_str());

        let mut payload = appendectomy();
        payload["surgeon_name"] = json!("");

        let response = send(&app, json_request("POST", "/operations", token, payload)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let page = body_json(send(&app, empty_request("GET", "/operations", token)).await).await;
        assert_eq!(page["total"], 0);
    }

    #[tokio::test]
    async fn test_stats_rejects_invalid_month() {
        let app = test_app().await;
        let token = login(&app).await;

        let response = send(
            &app,
            empty_request("GET", "/stats/monthly?month=13", Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_export_returns_csv_attachment() {
        let app = test_app().await;
        let token = login(&app).await;
        let token = Some(token.as_str());
        send(
            &app,
            json_request("POST", "/operations", token, appendectomy()),
        )
        .await;

        let response = send(&app, empty_request("GET", "/operations/export", token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv;charset=utf-8"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"operations_2024-10-01.csv\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(csv.starts_with('\u{feff}'));
        assert!(csv.contains("\"Appendectomy\""));
    }

    #[tokio::test]
    async fn test_image_upload_checks_type() {
        let app = test_app().await;
        let token = login(&app).await;
        let token = Some(token.as_str());

        let rejected = request("POST", "/images?name=notes.txt", token)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("hello"))
            .unwrap();
        assert_eq!(send(&app, rejected).await.status(), StatusCode::BAD_REQUEST);

        let accepted = request("POST", "/images?name=scan.png", token)
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from("hi"))
            .unwrap();
        let response = send(&app, accepted).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let image = body_json(response).await;
        assert_eq!(image["content"], "data:image/png;base64,aGk=");
        let id = image["id"].as_str().unwrap().to_string();

        let images = body_json(send(&app, empty_request("GET", "/images", token)).await).await;
        assert_eq!(images.as_array().unwrap().len(), 1);

        let response = send(
            &app,
            empty_request("DELETE", &format!("/images/{id}"), token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(
            &app,
            empty_request("DELETE", &format!("/images/{id}"), token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

//! JSON REST surface over the aggregator and the record store

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, warn};
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::models::{AggregateRecord, DateRange, RecordUpdate, parse_date};
use crate::store::{RecordFilter, RecordStore};
use crate::{VERSION, WeatherIntelError};

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub store: Arc<RecordStore>,
}

/// Error response: `{ "error": <kind>, "message": <text> }`
pub struct ApiError(WeatherIntelError);

impl From<WeatherIntelError> for ApiError {
    fn from(e: WeatherIntelError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(WeatherIntelError::validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            WeatherIntelError::Validation { .. } => StatusCode::BAD_REQUEST,
            WeatherIntelError::Resolution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WeatherIntelError::WeatherFetch { .. } => StatusCode::BAD_GATEWAY,
            WeatherIntelError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        let body = json!({
            "error": self.0.kind(),
            "message": self.0.user_message(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub location_query: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Dates stay strings here so malformed ones surface as validation errors
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub location_query: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl UpdateRequest {
    fn into_update(self) -> crate::Result<RecordUpdate> {
        Ok(RecordUpdate {
            location_query: self.location_query,
            start_date: self.start_date.as_deref().map(parse_date).transpose()?,
            end_date: self.end_date.as_deref().map(parse_date).transpose()?,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/weather-requests",
            get(list_requests).post(create_request),
        )
        .route("/weather-requests/count", get(count_requests))
        .route(
            "/weather-requests/{id}",
            get(get_request).patch(update_request).delete(delete_request),
        )
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

async fn create_request(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AggregateRecord>)> {
    let Json(request) = payload?;
    let range = DateRange::parse(&request.start_date, &request.end_date)?;
    let record = state
        .aggregator
        .aggregate(&request.location_query, range, request.user_id)
        .await?;
    state.store.insert(&record).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_requests(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> ApiResult<Json<Vec<AggregateRecord>>> {
    Ok(Json(state.store.list(&filter).await?))
}

async fn count_requests(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> ApiResult<Json<Value>> {
    let count = state.store.count(&filter).await?;
    Ok(Json(json!({ "count": count })))
}

async fn load(state: &AppState, id: Uuid) -> ApiResult<AggregateRecord> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| WeatherIntelError::not_found(format!("Weather request {id} not found")).into())
}

async fn get_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AggregateRecord>> {
    Ok(Json(load(&state, id).await?))
}

async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<Json<AggregateRecord>> {
    let Json(request) = payload?;
    let update = request.into_update()?;
    let record = load(&state, id).await?;
    let updated = state.aggregator.refresh(&record, &update).await?;
    state.store.update(&updated).await?;
    Ok(Json(updated))
}

async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let deleted = state.store.delete(id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location_resolver::testing::StaticResolver;
    use crate::models::ResolvedLocation;
    use crate::sources::testing::AllSources;
    use crate::weather::testing::{Behaviour, FakeProvider};
    use crate::weather::{PrimarySeriesFetcher, WeatherProvider};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        _dir: tempfile::TempDir,
    }

    fn test_app(weather: Behaviour) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = Aggregator::new(
            Arc::new(StaticResolver(vec![
                ResolvedLocation::new("Paris", "France", 48.8566, 2.3522).unwrap(),
                ResolvedLocation::new("Rome", "Italy", 41.9028, 12.4964).unwrap(),
            ])),
            PrimarySeriesFetcher::new(
                vec![FakeProvider::new("open_meteo", weather) as Arc<dyn WeatherProvider>],
                Duration::from_secs(1),
            ),
            AllSources::healthy().sources(),
            Duration::from_secs(1),
        );
        let state = AppState {
            aggregator: Arc::new(aggregator),
            store: Arc::new(RecordStore::open(dir.path().join("db")).unwrap()),
        };
        TestApp {
            app: Router::new().nest("/api", router(state)),
            _dir: dir,
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn paris_request() -> Value {
        json!({
            "location_query": "Paris, France",
            "start_date": "2024-06-01",
            "end_date": "2024-06-05",
            "user_id": "user-7"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let test = test_app(Behaviour::Succeed(5));
        let (status, body) = send(&test.app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_get_and_list() {
        let test = test_app(Behaviour::Succeed(5));

        let (status, created) =
            send(&test.app, "POST", "/api/weather-requests", Some(paris_request())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["resolved_location"]["city"], "Paris");
        assert_eq!(created["date_range"]["start_date"], "2024-06-01");
        assert_eq!(created["secondary_results"]["news"][0]["title"], "Heatwave");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) =
            send(&test.app, "GET", &format!("/api/weather-requests/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (_, listed) =
            send(&test.app, "GET", "/api/weather-requests?city=paris&user_id=user-7", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (_, count) =
            send(&test.app, "GET", "/api/weather-requests/count?country=italy", None).await;
        assert_eq!(count["count"], 0);
    }

    #[tokio::test]
    async fn test_inverted_range_is_bad_request() {
        let test = test_app(Behaviour::Succeed(5));
        let mut request = paris_request();
        request["start_date"] = json!("2024-06-09");

        let (status, body) = send(&test.app, "POST", "/api/weather-requests", Some(request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let test = test_app(Behaviour::Succeed(5));
        let (status, body) = send(
            &test.app,
            "POST",
            "/api/weather-requests",
            Some(json!({ "start_date": "2024-06-01", "end_date": "2024-06-05" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
        assert!(body["message"].as_str().unwrap().contains("location_query"));

        let (status, body) = send(
            &test.app,
            "POST",
            "/api/weather-requests",
            Some(json!({ "location_query": 42, "start_date": "2024-06-01", "end_date": "2024-06-05" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");

        let (_, listed) = send(&test.app, "GET", "/api/weather-requests", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_location_is_unprocessable() {
        let test = test_app(Behaviour::Succeed(5));
        let mut request = paris_request();
        request["location_query"] = json!("Atlantis");

        let (status, body) = send(&test.app, "POST", "/api/weather-requests", Some(request)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "resolution");
    }

    #[tokio::test]
    async fn test_weather_outage_is_bad_gateway() {
        let test = test_app(Behaviour::Fail);
        let (status, body) =
            send(&test.app, "POST", "/api/weather-requests", Some(paris_request())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "weather_fetch");

        let (_, count) = send(&test.app, "GET", "/api/weather-requests/count", None).await;
        assert_eq!(count["count"], 0);
    }

    #[tokio::test]
    async fn test_patch_moves_location() {
        let test = test_app(Behaviour::Succeed(5));
        let (_, created) =
            send(&test.app, "POST", "/api/weather-requests", Some(paris_request())).await;
        let uri = format!("/api/weather-requests/{}", created["id"].as_str().unwrap());

        let (status, updated) = send(
            &test.app,
            "PATCH",
            &uri,
            Some(json!({ "location_query": "Rome", "end_date": "2024-06-03" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["resolved_location"]["city"], "Rome");
        assert_eq!(updated["date_range"]["end_date"], "2024-06-03");
        assert_eq!(updated["secondary_results"], created["secondary_results"]);

        let (_, stored) = send(&test.app, "GET", &uri, None).await;
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_patch_with_bad_date_leaves_record() {
        let test = test_app(Behaviour::Succeed(5));
        let (_, created) =
            send(&test.app, "POST", "/api/weather-requests", Some(paris_request())).await;
        let uri = format!("/api/weather-requests/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &test.app,
            "PATCH",
            &uri,
            Some(json!({ "start_date": "2024-13-45" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, stored) = send(&test.app, "GET", &uri, None).await;
        assert_eq!(stored, created);
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let test = test_app(Behaviour::Succeed(5));
        let uri = format!("/api/weather-requests/{}", Uuid::new_v4());

        let (status, body) = send(&test.app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, body) = send(&test.app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], false);
    }
}

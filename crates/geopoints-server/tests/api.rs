use std::sync::Arc;

use arrow::ipc::writer::FileWriter;
use arrow_array::{Float64Array, Int64Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use geopoints_core::fixtures::builtin_cities;
use geopoints_core::{FileTableSource, InMemoryTableSource, PointSchema, TableSource};
use geopoints_server::{FailurePolicy, PointService, ServiceConfig, router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "geopoints-test-boundary";

fn app(source: Arc<dyn TableSource>, config: ServiceConfig) -> Router {
    router(Arc::new(PointService::new(source, config)))
}

fn write_ships_arrow(path: &std::path::Path, lat: Vec<f64>, lon: Vec<f64>, mmsi: Vec<i64>) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("MMSI", DataType::Int64, false),
    ]));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(Float64Array::from(lat)),
            Arc::new(Float64Array::from(lon)),
            Arc::new(Int64Array::from(mmsi)),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut writer = FileWriter::try_new(file, &schema).unwrap();
    writer.write(&batch).unwrap();
    writer.finish().unwrap();
}

fn multipart_request(field: &str, file_name: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload-pickle")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_points_request() -> Request<Body> {
    Request::builder()
        .uri("/api/points")
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_get_points_two_row_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ships.arrow");
    write_ships_arrow(&path, vec![1.0, 3.0], vec![2.0, 4.0], vec![111, 222]);

    let app = app(Arc::new(FileTableSource::new(&path)), ServiceConfig::default());
    let (status, body) = send(&app, get_points_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"points": [
            {"lon": 2.0, "lat": 1.0, "MMSI": 111},
            {"lon": 4.0, "lat": 3.0, "MMSI": 222}
        ]})
    );
}

#[tokio::test]
async fn test_get_points_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ships.arrow");
    write_ships_arrow(&path, vec![10.5, 11.5, 12.5], vec![-1.0, -2.0, -3.0], vec![7, 8, 9]);

    let app = app(Arc::new(FileTableSource::new(&path)), ServiceConfig::default());
    let (_, first) = send(&app, get_points_request()).await;
    let (_, second) = send(&app, get_points_request()).await;
    assert_eq!(first, second);
    assert_eq!(first["points"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_points_applies_row_limit() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ships.arrow");
    let n: i32 = 50;
    write_ships_arrow(
        &path,
        (0..n).map(f64::from).collect(),
        (0..n).map(f64::from).collect(),
        (0..i64::from(n)).collect(),
    );

    let config = ServiceConfig::default().with_points_row_limit(Some(20));
    let app = app(Arc::new(FileTableSource::new(&path)), config);
    let (_, body) = send(&app, get_points_request()).await;

    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 20);
    assert_eq!(points[0]["MMSI"], 0);
    assert_eq!(points[19]["MMSI"], 19);
}

#[tokio::test]
async fn test_missing_source_file_returns_empty_points() {
    let temp_dir = TempDir::new().unwrap();
    let source = FileTableSource::new(temp_dir.path().join("absent.arrow"));

    let app = app(Arc::new(source), ServiceConfig::default());
    let (status, body) = send(&app, get_points_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"points": []}));
}

#[tokio::test]
async fn test_source_missing_columns_returns_empty_points() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ships.csv");
    std::fs::write(&path, "latitude,longitude,MMSI\n1.0,2.0,111\n").unwrap();

    let app = app(Arc::new(FileTableSource::new(&path)), ServiceConfig::default());
    let (status, body) = send(&app, get_points_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"points": []}));
}

#[tokio::test]
async fn test_loud_points_policy_reports_unavailable_source() {
    let temp_dir = TempDir::new().unwrap();
    let source = FileTableSource::new(temp_dir.path().join("absent.arrow"));
    let config = ServiceConfig::default().with_points_policy(FailurePolicy::Loud);

    let app = app(Arc::new(source), config);
    let (status, body) = send(&app, get_points_request()).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert!(body.get("points").is_none());
}

#[tokio::test]
async fn test_builtin_cities_ignore_file_state() {
    let source = InMemoryTableSource::new("builtin cities", builtin_cities().unwrap());
    let config = ServiceConfig::default().with_schema(PointSchema::City);

    let app = app(Arc::new(source), config);
    let (status, body) = send(&app, get_points_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"points": [
            {"longitude": -0.1276, "latitude": 51.5072, "name": "London"},
            {"longitude": 2.3522, "latitude": 48.8566, "name": "Paris"},
            {"longitude": 13.405, "latitude": 52.52, "name": "Berlin"}
        ]})
    );
}

#[tokio::test]
async fn test_upload_csv_returns_all_rows() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let config = ServiceConfig::default().with_points_row_limit(Some(1));
    let app = app(Arc::new(source), config);

    let csv = b"lat,lon,MMSI,sog\n1.0,2.0,111,3.1\n3.0,4.0,222,0.0\n5.0,6.0,333,9.9\n";
    let (status, body) = send(&app, multipart_request("file", "ships.csv", csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"points": [
            {"lon": 2.0, "lat": 1.0, "MMSI": 111},
            {"lon": 4.0, "lat": 3.0, "MMSI": 222},
            {"lon": 6.0, "lat": 5.0, "MMSI": 333}
        ]})
    );
}

#[tokio::test]
async fn test_upload_arrow_under_other_field_name() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ships.arrow");
    write_ships_arrow(&path, vec![1.0], vec![2.0], vec![111]);
    let contents = std::fs::read(&path).unwrap();

    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let app = app(Arc::new(source), ServiceConfig::default());
    let (status, body) = send(&app, multipart_request("upload", "ships.arrow", &contents)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"points": [{"lon": 2.0, "lat": 1.0, "MMSI": 111}]}));
}

#[tokio::test]
async fn test_upload_missing_lat_is_bad_request() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let app = app(Arc::new(source), ServiceConfig::default());

    let csv = b"lon,MMSI\n2.0,111\n";
    let (status, body) = send(&app, multipart_request("file", "ships.csv", csv)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Required columns not found: lat");
    assert!(body.get("points").is_none());
}

#[tokio::test]
async fn test_upload_garbage_is_bad_request() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let app = app(Arc::new(source), ServiceConfig::default());

    let garbage = [0xC3, 0x28, 0x00, 0xFE, 0xFF, 0x13];
    let (status, body) = send(&app, multipart_request("file", "ships.bin", &garbage)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Uploaded file could not be read as a table");
}

#[tokio::test]
async fn test_upload_pickle_is_rejected_with_hint() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let app = app(Arc::new(source), ServiceConfig::default());

    let pickle = [0x80, 0x04, 0x95, 0x2A, 0x00, 0x00];
    let (status, body) = send(&app, multipart_request("file", "ships.pkl", &pickle)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Pickle"));
}

#[tokio::test]
async fn test_upload_without_multipart_is_bad_request() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let app = app(Arc::new(source), ServiceConfig::default());

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload-pickle")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

fn ships_csv(rows: usize) -> Vec<u8> {
    let mut csv = b"lat,lon,MMSI\n".to_vec();
    for _ in 0..rows {
        csv.extend_from_slice(b"1.5,2.5,123456789\n");
    }
    csv
}

#[tokio::test]
async fn test_upload_over_byte_cap_is_bad_request() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let config = ServiceConfig::default().with_max_upload_bytes(Some(64));
    let app = app(Arc::new(source), config);

    let csv = ships_csv(64);
    let (status, body) = send(&app, multipart_request("file", "ships.csv", &csv)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Uploaded file could not be read as a table");
}

#[tokio::test]
async fn test_upload_size_is_unbounded_by_default() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let app = app(Arc::new(source), ServiceConfig::default());

    // Larger than axum's 2 MiB default body limit.
    let rows = 150_000;
    let csv = ships_csv(rows);
    assert!(csv.len() > 2 * 1024 * 1024);
    let (status, body) = send(&app, multipart_request("file", "ships.csv", &csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"].as_array().unwrap().len(), rows);
}

#[tokio::test]
async fn test_soft_upload_policy_returns_empty_points() {
    let source = InMemoryTableSource::new("unused", builtin_cities().unwrap());
    let config = ServiceConfig::default().with_upload_policy(FailurePolicy::Soft);
    let app = app(Arc::new(source), config);

    let csv = b"lon,MMSI\n2.0,111\n";
    let (status, body) = send(&app, multipart_request("file", "ships.csv", csv)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"points": []}));
}

#[tokio::test]
async fn test_cors_allows_development_origin() {
    let source = InMemoryTableSource::new("cities", builtin_cities().unwrap());
    let app = app(
        Arc::new(source),
        ServiceConfig::default().with_schema(PointSchema::City),
    );

    let request = Request::builder()
        .uri("/api/points")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let source = InMemoryTableSource::new("cities", builtin_cities().unwrap());
    let app = app(
        Arc::new(source),
        ServiceConfig::default().with_schema(PointSchema::City),
    );

    let request = Request::builder()
        .uri("/api/points")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn test_cors_wildcard_preflight() {
    let source = InMemoryTableSource::new("cities", builtin_cities().unwrap());
    let config = ServiceConfig::default()
        .with_schema(PointSchema::City)
        .with_cors_origins(["*"]);
    let app = app(Arc::new(source), config);

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/upload-pickle")
        .header(header::ORIGIN, "https://maps.example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}

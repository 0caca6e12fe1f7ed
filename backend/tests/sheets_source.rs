use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use talentfunnel::{
    DashboardQuery, DashboardService, KeyWinsQuery, SheetsApiSource, SheetsAuth, SourceError, TabularSource,
    TransformSettings,
};

#[derive(Debug, Clone)]
struct SeenRequest {
    id: String,
    query: String,
    authorization: Option<String>,
}

type Seen = Arc<Mutex<Vec<SeenRequest>>>;

fn grid() -> Value {
    json!({
        "sheets": [
            {
                "properties": {"title": "Engineering"},
                "data": [{"rowData": [
                    {"values": [{"formattedValue": "Role"}, {"formattedValue": "Applied"}, {"formattedValue": "Screening"}]},
                    {"values": [{"formattedValue": "Backend"}, {"formattedValue": "1,200"}, {"formattedValue": "300"}]},
                    {"values": [{"formattedValue": "Frontend"}, {"formattedValue": "40"}]}
                ]}]
            },
            {
                "properties": {"title": "Key Wins"},
                "data": [{"rowData": [
                    {"values": [{"formattedValue": "Date"}, {"formattedValue": "Department"}, {"formattedValue": "Position"}]},
                    {"values": [{"formattedValue": "45509"}, {"formattedValue": "Engineering"}, {"formattedValue": "Staff SRE"}]}
                ]}]
            },
            {"properties": {"title": "Config"}}
        ]
    })
}

async fn spreadsheet(
    State(seen): State<Seen>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    if let Ok(mut seen) = seen.lock() {
        seen.push(SeenRequest {
            id: id.clone(),
            query: query.unwrap_or_default(),
            authorization,
        });
    }

    if id == "forbidden" {
        let body = json!({"error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}});
        return (StatusCode::FORBIDDEN, Json(body));
    }
    (StatusCode::OK, Json(grid()))
}

async fn spawn_fake_sheets() -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v4/spreadsheets/{id}", get(spreadsheet))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}/v4/spreadsheets"), seen)
}

fn last_request(seen: &Seen) -> SeenRequest {
    seen.lock().expect("lock").last().cloned().expect("a request")
}

#[tokio::test]
async fn api_key_request_decodes_grid() {
    let (base, seen) = spawn_fake_sheets().await;
    let source = SheetsApiSource::new(SheetsAuth::ApiKey("secret".into())).with_base_url(&base);

    let workbook = source.fetch_workbook("sheet-1").await.expect("workbook");
    assert_eq!(workbook.titles(), vec!["Engineering", "Key Wins", "Config"]);
    assert_eq!(workbook.tabs[0].rows[1][1].text(), Some("1,200"));
    assert_eq!(workbook.tabs[0].rows[2].len(), 2);
    assert!(workbook.tabs[2].rows.is_empty());

    let request = last_request(&seen);
    assert_eq!(request.id, "sheet-1");
    assert!(request.query.contains("includeGridData=true"));
    assert!(request.query.contains("key=secret"));
    assert!(request.query.contains("fields="));
    assert!(request.authorization.is_none());
}

#[tokio::test]
async fn bearer_token_is_sent_as_header() {
    let (base, seen) = spawn_fake_sheets().await;
    let source = SheetsApiSource::new(SheetsAuth::Bearer("tok".into())).with_base_url(&base);

    source.fetch_workbook("sheet-1").await.expect("workbook");

    let request = last_request(&seen);
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok"));
    assert!(!request.query.contains("key="));
}

#[tokio::test]
async fn api_error_carries_google_message() {
    let (base, _seen) = spawn_fake_sheets().await;
    let source = SheetsApiSource::new(SheetsAuth::ApiKey("secret".into())).with_base_url(&base);

    match source.fetch_workbook("forbidden").await {
        Err(SourceError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "The caller does not have permission");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let source = SheetsApiSource::new(SheetsAuth::ApiKey("secret".into()))
        .with_base_url(&format!("http://{addr}/v4/spreadsheets"));
    let err = source.fetch_workbook("sheet-1").await.expect_err("no server");
    assert!(matches!(err, SourceError::Request(_)));
}

#[tokio::test]
async fn service_over_fake_sheets() {
    let (base, _seen) = spawn_fake_sheets().await;
    let source: Arc<dyn TabularSource> =
        Arc::new(SheetsApiSource::new(SheetsAuth::ApiKey("secret".into())).with_base_url(&base));
    let settings = TransformSettings {
        excluded_tabs: vec!["Key Wins".to_string()],
        ..TransformSettings::default()
    };
    let service = DashboardService::new(Some(source), Some("sheet-1".to_string()), settings);

    let roles = service.dashboard(&DashboardQuery::default()).await;
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0].name(), "Engineering - Backend");
    assert_eq!(roles[0].stages()[0].candidate_count, 1200);
    assert_eq!(roles[0].conversion_rates()[0].rate, 25.0);
    assert_eq!(roles[1].stages()[1].candidate_count, 0);

    let wins = service
        .key_wins(&KeyWinsQuery {
            start: Some("2024-08-01".into()),
            end: Some("2024-08-07".into()),
        })
        .await;
    assert_eq!(wins.len(), 1);
    assert_eq!(wins[0].date, "45509");

    let forbidden: Arc<dyn TabularSource> =
        Arc::new(SheetsApiSource::new(SheetsAuth::ApiKey("secret".into())).with_base_url(&base));
    let fallback = DashboardService::new(
        Some(forbidden),
        Some("forbidden".to_string()),
        TransformSettings::default(),
    );
    assert_eq!(fallback.dashboard(&DashboardQuery::default()).await.len(), 3);
    assert!(fallback.key_wins(&KeyWinsQuery::default()).await.is_empty());
}

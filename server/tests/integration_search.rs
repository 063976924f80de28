use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use govnav_core::persist::{save, IndexPaths};
use govnav_core::{IndexBuilder, RawDocument};
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_app, build_app_with_index, ServerConfig};
use tempfile::tempdir;
use tower::ServiceExt;

fn corpus() -> Vec<RawDocument> {
    [
        ("28.142", "Fence Height", "fence height front yard setback"),
        ("24.08", "Quiet Hours", "noise ordinance quiet hours"),
        ("9.13", "Food Trucks", "food truck vendor permit"),
    ]
    .into_iter()
    .map(|(section, title, text)| RawDocument {
        chapter: "Madison General Ordinances".into(),
        section: section.into(),
        title: title.into(),
        text: text.into(),
        url: Some(format!("https://library.example.org/{section}")),
    })
    .collect()
}

fn app() -> Router {
    build_app_with_index(IndexBuilder::default().build(corpus()), ServerConfig::default())
}

async fn call(app: Router, uri: &str) -> (StatusCode, Bytes) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn call_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = call(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health() {
    let (status, body) = call(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (status, json) = call_json(app(), "/search?q=fence%20setback&k=3").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(json["total_hits"], 1);
    assert_eq!(arr[0]["id"], 0);
    assert_eq!(arr[0]["section"], "28.142");
    assert_eq!(arr[0]["url"], "https://library.example.org/28.142");
    assert!(arr[0]["score"].as_f64().unwrap() > 0.0);
    assert!(json["took_s"].as_f64().is_some());
}

#[tokio::test]
async fn search_without_matches_is_empty() {
    let (status, json) = call_json(app(), "/search?q=spaceship").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn non_positive_k_is_bad_request() {
    for uri in ["/search?q=fence&k=0", "/search?q=fence&k=-2"] {
        let (status, json) = call_json(app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(json["error"].as_str().unwrap().contains("top_k"));
    }
}

#[tokio::test]
async fn k_is_clamped_to_max() {
    let router = build_app_with_index(
        IndexBuilder::default().build(corpus()),
        ServerConfig { max_k: 1, ..ServerConfig::default() },
    );
    let (status, json) = call_json(router, "/search?q=fence%20noise%20truck&k=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
    assert_eq!(json["total_hits"], 3);
}

#[tokio::test]
async fn highlight_wraps_matches() {
    let (_, json) = call_json(app(), "/search?q=truck&highlight=true").await;
    assert!(json["results"][0]["snippet"].as_str().unwrap().contains("<em>truck</em>"));
}

#[tokio::test]
async fn ordinance_details_by_id() {
    let (status, json) = call_json(app(), "/ordinances/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "noise ordinance quiet hours");
    assert_eq!(json["url"], "https://library.example.org/24.08");

    let (status, _) = call_json(app(), "/ordinances/7").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call_json(app(), "/ordinances/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ordinance_lookup_by_title() {
    let (status, json) = call_json(app(), "/ordinances?title=quiet").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["section"], "24.08");
    let (status, _) = call_json(app(), "/ordinances?title=parking").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn serves_a_persisted_index() {
    let dir = tempdir().unwrap();
    save(&IndexBuilder::default().build(corpus()), &IndexPaths::new(dir.path())).unwrap();
    let router = build_app(dir.path().to_string_lossy().to_string(), ServerConfig::default()).unwrap();
    let (status, json) = call_json(router, "/search?q=food%20truck").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["title"], "Food Trucks");
}

#[test]
fn missing_index_fails_at_startup() {
    let dir = tempdir().unwrap();
    assert!(build_app(dir.path().join("absent").to_string_lossy().to_string(), ServerConfig::default()).is_err());
}

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use integrity::{LookupError, SourceLookup};
use serde_json::{Value, json};
use source_check::{AcademicSearch, MatchPolicy, WebSearch};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use util::http::build_client;

const TEXT: &str = "Photosynthesis converts light energy into chemical energy in plants.";

#[derive(Clone, Default)]
struct Recorded {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
    api_keys: Arc<Mutex<Vec<Option<String>>>>,
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn serp_ok(
    State(rec): State<Recorded>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.queries.lock().unwrap().push(params);
    Json(json!({
        "organic_results": [
            {
                "link": "https://bio.example/photosynthesis",
                "title": "Photosynthesis",
                "snippet": "converts light energy into chemical energy in plants."
            },
            {
                "link": "https://cars.example",
                "title": "Used cars",
                "snippet": "great deals this week"
            }
        ]
    }))
}

async fn serp_down() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn ddg(
    State(rec): State<Recorded>,
    Query(params): Query<HashMap<String, String>>,
) -> Html<&'static str> {
    rec.queries.lock().unwrap().push(params);
    Html(
        r#"<html><body>
            <div class="result"><a class="result__a" href="https://plants.example">Photosynthesis converts light energy into chemical energy</a></div>
            <div class="result"><a class="result__a" href="https://other.example">Football scores</a></div>
        </body></html>"#,
    )
}

async fn academic_ok(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    rec.bodies.lock().unwrap().push(body);
    rec.api_keys.lock().unwrap().push(
        headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    Json(json!({
        "results": [
            {
                "content": "Photosynthesis converts light energy into chemical energy in plants.",
                "metadata": {"source": "biology/ch3.pdf", "title": "Chapter 3"}
            },
            {"content": "Tectonic plates drift slowly.", "metadata": {}}
        ]
    }))
}

async fn academic_garbage() -> &'static str {
    "not json"
}

#[tokio::test]
async fn serpapi_results_are_used_when_available() {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/serp", get(serp_ok))
        .route("/ddg", get(ddg))
        .with_state(rec.clone());
    let base = spawn(app).await;

    let search = WebSearch::new(build_client(5).unwrap(), MatchPolicy::default())
        .with_serpapi_key("secret")
        .with_endpoints(format!("{base}/serp"), format!("{base}/ddg"));
    let matches = search.lookup(TEXT).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].url, "https://bio.example/photosynthesis");
    assert_eq!(matches[0].similarity, 100.0);

    let queries = rec.queries.lock().unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["engine"], "google");
    assert_eq!(queries[0]["api_key"], "secret");
    assert_eq!(queries[0]["num"], "5");
    assert_eq!(queries[0]["q"], TEXT);
}

#[tokio::test]
async fn serpapi_failure_falls_back_to_duckduckgo() {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/serp", get(serp_down))
        .route("/ddg", get(ddg))
        .with_state(rec.clone());
    let base = spawn(app).await;

    let search = WebSearch::new(build_client(5).unwrap(), MatchPolicy::default())
        .with_serpapi_key("secret")
        .with_endpoints(format!("{base}/serp"), format!("{base}/ddg"));
    let matches = search.lookup(TEXT).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].url, "https://plants.example");
    assert_eq!(
        matches[0].title.as_deref(),
        Some("Photosynthesis converts light energy into chemical energy")
    );
    assert_eq!(rec.queries.lock().unwrap()[0]["q"], TEXT);
}

#[tokio::test]
async fn serpapi_failure_without_fallback_is_an_error() {
    let app = Router::new()
        .route("/serp", get(serp_down))
        .with_state(Recorded::default());
    let base = spawn(app).await;

    let search = WebSearch::new(build_client(5).unwrap(), MatchPolicy::default())
        .with_serpapi_key("secret")
        .with_fallback(false)
        .with_endpoints(format!("{base}/serp"), format!("{base}/ddg"));

    assert!(matches!(
        search.lookup(TEXT).await,
        Err(LookupError::Failed(_))
    ));
}

#[tokio::test]
async fn academic_search_posts_query_and_scores_hits() {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/search", post(academic_ok))
        .with_state(rec.clone());
    let base = spawn(app).await;

    let search = AcademicSearch::new(
        build_client(5).unwrap(),
        Some(format!("{base}/search")),
        MatchPolicy::default(),
    )
    .with_api_key("kb-key")
    .with_collection("biology");
    let matches = search.lookup(TEXT).await.unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].url, "biology/ch3.pdf");
    assert_eq!(matches[0].title.as_deref(), Some("Chapter 3"));
    assert_eq!(matches[0].similarity, 100.0);

    let bodies = rec.bodies.lock().unwrap();
    assert_eq!(
        bodies[0],
        json!({"collection": "biology", "query": TEXT, "limit": 5})
    );
    assert_eq!(
        rec.api_keys.lock().unwrap()[0].as_deref(),
        Some("kb-key")
    );
}

#[tokio::test]
async fn academic_search_sends_the_whole_submission() {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/search", post(academic_ok))
        .with_state(rec.clone());
    let base = spawn(app).await;

    let essay = format!(
        "{} The mitochondria is the powerhouse of the cell. {}",
        "Introduction to cellular biology. ".repeat(8),
        "Closing remarks follow here. ".repeat(4)
    );
    assert!(essay.chars().count() > 200);

    let search = AcademicSearch::new(
        build_client(5).unwrap(),
        Some(format!("{base}/search")),
        MatchPolicy::default(),
    );
    search.lookup(&essay).await.unwrap();
    assert!(search.lookup(" \n\t ").await.unwrap().is_empty());

    let bodies = rec.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["query"], essay.as_str());
    assert_eq!(bodies[0]["collection"], "teachmate");
}

#[tokio::test]
async fn academic_search_reports_bad_responses() {
    let app = Router::new()
        .route("/garbage", post(academic_garbage))
        .route("/down", post(serp_down))
        .with_state(Recorded::default());
    let base = spawn(app).await;
    let client = build_client(5).unwrap();

    let garbage = AcademicSearch::new(
        client.clone(),
        Some(format!("{base}/garbage")),
        MatchPolicy::default(),
    );
    assert!(matches!(
        garbage.lookup(TEXT).await,
        Err(LookupError::Decode(_))
    ));

    let down = AcademicSearch::new(client, Some(format!("{base}/down")), MatchPolicy::default());
    assert!(matches!(down.lookup(TEXT).await, Err(LookupError::Status(500))));
}

//! Client tests against an in-process mock of the recommendation service

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use vibe_common::Error;
use vibe_session::{Completion, RecommendationClient, RecommendationSession, RegenerateBlocked, SessionLimits, SessionState};

const POOL: [&str; 5] = ["Beck", "Portishead", "Air", "Massive Attack", "Bjork"];
const BATCH: usize = 2;

// ========================================
// Mock service
// ========================================

#[derive(Clone, Default)]
struct MockService {
    /// Every /recommend body received, in order
    requests: Arc<Mutex<Vec<Value>>>,
}

#[derive(Deserialize)]
struct ArtistQuery {
    #[serde(default)]
    q: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "tracks_loaded": 1200 }))
}

async fn artists(Query(query): Query<ArtistQuery>) -> Json<Vec<String>> {
    let needle = query.q.to_lowercase();
    Json(
        POOL.iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .take(query.limit)
            .map(|name| name.to_string())
            .collect(),
    )
}

async fn artist_tracks(Path(artist): Path<String>) -> impl IntoResponse {
    match artist.as_str() {
        "Massive Attack" => (
            StatusCode::OK,
            Json(json!([
                { "track_id": "ma1", "track_name": "Teardrop", "year": 1998 },
                { "track_id": "ma2", "track_name": "Angel", "genre": "trip hop" }
            ])),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Artist not found" })),
        ),
    }
}

/// Next unseen batch from the pool; no metadata when asked for "Legacy"
async fn recommend(State(service): State<MockService>, Json(body): Json<Value>) -> impl IntoResponse {
    service.requests.lock().unwrap().push(body.clone());

    let seeds: Vec<&str> = body["artists"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if seeds.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "At least one artist required" })),
        );
    }

    let excluded: Vec<&str> = body["exclude_artists"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let unseen: Vec<&str> = POOL
        .iter()
        .copied()
        .filter(|name| !excluded.contains(name) && !seeds.contains(name))
        .collect();

    let mut recommendations = serde_json::Map::new();
    for (i, name) in unseen.iter().take(BATCH).enumerate() {
        recommendations.insert(
            name.to_string(),
            json!([{ "track_id": format!("{}-{}", name, i), "track_name": format!("{} hit", name) }]),
        );
    }

    if seeds.contains(&"Legacy") {
        return (StatusCode::OK, Json(json!({ "recommendations": recommendations })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "recommendations": recommendations,
            "meta": { "has_more_candidates": unseen.len() > BATCH }
        })),
    )
}

async fn spawn_service() -> (SocketAddr, MockService) {
    let service = MockService::default();
    let app = Router::new()
        .route("/health", get(health))
        .route("/artists", get(artists))
        .route("/artists/:name/tracks", get(artist_tracks))
        .route("/recommend", post(recommend))
        .with_state(service.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, service)
}

fn client_for(addr: SocketAddr) -> RecommendationClient {
    RecommendationClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}

// ========================================
// Endpoints
// ========================================

#[tokio::test]
async fn test_health() {
    let (addr, _) = spawn_service().await;

    let health = client_for(addr).health().await.unwrap();

    assert!(health.is_ok());
    assert_eq!(health.tracks_loaded, 1200);
}

#[tokio::test]
async fn test_search_artists_sends_query_and_limit() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);

    assert_eq!(client.search_artists("a", 2).await.unwrap(), vec!["Portishead", "Air"]);
    assert_eq!(client.search_artists("", 100).await.unwrap().len(), POOL.len());
}

#[tokio::test]
async fn test_artist_tracks_with_spaces_in_name() {
    let (addr, _) = spawn_service().await;

    let tracks = client_for(addr).artist_tracks("Massive Attack").await.unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].track_name, "Teardrop");
    assert_eq!(tracks[0].year, Some(1998));
    assert_eq!(tracks[1].genre.as_deref(), Some("trip hop"));
}

#[tokio::test]
async fn test_unknown_artist_is_status_error() {
    let (addr, _) = spawn_service().await;

    let err = client_for(addr).artist_tracks("Nobody").await.unwrap_err();

    match &err {
        Error::Status { status, detail } => {
            assert_eq!(*status, 404);
            assert_eq!(detail, "Artist not found");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    assert_eq!(err.user_message(), "Artist not found");
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(addr).health().await.unwrap_err();

    assert!(matches!(err, Error::Http(_)));
    assert!(err.is_network());
    assert!(!err.user_message().is_empty());
}

// ========================================
// Session over HTTP
// ========================================

/// Given a session seeded with Radiohead
/// When it searches and regenerates until the pool runs dry
/// Then each call excludes everything shown before and the session ends exhausted
#[tokio::test]
async fn test_regeneration_chain_until_exhausted() {
    let (addr, service) = spawn_service().await;
    let client = client_for(addr);
    let mut session = RecommendationSession::new(SessionLimits::default(), Default::default());
    session.inputs_mut().add_seed("Radiohead");

    let ticket = session.begin_search().unwrap();
    let result = client.recommend(ticket.request()).await;
    assert_eq!(session.complete(ticket, result), Completion::Applied(SessionState::Populated));
    assert_eq!(session.exclusion_history().len(), 2);

    let ticket = session.begin_regenerate().unwrap();
    let result = client.recommend(ticket.request()).await;
    assert_eq!(session.complete(ticket, result), Completion::Applied(SessionState::Populated));

    let ticket = session.begin_regenerate().unwrap();
    let result = client.recommend(ticket.request()).await;
    assert_eq!(session.complete(ticket, result), Completion::Applied(SessionState::Exhausted));
    assert_eq!(session.exclusion_history().len(), POOL.len());
    assert_eq!(session.begin_regenerate().unwrap_err(), RegenerateBlocked::PoolExhausted);

    let requests = service.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].get("exclude_artists").is_none());
    assert_eq!(requests[1]["exclude_artists"], json!(["Beck", "Portishead"]));
    assert_eq!(
        requests[2]["exclude_artists"],
        json!(["Air", "Beck", "Massive Attack", "Portishead"])
    );
    let client_id = session.id().to_string();
    assert!(requests.iter().all(|r| r["client_id"] == json!(client_id)));
}

#[tokio::test]
async fn test_service_error_surfaces_detail() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);
    let mut session = RecommendationSession::new(SessionLimits::default(), Default::default());
    session.inputs_mut().add_seed("Radiohead");
    let ticket = session.begin_search().unwrap();

    // Seeds stripped to provoke the service's validation error
    let mut request = ticket.request().clone();
    request.artists.clear();
    let result = client.recommend(&request).await;

    assert_eq!(
        session.complete(ticket, result),
        Completion::Failed("At least one artist required".to_string())
    );
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_response_without_meta_allows_regenerate() {
    let (addr, _) = spawn_service().await;
    let client = client_for(addr);
    let mut session = RecommendationSession::new(SessionLimits::default(), Default::default());
    session.inputs_mut().add_seed("Legacy");

    let ticket = session.begin_search().unwrap();
    let result = client.recommend(ticket.request()).await;
    session.complete(ticket, result);

    assert_eq!(session.state(), SessionState::Populated);
    assert!(session.last_meta().is_none());
    assert!(session.can_regenerate());
}

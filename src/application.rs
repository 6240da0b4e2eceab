use std::sync::Arc;

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::board::TileRecord;
use crate::game::GameManager;
use crate::identity::{bearer_token, IdentityVerifier};
use crate::websocket::{serve_socket, SessionSettings};
use crate::VERSION;

/// Everything the HTTP handlers share.
pub struct AppState {
    pub manager: Arc<GameManager>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub session: SessionSettings,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Health {
    status: &'static str,
    version: &'static str,
    players: usize,
    connections: usize,
}

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/tiles", get(tiles))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors)
}

/// Bearer header first, then the `token` query parameter browsers can set.
fn request_token(headers: &HeaderMap, query: TokenQuery) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string)
        .or(query.token.filter(|token| !token.trim().is_empty()))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
    State(state): State<SharedState>,
) -> Response {
    let Some(token) = request_token(&headers, query) else {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    };
    let player_id = match state.verifier.verify(&token).await {
        Ok(player_id) => player_id,
        Err(e) => {
            log::warn!("🔒 Rejected WebSocket upgrade: {}", e);
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    let manager = Arc::clone(&state.manager);
    let settings = state.session.clone();
    ws.on_upgrade(move |socket| serve_socket(socket, player_id, manager, settings))
}

async fn tiles(State(state): State<SharedState>) -> Json<Vec<TileRecord>> {
    Json(state.manager.board().records().to_vec())
}

async fn health(State(state): State<SharedState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: VERSION,
        players: state.manager.player_count().await,
        connections: state.manager.hub().len().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{parse_board, QuizBank};
    use crate::dice::RandomDice;
    use crate::game::GameSettings;
    use crate::hub::{ConnectionHub, SessionHandle};
    use crate::identity::DevIdentityVerifier;
    use crate::results::InMemoryResultsStore;
    use axum::http::HeaderValue;

    fn state() -> SharedState {
        let board = parse_board(
            r#"[
                {"id": 1, "kind": "start", "detail": "go", "next_ids": [2]},
                {"id": 2, "kind": "goal", "detail": "done", "prev_ids": [1]}
            ]"#,
            1,
        )
        .unwrap();
        let manager = GameManager::new(
            Arc::new(board),
            Arc::new(QuizBank::default()),
            Arc::new(ConnectionHub::new()),
            Arc::new(RandomDice),
            Arc::new(InMemoryResultsStore::new()),
            GameSettings::default(),
        );
        Arc::new(AppState {
            manager: Arc::new(manager),
            verifier: Arc::new(DevIdentityVerifier),
            session: SessionSettings::default(),
        })
    }

    #[test]
    fn test_request_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_token(&headers, TokenQuery::default()), None);

        let query = TokenQuery {
            token: Some("from-query".to_string()),
        };
        assert_eq!(request_token(&headers, query), Some("from-query".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        let query = TokenQuery {
            token: Some("from-query".to_string()),
        };
        assert_eq!(request_token(&headers, query), Some("from-header".to_string()));

        let blank = TokenQuery {
            token: Some(" ".to_string()),
        };
        assert_eq!(request_token(&HeaderMap::new(), blank), None);
    }

    #[tokio::test]
    async fn test_tiles_returns_board_records() {
        let Json(records) = tiles(State(state())).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].detail, "go");
        assert_eq!(records[1].prev_ids, vec![1]);
    }

    #[tokio::test]
    async fn test_health_counts_sessions() {
        let state = state();
        let (session, _rx) = SessionHandle::new("p1", 4);
        state.manager.join(session).await;

        let Json(health) = health(State(Arc::clone(&state))).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.players, 1);
        assert_eq!(health.connections, 1);
    }
}

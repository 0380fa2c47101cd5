use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use tower_http::services::ServeDir;

use holdem_ws::registry::{Registry, RoomConfig};
use holdem_ws::room::RoomMsg;
use holdem_ws::{ClientMessage, ServerMessage};

#[derive(Debug, Deserialize)]
struct JoinParams {
    player_id: String,
    name: String,
}

async fn ws_handler(
    Path(room_id): Path<String>,
    Query(params): Query<JoinParams>,
    State(registry): State<Arc<Registry>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, room_id, params))
}

async fn handle_socket(socket: WebSocket, registry: Arc<Registry>, room_id: String, params: JoinParams) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let Some(handle) = registry.lookup(&room_id).await else {
        let reply = ServerMessage::Error {
            code: "room_not_found".to_string(),
            message: format!("no room {}", room_id),
        };
        let _ = ws_tx
            .send(Message::Text(serde_json::to_string(&reply).unwrap()))
            .await;
        return;
    };

    // writer task: each connection is written to serially
    let (client_tx, mut client_rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(async move {
        while let Some(msg) = client_rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    if handle
        .tx
        .send(RoomMsg::Join {
            player_id: params.player_id.clone(),
            name: params.name.clone(),
            tx: client_tx.clone(),
        })
        .await
        .is_err()
    {
        let _ = writer.await;
        return;
    }

    // parse once at the boundary; the room only ever sees typed messages
    while let Some(Ok(frame)) = ws_rx.next().await {
        let Message::Text(text) = frame else { continue };
        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(msg) => {
                let leaving = matches!(msg, ClientMessage::Leave);
                if handle
                    .tx
                    .send(RoomMsg::Client {
                        player_id: params.player_id.clone(),
                        msg,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
                if leaving {
                    break;
                }
            }
            Err(_) => {
                let reply = ServerMessage::Error {
                    code: "invalid_message".to_string(),
                    message: "unparseable message".to_string(),
                };
                let _ = client_tx.send(Message::Text(serde_json::to_string(&reply).unwrap()));
            }
        }
    }

    let _ = handle
        .tx
        .send(RoomMsg::Disconnected {
            player_id: params.player_id.clone(),
        })
        .await;
    drop(client_tx);
    let _ = writer.await;
}

async fn list_rooms(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    Json(registry.list().await)
}

async fn create_room(
    State(registry): State<Arc<Registry>>,
    Json(config): Json<RoomConfig>,
) -> impl IntoResponse {
    if config.small_blind == 0 || config.big_blind <= config.small_blind {
        return (StatusCode::BAD_REQUEST, "bad blinds".to_string()).into_response();
    }
    let room_id = registry.create(config).await;
    Json(serde_json::json!({ "room_id": room_id })).into_response()
}

async fn room_state(
    Path(room_id): Path<String>,
    State(registry): State<Arc<Registry>>,
) -> impl IntoResponse {
    let Some(handle) = registry.lookup(&room_id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
    if handle.tx.send(RoomMsg::Describe { reply: reply_tx }).await.is_err() {
        return StatusCode::NOT_FOUND.into_response();
    }
    match reply_rx.await {
        Ok(description) => Json(description).into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let registry: Arc<Registry> = Arc::new(Registry::default());
    let app = Router::new()
        .route("/ws/:room_id", get(ws_handler))
        .route("/api/rooms", get(list_rooms))
        .route("/api/room/:room_id/state", get(room_state))
        .route("/create-room", post(create_room))
        .nest_service("/", ServeDir::new("public"))
        .with_state(registry);

    let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

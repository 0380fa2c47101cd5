use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Tiny probe client: connects to a room and turns stdin lines into
/// action frames. Lines: start | fold | check | call | bet N | raise N |
/// allin | chat TEXT | leave
#[tokio::main]
async fn main() {
    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://127.0.0.1:8080".to_string());
    let room_id = std::env::args().nth(2).unwrap_or_else(|| "lobby".to_string());
    let player_id = std::env::args()
        .nth(3)
        .unwrap_or_else(|| format!("p-{}", std::process::id()));
    let name = std::env::args().nth(4).unwrap_or_else(|| player_id.clone());

    let url = Url::parse(&format!(
        "{}/ws/{}?player_id={}&name={}",
        base, room_id, player_id, name
    ))
    .expect("bad url");
    let (ws, _resp) = connect_async(url.as_str()).await.expect("connect");
    let (mut ws_tx, mut ws_rx) = ws.split();

    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            println!("<- {}", msg);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut parts = line.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("");
        let frame = match cmd {
            "start" => serde_json::json!({"action": "start_game"}),
            "fold" | "check" | "call" | "leave" => serde_json::json!({"action": cmd}),
            "allin" => serde_json::json!({"action": "all_in"}),
            "bet" | "raise" => match arg.parse::<u32>() {
                Ok(amount) => serde_json::json!({"action": cmd, "amount": amount}),
                Err(_) => {
                    println!("usage: {} <amount>", cmd);
                    continue;
                }
            },
            "chat" => serde_json::json!({"action": "chat", "content": arg}),
            _ => {
                println!("unknown command: {}", cmd);
                continue;
            }
        };
        if ws_tx.send(Message::Text(frame.to_string())).await.is_err() {
            break;
        }
        if cmd == "leave" {
            break;
        }
    }

    reader.abort();
}

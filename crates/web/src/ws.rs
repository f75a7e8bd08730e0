//! `GET /ws/parking`: one subscriber per connection. The server pushes every
//! snapshot; the only thing a viewer sends is `{"type":"ping"}`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use model::message::{ClientMessage, PONG};
use parking::{
    broadcaster::{BroadcasterHandle, Subscription},
    database::Database,
};

use crate::WebState;

pub(crate) async fn parking_socket<D: Database + 'static>(
    State(WebState { client, .. }): State<WebState<D>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let broadcaster = client.broadcaster().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: BroadcasterHandle) {
    let Subscription { id, mut outbox } = match broadcaster.subscribe().await {
        Ok(subscription) => subscription,
        Err(why) => {
            warn!("could not register subscriber: {}", why);
            return;
        }
    };
    info!("subscriber {} connected", id);

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            payload = outbox.recv() => {
                let Some(payload) = payload else {
                    break;
                };
                if let Err(why) = sink.send(Message::Text(payload.to_string())).await {
                    debug!("send to subscriber {} failed: {}", id, why);
                    break;
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => match ClientMessage::parse(&text) {
                        Ok(ClientMessage::Ping) => {
                            if sink.send(Message::Text(PONG.to_owned())).await.is_err() {
                                break;
                            }
                        }
                        Err(why) => {
                            debug!("dropping message from subscriber {}: {}", id, why);
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(why)) => {
                        debug!("subscriber {} transport error: {}", id, why);
                        break;
                    }
                    // binary, ping and pong frames
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    if let Err(why) = broadcaster.unsubscribe(id).await {
        debug!("could not unsubscribe {}: {}", id, why);
    }
    info!("subscriber {} disconnected", id);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::{SinkExt, StreamExt};
    use model::{
        message::{ServerMessage, PING},
        zone::NewZone,
    };
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

    use crate::tests::{memory_state, router};

    async fn next_text<S>(stream: &mut S) -> String
    where
        S: StreamExt<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            if let WsMessage::Text(text) = message {
                return text;
            }
        }
    }

    #[tokio::test]
    async fn pushes_snapshots_and_answers_pings() {
        let (state, _) = memory_state().await;
        let client = state.client.clone();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        let (socket, _) = connect_async(format!("ws://{}/ws/parking", address))
            .await
            .unwrap();
        let (mut sink, mut stream) = socket.split();

        // the current snapshot arrives right after connecting
        let first = next_text(&mut stream).await;
        assert_eq!(
            ServerMessage::parse(&first).unwrap(),
            ServerMessage::Snapshot(Vec::new())
        );

        sink.send(WsMessage::Text(PING.to_owned())).await.unwrap();
        // a periodic refresh may land before the reply
        loop {
            match ServerMessage::parse(&next_text(&mut stream).await).unwrap() {
                ServerMessage::Pong => break,
                ServerMessage::Snapshot(snapshot) => assert!(snapshot.is_empty()),
                other => panic!("unexpected message {:?}", other),
            }
        }

        // garbage is dropped, the connection stays usable
        sink.send(WsMessage::Text("{oops".to_owned())).await.unwrap();

        let new_zone: NewZone = serde_json::from_value(json!({
            "parking_name": "Piata_Operei",
            "total_spots": 12,
            "coordinates": [
                { "latitude": 45.753, "longitude": 21.225 },
                { "latitude": 45.754, "longitude": 21.226 },
                { "latitude": 45.752, "longitude": 21.227 },
            ],
        }))
        .unwrap();
        let created = client.create_zone(new_zone).await.unwrap();

        let pushed = loop {
            if let ServerMessage::Snapshot(snapshot) =
                ServerMessage::parse(&next_text(&mut stream).await).unwrap()
            {
                if !snapshot.is_empty() {
                    break snapshot;
                }
            }
        };
        assert_eq!(pushed, vec![created]);

        sink.send(WsMessage::Close(None)).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while client.broadcaster().subscriber_count().await.unwrap() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}

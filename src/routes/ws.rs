// WebSocket handler: push every published health state to the client

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::HealthState;
use crate::store::PollingLease;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

pub(super) async fn ws_health(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let store = state.store.clone();
    ws.on_upgrade(move |socket| async move {
        // Subscribe before leasing so the first cycle's update is not missed.
        let mut rx = store.subscribe();
        let lease = store.lease();
        if let Err(e) = stream_health(socket, &mut rx, lease).await {
            tracing::info!("Health stream error: {}", e);
        }
    })
}

/// Holds `lease` until the client goes away, so polling runs while anyone watches.
async fn stream_health(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<HealthState>,
    lease: PollingLease,
) -> anyhow::Result<()> {
    tracing::info!("Client connected to health stream");

    let current = serde_json::to_string(&lease.store().state())?;
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(current.into()))).await;
    if r.is_err() || r.unwrap_or(Ok(())).is_err() {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // First tick is immediate; the welcome message already proved liveness.
    ping_interval.tick().await;
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(state) => {
                        let json = serde_json::to_string(&state)?;
                        let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
                        if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/health client lagged, skipped {} updates", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("Client disconnected from health stream");
    Ok(())
}

//! Manages the WebSocket connection lifecycle for one classroom session.

use super::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use anyhow::{Result, anyhow};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use classroom_core::{Classroom, persona};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

type SocketSink = SplitSink<WebSocket, Message>;

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Greets the client, waits for a valid `init`, then plays the classroom until
/// it finishes or the client goes away. A disconnect abandons the session.
#[instrument(name = "ws_session", skip_all, fields(session_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    tracing::Span::current().record("session_id", tracing::field::display(session_id));
    info!("New WebSocket connection. Awaiting initialization...");

    let (mut socket_tx, mut socket_rx) = socket.split();

    let welcome = ServerMessage::Welcome {
        personas: persona::CATALOG.to_vec(),
    };
    if let Err(e) = send_msg(&mut socket_tx, welcome).await {
        error!(error = ?e, "Failed to greet client.");
        return;
    }

    let Some(classroom) = initialize_classroom(&mut socket_tx, &mut socket_rx, &state, session_id).await
    else {
        info!("Client disconnected before the classroom was ready.");
        return;
    };

    if let Err(e) = run_classroom(&mut socket_tx, &mut socket_rx, classroom).await {
        error!(error = ?e, "Classroom session terminated with error.");
    }
    info!("WebSocket connection closed.");
}

/// Waits for the client's `init` and sets up the classroom.
///
/// Anything else is answered with an error and the wait continues. Returns
/// `None` if the client leaves first.
async fn initialize_classroom(
    socket_tx: &mut SocketSink,
    socket_rx: &mut SplitStream<WebSocket>,
    state: &Arc<AppState>,
    session_id: Uuid,
) -> Option<Classroom> {
    while let Some(msg_result) = socket_rx.next().await {
        let text = match msg_result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        };

        let (persona_choice, topic, seed) = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::Init {
                persona,
                topic,
                seed,
            }) if !topic.trim().is_empty() => (persona, topic, seed),
            Ok(ClientMessage::Init { .. }) => {
                send_error(socket_tx, "`topic` must not be empty").await.ok()?;
                continue;
            }
            Ok(_) => {
                send_error(socket_tx, "First message must be `init`").await.ok()?;
                continue;
            }
            Err(e) => {
                send_error(socket_tx, &format!("Malformed message: {}", e)).await.ok()?;
                continue;
            }
        };

        let persona = persona::resolve_persona(&persona_choice);
        let topic = topic.trim().to_string();
        info!(
            %topic,
            ?seed,
            provider = ?state.config.oracle.provider,
            model = %state.config.oracle.chat_model,
            "Initializing classroom"
        );

        let (classroom, notices) = Classroom::setup(
            state.oracle.clone(),
            state.prompts.clone(),
            state.curriculum_service.as_ref(),
            persona,
            topic,
        )
        .await;
        let classroom = match seed {
            Some(seed) => classroom.with_rng(StdRng::seed_from_u64(seed)),
            None => classroom,
        };

        let session = classroom.state();
        let initialized = ServerMessage::Initialized {
            session_id,
            topic: session.topic.clone(),
            persona: session.persona.clone(),
            curriculum: session.curriculum.clone(),
            question_count: session.test_bank.len(),
        };
        send_msg(socket_tx, initialized).await.ok()?;
        send_msg(socket_tx, ServerMessage::Notices { items: notices })
            .await
            .ok()?;
        return Some(classroom);
    }
    None
}

/// Feeds teacher lines to the classroom until it finishes.
async fn run_classroom(
    socket_tx: &mut SocketSink,
    socket_rx: &mut SplitStream<WebSocket>,
    mut classroom: Classroom,
) -> Result<()> {
    while let Some(msg_result) = socket_rx.next().await {
        let text = match msg_result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("Client sent close frame. Abandoning session.");
                return Ok(());
            }
            Ok(Message::Binary(_)) => {
                warn!("Ignoring binary frame.");
                continue;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
            Err(e) => return Err(anyhow!("Error receiving from client WebSocket: {:?}", e)),
        };

        match serde_json::from_str::<ClientMessage>(&text) {
            Ok(ClientMessage::TeacherLine { text }) => {
                debug!(chars = text.len(), "Teacher line received");
                let items = classroom.submit_teacher_line(&text).await;
                send_msg(socket_tx, ServerMessage::Notices { items }).await?;

                if let Some(outcome) = classroom.outcome() {
                    send_msg(socket_tx, ServerMessage::GameOver { outcome }).await?;
                    socket_tx.send(Message::Close(None)).await?;
                    info!(?outcome, "Game over.");
                    return Ok(());
                }
            }
            Ok(ClientMessage::Init { .. }) => {
                send_error(socket_tx, "Session is already initialized").await?;
            }
            Err(e) => {
                send_error(socket_tx, &format!("Malformed message: {}", e)).await?;
            }
        }
    }
    info!("Client disconnected. Abandoning session.");
    Ok(())
}

async fn send_error(socket_tx: &mut SocketSink, message: &str) -> Result<()> {
    warn!(message, "Rejecting client message.");
    send_msg(
        socket_tx,
        ServerMessage::Error {
            message: message.to_string(),
        },
    )
    .await
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(socket_tx: &mut SocketSink, msg: ServerMessage) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}

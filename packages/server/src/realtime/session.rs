use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use common::MessageKind;
use common::realtime::{
    Ack, ClientEvent, Joined, SendFile, SendText, ServerEvent, Typing, TypingNotice,
};
use futures::{SinkExt, StreamExt};
use sea_orm::DatabaseConnection;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, error, warn};

use super::hub::{ChatHub, ConnectionId};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::policy::{self, Action, Target};
use crate::state::AppState;
use crate::utils::{chat, room};

/// Drive one upgraded WebSocket until the client goes away.
///
/// Outbound events go through an unbounded channel drained by a writer
/// task, so the hub never waits on a slow socket. Inbound frames are
/// handled one at a time, which keeps a client's own sends in order.
pub async fn run(socket: WebSocket, state: AppState, user: AuthUser) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to encode chat event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = ChatSession::new(state.db.clone(), state.hub.clone(), user, tx);
    debug!(user_id = session.user.user_id, conn = ?session.conn, "Chat connection opened");

    loop {
        tokio::select! {
            frame = stream.next() => {
                let Some(Ok(frame)) = frame else { break };
                match frame {
                    Message::Text(text) => session.handle_frame(text.as_str()).await,
                    Message::Binary(_) => session.reply(ServerEvent::error("Binary frames are not supported")),
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            _ = &mut writer => break,
        }
    }

    session.close();
    debug!(user_id = session.user.user_id, conn = ?session.conn, "Chat connection closed");
    drop(session);
    writer.abort();
}

/// Per-connection chat state.
pub struct ChatSession {
    db: DatabaseConnection,
    hub: Arc<ChatHub>,
    user: AuthUser,
    conn: ConnectionId,
    tx: UnboundedSender<ServerEvent>,
    /// The room this connection listens to, if any.
    joined: Option<i32>,
}

impl ChatSession {
    pub fn new(
        db: DatabaseConnection,
        hub: Arc<ChatHub>,
        user: AuthUser,
        tx: UnboundedSender<ServerEvent>,
    ) -> Self {
        let conn = hub.next_connection_id();
        Self {
            db,
            hub,
            user,
            conn,
            tx,
            joined: None,
        }
    }

    fn reply(&self, event: ServerEvent) {
        // The writer only stops when the socket is gone.
        let _ = self.tx.send(event);
    }

    async fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle(event).await,
            Err(e) => self.reply(ServerEvent::error(format!("Malformed event: {e}"))),
        }
    }

    pub async fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom(join) => {
                if join.user_id.is_some_and(|id| id != self.user.user_id) {
                    self.reply(ServerEvent::error("userId does not match the connection"));
                    return;
                }
                if let Err(e) = self.join(join.room_id).await {
                    self.reply(ServerEvent::error(describe(&e)));
                }
            }
            ClientEvent::Message(msg) => self.send_text(msg).await,
            ClientEvent::FileUpload(file) => self.send_file(file).await,
            ClientEvent::Typing(typing) => self.typing(typing),
        }
    }

    async fn join(&mut self, room_id: i32) -> Result<(), AppError> {
        self.check_room(room_id, Action::JoinChat).await?;

        if self.joined == Some(room_id) {
            self.reply(ServerEvent::Joined(Joined {
                room_id,
                present_user_ids: self.hub.present_users(room_id),
            }));
            return Ok(());
        }

        if let Some(previous) = self.joined.take() {
            self.hub.leave(previous, self.conn);
        }
        let present_user_ids = self
            .hub
            .join(room_id, self.conn, self.user.user_id, self.tx.clone());
        self.joined = Some(room_id);
        self.reply(ServerEvent::Joined(Joined {
            room_id,
            present_user_ids,
        }));
        Ok(())
    }

    /// The room must still exist and the user must still be a member,
    /// including for the room this connection joined. A deleted room is
    /// forgotten so later sends do not reach its former subscribers.
    async fn check_room(&mut self, room_id: i32, action: Action) -> Result<(), AppError> {
        if let Err(e) = room::find_room(&self.db, room_id).await {
            if self.joined == Some(room_id) && matches!(e, AppError::NotFound(_)) {
                self.joined = None;
                self.hub.leave(room_id, self.conn);
            }
            return Err(e);
        }
        let is_member = room::is_member(&self.db, room_id, self.user.user_id).await?;
        policy::authorize(&self.user, action, Target::room(is_member))
    }

    async fn send_text(&mut self, msg: SendText) {
        let SendText {
            room_id,
            sender_id,
            text,
            client_ref,
        } = msg;

        if sender_id.is_some_and(|id| id != self.user.user_id) {
            self.reply(ServerEvent::Ack(Ack::rejected(
                client_ref,
                "senderId does not match the connection",
            )));
            return;
        }
        let text = text.trim();
        if text.is_empty() {
            self.reply(ServerEvent::Ack(Ack::rejected(client_ref, "Message text cannot be empty")));
            return;
        }
        if text.chars().count() > chat::MAX_MESSAGE_CHARS {
            self.reply(ServerEvent::Ack(Ack::rejected(
                client_ref,
                format!("Message exceeds {} characters", chat::MAX_MESSAGE_CHARS),
            )));
            return;
        }

        self.persist_and_broadcast(room_id, MessageKind::Text, text.to_string(), None, client_ref)
            .await;
    }

    async fn send_file(&mut self, file: SendFile) {
        let SendFile {
            room_id,
            sender_id,
            file_url,
            file_name,
            client_ref,
        } = file;

        if sender_id.is_some_and(|id| id != self.user.user_id) {
            self.reply(ServerEvent::Ack(Ack::rejected(
                client_ref,
                "senderId does not match the connection",
            )));
            return;
        }
        let file_url = file_url.trim().to_string();
        if file_url.is_empty() {
            self.reply(ServerEvent::Ack(Ack::rejected(client_ref, "fileUrl is required")));
            return;
        }
        let file_name = file_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| chat::file_name_from_url(&file_url));

        self.persist_and_broadcast(
            room_id,
            MessageKind::File,
            file_name,
            Some(file_url),
            client_ref,
        )
        .await;
    }

    /// Store first, then acknowledge the sender, then fan out.
    ///
    /// Nothing is broadcast unless the row was written.
    async fn persist_and_broadcast(
        &mut self,
        room_id: i32,
        kind: MessageKind,
        body: String,
        attachment_url: Option<String>,
        client_ref: Option<String>,
    ) {
        if let Err(e) = self.check_room(room_id, Action::SendChat).await {
            self.reply(ServerEvent::Ack(Ack::rejected(client_ref, describe(&e))));
            return;
        }

        let saved = match chat::record_message(
            &self.db,
            room_id,
            self.user.user_id,
            kind,
            body,
            attachment_url,
        )
        .await
        {
            Ok(saved) => saved,
            Err(e) => {
                error!(room_id, user_id = self.user.user_id, "Failed to save chat message: {}", e);
                self.reply(ServerEvent::Ack(Ack::rejected(client_ref, "Failed to save message")));
                return;
            }
        };

        self.reply(ServerEvent::Ack(Ack::accepted(client_ref, saved.id)));
        let delivered = self
            .hub
            .broadcast(room_id, chat::to_payload(&saved).into_event());
        debug!(room_id, message_id = saved.id, delivered, "Broadcast chat message");
    }

    fn typing(&self, typing: Typing) {
        if typing.user_id.is_some_and(|id| id != self.user.user_id) {
            self.reply(ServerEvent::error("userId does not match the connection"));
            return;
        }
        if self.joined != Some(typing.room_id) {
            warn!(
                room_id = typing.room_id,
                user_id = self.user.user_id,
                "Typing signal for a room the connection has not joined"
            );
            return;
        }
        self.hub.broadcast_except(
            typing.room_id,
            self.conn,
            ServerEvent::Typing(TypingNotice {
                user_id: self.user.user_id,
                is_typing: typing.is_typing,
                timestamp: Utc::now().timestamp_millis(),
            }),
        );
    }

    /// Leave the joined room, if any.
    pub fn close(&mut self) {
        if let Some(room_id) = self.joined.take() {
            self.hub.leave(room_id, self.conn);
        }
    }
}

/// Client-facing text for a failed chat action.
fn describe(err: &AppError) -> String {
    match err {
        AppError::PermissionDenied => "You are not a member of this room".to_string(),
        AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
        AppError::Internal(detail) => {
            error!("Chat action failed: {}", detail);
            "Internal error".to_string()
        }
        other => other.to_string(),
    }
}

//! In-memory chat state and the handlers that mutate it.
//!
//! [`Relay`] performs no I/O. Each handler returns the [`Outbound`] events the
//! caller must deliver, addressed by [`Audience`].

use std::collections::HashMap;
use log::{debug, info};
use serde_json::Value;

use crate::history::{ChatMessage, MessageLog};
use crate::messages::{CallTarget, ClientEvent, NewMessage, ProfileUpdate, ServerEvent};
use crate::roster::{Roster, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Others(String),
    Only(String),
}

impl Audience {
    pub fn includes(&self, conn_id: &str) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Others(excluded) => excluded != conn_id,
            Audience::Only(target) => target == conn_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Outbound {
    fn everyone(event: ServerEvent) -> Self {
        Outbound {
            audience: Audience::Everyone,
            event,
        }
    }

    fn others(conn_id: &str, event: ServerEvent) -> Self {
        Outbound {
            audience: Audience::Others(conn_id.to_string()),
            event,
        }
    }

    fn only(conn_id: &str, event: ServerEvent) -> Self {
        Outbound {
            audience: Audience::Only(conn_id.to_string()),
            event,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub users: usize,
    pub messages: usize,
}

#[derive(Debug, Default)]
pub struct Relay {
    roster: Roster,
    history: MessageLog,
    /// Connection ids in the order they started typing.
    typing: Vec<String>,
    /// Connection id -> sharer display name.
    screen_sharers: HashMap<String, String>,
    whiteboard: Value,
}

impl Relay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_limit(limit: usize) -> Self {
        Relay {
            history: MessageLog::with_capacity(limit),
            ..Self::default()
        }
    }

    pub fn stats(&self) -> Stats {
        Stats {
            users: self.roster.len(),
            messages: self.history.len(),
        }
    }

    pub fn handle(&mut self, conn_id: &str, event: ClientEvent) -> Vec<Outbound> {
        let sender_id = conn_id.to_string();
        match event {
            ClientEvent::Join(username) => self.join(conn_id, username),
            ClientEvent::UpdateProfile(update) => self.update_profile(conn_id, update),
            ClientEvent::Message(message) => self.post_message(conn_id, message),
            ClientEvent::EditMessage {
                message_id,
                new_text,
            } => {
                if !self.history.edit(&message_id, conn_id, &new_text) {
                    return Vec::new();
                }
                let event = ServerEvent::MessageEdited {
                    message_id,
                    new_text,
                };
                vec![Outbound::everyone(event)]
            }
            ClientEvent::DeleteMessage(message_id) => {
                if !self.history.delete(&message_id, conn_id) {
                    return Vec::new();
                }
                vec![Outbound::everyone(ServerEvent::MessageDeleted(message_id))]
            }
            ClientEvent::TogglePinMessage(message_id) => {
                let Some(is_pinned) = self.history.toggle_pin(&message_id) else {
                    return Vec::new();
                };
                let event = ServerEvent::MessagePinToggled {
                    message_id,
                    is_pinned,
                };
                vec![Outbound::everyone(event)]
            }
            ClientEvent::Typing(is_typing) => self.set_typing(conn_id, is_typing),
            ClientEvent::StartScreenShare => self.start_screen_share(conn_id),
            ClientEvent::StopScreenShare => {
                self.screen_sharers.remove(conn_id);
                let event = ServerEvent::ScreenShareStopped(sender_id);
                vec![Outbound::others(conn_id, event)]
            }
            ClientEvent::WebrtcOffer { offer, target_id } => {
                let event = ServerEvent::WebrtcOffer { offer, sender_id };
                forward(conn_id, &target_id, "webrtc-offer", event)
            }
            ClientEvent::WebrtcAnswer { answer, target_id } => {
                let event = ServerEvent::WebrtcAnswer { answer, sender_id };
                forward(conn_id, &target_id, "webrtc-answer", event)
            }
            ClientEvent::WebrtcIceCandidate {
                candidate,
                target_id,
            } => {
                let event = ServerEvent::WebrtcIceCandidate {
                    candidate,
                    sender_id,
                };
                forward(conn_id, &target_id, "webrtc-ice-candidate", event)
            }
            ClientEvent::CallInitiate {
                target_user_id,
                is_video_call,
            } => {
                let Some(username) = self.roster.username(conn_id) else {
                    return Vec::new();
                };
                let event = ServerEvent::CallIncoming {
                    user_id: sender_id,
                    username: username.to_string(),
                    is_video_call,
                };
                forward(conn_id, &target_user_id, "call-initiate", event)
            }
            ClientEvent::CallAnswer {
                caller_id,
                is_video_call,
            } => {
                let event = ServerEvent::CallAccepted {
                    user_id: sender_id,
                    is_video_call,
                };
                forward(conn_id, &caller_id, "call-answer", event)
            }
            ClientEvent::CallReject { caller_id } => {
                let event = ServerEvent::CallRejected { user_id: sender_id };
                forward(conn_id, &caller_id, "call-reject", event)
            }
            ClientEvent::CallEnd(target) => {
                let event = ServerEvent::CallEnded { user_id: sender_id };
                match target.and_then(|CallTarget { target_id }| target_id) {
                    Some(target_id) => forward(conn_id, &target_id, "call-end", event),
                    None => vec![Outbound::others(conn_id, event)],
                }
            }
            ClientEvent::CallOffer { offer, target_id } => {
                let event = ServerEvent::CallOffer { offer, sender_id };
                forward(conn_id, &target_id, "call-offer", event)
            }
            ClientEvent::CallAnswerSdp { answer, target_id } => {
                let event = ServerEvent::CallAnswerSdp { answer, sender_id };
                forward(conn_id, &target_id, "call-answer-sdp", event)
            }
            ClientEvent::CallIceCandidate {
                candidate,
                target_id,
            } => {
                let event = ServerEvent::CallIceCandidate {
                    candidate,
                    sender_id,
                };
                forward(conn_id, &target_id, "call-ice-candidate", event)
            }
            ClientEvent::ExcalidrawUpdate(state) => {
                self.whiteboard = state.clone();
                vec![Outbound::others(conn_id, ServerEvent::ExcalidrawUpdate(state))]
            }
        }
    }

    /// Drops everything held for `conn_id`. Connections that never joined produce nothing.
    pub fn disconnect(&mut self, conn_id: &str) -> Vec<Outbound> {
        let Some(user) = self.roster.remove(conn_id) else {
            return Vec::new();
        };
        let mut outbound = Vec::new();

        if self.clear_typing(conn_id) {
            outbound.push(Outbound::everyone(ServerEvent::Typing(self.typing_names())));
        }
        if self.screen_sharers.remove(conn_id).is_some() {
            let event = ServerEvent::ScreenShareStopped(conn_id.to_string());
            outbound.push(Outbound::others(conn_id, event));
        }
        outbound.push(Outbound::others(conn_id, ServerEvent::UserLeft {
            id: user.id,
            username: user.username.clone(),
        }));

        info!("{} left the chat", user.username);
        outbound
    }

    fn join(&mut self, conn_id: &str, username: String) -> Vec<Outbound> {
        let user = User::new(conn_id.to_string(), username);
        info!("{} joined the chat", user.username);
        self.roster.insert(user.clone());

        vec![
            Outbound::only(conn_id, ServerEvent::Init {
                messages: self.history.snapshot(),
                users: self.roster.list(),
                excalidraw_state: self.whiteboard.clone(),
            }),
            Outbound::others(conn_id, ServerEvent::UserJoined(user)),
        ]
    }

    fn update_profile(&mut self, conn_id: &str, update: ProfileUpdate) -> Vec<Outbound> {
        let Some(user) = self.roster.get_mut(conn_id) else {
            return Vec::new();
        };
        if let Some(status) = update.status {
            user.status = status;
        }
        if let Some(picture) = update.profile_picture {
            user.profile_picture = picture;
        }
        info!("{} updated profile: status={:?}", user.username, user.status);
        vec![Outbound::everyone(ServerEvent::ProfileUpdated(user.clone()))]
    }

    fn post_message(&mut self, conn_id: &str, draft: NewMessage) -> Vec<Outbound> {
        let Some(user) = self.roster.get(conn_id) else {
            return Vec::new();
        };
        let mut message = ChatMessage::new(conn_id, &user.username, draft.text, draft.kind);
        message.gif_url = draft.gif_url;
        message.file_url = draft.file_url;
        message.file_name = draft.file_name;
        message.file_size = draft.file_size;
        message.reply_to = draft.reply_to;

        if let Some(evicted) = self.history.push(message.clone()) {
            debug!("Evicted message {} from history", evicted.id);
        }
        let mut outbound = vec![Outbound::everyone(ServerEvent::Message(message))];

        if self.clear_typing(conn_id) {
            outbound.push(Outbound::everyone(ServerEvent::Typing(self.typing_names())));
        }
        outbound
    }

    fn set_typing(&mut self, conn_id: &str, is_typing: bool) -> Vec<Outbound> {
        if self.roster.get(conn_id).is_none() {
            return Vec::new();
        }
        if is_typing {
            if !self.typing.iter().any(|id| id == conn_id) {
                self.typing.push(conn_id.to_string());
            }
        } else {
            self.clear_typing(conn_id);
        }
        vec![Outbound::everyone(ServerEvent::Typing(self.typing_names()))]
    }

    fn start_screen_share(&mut self, conn_id: &str) -> Vec<Outbound> {
        let Some(username) = self.roster.username(conn_id).map(str::to_string) else {
            return Vec::new();
        };
        self.screen_sharers.insert(conn_id.to_string(), username.clone());
        vec![Outbound::others(conn_id, ServerEvent::ScreenShareStarted {
            user_id: conn_id.to_string(),
            username,
        })]
    }

    fn clear_typing(&mut self, conn_id: &str) -> bool {
        let before = self.typing.len();
        self.typing.retain(|id| id != conn_id);
        self.typing.len() != before
    }

    fn typing_names(&self) -> Vec<String> {
        self.typing
            .iter()
            .filter_map(|id| self.roster.username(id))
            .map(str::to_string)
            .collect()
    }
}

fn forward(sender: &str, target: &str, kind: &str, event: ServerEvent) -> Vec<Outbound> {
    debug!("Forwarding {} from {} to {}", kind, sender, target);
    vec![Outbound::only(target, event)]
}

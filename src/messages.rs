use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::FrameError;
use crate::history::{ChatMessage, MessageKind};
use crate::roster::{Status, User};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Outer `None`: leave the avatar alone. `Some(None)`: clear it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_picture: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gif_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
}

/// Events a client may send. Framed as `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    Join(String),
    UpdateProfile(ProfileUpdate),
    Message(NewMessage),
    EditMessage { message_id: String, new_text: String },
    DeleteMessage(String),
    TogglePinMessage(String),
    Typing(bool),
    StartScreenShare,
    StopScreenShare,
    WebrtcOffer { offer: Value, target_id: String },
    WebrtcAnswer { answer: Value, target_id: String },
    WebrtcIceCandidate { candidate: Value, target_id: String },
    CallInitiate { target_user_id: String, is_video_call: bool },
    CallAnswer { caller_id: String, is_video_call: bool },
    CallReject { caller_id: String },
    CallEnd(Option<CallTarget>),
    CallOffer { offer: Value, target_id: String },
    CallAnswerSdp { answer: Value, target_id: String },
    CallIceCandidate { candidate: Value, target_id: String },
    ExcalidrawUpdate(Value),
}

impl ClientEvent {
    pub fn from_frame(text: &str) -> Result<Self, FrameError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    Init {
        messages: Vec<ChatMessage>,
        users: Vec<User>,
        excalidraw_state: Value,
    },
    UserJoined(User),
    UserLeft { id: String, username: String },
    ProfileUpdated(User),
    Message(ChatMessage),
    MessageEdited { message_id: String, new_text: String },
    MessageDeleted(String),
    MessagePinToggled { message_id: String, is_pinned: bool },
    Typing(Vec<String>),
    ScreenShareStarted { user_id: String, username: String },
    ScreenShareStopped(String),
    WebrtcOffer { offer: Value, sender_id: String },
    WebrtcAnswer { answer: Value, sender_id: String },
    WebrtcIceCandidate { candidate: Value, sender_id: String },
    CallIncoming { user_id: String, username: String, is_video_call: bool },
    CallAccepted { user_id: String, is_video_call: bool },
    CallRejected { user_id: String },
    CallEnded { user_id: String },
    CallOffer { offer: Value, sender_id: String },
    CallAnswerSdp { answer: Value, sender_id: String },
    CallIceCandidate { candidate: Value, sender_id: String },
    ExcalidrawUpdate(Value),
}

impl ServerEvent {
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

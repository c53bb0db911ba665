use serde::{Deserialize, Serialize};
use std::fmt;

/// Path of the chat socket on the page's host.
pub const CHAT_PATH: &str = "/chat";

pub const CHAT_WINDOW_ID: &str = "chat-window";
pub const INPUT_FORM_ID: &str = "input-form";
pub const NICK_FIELD: &str = "nick";
pub const MESSAGE_FIELD: &str = "msg";

/// One chat line as it travels over the socket: `{"nick": ..., "message": ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatMessage {
    pub nick: String,
    pub message: String,
}

impl ChatMessage {
    pub fn new(nick: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            message: message.into(),
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Both fields are required. Anything else is a malformed frame.
    pub fn from_frame(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Empty messages never go on the wire. No trimming: `" "` is sendable.
    pub fn is_sendable(&self) -> bool {
        !self.message.is_empty()
    }

    /// Renders the panel line for this message.
    ///
    /// Nick and message are interpolated as-is, so markup inside either one is
    /// interpreted by the panel. Callers rendering untrusted peers get whatever
    /// HTML those peers send.
    pub fn render_html(&self) -> String {
        format!("<p><b>{}</b>: {}</p>", self.nick, self.message)
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.nick, self.message)
    }
}

/// Socket URL for a page served from `host`. The scheme is always `wss`,
/// even when the page itself came over plain http.
pub fn chat_url(host: &str) -> String {
    format!("wss://{}{}", host, CHAT_PATH)
}

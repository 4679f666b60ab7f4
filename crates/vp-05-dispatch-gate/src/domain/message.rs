//! # Outbound Messages
//!
//! What the front end hands to the gate: who sends, to whom, and the
//! decoded text when there is one.

use shared_types::PhoneNumber;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Sender identifier (`from`), used to route to an agent.
    pub sender: String,
    pub recipients: Vec<PhoneNumber>,
    /// `None` when the body was missing or could not be decoded.
    pub text: Option<String>,
    /// The caller supplied its own UDH: the text is one transport unit and
    /// is never split again.
    pub caller_segmented: bool,
}

impl OutboundMessage {
    pub fn new(sender: impl Into<String>, recipients: Vec<PhoneNumber>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            recipients,
            text: Some(text.into()),
            caller_segmented: false,
        }
    }

    /// Message whose body is unusable.
    pub fn without_text(sender: impl Into<String>, recipients: Vec<PhoneNumber>) -> Self {
        Self {
            sender: sender.into(),
            recipients,
            text: None,
            caller_segmented: false,
        }
    }

    pub fn caller_segmented(mut self, segmented: bool) -> Self {
        self.caller_segmented = segmented;
        self
    }

    /// Text worth hashing: present and not empty.
    pub fn hashable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// What the SMS gateway answered for one forwarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl GatewayReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

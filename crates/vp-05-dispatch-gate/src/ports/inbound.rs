//! # Inbound Port

use async_trait::async_trait;

use crate::domain::message::OutboundMessage;
use crate::domain::outcome::DispatchReport;
use crate::ports::outbound::PartForwarder;

#[async_trait]
pub trait MessageDispatch: Send + Sync {
    /// Run the full gate for one inbound message. `forwarder` is used only
    /// when the gate segments the message itself.
    async fn dispatch<F: PartForwarder>(&self, message: &OutboundMessage, forwarder: &F) -> DispatchReport;
}

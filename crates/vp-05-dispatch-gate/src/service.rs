//! # Dispatch Gate Service
//!
//! Decides, per inbound message, whether it may reach the SMS gateway and
//! registers its verification hashes on the way:
//!
//! 1. Resolve the sender to an agent. None found: fallback policy.
//! 2. No usable text: fallback policy (agent override first).
//! 3. Hash the whole message for every recipient with a registered key and
//!    store the hashes. Failure: fallback policy.
//! 4. When the gate has to segment, hash, store and forward each part in
//!    order, stopping at the first part that cannot go out. A failed store
//!    under fallback marks the message unverified; every remaining part is
//!    still hashed while the keys are usable.

use std::collections::HashMap;

use async_trait::async_trait;
use proxy_telemetry::{metric_inc, DISPATCH_OUTCOMES, HASH_SUBMISSIONS, PARTS_FORWARDED};
use shared_types::{Agent, PhoneNumber};
use tracing::{debug, info, warn};
use vp_01_text_hashing::{HashingError, KeyRole, VerificationHashGenerator};
use vp_02_segmentation::{MessagePart, MessageSegmenter};
use zeroize::Zeroizing;

use crate::domain::errors::DispatchError;
use crate::domain::message::OutboundMessage;
use crate::domain::outcome::{DispatchReport, DispatchState, PartFailure};
use crate::domain::policy::GateConfig;
use crate::ports::inbound::MessageDispatch;
use crate::ports::outbound::{AgentDirectory, PartForwarder, VerificationBackend};

/// Key material for one message, fetched once and reused for its parts.
struct SigningContext<'a> {
    agent: &'a Agent,
    private_der: Zeroizing<Vec<u8>>,
    public_der: Option<Vec<u8>>,
    recipient_keys: HashMap<String, Vec<u8>>,
}

pub struct DispatchGate<D, B> {
    directory: D,
    backend: B,
    config: GateConfig,
    segmenter: MessageSegmenter,
    generator: VerificationHashGenerator,
}

impl<D: AgentDirectory, B: VerificationBackend> DispatchGate<D, B> {
    pub fn new(directory: D, backend: B, config: GateConfig) -> Self {
        Self {
            directory,
            backend,
            config,
            segmenter: MessageSegmenter::new(),
            generator: VerificationHashGenerator::new(),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn fallback(&self, agent: Option<&Agent>, reason: Option<DispatchError>) -> DispatchReport {
        if self.config.fallback.allows_unverified(agent) {
            DispatchReport::ForwardOriginal { verified: false }
        } else {
            DispatchReport::Suppressed { reason }
        }
    }

    async fn log_registered_key(&self, agent: &Agent) {
        let local = agent.vsms_keys.as_ref().map(|k| k.public.as_str());
        match self.backend.registered_agent_key(&agent.id).await {
            Ok(remote) => debug!(
                agent_id = %agent.id,
                backend_key = remote.as_deref().unwrap_or("<none>"),
                local_key = local.unwrap_or("<none>"),
                "agent key comparison"
            ),
            Err(e) => debug!(agent_id = %agent.id, error = %e, "could not fetch registered agent key"),
        }
    }

    async fn signing_context<'a>(
        &self,
        agent: &'a Agent,
        recipients: &[PhoneNumber],
    ) -> Result<SigningContext<'a>, DispatchError> {
        let keys = agent
            .keys()
            .map_err(|e| DispatchError::KeyFormat(e.to_string()))?;
        let private_der = keys
            .private_der()
            .map_err(|e| DispatchError::KeyFormat(e.to_string()))?;
        let recipient_keys = self.backend.recipient_keys(recipients).await?;
        Ok(SigningContext {
            agent,
            private_der,
            public_der: keys.public_der().ok(),
            recipient_keys,
        })
    }

    /// Hash `text` for every recipient with a usable key and store the
    /// hashes in one request.
    async fn submit(
        &self,
        context: &SigningContext<'_>,
        recipients: &[PhoneNumber],
        text: &str,
    ) -> Result<usize, DispatchError> {
        debug!(agent_id = %context.agent.id, state = ?DispatchState::Hashing, chars = text.chars().count());
        let mut hashes = Vec::with_capacity(recipients.len() * 2);
        let mut key_error = None;
        for recipient in recipients {
            let Some(device_key) = context.recipient_keys.get(recipient.as_str()) else {
                debug!(recipient = %recipient, "recipient has no registered key");
                continue;
            };
            match self.generator.hash_codes(&context.private_der, device_key, text) {
                Ok(digests) => hashes.extend(digests),
                Err(HashingError::KeyFormat {
                    role: KeyRole::RecipientPublic,
                    reason,
                }) => {
                    warn!(recipient = %recipient, reason = %reason, "unusable recipient key");
                    key_error = Some(DispatchError::KeyFormat(reason));
                }
                Err(e) => return Err(DispatchError::KeyFormat(e.to_string())),
            }
        }
        if hashes.is_empty() {
            return Err(key_error.unwrap_or(DispatchError::NoRecipientKey));
        }

        debug!(agent_id = %context.agent.id, state = ?DispatchState::Submitting, hashes = hashes.len());
        self.backend
            .store_hashes(&context.agent.id, &hashes, context.public_der.as_deref())
            .await?;
        Ok(hashes.len())
    }

    async fn submit_counted(
        &self,
        context: &SigningContext<'_>,
        recipients: &[PhoneNumber],
        text: &str,
    ) -> Result<usize, DispatchError> {
        let result = self.submit(context, recipients, text).await;
        let label = if result.is_ok() { "stored" } else { "failed" };
        metric_inc!(HASH_SUBMISSIONS, &[label]);
        result
    }

    /// Forward `parts` in order. With a signing context every part is hashed
    /// and stored before it goes out; a failed store under fallback leaves
    /// the message unverified but later parts are still attempted.
    async fn forward_parts<F: PartForwarder>(
        &self,
        agent: &Agent,
        context: Option<SigningContext<'_>>,
        mut verified: bool,
        recipients: &[PhoneNumber],
        parts: Vec<MessagePart>,
        forwarder: &F,
    ) -> DispatchReport {
        let total = parts.len();
        let mut last_reply = None;

        for part in &parts {
            if let Some(signing) = &context {
                if let Err(e) = self.submit_counted(signing, recipients, &part.text).await {
                    if !self.config.fallback.allows_unverified(Some(agent)) {
                        warn!(agent_id = %agent.id, ordinal = part.ordinal, error = %e, "part hash submission failed");
                        return DispatchReport::PartFailed {
                            ordinal: part.ordinal,
                            failure: PartFailure::Suppressed(e),
                        };
                    }
                    warn!(
                        agent_id = %agent.id,
                        ordinal = part.ordinal,
                        error = %e,
                        "part hash submission failed, sending part unverified"
                    );
                    verified = false;
                }
            }

            match forwarder.forward_part(part).await {
                Err(e) => {
                    warn!(agent_id = %agent.id, ordinal = part.ordinal, error = %e, "gateway unreachable");
                    return DispatchReport::PartFailed {
                        ordinal: part.ordinal,
                        failure: PartFailure::Transport(e),
                    };
                }
                Ok(reply) if !reply.is_success() => {
                    warn!(agent_id = %agent.id, ordinal = part.ordinal, status = reply.status, "gateway rejected part");
                    return DispatchReport::PartFailed {
                        ordinal: part.ordinal,
                        failure: PartFailure::Rejected(reply),
                    };
                }
                Ok(reply) => {
                    metric_inc!(PARTS_FORWARDED);
                    debug!(ordinal = part.ordinal, total, status = reply.status, "part forwarded");
                    last_reply = Some(reply);
                }
            }
        }

        let verified = verified && context.is_some();
        match last_reply {
            Some(reply) => DispatchReport::PartsForwarded {
                verified,
                parts: parts.len() as u8,
                reply,
            },
            None => DispatchReport::ForwardOriginal { verified },
        }
    }

    async fn run<F: PartForwarder>(&self, message: &OutboundMessage, forwarder: &F) -> DispatchReport {
        let sender = message.sender.as_str();
        debug!(sender, state = ?DispatchState::ResolvingAgent);

        let resolved = match self.directory.agent_for(sender).await {
            Ok(Some(agent)) => agent,
            Ok(None) => {
                debug!(sender, "no agent for sender");
                return self.fallback(None, None);
            }
            Err(e) => {
                warn!(sender, error = %e, "agent lookup failed");
                return self.fallback(None, Some(e));
            }
        };

        let agent: &Agent = &resolved;

        let Some(text) = message.hashable_text() else {
            warn!(agent_id = %agent.id, sender, "no usable message text");
            return self.fallback(Some(agent), None);
        };

        let parts = if message.caller_segmented || !self.segmenter.needs_split(text) {
            None
        } else {
            match self.segmenter.split(text) {
                Ok(parts) if parts.len() > 1 => Some(parts),
                Ok(_) => None,
                Err(e) => {
                    warn!(agent_id = %agent.id, error = %e, "message cannot be segmented");
                    return DispatchReport::Suppressed {
                        reason: Some(e.into()),
                    };
                }
            }
        };

        if self.config.debug_mode {
            self.log_registered_key(agent).await;
        }

        let allows_unverified = self.config.fallback.allows_unverified(Some(agent));
        let mut context = match self.signing_context(agent, &message.recipients).await {
            Ok(context) => Some(context),
            Err(e) if allows_unverified => {
                warn!(agent_id = %agent.id, error = %e, "no signing keys, sending unverified");
                None
            }
            Err(e) => {
                warn!(agent_id = %agent.id, error = %e, "no signing keys");
                return DispatchReport::Suppressed { reason: Some(e) };
            }
        };

        let mut verified = false;
        if let Some(signing) = &context {
            match self.submit_counted(signing, &message.recipients, text).await {
                Ok(_) => verified = true,
                Err(e) if allows_unverified => {
                    warn!(agent_id = %agent.id, error = %e, "hash submission failed, sending unverified");
                    // A backend failure leaves the keys usable: parts still
                    // carry their own hashes. Key problems would only repeat.
                    if !matches!(e, DispatchError::BackendSubmission(_)) {
                        context = None;
                    }
                }
                Err(e) => {
                    warn!(agent_id = %agent.id, error = %e, "hash submission failed");
                    return DispatchReport::Suppressed { reason: Some(e) };
                }
            }
        }

        match parts {
            None => DispatchReport::ForwardOriginal { verified },
            Some(parts) => {
                self.forward_parts(agent, context, verified, &message.recipients, parts, forwarder)
                    .await
            }
        }
    }
}

#[async_trait]
impl<D: AgentDirectory, B: VerificationBackend> MessageDispatch for DispatchGate<D, B> {
    async fn dispatch<F: PartForwarder>(&self, message: &OutboundMessage, forwarder: &F) -> DispatchReport {
        let report = self.run(message, forwarder).await;
        metric_inc!(DISPATCH_OUTCOMES, &[report.verdict()]);
        info!(
            sender = %message.sender,
            recipients = message.recipients.len(),
            verdict = report.verdict(),
            state = ?report.state(),
            "dispatch finished"
        );
        report
    }
}

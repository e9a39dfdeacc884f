use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    reply::Reply,
    updates::{default_dispatcher, EventContext, HandlerResult, UpdateDispatcher, UpdateEnvelope},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Everything that talks to the Bot API sits behind this trait; the runner
/// only sees envelopes and replies.
#[async_trait]
pub trait UpdateTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_update(&self) -> Result<Option<UpdateEnvelope>, TransportError>;
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopUpdateTransport;

#[async_trait]
impl UpdateTransport for NoopUpdateTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_update(&self) -> Result<Option<UpdateEnvelope>, TransportError> {
        Ok(None)
    }

    async fn send_reply(&self, _chat_id: i64, _reply: &Reply) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct LongPollRunner {
    transport: Arc<dyn UpdateTransport>,
    dispatcher: UpdateDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl Default for LongPollRunner {
    fn default() -> Self {
        Self {
            transport: Arc::new(NoopUpdateTransport),
            dispatcher: default_dispatcher(),
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl LongPollRunner {
    pub fn new(
        transport: Arc<dyn UpdateTransport>,
        dispatcher: UpdateDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "long-poll transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "long-poll retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening long-poll transport connection");
        self.transport.connect().await?;
        info!(attempt, "long-poll transport connected");

        loop {
            let Some(envelope) = self.transport.next_update().await? else {
                info!(attempt, "long-poll update stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };

            let correlation_id = format!("update-{}", envelope.update_id);
            debug!(
                update_id = envelope.update_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %correlation_id,
                "received telegram update"
            );

            let context = EventContext { correlation_id: correlation_id.clone() };
            match self.dispatcher.dispatch(&envelope, &context).await {
                Ok(HandlerResult::Responded(reply)) => {
                    self.deliver(&envelope, &reply, &correlation_id).await;
                }
                Ok(HandlerResult::Processed | HandlerResult::Ignored) => {}
                Err(error) => {
                    warn!(
                        update_id = envelope.update_id,
                        correlation_id = %correlation_id,
                        error = %error,
                        "update dispatch failed; continuing poll loop"
                    );
                }
            }
        }
    }

    /// Delivery is fire-and-forget: a failed send is logged and dropped, the
    /// poll loop keeps running.
    async fn deliver(&self, envelope: &UpdateEnvelope, reply: &Reply, correlation_id: &str) {
        let Some(chat_id) = envelope.event.chat_id() else {
            warn!(
                update_id = envelope.update_id,
                correlation_id = %correlation_id,
                "handler produced a reply for an event without a chat; dropping it"
            );
            return;
        };

        if let Err(error) = self.transport.send_reply(chat_id, reply).await {
            warn!(
                update_id = envelope.update_id,
                chat_id,
                correlation_id = %correlation_id,
                error = %error,
                "failed to deliver reply"
            );
        } else {
            debug!(
                update_id = envelope.update_id,
                chat_id,
                correlation_id = %correlation_id,
                "reply delivered"
            );
        }
    }
}

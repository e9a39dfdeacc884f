use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    commands::{
        normalize_dice_command, CommandParseError, CommandPayload, CommandRouteError,
        CommandRouter, D20CommandService, DiceCommandService,
    },
    reply::Reply,
};

/// One inbound Telegram update, classified for dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateEnvelope {
    pub update_id: i64,
    pub event: TelegramEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TelegramEvent {
    Command(CommandPayload),
    PlainMessage(PlainMessageEvent),
    Unsupported { kind: String },
}

impl TelegramEvent {
    pub fn event_type(&self) -> TelegramEventType {
        match self {
            Self::Command(_) => TelegramEventType::Command,
            Self::PlainMessage(_) => TelegramEventType::PlainMessage,
            Self::Unsupported { .. } => TelegramEventType::Unsupported,
        }
    }

    /// Chat the update came from; replies go back to the same chat.
    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Self::Command(payload) => Some(payload.chat_id),
            Self::PlainMessage(event) => Some(event.chat_id),
            Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TelegramEventType {
    Command,
    PlainMessage,
    Unsupported,
}

/// A text message that is not a `/command`. The bot leaves these alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlainMessageEvent {
    pub chat_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(Reply),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Route(#[from] CommandRouteError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> TelegramEventType;
    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct UpdateDispatcher {
    handlers: HashMap<TelegramEventType, Arc<dyn EventHandler>>,
}

impl UpdateDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &UpdateEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Dispatcher wired with the production command service over the built-in
/// phrase table. Bootstrap swaps in a service carrying the loaded overrides.
pub fn default_dispatcher() -> UpdateDispatcher {
    dispatcher_with_service(D20CommandService::default())
}

pub fn dispatcher_with_service<S>(service: S) -> UpdateDispatcher
where
    S: DiceCommandService + 'static,
{
    let mut dispatcher = UpdateDispatcher::new();
    dispatcher.register(CommandHandler::new(service));
    dispatcher
}

pub struct CommandHandler<S> {
    router: CommandRouter<S>,
}

impl<S> CommandHandler<S>
where
    S: DiceCommandService,
{
    pub fn new(service: S) -> Self {
        Self { router: CommandRouter::new(service) }
    }
}

#[async_trait]
impl<S> EventHandler for CommandHandler<S>
where
    S: DiceCommandService + 'static,
{
    fn event_type(&self) -> TelegramEventType {
        TelegramEventType::Command
    }

    async fn handle(
        &self,
        envelope: &UpdateEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let TelegramEvent::Command(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let normalized = normalize_dice_command(payload.clone())?;
        let reply = self.router.route(normalized).await?;
        Ok(HandlerResult::Responded(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        default_dispatcher, EventContext, HandlerResult, PlainMessageEvent, TelegramEvent,
        UpdateDispatcher, UpdateEnvelope,
    };
    use crate::commands::CommandPayload;

    fn command_envelope(text: &str) -> UpdateEnvelope {
        UpdateEnvelope {
            update_id: 1,
            event: TelegramEvent::Command(CommandPayload {
                text: text.to_owned(),
                chat_id: 100,
                user_id: 7,
                display_name: "Alice".to_owned(),
                request_id: "update-1".to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn dispatcher_routes_start_and_roll_commands() {
        let dispatcher = default_dispatcher();

        for text in ["/start", "/roll"] {
            let result = dispatcher
                .dispatch(&command_envelope(text), &EventContext::default())
                .await
                .expect("dispatch");
            assert!(matches!(result, HandlerResult::Responded(_)), "{text} should get a reply");
        }
    }

    #[tokio::test]
    async fn dispatcher_ignores_plain_messages_without_a_handler() {
        let dispatcher = default_dispatcher();
        let envelope = UpdateEnvelope {
            update_id: 2,
            event: TelegramEvent::PlainMessage(PlainMessageEvent {
                chat_id: 100,
                user_id: 7,
                display_name: "Alice".to_owned(),
                text: "random chat banter".to_owned(),
            }),
        };

        let result =
            dispatcher.dispatch(&envelope, &EventContext::default()).await.expect("dispatch");
        assert_eq!(result, HandlerResult::Ignored);
    }

    #[tokio::test]
    async fn dispatcher_returns_ignored_when_no_handler_registered() {
        let dispatcher = UpdateDispatcher::new();
        let result = dispatcher
            .dispatch(&command_envelope("/roll"), &EventContext::default())
            .await
            .expect("dispatch");
        assert_eq!(result, HandlerResult::Ignored);
    }

    #[test]
    fn default_dispatcher_registers_the_command_handler() {
        assert_eq!(default_dispatcher().handler_count(), 1);
    }

    #[test]
    fn chat_id_is_exposed_for_replyable_events() {
        assert_eq!(command_envelope("/roll").event.chat_id(), Some(100));
        let unsupported = TelegramEvent::Unsupported { kind: "edited_message".to_owned() };
        assert_eq!(unsupported.chat_id(), None);
    }
}

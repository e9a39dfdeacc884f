use async_trait::async_trait;
use thiserror::Error;

use critbot_core::phrases::PhraseResolver;
use critbot_core::roll::roll_d20;

use crate::reply::{self, Reply};

/// Raw inbound command message, as delivered by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandPayload {
    /// Full message text, e.g. `/roll` or `/roll@CritBot 2d6`.
    pub text: String,
    pub chat_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub request_id: String,
}

/// A command payload normalized for routing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEnvelope {
    pub verb: String,
    /// `@BotName` suffix Telegram appends to commands in group chats.
    pub bot_mention: Option<String>,
    pub freeform_args: String,
    pub chat_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiceCommand {
    Start,
    Roll,
    Unknown { verb: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("message is not a bot command: {0}")]
    NotACommand(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandRouteError {
    #[error("command service failed: {0}")]
    Service(String),
}

/// Splits `/verb@BotName args` into its envelope parts. Telegram commands
/// always start with `/`; anything else is ordinary chat noise.
pub fn normalize_dice_command(
    payload: CommandPayload,
) -> Result<CommandEnvelope, CommandParseError> {
    let text = payload.text.trim();
    let Some(command_text) = text.strip_prefix('/') else {
        return Err(CommandParseError::NotACommand(payload.text));
    };

    let mut parts = command_text.split_whitespace();
    let head = parts.next().unwrap_or_default();
    let freeform_args = parts.collect::<Vec<_>>().join(" ");

    let (verb, bot_mention) = match head.split_once('@') {
        Some((verb, mention)) if !mention.is_empty() => (verb, Some(mention.to_owned())),
        Some((verb, _)) => (verb, None),
        None => (head, None),
    };

    Ok(CommandEnvelope {
        verb: verb.to_ascii_lowercase(),
        bot_mention,
        freeform_args,
        chat_id: payload.chat_id,
        user_id: payload.user_id,
        display_name: payload.display_name,
        request_id: payload.request_id,
    })
}

pub fn classify_dice_command(verb: &str) -> DiceCommand {
    match verb {
        "start" => DiceCommand::Start,
        "roll" => DiceCommand::Roll,
        _ => DiceCommand::Unknown { verb: verb.to_owned() },
    }
}

pub struct CommandRouter<S> {
    service: S,
}

impl<S> CommandRouter<S>
where
    S: DiceCommandService,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn route(&self, envelope: CommandEnvelope) -> Result<Reply, CommandRouteError> {
        match classify_dice_command(&envelope.verb) {
            DiceCommand::Start => self.service.greet(&envelope).await,
            DiceCommand::Roll => self.service.roll(&envelope).await,
            DiceCommand::Unknown { verb } => Ok(reply::unknown_command_reply(&verb)),
        }
    }
}

#[async_trait]
pub trait DiceCommandService: Send + Sync {
    async fn greet(&self, envelope: &CommandEnvelope) -> Result<Reply, CommandRouteError>;

    async fn roll(&self, envelope: &CommandEnvelope) -> Result<Reply, CommandRouteError>;
}

/// The production command service: rolls the die and resolves the phrase
/// against the override table injected at bootstrap.
#[derive(Clone, Debug, Default)]
pub struct D20CommandService {
    resolver: PhraseResolver,
}

impl D20CommandService {
    pub fn new(resolver: PhraseResolver) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl DiceCommandService for D20CommandService {
    async fn greet(&self, _envelope: &CommandEnvelope) -> Result<Reply, CommandRouteError> {
        Ok(reply::greeting_reply())
    }

    async fn roll(&self, envelope: &CommandEnvelope) -> Result<Reply, CommandRouteError> {
        let result = roll_d20();
        let phrase = self.resolver.resolve(result);
        Ok(reply::roll_reply(&envelope.display_name, result, &phrase))
    }
}

//! Telegram integration - long-polling bot interface
//!
//! This crate provides the Telegram interface for critbot:
//! - **Commands** (`commands`) - `/start` and `/roll` parsing and routing
//! - **Updates** (`updates`) - inbound update envelopes and event dispatch
//! - **Poller** (`poller`) - transport trait and long-poll loop with reconnection logic
//! - **Replies** (`reply`) - outbound message templates (Telegram Markdown subset)
//! - **Bot API** (`api`) - `getUpdates`/`sendMessage` transport over HTTPS
//!
//! # Getting Started
//!
//! 1. Create a bot with @BotFather and copy the token
//! 2. Set `CRITBOT_BOT_TOKEN` (or `BOT_TOKEN`)
//! 3. Run `critbot-server`; send `/roll` to the bot
//!
//! # Architecture
//!
//! ```text
//! Telegram Updates → UpdateDispatcher → CommandRouter → DiceCommandService
//!                         ↓
//!                  Reply → UpdateTransport::send_reply
//! ```
//!
//! # Key Types
//!
//! - `LongPollRunner` - poll loop with reconnection logic
//! - `UpdateDispatcher` - routes updates to the appropriate handler
//! - `DiceCommandService` - trait for the `/start` and `/roll` handlers
//! - `BotApiTransport` - production transport over the Telegram Bot API

pub mod api;
pub mod commands;
pub mod poller;
pub mod reply;
pub mod updates;

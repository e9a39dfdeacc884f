use serde::Serialize;

/// Parse modes the Bot API accepts for outbound text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "Markdown")]
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

/// One outbound text reply. The only delivery unit this bot produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), parse_mode: None }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self { text: text.into(), parse_mode: Some(ParseMode::Markdown) }
    }
}

pub fn greeting_reply() -> Reply {
    Reply::plain("Hi! I'm a d20 die. Send /roll to make a throw.")
}

/// The roll reply: display name, bold numeric result, resolved phrase.
pub fn roll_reply(display_name: &str, result: i64, phrase: &str) -> Reply {
    let name = escape_markdown(display_name);
    Reply::markdown(format!("{name}, you rolled: *{result}*\n{phrase}"))
}

pub fn unknown_command_reply(verb: &str) -> Reply {
    Reply::plain(format!("I don't know /{verb}. Try /roll, or /start for a hello."))
}

/// Escapes the characters the legacy Markdown parse mode treats as markup.
/// User display names pass through here so a name like `_sneaky_` cannot
/// break the reply entity parsing.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{greeting_reply, roll_reply, unknown_command_reply, ParseMode, Reply};

    #[test]
    fn roll_reply_bolds_the_result_and_keeps_the_phrase() {
        let reply = roll_reply("Alice", 17, "🌟 Excellent! Just short of a crit.");
        assert_eq!(reply.parse_mode, Some(ParseMode::Markdown));
        assert!(reply.text.contains("*17*"));
        assert!(reply.text.starts_with("Alice, you rolled:"));
        assert!(reply.text.ends_with("🌟 Excellent! Just short of a crit."));
    }

    #[test]
    fn roll_reply_escapes_markup_in_display_names() {
        let reply = roll_reply("_sneaky_ [name]*", 4, "phrase");
        assert!(reply.text.starts_with("\\_sneaky\\_ \\[name]\\*"));
    }

    #[test]
    fn greeting_is_plain_text() {
        let reply = greeting_reply();
        assert_eq!(reply.parse_mode, None);
        assert!(reply.text.contains("/roll"));
    }

    #[test]
    fn unknown_command_reply_names_the_verb() {
        let reply = unknown_command_reply("dance");
        assert!(reply.text.contains("/dance"));
    }

    #[test]
    fn parse_mode_serializes_to_bot_api_values() {
        let markdown = serde_json::to_string(&ParseMode::Markdown).expect("serialize");
        let html = serde_json::to_string(&ParseMode::Html).expect("serialize");
        assert_eq!(markdown, "\"Markdown\"");
        assert_eq!(html, "\"HTML\"");
    }

    #[test]
    fn plain_reply_omits_parse_mode_on_the_wire() {
        let reply = Reply::plain("hello");
        let wire = serde_json::to_string(&reply).expect("serialize");
        assert!(!wire.contains("parse_mode"));
    }
}

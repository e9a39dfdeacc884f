use std::path::Path;

use critbot_core::phrases::{PhraseOverrides, PhraseResolver};

use super::CommandResult;

pub fn run(value: i64, phrases: Option<&Path>) -> CommandResult {
    let overrides = match phrases {
        Some(path) => PhraseOverrides::load_or_default(path),
        None => PhraseOverrides::new(),
    };
    let resolver = PhraseResolver::new(overrides);

    CommandResult { exit_code: 0, output: format!("roll {value}: {}", resolver.resolve(value)) }
}

use std::path::Path;

use critbot_core::phrases::{PhraseOverrides, PhraseResolver};
use critbot_core::roll::roll_d20_with;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::CommandResult;

pub fn run(count: u32, seed: Option<u64>, phrases: Option<&Path>) -> CommandResult {
    let overrides = match phrases {
        Some(path) => PhraseOverrides::load_or_default(path),
        None => PhraseOverrides::new(),
    };
    let resolver = PhraseResolver::new(overrides);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut lines = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let result = roll_d20_with(&mut rng);
        lines.push(format!("roll {result:>2}: {}", resolver.resolve(result)));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

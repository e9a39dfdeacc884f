//! Phrase table loading and roll-result phrase resolution.
//!
//! Resolution is a two-tier lookup: an override table loaded once at startup
//! from a TOML file, then a fixed built-in table keyed by roll-result range.
//! Override loading is never fatal; every failure path degrades to the
//! built-in table with a logged warning.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

const CRIT_FAILURE_PHRASE: &str = "💥 Critical failure! Nothing went to plan.";
const CRIT_SUCCESS_PHRASE: &str = "🎉 Crit! You exceeded every expectation!";
const POOR_PHRASE: &str = "😕 Poor. The result leaves much to be desired.";
const MEDIOCRE_PHRASE: &str = "🤔 So-so. Could be worse, but not good either.";
const GOOD_PHRASE: &str = "👍 Not bad. A respectable result.";
const NEAR_CRIT_PHRASE: &str = "🌟 Excellent! Just short of a crit.";

#[derive(Debug, Error)]
pub enum PhraseLoadError {
    #[error("phrase file `{path}` was not found")]
    Missing { path: PathBuf },
    #[error("could not read phrase file `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse phrase file `{path}`: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("phrase file `{path}` has a non-integer key `{key}`")]
    InvalidKey { path: PathBuf, key: String },
}

/// Externally supplied phrase mapping, keyed by roll value.
///
/// Constructed once at startup and read-only afterward, so it can be shared
/// across concurrent handlers without synchronization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhraseOverrides {
    entries: BTreeMap<i64, String>,
}

impl PhraseOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i64, String)>,
    {
        Self { entries: entries.into_iter().collect() }
    }

    /// Reads a TOML table of stringified-integer keys to phrase strings.
    ///
    /// Keys outside 1..=20 are loaded but never hit by in-range rolls; a
    /// non-integer key rejects the whole file.
    pub fn load(path: &Path) -> Result<Self, PhraseLoadError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(PhraseLoadError::Missing { path: path.to_path_buf() });
            }
            Err(source) => {
                return Err(PhraseLoadError::Read { path: path.to_path_buf(), source });
            }
        };

        let table: BTreeMap<String, String> = toml::from_str(&raw)
            .map_err(|source| PhraseLoadError::Parse { path: path.to_path_buf(), source })?;

        let mut entries = BTreeMap::new();
        for (key, phrase) in table {
            let roll = key.trim().parse::<i64>().map_err(|_| PhraseLoadError::InvalidKey {
                path: path.to_path_buf(),
                key: key.clone(),
            })?;
            entries.insert(roll, phrase);
        }

        Ok(Self { entries })
    }

    /// Loads the override table, absorbing every failure into the empty table
    /// with a logged warning. The process stays fully functional on the
    /// built-in phrases.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(overrides) => overrides,
            Err(error @ PhraseLoadError::Missing { .. }) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "phrase override file missing; using built-in phrases"
                );
                Self::default()
            }
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "phrase override file unusable; using built-in phrases"
                );
                Self::default()
            }
        }
    }

    pub fn get(&self, roll: i64) -> Option<&str> {
        self.entries.get(&roll).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves a roll result to its flavor phrase.
///
/// The override table is injected at construction; `resolve` is a pure
/// function of its input and that table.
#[derive(Clone, Debug, Default)]
pub struct PhraseResolver {
    overrides: PhraseOverrides,
}

impl PhraseResolver {
    pub fn new(overrides: PhraseOverrides) -> Self {
        Self { overrides }
    }

    /// Total over all integers; always returns a non-empty string.
    ///
    /// An override whose value is empty or whitespace-only counts as absent
    /// and falls through to the built-in table.
    pub fn resolve(&self, roll: i64) -> String {
        if let Some(phrase) = self.overrides.get(roll) {
            if !phrase.trim().is_empty() {
                return phrase.to_owned();
            }
        }
        default_phrase(roll)
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

/// The built-in phrase table, keyed by roll-result range. Values outside
/// 1..=20 echo the literal number back.
pub fn default_phrase(roll: i64) -> String {
    match roll {
        1 => CRIT_FAILURE_PHRASE.to_owned(),
        20 => CRIT_SUCCESS_PHRASE.to_owned(),
        2..=5 => POOR_PHRASE.to_owned(),
        6..=10 => MEDIOCRE_PHRASE.to_owned(),
        11..=15 => GOOD_PHRASE.to_owned(),
        16..=19 => NEAR_CRIT_PHRASE.to_owned(),
        other => format!("Rolled {other}. You decide."),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;

    use tempfile::TempDir;

    use super::{default_phrase, PhraseLoadError, PhraseOverrides, PhraseResolver};

    #[test]
    fn resolve_is_non_empty_for_every_in_range_roll() {
        let resolver = PhraseResolver::default();
        for roll in 1..=20 {
            assert!(!resolver.resolve(roll).is_empty(), "roll {roll} resolved to empty phrase");
        }
    }

    #[test]
    fn out_of_range_rolls_echo_the_literal_value() {
        let resolver = PhraseResolver::default();
        for roll in [0, -3, 21, 42, i64::MAX] {
            let phrase = resolver.resolve(roll);
            assert!(
                phrase.contains(&roll.to_string()),
                "phrase `{phrase}` should echo the value {roll}"
            );
        }
        assert_eq!(resolver.resolve(42), "Rolled 42. You decide.");
    }

    #[test]
    fn override_wins_over_default_regardless_of_range_class() {
        let resolver = PhraseResolver::new(PhraseOverrides::from_entries([
            (1, "Ouch".to_owned()),
            (20, "Glorious".to_owned()),
            (7, "Meh".to_owned()),
        ]));

        assert_eq!(resolver.resolve(1), "Ouch");
        assert_eq!(resolver.resolve(20), "Glorious");
        assert_eq!(resolver.resolve(7), "Meh");
        // untouched keys still come from the built-in table
        assert_eq!(resolver.resolve(2), default_phrase(2));
    }

    #[test]
    fn empty_override_table_reproduces_the_default_classification() {
        let resolver = PhraseResolver::new(PhraseOverrides::new());
        for roll in 1..=20 {
            assert_eq!(resolver.resolve(roll), default_phrase(roll));
        }
    }

    #[test]
    fn blank_override_value_counts_as_absent() {
        let resolver = PhraseResolver::new(PhraseOverrides::from_entries([
            (3, String::new()),
            (4, "   ".to_owned()),
        ]));

        assert_eq!(resolver.resolve(3), default_phrase(3));
        assert_eq!(resolver.resolve(4), default_phrase(4));
    }

    #[test]
    fn default_table_covers_all_six_range_branches() {
        assert_eq!(default_phrase(1), super::CRIT_FAILURE_PHRASE);
        assert_eq!(default_phrase(20), super::CRIT_SUCCESS_PHRASE);
        for roll in 2..=5 {
            assert_eq!(default_phrase(roll), super::POOR_PHRASE);
        }
        for roll in 6..=10 {
            assert_eq!(default_phrase(roll), super::MEDIOCRE_PHRASE);
        }
        for roll in 11..=15 {
            assert_eq!(default_phrase(roll), super::GOOD_PHRASE);
        }
        for roll in 16..=19 {
            assert_eq!(default_phrase(roll), super::NEAR_CRIT_PHRASE);
        }
    }

    #[test]
    fn load_reads_a_valid_toml_table() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("phrases.toml");
        fs::write(
            &path,
            r#"
"1" = "Ouch"
"20" = "Glorious"
"99" = "unreachable but permitted"
"#,
        )
        .map_err(|err| err.to_string())?;

        let overrides =
            PhraseOverrides::load(&path).map_err(|err| format!("load failed: {err}"))?;
        assert_eq!(overrides.len(), 3);
        assert_eq!(overrides.get(1), Some("Ouch"));
        assert_eq!(overrides.get(20), Some("Glorious"));
        assert_eq!(overrides.get(99), Some("unreachable but permitted"));
        assert_eq!(overrides.get(2), None);
        Ok(())
    }

    #[test]
    fn missing_file_is_a_missing_error_and_absorbed_by_load_or_default() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("nope.toml");

        let error = PhraseOverrides::load(&path).expect_err("load should fail");
        assert!(matches!(error, PhraseLoadError::Missing { .. }));

        let overrides = PhraseOverrides::load_or_default(&path);
        assert!(overrides.is_empty());
    }

    #[test]
    fn malformed_toml_is_a_parse_error_and_absorbed_by_load_or_default() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("phrases.toml");
        fs::write(&path, "not [valid toml").expect("write fixture");

        let error = PhraseOverrides::load(&path).expect_err("load should fail");
        assert!(matches!(error, PhraseLoadError::Parse { .. }));

        let overrides = PhraseOverrides::load_or_default(&path);
        assert!(overrides.is_empty());
    }

    #[test]
    fn non_integer_key_rejects_the_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("phrases.toml");
        fs::write(&path, "\"natural\" = \"nope\"").expect("write fixture");

        let error = PhraseOverrides::load(&path).expect_err("load should fail");
        assert!(matches!(error, PhraseLoadError::InvalidKey { ref key, .. } if key == "natural"));
        assert!(PhraseOverrides::load_or_default(&path).is_empty());
    }

    #[test]
    fn end_to_end_override_scenario() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("phrases.toml");
        fs::write(&path, "\"1\" = \"Ouch\"").expect("write fixture");

        let resolver = PhraseResolver::new(PhraseOverrides::load_or_default(&path));
        assert_eq!(resolver.resolve(1), "Ouch");
        assert_eq!(resolver.resolve(2), default_phrase(2));
        assert_eq!(resolver.resolve(20), default_phrase(20));
        assert_eq!(resolver.resolve(42), "Rolled 42. You decide.");
    }
}

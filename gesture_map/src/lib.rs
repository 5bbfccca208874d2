//! # gesture_map
//!
//! The association between a raised-finger count and the shell command it
//! launches, plus the JSON configuration loader behind it.
//!
//! A config file is a flat JSON object keyed by the digit strings `"0"`
//! through `"5"`:
//!
//! ```json
//! {
//!     "1": "nautilus",
//!     "2": "firefox",
//!     "5": "thunderbird"
//! }
//! ```
//!
//! Keys are converted to typed [`FingerCount`]s when the file is read; a
//! key outside `0..=5` (or a non-string value) rejects the whole file, so
//! a map is always either exactly what the file says or exactly one of
//! the built-in defaults — never a partial mixture.
//!
//! Loading is two-tier recoverable (see [`GestureMap::load`]):
//!
//! * unreadable file → the full default table,
//! * malformed file → a minimal default table.
//!
//! Command strings are handed to the launcher verbatim and run through a
//! shell, so metacharacters in the config are live.  The file is trusted
//! input; nothing here sanitizes it.

use std::collections::BTreeMap;
use std::path::Path;

use hand_pose::FingerCount;
use thiserror::Error;
use tracing::{info, warn};

// ════════════════════════════════════════════════════════════════════════════
// ConfigError
// ════════════════════════════════════════════════════════════════════════════

/// Why a gesture config file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read at all.
    #[error("cannot read gesture config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a JSON object of string-to-string entries.
    #[error("malformed gesture config: {0}")]
    Json(#[from] serde_json::Error),

    /// A key is not one of the digit strings "0" through "5".
    #[error("gesture key {0:?} is not a finger count 0-5")]
    InvalidKey(String),
}

// ════════════════════════════════════════════════════════════════════════════
// ConfigSource
// ════════════════════════════════════════════════════════════════════════════

/// Where a loaded [`GestureMap`] actually came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from the config file.
    File,
    /// File missing/unreadable — full built-in table substituted.
    FullDefaults,
    /// File malformed — minimal built-in table substituted.
    MinimalDefaults,
}

impl ConfigSource {
    pub fn label(self) -> &'static str {
        match self {
            ConfigSource::File => "config file",
            ConfigSource::FullDefaults => "built-in defaults (file missing)",
            ConfigSource::MinimalDefaults => "built-in minimal defaults (file malformed)",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureMap
// ════════════════════════════════════════════════════════════════════════════

/// Immutable finger-count → command table, ordered by count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GestureMap {
    commands: BTreeMap<FingerCount, String>,
}

impl GestureMap {
    /// The full fallback table used when no config file exists.
    ///
    /// The program names are deployment-specific placeholders (a common
    /// GNOME desktop), not part of any contract.
    pub fn default_full() -> Self {
        let mut map = GestureMap::default();
        map.insert(FingerCount::new(0).unwrap(), "gnome-terminal");
        map.insert(FingerCount::new(1).unwrap(), "nautilus");
        map.insert(FingerCount::new(2).unwrap(), "firefox");
        map.insert(FingerCount::new(3).unwrap(), "code");
        map.insert(FingerCount::new(4).unwrap(), "gedit");
        map.insert(FingerCount::new(5).unwrap(), "thunderbird");
        map
    }

    /// The smaller fallback table used when a config file exists but
    /// cannot be parsed.
    pub fn default_minimal() -> Self {
        let mut map = GestureMap::default();
        map.insert(FingerCount::new(0).unwrap(), "gnome-terminal");
        map.insert(FingerCount::new(2).unwrap(), "firefox");
        map.insert(FingerCount::new(5).unwrap(), "thunderbird");
        map
    }

    pub fn insert(&mut self, count: FingerCount, command: &str) {
        self.commands.insert(count, command.to_string());
    }

    /// Command mapped to `count`, if any.
    pub fn command_for(&self, count: FingerCount) -> Option<&str> {
        self.commands.get(&count).map(String::as_str)
    }

    pub fn contains(&self, count: FingerCount) -> bool {
        self.commands.contains_key(&count)
    }

    /// Entries in ascending count order.
    pub fn iter(&self) -> impl Iterator<Item = (FingerCount, &str)> {
        self.commands.iter().map(|(c, s)| (*c, s.as_str()))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    // ── parsing ──────────────────────────────────────────────────────────

    /// Parse a config document.  All-or-nothing: the first bad key fails
    /// the whole document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(text)?;
        let mut map = GestureMap::default();
        for (key, command) in raw {
            let count = key
                .parse::<u8>()
                .ok()
                .and_then(FingerCount::new)
                .ok_or_else(|| ConfigError::InvalidKey(key.clone()))?;
            map.commands.insert(count, command);
        }
        Ok(map)
    }

    /// Read and parse `path`, surfacing the typed error.
    pub fn load_result(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    // ── loading with fallbacks ───────────────────────────────────────────

    /// Load `path`, substituting defaults on failure (never errors):
    ///
    /// * unreadable file → [`GestureMap::default_full`],
    /// * malformed contents → [`GestureMap::default_minimal`].
    pub fn load(path: &Path) -> Self {
        Self::load_with_source(path).0
    }

    /// Like [`GestureMap::load`], also reporting which table was used.
    pub fn load_with_source(path: &Path) -> (Self, ConfigSource) {
        match Self::load_result(path) {
            Ok(map) => {
                info!(path = %path.display(), entries = map.len(), "loaded gesture config");
                (map, ConfigSource::File)
            }
            Err(ConfigError::Io(e)) => {
                warn!(path = %path.display(), error = %e, "gesture config unreadable, using defaults");
                (Self::default_full(), ConfigSource::FullDefaults)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "gesture config malformed, using minimal defaults");
                (Self::default_minimal(), ConfigSource::MinimalDefaults)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn count(n: u8) -> FingerCount {
        FingerCount::new(n).unwrap()
    }

    // ── parsing ──────────────────────────────────────────────────────────

    #[test]
    fn parses_well_formed_config() {
        let map = GestureMap::from_json_str(r#"{"0": "echo A", "3": "echo B"}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.command_for(count(0)), Some("echo A"));
        assert_eq!(map.command_for(count(3)), Some("echo B"));
        assert_eq!(map.command_for(count(1)), None);
    }

    #[test]
    fn rejects_out_of_range_key() {
        let err = GestureMap::from_json_str(r#"{"6": "xterm"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(k) if k == "6"));
    }

    #[test]
    fn rejects_non_numeric_key() {
        let err = GestureMap::from_json_str(r#"{"fist": "xterm"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey(_)));
    }

    #[test]
    fn rejects_non_string_value() {
        assert!(matches!(
            GestureMap::from_json_str(r#"{"2": 17}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn rejects_non_object_document() {
        assert!(matches!(
            GestureMap::from_json_str(r#"["firefox"]"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn one_bad_key_rejects_the_whole_file() {
        // No partial acceptance: the good entry must not survive.
        let err = GestureMap::from_json_str(r#"{"2": "firefox", "9": "xterm"}"#);
        assert!(err.is_err());
    }

    // ── fallbacks ────────────────────────────────────────────────────────

    #[test]
    fn missing_file_yields_exact_full_defaults() {
        let (map, source) =
            GestureMap::load_with_source(Path::new("/no/such/gestures.json"));
        assert_eq!(source, ConfigSource::FullDefaults);
        assert_eq!(map, GestureMap::default_full());
        assert_eq!(map.len(), 6);
        assert_eq!(map.command_for(count(0)), Some("gnome-terminal"));
        assert_eq!(map.command_for(count(3)), Some("code"));
        assert_eq!(map.command_for(count(5)), Some("thunderbird"));
    }

    #[test]
    fn malformed_file_yields_exact_minimal_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let (map, source) = GestureMap::load_with_source(file.path());
        assert_eq!(source, ConfigSource::MinimalDefaults);
        assert_eq!(map, GestureMap::default_minimal());
        assert_eq!(map.len(), 3);
        assert_eq!(map.command_for(count(0)), Some("gnome-terminal"));
        assert_eq!(map.command_for(count(2)), Some("firefox"));
        assert_eq!(map.command_for(count(5)), Some("thunderbird"));
        assert_eq!(map.command_for(count(1)), None);
    }

    #[test]
    fn bad_key_in_valid_json_falls_back_to_minimal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"2": "firefox", "7": "xterm"}}"#).unwrap();

        let (map, source) = GestureMap::load_with_source(file.path());
        assert_eq!(source, ConfigSource::MinimalDefaults);
        assert_eq!(map, GestureMap::default_minimal());
    }

    #[test]
    fn valid_file_loads_as_is() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"4": "gimp"}}"#).unwrap();

        let (map, source) = GestureMap::load_with_source(file.path());
        assert_eq!(source, ConfigSource::File);
        assert_eq!(map.len(), 1);
        assert_eq!(map.command_for(count(4)), Some("gimp"));
    }

    // ── table shape ──────────────────────────────────────────────────────

    #[test]
    fn iteration_is_count_ordered() {
        let map = GestureMap::from_json_str(r#"{"5": "c", "0": "a", "2": "b"}"#).unwrap();
        let counts: Vec<u8> = map.iter().map(|(c, _)| c.get()).collect();
        assert_eq!(counts, [0, 2, 5]);
    }

    #[test]
    fn commands_pass_through_verbatim() {
        // Shell metacharacters are preserved, not sanitized.
        let map =
            GestureMap::from_json_str(r#"{"1": "notify-send hi && date > /tmp/t"}"#).unwrap();
        assert_eq!(
            map.command_for(count(1)),
            Some("notify-send hi && date > /tmp/t")
        );
    }
}

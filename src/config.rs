//! UCI-settable search configuration.

use crate::error::ConfigError;

const MAX_SEARCH_DEPTH_MIN: i64 = 2;
const MAX_SEARCH_DEPTH_MAX: i64 = 8;
const MAX_SEARCH_DEPTH_DEFAULT: u32 = 7;

/// The search parameters an operator can change at runtime via `setoption`.
#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    pub max_search_depth: u32,
    pub use_pruning: bool,
    pub use_incremental_search: bool,
    pub search_until_no_captures: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_search_depth: MAX_SEARCH_DEPTH_DEFAULT,
            use_pruning: true,
            use_incremental_search: true,
            search_until_no_captures: false,
        }
    }
}

impl SearchConfig {
    /// Lines describing each option in the UCI `option name ... type ...`
    /// format, emitted in response to the `uci` command.
    #[must_use]
    pub fn uci_option_lines() -> Vec<String> {
        vec![
            format!(
                "option name max_search_depth type spin default {} min {} max {}",
                MAX_SEARCH_DEPTH_DEFAULT, MAX_SEARCH_DEPTH_MIN, MAX_SEARCH_DEPTH_MAX
            ),
            "option name use_pruning type check default true".to_string(),
            "option name use_incremental_search type check default true".to_string(),
            "option name search_until_no_captures type check default false".to_string(),
        ]
    }

    /// Applies a single `setoption name <name> value <value>` pair.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        match name {
            "max_search_depth" => {
                let parsed: i64 = value.parse().map_err(|_| ConfigError::InvalidType {
                    name: name.to_string(),
                    value: value.to_string(),
                })?;
                if !(MAX_SEARCH_DEPTH_MIN..=MAX_SEARCH_DEPTH_MAX).contains(&parsed) {
                    return Err(ConfigError::OutOfRange {
                        name: name.to_string(),
                        value: parsed,
                        min: MAX_SEARCH_DEPTH_MIN,
                        max: MAX_SEARCH_DEPTH_MAX,
                    });
                }
                self.max_search_depth = parsed as u32;
            }
            "use_pruning" => self.use_pruning = parse_bool(name, value)?,
            "use_incremental_search" => self.use_incremental_search = parse_bool(name, value)?,
            "search_until_no_captures" => self.search_until_no_captures = parse_bool(name, value)?,
            _ => {
                return Err(ConfigError::UnknownOption {
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidType {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Splits a `setoption` command's argument tail into `(name, value)`,
/// handling the UCI convention that option names and values may each
/// contain internal spaces, delimited by the literal `name`/`value` tokens.
#[must_use]
pub fn parse_setoption(parts: &[&str]) -> Option<(String, String)> {
    let name_idx = parts.iter().position(|&p| p == "name")?;
    let value_idx = parts.iter().position(|&p| p == "value");

    match value_idx {
        Some(value_idx) if value_idx > name_idx => {
            let name = parts[name_idx + 1..value_idx].join(" ");
            let value = parts[value_idx + 1..].join(" ");
            Some((name, value))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_depth_seven_with_pruning_and_incremental_search_on() {
        let config = SearchConfig::default();
        assert_eq!(config.max_search_depth, 7);
        assert!(config.use_pruning);
        assert!(config.use_incremental_search);
        assert!(!config.search_until_no_captures);
    }

    #[test]
    fn rejects_out_of_range_depth() {
        let mut config = SearchConfig::default();
        assert!(config.set("max_search_depth", "20").is_err());
    }

    #[test]
    fn rejects_unknown_option() {
        let mut config = SearchConfig::default();
        assert!(matches!(config.set("multipv", "4"), Err(ConfigError::UnknownOption { .. })));
    }

    #[test]
    fn parses_setoption_tokens() {
        let parts: Vec<&str> = "name max_search_depth value 5".split_whitespace().collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        assert_eq!(name, "max_search_depth");
        assert_eq!(value, "5");
    }

    #[test]
    fn applies_parsed_setoption() {
        let mut config = SearchConfig::default();
        let parts: Vec<&str> = "name use_pruning value false".split_whitespace().collect();
        let (name, value) = parse_setoption(&parts).unwrap();
        config.set(&name, &value).unwrap();
        assert!(!config.use_pruning);
    }
}

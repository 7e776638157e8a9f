//! Regex rules on tool names

use crate::error::ConfigError;
use regex::Regex;

/// A compiled list of tool-name patterns
#[derive(Debug, Default)]
pub struct PatternMatcher {
    patterns: Vec<(String, Regex)>,
}

impl PatternMatcher {
    /// Compile `patterns`; `field` names the config key in error messages
    pub fn new(field: &str, patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .map(|regex| (pattern.clone(), regex))
                    .map_err(|e| ConfigError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: format!("in {}: {}", field, e),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, tool_name: &str) -> bool {
        self.find_match(tool_name).is_some()
    }

    /// Source text of the first pattern matching `tool_name`
    pub fn find_match(&self, tool_name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(tool_name))
            .map(|(source, _)| source.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

//! Attribute paths
//!
//! Dotted references into a user resource (`name.givenName`) and the fixed
//! allow-list of attributes that filters and selectors may address.

use crate::error::PathError;
use std::fmt;

/// Attributes that may appear in a filter expression or attribute selector.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "userName",
    "name",
    "name.familyName",
    "name.givenName",
    "roles",
    "roles.value",
    "roles.display",
    "roles.primary",
    "roles.type",
    "externalId",
    "active",
    "meta",
    "meta.resourceType",
    "meta.created",
    "meta.lastModified",
    "meta.location",
    "id",
    "schemas",
];

/// The allow-list sorted alphabetically, as reported in error messages
pub fn allowed_attributes_sorted() -> Vec<String> {
    let mut allowed: Vec<String> = ALLOWED_ATTRIBUTES.iter().map(|a| a.to_string()).collect();
    allowed.sort();
    allowed
}

/// An ordered, non-empty sequence of attribute name segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributePath {
    segments: Vec<String>,
}

impl AttributePath {
    /// Parse a dotted path such as `name.givenName`.
    ///
    /// Segments must be non-empty and may not contain whitespace. The path is
    /// not checked against the allow-list; see [`AttributePath::allowed`].
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<String> = text.split('.').map(str::to_string).collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || s.chars().any(char::is_whitespace))
        {
            return Err(PathError::Malformed(text.to_string()));
        }

        Ok(Self { segments })
    }

    /// Parse a path only if it names an allow-listed attribute
    pub fn allowed(text: &str) -> Option<Self> {
        if ALLOWED_ATTRIBUTES.contains(&text) {
            Self::parse(text).ok()
        } else {
            None
        }
    }

    /// All segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The top-level attribute name
    pub fn root(&self) -> &str {
        // non-empty by construction
        &self.segments[0]
    }

    /// The sub-attribute name for two-segment paths (`name.givenName` -> `givenName`)
    pub fn child(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [_, child] => Some(child.as_str()),
            _ => None,
        }
    }

    /// Compare against a dotted literal without allocating
    pub fn is(&self, dotted: &str) -> bool {
        let mut parts = dotted.split('.');
        self.segments
            .iter()
            .all(|segment| parts.next() == Some(segment.as_str()))
            && parts.next().is_none()
    }

    /// Whether the path is part of the filter/selector allow-list
    pub fn is_allowed(&self) -> bool {
        ALLOWED_ATTRIBUTES.iter().any(|allowed| self.is(allowed))
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested() {
        let path = AttributePath::parse("name.givenName").unwrap();
        assert_eq!(path.segments(), ["name", "givenName"]);
        assert_eq!(path.root(), "name");
        assert_eq!(path.child(), Some("givenName"));
        assert_eq!(AttributePath::parse("userName").unwrap().child(), None);
        assert_eq!(path.to_string(), "name.givenName");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(AttributePath::parse("   "), Err(PathError::Empty));
        assert!(matches!(
            AttributePath::parse("name..givenName"),
            Err(PathError::Malformed(_))
        ));
        assert!(matches!(
            AttributePath::parse(".name"),
            Err(PathError::Malformed(_))
        ));
        assert!(matches!(
            AttributePath::parse("name.given Name"),
            Err(PathError::Malformed(_))
        ));
    }

    #[test]
    fn test_allow_list() {
        for attribute in ALLOWED_ATTRIBUTES {
            let path = AttributePath::allowed(attribute).unwrap();
            assert!(path.is_allowed());
        }
        assert!(AttributePath::allowed("password").is_none());
        assert!(AttributePath::allowed("name.middleName").is_none());
        assert!(!AttributePath::parse("displayName").unwrap().is_allowed());
    }

    #[test]
    fn test_is_matches_whole_path() {
        let path = AttributePath::parse("roles.value").unwrap();
        assert!(path.is("roles.value"));
        assert!(!path.is("roles"));
        assert!(!path.is("roles.value.extra"));
    }

    #[test]
    fn test_sorted_allow_list() {
        let sorted = allowed_attributes_sorted();
        assert_eq!(sorted.len(), ALLOWED_ATTRIBUTES.len());
        assert_eq!(sorted.first().map(String::as_str), Some("active"));
    }
}

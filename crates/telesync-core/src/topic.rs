//! MQTT-style topic filters.
//!
//! Subscription patterns may use `+` for exactly one segment and a trailing
//! `#` for any suffix. Stored state keys are always concrete topics;
//! wildcards are legal only in subscription requests.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Single,
    Rest,
}

/// A parsed subscription pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    pattern: String,
    segments: Vec<Segment>,
}

impl TopicFilter {
    /// Parse a subscription pattern.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty, uses `#` anywhere but the
    /// final segment, or embeds a wildcard character inside a segment.
    pub fn parse(pattern: &str) -> Result<Self, FilterError> {
        if pattern.is_empty() {
            return Err(FilterError::Empty);
        }

        let raw_segments: Vec<&str> = pattern.split('/').collect();
        let last = raw_segments.len() - 1;
        let mut segments = Vec::with_capacity(raw_segments.len());

        for (index, raw) in raw_segments.iter().enumerate() {
            let segment = match *raw {
                "+" => Segment::Single,
                "#" => {
                    if index != last {
                        return Err(FilterError::RestNotLast(pattern.to_string()));
                    }
                    Segment::Rest
                }
                literal => {
                    if literal.contains('+') || literal.contains('#') {
                        return Err(FilterError::EmbeddedWildcard(pattern.to_string()));
                    }
                    Segment::Literal(literal.to_string())
                }
            };
            segments.push(segment);
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// Whether a concrete topic matches this pattern.
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let topic_segments: Vec<&str> = topic.split('/').collect();
        let mut position = 0;

        for segment in &self.segments {
            match segment {
                Segment::Rest => return true,
                Segment::Single => {
                    if position >= topic_segments.len() {
                        return false;
                    }
                    position += 1;
                }
                Segment::Literal(literal) => {
                    if topic_segments.get(position).copied() != Some(literal.as_str()) {
                        return false;
                    }
                    position += 1;
                }
            }
        }

        position == topic_segments.len()
    }

    /// Whether the pattern contains any wildcard segment.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Single | Segment::Rest))
    }

    /// The original pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl FromStr for TopicFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

/// Errors that can occur parsing a topic filter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FilterError {
    /// Pattern is the empty string
    #[error("empty topic filter")]
    Empty,
    /// `#` used anywhere but the final segment
    #[error("'#' must be the final segment: {0}")]
    RestNotLast(String),
    /// Wildcard character embedded inside a literal segment
    #[error("wildcard must occupy a whole segment: {0}")]
    EmbeddedWildcard(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        let filter = TopicFilter::parse("home/tele/grid").unwrap();
        assert!(filter.matches("home/tele/grid"));
        assert!(!filter.matches("home/tele/inverter"));
        assert!(!filter.matches("home/tele/grid/extra"));
        assert!(!filter.is_wildcard());
    }

    #[test]
    fn single_segment_wildcard() {
        let filter = TopicFilter::parse("home/tele/room/+/temp").unwrap();
        assert!(filter.matches("home/tele/room/living/temp"));
        assert!(filter.matches("home/tele/room/attic/temp"));
        assert!(!filter.matches("home/tele/room/temp"));
        assert!(!filter.matches("home/tele/room/living/attic/temp"));
        assert!(filter.is_wildcard());
    }

    #[test]
    fn leading_single_wildcard() {
        let filter = TopicFilter::parse("+/status").unwrap();
        assert!(filter.matches("shellypro2/status"));
        assert!(!filter.matches("shellypro2/events"));
        assert!(!filter.matches("a/b/status"));
    }

    #[test]
    fn trailing_rest_wildcard() {
        let filter = TopicFilter::parse("home/plan/#").unwrap();
        assert!(filter.matches("home/plan/prices/day/0"));
        assert!(filter.matches("home/plan"));
        assert!(!filter.matches("home/tele/grid"));
    }

    #[test]
    fn rest_must_be_last() {
        assert!(matches!(
            TopicFilter::parse("home/#/temp"),
            Err(FilterError::RestNotLast(_))
        ));
    }

    #[test]
    fn embedded_wildcard_rejected() {
        assert!(matches!(
            TopicFilter::parse("home/te+le/grid"),
            Err(FilterError::EmbeddedWildcard(_))
        ));
    }

    #[test]
    fn empty_pattern_rejected() {
        assert!(matches!(TopicFilter::parse(""), Err(FilterError::Empty)));
    }
}

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Text comparison policy between a query fragment and an observed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TextMatchMode {
    Equal,
    EqualIgnoreCase,
    Contains,
    ContainsIgnoreCase,
    StartsWith,
    EndsWith,
    RegexFull,
    RegexPartial,
}

impl TextMatchMode {
    pub fn matches(self, target: &str, observed: &str) -> bool {
        match self {
            Self::Equal => target == observed,
            Self::EqualIgnoreCase => target.to_lowercase() == observed.to_lowercase(),
            Self::Contains => observed.contains(target),
            Self::ContainsIgnoreCase => observed.to_lowercase().contains(&target.to_lowercase()),
            Self::StartsWith => observed.starts_with(target),
            Self::EndsWith => observed.ends_with(target),
            Self::RegexFull | Self::RegexPartial => match self.compile(target) {
                Some(re) => re.is_match(observed),
                None => false,
            },
        }
    }

    pub fn is_regex(self) -> bool {
        matches!(self, Self::RegexFull | Self::RegexPartial)
    }

    /// Builds the pattern for regex modes. Full mode anchors both ends.
    pub fn compile(self, target: &str) -> Option<Regex> {
        let pattern = match self {
            Self::RegexFull => format!("^(?:{target})$"),
            Self::RegexPartial => target.to_string(),
            _ => return None,
        };
        Regex::new(&pattern).ok()
    }
}

/// One query slot: a match mode paired with its optional target.
///
/// Regex targets are compiled once here instead of on every comparison.
#[derive(Debug, Clone)]
pub struct SlotMatcher {
    mode: TextMatchMode,
    target: Option<String>,
    regex: Option<Regex>,
}

impl SlotMatcher {
    pub fn new(mode: TextMatchMode, target: Option<&str>) -> Self {
        let target = target.filter(|t| !t.is_empty()).map(str::to_string);
        let regex = match (&target, mode.is_regex()) {
            (Some(t), true) => {
                let compiled = mode.compile(t);
                if compiled.is_none() {
                    tracing::warn!("Invalid {:?} pattern, slot will never match: {}", mode, t);
                }
                compiled
            }
            _ => None,
        };
        Self {
            mode,
            target,
            regex,
        }
    }

    pub fn mode(&self) -> TextMatchMode {
        self.mode
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Absent target or absent observed value satisfies the slot.
    pub fn is_satisfied(&self, observed: Option<&str>) -> bool {
        let Some(target) = self.target.as_deref() else {
            return true;
        };
        let observed = match observed {
            Some(o) if !o.is_empty() => o,
            _ => return true,
        };
        if self.mode.is_regex() {
            return self.regex.as_ref().is_some_and(|re| re.is_match(observed));
        }
        self.mode.matches(target, observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_modes_compare_as_expected() {
        assert!(TextMatchMode::Equal.matches("com/Foo", "com/Foo"));
        assert!(!TextMatchMode::Equal.matches("com/Foo", "com/foo"));
        assert!(TextMatchMode::EqualIgnoreCase.matches("com/Foo", "COM/FOO"));
        assert!(TextMatchMode::Contains.matches("IOException", "java/io/IOException"));
        assert!(TextMatchMode::ContainsIgnoreCase.matches("ioexception", "java/io/IOException"));
        assert!(TextMatchMode::StartsWith.matches("java/", "java/lang/String"));
        assert!(TextMatchMode::EndsWith.matches("String", "java/lang/String"));
        assert!(!TextMatchMode::EndsWith.matches("java", "java/lang/String"));
    }

    #[test]
    fn regex_full_is_anchored_and_partial_is_not() {
        assert!(TextMatchMode::RegexFull.matches("com/.*", "com/Foo"));
        assert!(!TextMatchMode::RegexFull.matches("Foo", "com/Foo"));
        assert!(TextMatchMode::RegexPartial.matches("Foo", "com/Foo"));
        assert!(!TextMatchMode::RegexPartial.matches("(", "com/Foo"));
    }

    #[test]
    fn slot_treats_empty_as_wildcard() {
        let slot = SlotMatcher::new(TextMatchMode::Equal, Some(""));
        assert!(slot.target().is_none());
        assert!(slot.is_satisfied(Some("anything")));

        let slot = SlotMatcher::new(TextMatchMode::Equal, Some("foo"));
        assert!(slot.is_satisfied(None));
        assert!(slot.is_satisfied(Some("")));
        assert!(slot.is_satisfied(Some("foo")));
        assert!(!slot.is_satisfied(Some("bar")));
    }

    #[test]
    fn invalid_regex_slot_never_matches() {
        let slot = SlotMatcher::new(TextMatchMode::RegexPartial, Some("[unclosed"));
        assert!(!slot.is_satisfied(Some("[unclosed")));
    }
}

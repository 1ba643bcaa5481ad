//! USE flag change lists
//!
//! Parses the value column of package.use lines, e.g.
//! `X wayland -gtk +qt5` or `-* ssl VIDEO_CARDS: intel -nouveau`.
//! USE_EXPAND groups (`NAME:`) are expanded to their lowercase-prefixed
//! flag names so later stages only ever see plain flag tokens.

/// A single USE flag change token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UseChange {
    /// `-*`: disable every flag set so far
    ClearAll,
    /// `-group_*`: disable every flag of one USE_EXPAND group. Holds the
    /// flag prefix, e.g. `video_cards_`.
    ClearGroup(String),
    /// `flag` or `+flag`
    Enable(String),
    /// `-flag`
    Disable(String),
}

impl UseChange {
    /// Parse a single token
    pub fn parse(token: &str) -> Self {
        if token == "-*" {
            Self::ClearAll
        } else if let Some(flag) = token.strip_prefix('-') {
            match flag.strip_suffix('*') {
                Some(prefix) if prefix.ends_with('_') => Self::ClearGroup(prefix.to_string()),
                _ => Self::Disable(flag.to_string()),
            }
        } else {
            Self::Enable(token.trim_start_matches('+').to_string())
        }
    }
}

/// Split a package.use value into change tokens, expanding USE_EXPAND groups.
///
/// A `-*` inside a group only clears that group and becomes `-group_*`.
/// Tokens keep their original spelling (`+a` stays `+a`) so they can be
/// reported back as written.
pub fn split_use_string(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut prefix: Option<String> = None;

    for token in s.split_whitespace() {
        if let Some(group) = token.strip_suffix(':') {
            if !group.is_empty() {
                prefix = Some(group.to_lowercase());
                continue;
            }
        }

        match &prefix {
            Some(group) => {
                let (sign, flag) = match token.chars().next() {
                    Some(c @ ('-' | '+')) => (c.to_string(), &token[1..]),
                    _ => (String::new(), token),
                };
                tokens.push(format!("{}{}_{}", sign, group, flag));
            }
            None => tokens.push(token.to_string()),
        }
    }

    tokens
}

/// The flag name a token refers to, without any leading `+`/`-`
pub fn strip_flag(token: &str) -> &str {
    token.trim_start_matches(['+', '-'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_changes() {
        assert_eq!(UseChange::parse("-*"), UseChange::ClearAll);
        assert_eq!(UseChange::parse("ssl"), UseChange::Enable("ssl".to_string()));
        assert_eq!(UseChange::parse("+ssl"), UseChange::Enable("ssl".to_string()));
        assert_eq!(UseChange::parse("-ssl"), UseChange::Disable("ssl".to_string()));
        assert_eq!(
            UseChange::parse("-video_cards_*"),
            UseChange::ClearGroup("video_cards_".to_string())
        );
        assert_eq!(UseChange::parse("-foo*"), UseChange::Disable("foo*".to_string()));
    }

    #[test]
    fn test_split_plain() {
        assert_eq!(split_use_string("X  -gtk +qt5"), vec!["X", "-gtk", "+qt5"]);
        assert!(split_use_string("").is_empty());
    }

    #[test]
    fn test_split_use_expand() {
        assert_eq!(
            split_use_string("ssl VIDEO_CARDS: intel -nouveau PYTHON_TARGETS: +python3_12"),
            vec![
                "ssl",
                "video_cards_intel",
                "-video_cards_nouveau",
                "+python_targets_python3_12"
            ]
        );
    }

    #[test]
    fn test_split_use_expand_clear_is_scoped_to_group() {
        assert_eq!(
            split_use_string("-* ssl VIDEO_CARDS: -* intel"),
            vec!["-*", "ssl", "-video_cards_*", "video_cards_intel"]
        );
    }

    #[test]
    fn test_strip_flag() {
        assert_eq!(strip_flag("+a"), "a");
        assert_eq!(strip_flag("-a"), "a");
        assert_eq!(strip_flag("a"), "a");
    }
}

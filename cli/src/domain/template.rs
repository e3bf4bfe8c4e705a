//! `<(attr)>` placeholder substitution for command strings.
//!
//! Substitution is a single left-to-right scan over the command: every
//! recognised token is replaced by its attribute value, and substituted
//! values are never rescanned.

use std::collections::BTreeMap;

const OPEN: &str = "<(";
const CLOSE: &str = ")>";

/// Named attributes an agent exposes to its command templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, String>,
}

impl Attributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an attribute, builder style.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Attribute names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Replaces every `<(key)>` whose `key` is a known attribute.
///
/// Unknown tokens are left verbatim.
#[must_use]
pub fn render(command: &str, attrs: &Attributes) -> String {
    if !command.contains(OPEN) {
        return command.to_string();
    }

    let mut out = String::with_capacity(command.len());
    let mut rest = command;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let value = after_open
            .find(CLOSE)
            .and_then(|end| attrs.get(&after_open[..end]).map(|v| (end, v)));
        match value {
            Some((end, v)) => {
                out.push_str(v);
                rest = &after_open[end + CLOSE.len()..];
            }
            None => {
                // Not a token: keep the opener and resume just after it, so
                // `<(<(name)>` still resolves the inner token.
                out.push_str(OPEN);
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    out
}

//! Rule matching.
//!
//! Rules are compiled once per publish into a [`RuleIndex`], which answers
//! `find(path, scheme, now)` in three ordered passes:
//!
//! 1. **Exact** - hash lookup on the normalized path
//! 2. **Placeholder** - `{token}` / `{*rest}` patterns
//! 3. **Regular expression** - full-path regex
//!
//! An earlier pass always outranks a later one. Within a pass the most
//! specific rule wins, ties going to the lowest rule id.

mod compiled;
mod index;
mod pattern;

pub use compiled::{CompiledRule, Specificity};
pub use index::{RuleIndex, RuleMatch};
pub use pattern::PlaceholderPattern;

/// Values captured from a request path.
///
/// Placeholder rules fill the named slots; regex rules fill the positional
/// slots (`$0` is the whole match) and, for named groups, the named slots too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    named: Vec<(String, String)>,
    positional: Vec<Option<String>>,
}

impl Captures {
    pub fn named(&self, name: &str) -> Option<&str> {
        self.named
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).and_then(|v| v.as_deref())
    }

    pub(crate) fn insert_named(&mut self, name: &str, value: &str) {
        self.named.push((name.to_string(), value.to_string()));
    }

    pub(crate) fn insert_positional(&mut self, index: usize, value: Option<&str>) {
        if self.positional.len() <= index {
            self.positional.resize(index + 1, None);
        }
        self.positional[index] = value.map(str::to_string);
    }
}

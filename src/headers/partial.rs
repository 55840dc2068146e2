use super::ScopedHeaders;

/// Canonicalizes a header name: uppercase with dashes replaced by
/// underscores, the form used for environment keys.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

/// Collapses every run of whitespace into a single space and trims the ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A header whose value may still be extended by continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialHeader {
    name: String,
    value: String,
}

impl PartialHeader {
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: canonical_name(name),
            value: normalize_whitespace(value),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Appends continuation text, joined to the existing value by one space.
    pub fn extend(&mut self, text: &str) {
        self.value.push(' ');
        self.value.push_str(&normalize_whitespace(text));
    }

    /// Writes the accumulated header into `target`.
    pub fn apply(self, target: &mut ScopedHeaders) {
        target.set(self.name, self.value);
    }
}

//! Deduplication identity for one benchmark unit.

use std::fmt;

/// (prompt, provider, model) triple identifying one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunIdentity {
    pub prompt: String,
    pub provider: String,
    pub model: String,
}

impl RunIdentity {
    pub fn new(
        prompt: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Canonical string form used as the dedup key.
    ///
    /// The separator is escaped inside components, so the mapping from
    /// triple to key is injective even when a model ID contains `|`.
    pub fn canonical_key(&self) -> String {
        format!(
            "{}|{}|{}",
            escape(&self.prompt),
            escape(&self.provider),
            escape(&self.model)
        )
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.prompt, self.provider, self.model)
    }
}

fn escape(component: &str) -> String {
    component.replace('\\', "\\\\").replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_stable() {
        let id = RunIdentity::new("general_knowledge", "acme", "acme-mini");
        assert_eq!(id.canonical_key(), "general_knowledge|acme|acme-mini");
    }

    #[test]
    fn key_is_injective_over_separator_collisions() {
        // Without escaping these two triples would collide on "a|b|c|m".
        let a = RunIdentity::new("a|b", "c", "m");
        let b = RunIdentity::new("a", "b|c", "m");
        assert_ne!(a.canonical_key(), b.canonical_key());

        let c = RunIdentity::new("a\\", "|b", "m");
        let d = RunIdentity::new("a", "\\|b", "m");
        assert_ne!(c.canonical_key(), d.canonical_key());
    }
}

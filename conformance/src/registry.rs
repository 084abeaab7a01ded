//! Scenario registry: control-socket names to scenarios.

use std::collections::BTreeMap;

use crate::scenarios::{ExpectedKind, Scenario};

/// What a control line selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioEntry {
    /// The name the entry was registered under. Aliases keep their own name.
    pub name: &'static str,
    pub scenario: Scenario,
    pub expects: ExpectedKind,
}

impl ScenarioEntry {
    pub fn new(name: &'static str, scenario: Scenario) -> Self {
        Self {
            name,
            scenario,
            expects: scenario.expects(),
        }
    }

    /// The entry an unknown name resolves to.
    pub fn failure() -> Self {
        Self::new(Scenario::Failure.name(), Scenario::Failure)
    }

    pub fn is_failure(&self) -> bool {
        self.scenario == Scenario::Failure
    }
}

/// Names the C client test-suite uses for scenarios registered under
/// another name.
const ALIASES: &[(&str, Scenario)] = &[("remove_success", Scenario::RremoveSuccess)];

/// Name to entry table. Read-only once the server starts.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    entries: BTreeMap<&'static str, ScenarioEntry>,
}

impl ScenarioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every scenario under its own name, plus the known aliases.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for &scenario in Scenario::ALL {
            registry.register(scenario.name(), scenario);
        }
        for &(name, scenario) in ALIASES {
            registry.register(name, scenario);
        }
        registry
    }

    /// Add `name`, returning the entry it replaces.
    pub fn register(&mut self, name: &'static str, scenario: Scenario) -> Option<ScenarioEntry> {
        self.entries
            .insert(name, ScenarioEntry::new(name, scenario))
    }

    pub fn get(&self, name: &str) -> Option<ScenarioEntry> {
        self.entries.get(name).copied()
    }

    /// Resolve a control line. Unknown names select the failure entry.
    pub fn lookup(&self, name: &str) -> ScenarioEntry {
        self.get(name).unwrap_or_else(ScenarioEntry::failure)
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = ScenarioEntry> + '_ {
        self.entries.values().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ninep_protocol::MessageKind;

    use super::*;

    #[test]
    fn test_builtin_has_every_scenario() {
        let registry = ScenarioRegistry::builtin();
        assert_eq!(registry.len(), Scenario::ALL.len() + ALIASES.len());
        for &scenario in Scenario::ALL {
            let entry = registry.get(scenario.name()).unwrap();
            assert_eq!(entry.scenario, scenario);
            assert_eq!(entry.expects, scenario.expects());
        }
    }

    #[test]
    fn test_lookup_is_stable() {
        let registry = ScenarioRegistry::builtin();
        let first = registry.lookup("rversion_success");
        let second = registry.lookup("rversion_success");
        assert_eq!(first, second);
        assert_eq!(
            first.expects,
            ExpectedKind::Exactly(MessageKind::Tversion)
        );
    }

    #[test]
    fn test_unknown_name_is_failure() {
        let registry = ScenarioRegistry::builtin();
        let entry = registry.lookup("no_such_scenario");
        assert!(entry.is_failure());
        assert_eq!(entry.expects, ExpectedKind::Any);
        assert_eq!(registry.get("no_such_scenario"), None);
        // the failure entry is not addressable by name
        assert!(registry.lookup("failure").is_failure());
        assert_eq!(registry.get("failure"), None);
    }

    #[test]
    fn test_alias_keeps_its_name() {
        let registry = ScenarioRegistry::builtin();
        let alias = registry.lookup("remove_success");
        assert_eq!(alias.name, "remove_success");
        assert_eq!(alias.scenario, Scenario::RremoveSuccess);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ScenarioRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.register("x", Scenario::RreadSuccess), None);
        let old = registry.register("x", Scenario::RreadCountZero).unwrap();
        assert_eq!(old.scenario, Scenario::RreadSuccess);
        assert_eq!(registry.lookup("x").scenario, Scenario::RreadCountZero);
    }

    #[test]
    fn test_iter_is_sorted() {
        let names: Vec<_> = ScenarioRegistry::builtin().iter().map(|e| e.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}

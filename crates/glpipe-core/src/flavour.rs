//! Flavour specification types and combination expansion.
//!
//! A flavour set is a named, ordered sequence of combination rules. Expanding
//! a set takes the cross product architectures × platforms × modifier-groups
//! per rule, unions the per-rule results and deduplicates by exact
//! (architecture, platform, modifier-set) tuple equality.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Test categories a rule may declare as tolerated failures.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TestCategory {
    Unit,
    Integration,
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCategory::Unit => write!(f, "unit"),
            TestCategory::Integration => write!(f, "integration"),
        }
    }
}

impl FromStr for TestCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unit" => Ok(TestCategory::Unit),
            "integration" => Ok(TestCategory::Integration),
            other => Err(format!("unknown test category: '{other}'")),
        }
    }
}

/// One combination rule inside a flavour set.
///
/// `modifiers` is an ordered sequence of groups; each group contributes
/// exactly one chosen element per expanded flavour, so the modifier dimension
/// is a product over groups, not a flat union.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationRule {
    pub architectures: Vec<String>,
    pub platforms: Vec<String>,
    pub modifiers: Vec<Vec<String>>,
    /// Test categories allowed to fail for every flavour this rule produces.
    #[serde(default)]
    pub fails: BTreeSet<TestCategory>,
}

impl CombinationRule {
    /// Check the non-empty invariants for this rule.
    ///
    /// `set` and `index` identify the rule in error messages.
    pub fn validate(&self, set: &str, index: usize) -> Result<()> {
        if self.architectures.is_empty() {
            return Err(Error::InvalidSpec(format!(
                "set '{set}', rule {index}: architectures must not be empty"
            )));
        }
        if self.platforms.is_empty() {
            return Err(Error::InvalidSpec(format!(
                "set '{set}', rule {index}: platforms must not be empty"
            )));
        }
        for (g, group) in self.modifiers.iter().enumerate() {
            if group.is_empty() {
                return Err(Error::InvalidSpec(format!(
                    "set '{set}', rule {index}: modifier group {g} must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Cross product over the modifier groups: one chosen element per group.
    ///
    /// A rule without modifier groups yields a single empty modifier set.
    fn modifier_combinations(&self) -> Vec<BTreeSet<String>> {
        let mut combos: Vec<BTreeSet<String>> = vec![BTreeSet::new()];
        for group in &self.modifiers {
            let mut next = Vec::with_capacity(combos.len() * group.len());
            for partial in &combos {
                for choice in group {
                    let mut extended = partial.clone();
                    extended.insert(choice.clone());
                    next.push(extended);
                }
            }
            combos = next;
        }
        combos
    }
}

/// One concrete build variant produced by expansion. Immutable value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flavour {
    pub architecture: String,
    pub platform: String,
    pub modifiers: BTreeSet<String>,
    /// Union of the `fails` sets of every rule that produced this flavour.
    #[serde(default)]
    pub fails: BTreeSet<TestCategory>,
}

impl Flavour {
    /// Canonical `platform-modifiers-architecture` name, e.g.
    /// `aws-_prod-gardener-amd64`.
    pub fn canonical_name(&self) -> String {
        let mut parts = vec![self.platform.as_str()];
        parts.extend(self.modifiers.iter().map(|m| m.as_str()));
        parts.push(self.architecture.as_str());
        parts.join("-")
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// A named group of combination rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavourSet {
    pub name: String,
    pub combinations: Vec<CombinationRule>,
}

impl FlavourSet {
    /// Expand the combination rules into the full enumerated flavour list.
    ///
    /// Ordering is the enumeration order of the rules and their dimensions,
    /// stable across runs for the same input. Duplicate tuples reachable
    /// through more than one rule are emitted once, with the `fails` sets of
    /// all producing rules unioned.
    ///
    /// An empty `combinations` sequence yields an empty list; callers treat a
    /// zero-flavour build target as a no-op, not a failure.
    pub fn expand(&self) -> Result<Vec<Flavour>> {
        let mut flavours: Vec<Flavour> = Vec::new();
        let mut seen: HashMap<(String, String, BTreeSet<String>), usize> = HashMap::new();

        for (index, rule) in self.combinations.iter().enumerate() {
            rule.validate(&self.name, index)?;
            let modifier_combos = rule.modifier_combinations();
            for architecture in &rule.architectures {
                for platform in &rule.platforms {
                    for modifiers in &modifier_combos {
                        let key = (
                            architecture.clone(),
                            platform.clone(),
                            modifiers.clone(),
                        );
                        match seen.get(&key) {
                            Some(&at) => {
                                flavours[at].fails.extend(rule.fails.iter().copied());
                            }
                            None => {
                                seen.insert(key, flavours.len());
                                flavours.push(Flavour {
                                    architecture: architecture.clone(),
                                    platform: platform.clone(),
                                    modifiers: modifiers.clone(),
                                    fails: rule.fails.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(flavours)
    }
}

/// A loaded flavour specification document: set name → flavour set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlavourDocument {
    sets: BTreeMap<String, FlavourSet>,
}

impl FlavourDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a set, returning the previously stored set for the same name.
    pub fn insert(&mut self, set: FlavourSet) -> Option<FlavourSet> {
        self.sets.insert(set.name.clone(), set)
    }

    /// Look up a set by name.
    pub fn get(&self, name: &str) -> Result<&FlavourSet> {
        self.sets
            .get(name)
            .ok_or_else(|| Error::UnknownSet(name.to_string()))
    }

    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(
        architectures: &[&str],
        platforms: &[&str],
        modifiers: &[&[&str]],
        fails: &[TestCategory],
    ) -> CombinationRule {
        CombinationRule {
            architectures: architectures.iter().map(|s| s.to_string()).collect(),
            platforms: platforms.iter().map(|s| s.to_string()).collect(),
            modifiers: modifiers
                .iter()
                .map(|g| g.iter().map(|s| s.to_string()).collect())
                .collect(),
            fails: fails.iter().copied().collect(),
        }
    }

    fn set(name: &str, combinations: Vec<CombinationRule>) -> FlavourSet {
        FlavourSet {
            name: name.to_string(),
            combinations,
        }
    }

    #[test]
    fn test_expansion_is_product_over_modifier_groups() {
        let s = set("all", vec![rule(&["x"], &["p"], &[&["a", "b"], &["c"]], &[])]);
        let flavours = s.expand().unwrap();

        assert_eq!(flavours.len(), 2);
        assert_eq!(flavours[0].modifiers, BTreeSet::from(["a", "c"].map(String::from)));
        assert_eq!(flavours[1].modifiers, BTreeSet::from(["b", "c"].map(String::from)));
        for f in &flavours {
            assert_eq!(f.architecture, "x");
            assert_eq!(f.platform, "p");
        }
    }

    #[test]
    fn test_expansion_deduplicates_identical_rules() {
        let r = rule(&["amd64"], &["aws"], &[&["_prod"]], &[]);
        let once = set("all", vec![r.clone()]).expand().unwrap();
        let twice = set("all", vec![r.clone(), r]).expand().unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_fails_union_across_overlapping_rules() {
        let s = set(
            "all",
            vec![
                rule(&["amd64"], &["aws"], &[], &[TestCategory::Unit]),
                rule(&["amd64"], &["aws"], &[], &[TestCategory::Integration]),
            ],
        );
        let flavours = s.expand().unwrap();

        assert_eq!(flavours.len(), 1);
        assert_eq!(
            flavours[0].fails,
            BTreeSet::from([TestCategory::Unit, TestCategory::Integration])
        );
    }

    #[test]
    fn test_empty_combinations_yield_empty_set() {
        let flavours = set("all", vec![]).expand().unwrap();
        assert!(flavours.is_empty());
    }

    #[test]
    fn test_empty_dimension_is_invalid() {
        let s = set("all", vec![rule(&[], &["aws"], &[], &[])]);
        assert!(matches!(s.expand(), Err(Error::InvalidSpec(_))));

        let s = set("all", vec![rule(&["amd64"], &["aws"], &[&[]], &[])]);
        let err = s.expand().unwrap_err();
        assert!(err.to_string().contains("modifier group 0"));
    }

    #[test]
    fn test_expansion_order_is_stable() {
        let s = set(
            "all",
            vec![rule(&["amd64", "arm64"], &["aws", "gcp"], &[&["_prod"]], &[])],
        );
        let names: Vec<String> = s
            .expand()
            .unwrap()
            .iter()
            .map(Flavour::canonical_name)
            .collect();

        assert_eq!(
            names,
            vec![
                "aws-_prod-amd64",
                "gcp-_prod-amd64",
                "aws-_prod-arm64",
                "gcp-_prod-arm64",
            ]
        );
    }

    #[test]
    fn test_document_lookup() {
        let mut doc = FlavourDocument::new();
        doc.insert(set("all", vec![]));

        assert!(doc.get("all").is_ok());
        assert!(matches!(doc.get("missing"), Err(Error::UnknownSet(_))));
    }
}

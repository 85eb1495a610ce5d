//! Flavour specification document parsing.
//!
//! Documents are KDL, e.g.:
//!
//! ```kdl
//! flavour-set "all" {
//!     combination {
//!         architectures "amd64" "arm64"
//!         platforms "aws" "gcp"
//!         modifiers {
//!             group "_prod" "_dev"
//!             group "gardener"
//!         }
//!         fails "unit"
//!     }
//! }
//!
//! credential "oci-registry" file="secrets/oci.json"
//! credential "object-store" file="secrets/s3.json"
//! ```

use crate::{ConfigError, ConfigResult};
use glpipe_core::credential::CredentialSpec;
use glpipe_core::flavour::{CombinationRule, FlavourDocument, FlavourSet, TestCategory};
use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A fully parsed and validated flavour configuration.
#[derive(Debug, Clone)]
pub struct FlavourConfig {
    pub flavours: FlavourDocument,
    pub credentials: Vec<CredentialSpec>,
}

/// Parse a flavour configuration from KDL text.
///
/// Validation happens here, once at load time: non-empty rule dimensions,
/// unique set names, known test categories. Downstream code can assume a
/// well-formed document.
pub fn parse_document(kdl: &str) -> ConfigResult<FlavourConfig> {
    let doc: KdlDocument = kdl.parse()?;

    let mut flavours = FlavourDocument::new();
    let mut credentials = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "flavour-set" => {
                let set = parse_flavour_set(node)?;
                if flavours.insert(set.clone()).is_some() {
                    return Err(ConfigError::Duplicate(format!(
                        "flavour-set '{}'",
                        set.name
                    )));
                }
            }
            "credential" => {
                credentials.push(parse_credential(node)?);
            }
            _ => {} // Ignore unknown nodes
        }
    }

    if credentials
        .iter()
        .map(|c| c.cfg_type.as_str())
        .collect::<BTreeSet<_>>()
        .len()
        != credentials.len()
    {
        return Err(ConfigError::Duplicate("credential cfg type".to_string()));
    }

    Ok(FlavourConfig {
        flavours,
        credentials,
    })
}

fn parse_flavour_set(node: &KdlNode) -> ConfigResult<FlavourSet> {
    // Default set name if unspecified: "all".
    let name = get_first_string_arg(node).unwrap_or_else(|| "all".to_string());

    let mut combinations = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "combination" {
                combinations.push(parse_combination(child)?);
            }
        }
    }

    let set = FlavourSet { name, combinations };
    for (index, rule) in set.combinations.iter().enumerate() {
        rule.validate(&set.name, index)
            .map_err(|e| ConfigError::InvalidValue {
                field: "combination".to_string(),
                message: e.to_string(),
            })?;
    }

    Ok(set)
}

fn parse_combination(node: &KdlNode) -> ConfigResult<CombinationRule> {
    let mut architectures = Vec::new();
    let mut platforms = Vec::new();
    let mut modifiers = Vec::new();
    let mut fails = BTreeSet::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "architectures" => {
                    architectures = get_all_string_args(child);
                }
                "platforms" => {
                    platforms = get_all_string_args(child);
                }
                "modifiers" => {
                    if let Some(groups) = child.children() {
                        for group in groups.nodes() {
                            if group.name().value() == "group" {
                                modifiers.push(get_all_string_args(group));
                            }
                        }
                    }
                }
                "fails" => {
                    for raw in get_all_string_args(child) {
                        let category: TestCategory =
                            raw.parse().map_err(|message| ConfigError::InvalidValue {
                                field: "fails".to_string(),
                                message,
                            })?;
                        fails.insert(category);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(CombinationRule {
        architectures,
        platforms,
        modifiers,
        fails,
    })
}

fn parse_credential(node: &KdlNode) -> ConfigResult<CredentialSpec> {
    let cfg_type = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("credential cfg type".to_string()))?;

    let source_file = get_string_prop(node, "file").ok_or_else(|| {
        ConfigError::MissingField(format!("file for credential '{cfg_type}'"))
    })?;

    Ok(CredentialSpec {
        cfg_type,
        source_file: PathBuf::from(source_file),
    })
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_document() {
        let kdl = r#"
            flavour-set "all" {
                combination {
                    architectures "amd64"
                    platforms "aws"
                    modifiers {
                        group "_prod" "gardener"
                    }
                    fails "unit" "integration"
                }
            }
        "#;

        let config = parse_document(kdl).unwrap();
        let set = config.flavours.get("all").unwrap();

        assert_eq!(set.combinations.len(), 1);
        let rule = &set.combinations[0];
        assert_eq!(rule.architectures, vec!["amd64"]);
        assert_eq!(rule.platforms, vec!["aws"]);
        assert_eq!(rule.modifiers, vec![vec!["_prod", "gardener"]]);
        assert_eq!(
            rule.fails,
            BTreeSet::from([TestCategory::Unit, TestCategory::Integration])
        );
    }

    #[test]
    fn test_set_name_defaults_to_all() {
        let kdl = r#"
            flavour-set {
                combination {
                    architectures "amd64"
                    platforms "aws"
                }
            }
        "#;

        let config = parse_document(kdl).unwrap();
        assert!(config.flavours.get("all").is_ok());
    }

    #[test]
    fn test_parse_credentials() {
        let kdl = r#"
            credential "oci-registry" file="secrets/oci.json"
            credential "object-store" file="secrets/s3.json"
        "#;

        let config = parse_document(kdl).unwrap();
        assert_eq!(config.credentials.len(), 2);
        assert_eq!(config.credentials[0].cfg_type, "oci-registry");
        assert_eq!(
            config.credentials[0].source_file,
            PathBuf::from("secrets/oci.json")
        );
    }

    #[test]
    fn test_duplicate_set_name_rejected() {
        let kdl = r#"
            flavour-set "all" {
            }
            flavour-set "all" {
            }
        "#;

        assert!(matches!(
            parse_document(kdl),
            Err(ConfigError::Duplicate(_))
        ));
    }

    #[test]
    fn test_empty_dimension_rejected_at_load() {
        let kdl = r#"
            flavour-set "all" {
                combination {
                    platforms "aws"
                }
            }
        "#;

        assert!(matches!(
            parse_document(kdl),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_unknown_test_category_rejected() {
        let kdl = r#"
            flavour-set "all" {
                combination {
                    architectures "amd64"
                    platforms "aws"
                    fails "smoke"
                }
            }
        "#;

        assert!(matches!(
            parse_document(kdl),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_credential_without_file_rejected() {
        let kdl = r#"credential "oci-registry""#;

        assert!(matches!(
            parse_document(kdl),
            Err(ConfigError::MissingField(_))
        ));
    }

    #[test]
    fn test_empty_combinations_are_valid() {
        let kdl = r#"
            flavour-set "nightly" {
            }
        "#;

        let config = parse_document(kdl).unwrap();
        let set = config.flavours.get("nightly").unwrap();
        assert!(set.combinations.is_empty());
        assert!(set.expand().unwrap().is_empty());
    }
}

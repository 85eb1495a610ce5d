//! Build target progression and stage resolution.
//!
//! Targets form an ordered pipeline-stage progression: each later stage
//! presupposes that all earlier stages completed for the same flavour in a
//! prior invocation. Sequencing across invocations is owned by the
//! orchestrator; this resolver only emits the stage requirements.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::flavour::Flavour;

/// Cfg type for object-store upload credentials.
pub const CFG_TYPE_OBJECT_STORE: &str = "object-store";
/// Cfg type for OCI registry push credentials.
pub const CFG_TYPE_OCI_REGISTRY: &str = "oci-registry";

/// The processing stage a flavour is pushed through.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    #[default]
    Build,
    Manifest,
    Release,
    Publish,
}

impl BuildTarget {
    /// Stage progression order.
    pub const ALL: [BuildTarget; 4] = [
        BuildTarget::Build,
        BuildTarget::Manifest,
        BuildTarget::Release,
        BuildTarget::Publish,
    ];

    /// Every stage from `build` up to and including this target, in order.
    pub fn required_stages(self) -> Vec<BuildTarget> {
        Self::ALL.iter().copied().filter(|s| *s <= self).collect()
    }

    /// The credential cfg types this stage needs, statically declared.
    pub fn required_cfg_types(self) -> &'static [&'static str] {
        match self {
            BuildTarget::Build => &[],
            BuildTarget::Manifest | BuildTarget::Release => &[CFG_TYPE_OBJECT_STORE],
            BuildTarget::Publish => &[CFG_TYPE_OBJECT_STORE, CFG_TYPE_OCI_REGISTRY],
        }
    }

    /// Whether this stage pushes to an OCI registry and therefore requires
    /// an OCI path in the generator context.
    pub fn needs_oci_path(self) -> bool {
        self.required_cfg_types()
            .contains(&CFG_TYPE_OCI_REGISTRY)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildTarget::Build => "build",
            BuildTarget::Manifest => "manifest",
            BuildTarget::Release => "release",
            BuildTarget::Publish => "publish",
        };
        write!(f, "{name}")
    }
}

impl FromStr for BuildTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "build" => Ok(BuildTarget::Build),
            "manifest" => Ok(BuildTarget::Manifest),
            "release" => Ok(BuildTarget::Release),
            "publish" => Ok(BuildTarget::Publish),
            other => Err(format!("unknown build target: '{other}'")),
        }
    }
}

/// One expanded flavour with the ordered stages it must go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    pub flavour: Flavour,
    pub stages: Vec<BuildTarget>,
}

/// Map the requested target onto the expanded flavours.
///
/// Emits one plan per flavour, preserving the expansion order. Does not
/// verify that earlier stages actually ran; that is the orchestrator's
/// concern across invocations.
pub fn resolve_target(target: BuildTarget, flavours: Vec<Flavour>) -> Vec<StagePlan> {
    let stages = target.required_stages();
    flavours
        .into_iter()
        .map(|flavour| StagePlan {
            flavour,
            stages: stages.clone(),
        })
        .collect()
}

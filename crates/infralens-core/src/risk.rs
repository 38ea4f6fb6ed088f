//! Deterministic risk scoring
//!
//! Rules are evaluated in a fixed precedence order and the first match
//! decides the level:
//!
//! 1. **High**: a sensitive resource is deleted or replaced; more than
//!    [`HIGH_SENSITIVE_THRESHOLD`] sensitive resources change; more than
//!    [`HIGH_DESTRUCTIVE_THRESHOLD`] destructive actions.
//! 2. **Medium**: any sensitive resource changes; more than
//!    [`MEDIUM_CHANGE_THRESHOLD`] changes in total; any destructive action.
//! 3. **Low**: everything else, including the empty change set.
//!
//! Deployment size and cost impact are banded independently of the level.

use crate::model::{ChangeSet, ResourceChange};
use serde::Serialize;
use std::collections::BTreeMap;

/// High when the number of changed sensitive resources exceeds this
pub const HIGH_SENSITIVE_THRESHOLD: usize = 3;
/// High when deletes + replaces exceed this
pub const HIGH_DESTRUCTIVE_THRESHOLD: usize = 5;
/// Medium when the total change count exceeds this
pub const MEDIUM_CHANGE_THRESHOLD: usize = 10;
/// Size/cost band becomes medium above this count
pub const SIZE_MEDIUM_THRESHOLD: usize = 10;
/// Size/cost band becomes large above this count
pub const SIZE_LARGE_THRESHOLD: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule that decided the risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskRule {
    SensitiveResourceDestroyed,
    SensitiveChangeCountExceeded,
    DestructiveCountExceeded,
    SensitiveResourceChanged,
    ChangeCountExceeded,
    DestructiveChangePresent,
    /// No elevating rule matched
    Baseline,
}

impl RiskRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRule::SensitiveResourceDestroyed => "sensitive_resource_destroyed",
            RiskRule::SensitiveChangeCountExceeded => "sensitive_change_count_exceeded",
            RiskRule::DestructiveCountExceeded => "destructive_count_exceeded",
            RiskRule::SensitiveResourceChanged => "sensitive_resource_changed",
            RiskRule::ChangeCountExceeded => "change_count_exceeded",
            RiskRule::DestructiveChangePresent => "destructive_change_present",
            RiskRule::Baseline => "baseline",
        }
    }

    pub fn level(&self) -> RiskLevel {
        match self {
            RiskRule::SensitiveResourceDestroyed
            | RiskRule::SensitiveChangeCountExceeded
            | RiskRule::DestructiveCountExceeded => RiskLevel::High,
            RiskRule::SensitiveResourceChanged
            | RiskRule::ChangeCountExceeded
            | RiskRule::DestructiveChangePresent => RiskLevel::Medium,
            RiskRule::Baseline => RiskLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentSize {
    Small,
    Medium,
    Large,
}

impl DeploymentSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentSize::Small => "small",
            DeploymentSize::Medium => "medium",
            DeploymentSize::Large => "large",
        }
    }

    pub fn from_count(count: usize) -> Self {
        if count > SIZE_LARGE_THRESHOLD {
            DeploymentSize::Large
        } else if count > SIZE_MEDIUM_THRESHOLD {
            DeploymentSize::Medium
        } else {
            DeploymentSize::Small
        }
    }
}

/// Rough billing impact, banded over the total change count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CostImpact {
    Minimal,
    Moderate,
    Significant,
}

impl CostImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostImpact::Minimal => "minimal",
            CostImpact::Moderate => "moderate",
            CostImpact::Significant => "significant",
        }
    }

    pub fn from_count(count: usize) -> Self {
        match DeploymentSize::from_count(count) {
            DeploymentSize::Small => CostImpact::Minimal,
            DeploymentSize::Medium => CostImpact::Moderate,
            DeploymentSize::Large => CostImpact::Significant,
        }
    }
}

/// Risk assessment borrowed from the `ChangeSet` it describes.
///
/// The lifetime ties the assessment to its change set: it cannot outlive
/// it and is never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment<'a> {
    pub level: RiskLevel,
    pub rule: RiskRule,
    pub size: DeploymentSize,
    pub cost_impact: CostImpact,
    pub total_changes: usize,
    pub destructive_changes: usize,
    /// Sensitive resources carrying any action, in change-set order
    pub security_sensitive: Vec<&'a ResourceChange>,
    /// Resource type → number of resources (not actions) of that type
    pub resource_types: BTreeMap<&'a str, usize>,
}

impl RiskAssessment<'_> {
    pub fn has_security_changes(&self) -> bool {
        !self.security_sensitive.is_empty()
    }
}

/// Score a classified change set. Pure: same input, same assessment.
pub fn score(change_set: &ChangeSet) -> RiskAssessment<'_> {
    let summary = change_set.summary();
    let total_changes = summary.total();
    let destructive_changes = summary.destructive();

    let security_sensitive: Vec<&ResourceChange> = change_set
        .resources()
        .filter(|r| r.is_security_sensitive())
        .collect();

    let mut resource_types: BTreeMap<&str, usize> = BTreeMap::new();
    for resource in change_set.resources() {
        *resource_types.entry(resource.resource_type()).or_insert(0) += 1;
    }

    let rule = decide_rule(&security_sensitive, total_changes, destructive_changes);

    RiskAssessment {
        level: rule.level(),
        rule,
        size: DeploymentSize::from_count(total_changes),
        cost_impact: CostImpact::from_count(total_changes),
        total_changes,
        destructive_changes,
        security_sensitive,
        resource_types,
    }
}

fn decide_rule(
    sensitive: &[&ResourceChange],
    total_changes: usize,
    destructive_changes: usize,
) -> RiskRule {
    if sensitive.iter().any(|r| r.is_destructive()) {
        return RiskRule::SensitiveResourceDestroyed;
    }
    if sensitive.len() > HIGH_SENSITIVE_THRESHOLD {
        return RiskRule::SensitiveChangeCountExceeded;
    }
    if destructive_changes > HIGH_DESTRUCTIVE_THRESHOLD {
        return RiskRule::DestructiveCountExceeded;
    }
    if !sensitive.is_empty() {
        return RiskRule::SensitiveResourceChanged;
    }
    if total_changes > MEDIUM_CHANGE_THRESHOLD {
        return RiskRule::ChangeCountExceeded;
    }
    if destructive_changes > 0 {
        return RiskRule::DestructiveChangePresent;
    }
    RiskRule::Baseline
}

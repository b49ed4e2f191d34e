//! Pre-flight policy gate.
//!
//! Before any resolution work begins, the orchestrator evaluates the attempt
//! against a set of independent deny predicates. The gate is pure and
//! read-only: it never touches persistence and never performs I/O. Label and
//! organization metadata is supplied up-front on the [`MergeAttempt`]
//! descriptor by the caller's policy data source.
//!
//! Evaluation is a boolean OR of independent predicates: any matching rule
//! denies the attempt, and all matching reasons are collected so the caller
//! can surface every problem at once. Adding a rule never requires
//! reordering existing ones.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{OrgId, PolicyDecision, PrNumber, RepoId};

/// Describes the merge attempt being gated.
///
/// Built by the caller from PR metadata (labels) and organization records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAttempt {
    pub org: OrgId,
    pub repo: RepoId,
    pub pr: PrNumber,
    /// Labels on the pull request. A set: order and duplicates are irrelevant
    /// to policy.
    pub labels: BTreeSet<String>,
}

impl MergeAttempt {
    pub fn new(org: OrgId, repo: RepoId, pr: PrNumber) -> Self {
        MergeAttempt {
            org,
            repo,
            pr,
            labels: BTreeSet::new(),
        }
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }
}

/// A single deny predicate.
///
/// Rules are independent: each inspects the attempt and either produces a
/// human-readable denial reason or passes. Rules must not depend on the
/// evaluation order of other rules.
pub trait PolicyRule: Send + Sync {
    /// Returns a denial reason if this rule vetoes the attempt.
    fn deny_reason(&self, attempt: &MergeAttempt) -> Option<String>;
}

/// Denies attempts on PRs carrying any of the configured labels.
///
/// Used for opt-out labels like `sensitive` or `no-auto-merge`.
#[derive(Debug, Clone)]
pub struct DenyLabelRule {
    labels: BTreeSet<String>,
}

impl DenyLabelRule {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DenyLabelRule {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// The default opt-out labels.
    pub fn sensitive() -> Self {
        DenyLabelRule::new(["sensitive", "no-auto-merge"])
    }
}

impl PolicyRule for DenyLabelRule {
    fn deny_reason(&self, attempt: &MergeAttempt) -> Option<String> {
        let matched: Vec<&str> = attempt
            .labels
            .iter()
            .filter(|l| self.labels.contains(*l))
            .map(String::as_str)
            .collect();

        if matched.is_empty() {
            None
        } else {
            Some(format!(
                "PR {} carries opt-out label(s): {}",
                attempt.pr,
                matched.join(", ")
            ))
        }
    }
}

/// Denies attempts for organizations with automated merging switched off.
#[derive(Debug, Clone)]
pub struct BlockedOrgRule {
    orgs: BTreeSet<OrgId>,
}

impl BlockedOrgRule {
    pub fn new<I>(orgs: I) -> Self
    where
        I: IntoIterator<Item = OrgId>,
    {
        BlockedOrgRule {
            orgs: orgs.into_iter().collect(),
        }
    }
}

impl PolicyRule for BlockedOrgRule {
    fn deny_reason(&self, attempt: &MergeAttempt) -> Option<String> {
        if self.orgs.contains(&attempt.org) {
            Some(format!(
                "organization {} has automated merging disabled",
                attempt.org
            ))
        } else {
            None
        }
    }
}

/// The policy gate: a collection of independent deny predicates.
pub struct PolicyGate {
    rules: Vec<Box<dyn PolicyRule>>,
}

impl PolicyGate {
    /// A gate with the default rule set (sensitive-label opt-out).
    pub fn new() -> Self {
        PolicyGate {
            rules: vec![Box::new(DenyLabelRule::sensitive())],
        }
    }

    /// A gate with no rules; every attempt is allowed.
    pub fn permissive() -> Self {
        PolicyGate { rules: vec![] }
    }

    /// Adds a rule. Order is irrelevant: all rules are always consulted.
    pub fn with_rule(mut self, rule: impl PolicyRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Evaluates every rule against the attempt.
    ///
    /// Returns `allow=false` with every matching reason when any predicate
    /// matches. Callers are responsible for halting the pipeline and
    /// surfacing the reasons upstream.
    pub fn evaluate(&self, attempt: &MergeAttempt) -> PolicyDecision {
        let reasons: Vec<String> = self
            .rules
            .iter()
            .filter_map(|rule| rule.deny_reason(attempt))
            .collect();

        if reasons.is_empty() {
            PolicyDecision::allowed()
        } else {
            PolicyDecision::denied(reasons)
        }
    }
}

impl Default for PolicyGate {
    fn default() -> Self {
        PolicyGate::new()
    }
}

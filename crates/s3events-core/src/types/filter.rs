//! Key filter rules
//!
//! A destination subscribes with an ordered list of prefix/suffix rules.
//! How the rules combine is selected by [`FilterSemantics`].

use super::StorageObjectRef;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Filter Rules
// ============================================================================

/// Which end of the key a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterRuleKind {
    Prefix,
    Suffix,
}

impl FilterRuleKind {
    /// Any rule name other than "prefix" is treated as a suffix rule
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("prefix") {
            FilterRuleKind::Prefix
        } else {
            FilterRuleKind::Suffix
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterRuleKind::Prefix => "prefix",
            FilterRuleKind::Suffix => "suffix",
        }
    }
}

/// Filter rule for key name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFilterRule", into = "RawFilterRule")]
pub struct FilterRule {
    pub kind: FilterRuleKind,
    pub value: String,
}

/// Wire shape of a filter rule: `{"Name": "prefix", "Value": "logs/"}`
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawFilterRule {
    name: String,
    value: String,
}

impl From<RawFilterRule> for FilterRule {
    fn from(raw: RawFilterRule) -> Self {
        Self {
            kind: FilterRuleKind::from_name(&raw.name),
            value: raw.value,
        }
    }
}

impl From<FilterRule> for RawFilterRule {
    fn from(rule: FilterRule) -> Self {
        Self {
            name: rule.kind.as_str().to_string(),
            value: rule.value,
        }
    }
}

impl FilterRule {
    pub fn prefix(value: impl Into<String>) -> Self {
        Self {
            kind: FilterRuleKind::Prefix,
            value: value.into(),
        }
    }

    pub fn suffix(value: impl Into<String>) -> Self {
        Self {
            kind: FilterRuleKind::Suffix,
            value: value.into(),
        }
    }

    /// Check a single key against this rule
    pub fn matches(&self, key: &str) -> bool {
        match self.kind {
            FilterRuleKind::Prefix => key.starts_with(&self.value),
            FilterRuleKind::Suffix => key.ends_with(&self.value),
        }
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind.as_str(), self.value)
    }
}

// ============================================================================
// Rule Combination
// ============================================================================

/// How a list of rules combines into one verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterSemantics {
    /// Every rule must match
    #[default]
    AllRules,
    /// Only the last rule decides; earlier rules are overwritten
    LastRuleWins,
}

impl FilterSemantics {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterSemantics::AllRules => "all-rules",
            FilterSemantics::LastRuleWins => "last-rule-wins",
        }
    }
}

impl fmt::Display for FilterSemantics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterSemantics {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-rules" => Ok(FilterSemantics::AllRules),
            "last-rule-wins" => Ok(FilterSemantics::LastRuleWins),
            other => Err(Error::InvalidArgument(format!(
                "unknown filter semantics '{}', expected all-rules or last-rule-wins",
                other
            ))),
        }
    }
}

/// Evaluate rules against an object with the default semantics.
///
/// An empty rule list always matches.
pub fn should_dispatch(object: &StorageObjectRef, rules: &[FilterRule]) -> bool {
    should_dispatch_with(object, rules, FilterSemantics::default())
}

/// Evaluate rules against an object with explicit semantics
pub fn should_dispatch_with(
    object: &StorageObjectRef,
    rules: &[FilterRule],
    semantics: FilterSemantics,
) -> bool {
    match semantics {
        FilterSemantics::AllRules => rules.iter().all(|rule| rule.matches(&object.key)),
        FilterSemantics::LastRuleWins => rules
            .last()
            .map_or(true, |rule| rule.matches(&object.key)),
    }
}

// ============================================================================
// Key Filter
// ============================================================================

/// S3 Key filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct S3KeyFilter {
    #[serde(default)]
    pub filter_rules: Vec<FilterRule>,
}

impl S3KeyFilter {
    /// Filter without rules; matches everything
    pub fn none() -> Self {
        Self::default()
    }

    pub fn prefix(value: impl Into<String>) -> Self {
        Self::none().with_prefix(value)
    }

    pub fn suffix(value: impl Into<String>) -> Self {
        Self::none().with_suffix(value)
    }

    pub fn with_prefix(mut self, value: impl Into<String>) -> Self {
        self.filter_rules.push(FilterRule::prefix(value));
        self
    }

    pub fn with_suffix(mut self, value: impl Into<String>) -> Self {
        self.filter_rules.push(FilterRule::suffix(value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filter_rules.is_empty()
    }

    /// Check if an object passes the filter
    pub fn matches(&self, object: &StorageObjectRef, semantics: FilterSemantics) -> bool {
        should_dispatch_with(object, &self.filter_rules, semantics)
    }
}

impl fmt::Display for S3KeyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self.filter_rules.iter().map(|r| r.to_string()).collect();
        f.write_str(&rules.join(" "))
    }
}

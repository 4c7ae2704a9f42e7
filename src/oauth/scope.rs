//! Scope sets with subset checks and canonical ordering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An unordered, duplicate-free set of scope names.
///
/// Scopes are kept in lexical order so that hashing and display are canonical
/// regardless of the order a caller supplied them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a space-delimited OAuth `scope` parameter.
    pub fn parse(scope: &str) -> Self {
        scope.split_whitespace().collect()
    }

    /// Returns true iff every scope in `candidate` is also in `superset`.
    pub fn is_subset<C, S>(candidate: C, superset: S) -> bool
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let superset: ScopeSet = superset.into_iter().collect();
        candidate
            .into_iter()
            .all(|scope| superset.contains(scope.as_ref()))
    }

    pub fn is_subset_of(&self, superset: &ScopeSet) -> bool {
        self.0.is_subset(&superset.0)
    }

    /// Scopes of `self` that are missing from `superset`, in canonical order.
    pub fn missing_from(&self, superset: &ScopeSet) -> Vec<String> {
        self.0.difference(&superset.0).cloned().collect()
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Scopes joined by single spaces in canonical order.
    pub fn to_scope_string(&self) -> String {
        self.iter().collect::<Vec<_>>().join(" ")
    }

    /// First scope token that fails [`validate_scope_token`], if any.
    pub fn first_invalid(&self) -> Option<&str> {
        self.iter().find(|scope| !validate_scope_token(scope))
    }
}

impl<S: AsRef<str>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(|s| s.as_ref().to_string()).collect())
    }
}

impl<'a> IntoIterator for &'a ScopeSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_scope_string())
    }
}

/// Validate a single scope name.
pub fn validate_scope_token(scope: &str) -> bool {
    !scope.is_empty()
        && scope
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '/'))
}

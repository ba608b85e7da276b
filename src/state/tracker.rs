//! Membership sets for visited and checked URLs
//!
//! Both sets share one implementation but are distinct types, so a URL can
//! only ever be recorded in the set the caller meant. A URL may be checked
//! without ever being visited (a dead end that was probed but never crawled).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::marker::PhantomData;

/// Marker for URLs whose page body was fetched and processed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visited;

/// Marker for URLs whose reachability was probed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checked;

/// A grow-only set of normalized URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlSet<K> {
    urls: HashSet<String>,
    kind: PhantomData<K>,
}

/// URLs that have been crawled as pages
pub type VisitedSet = UrlSet<Visited>;

/// URLs whose status has been probed
pub type CheckedSet = UrlSet<Checked>;

impl<K> UrlSet<K> {
    /// Creates an empty set
    pub fn new() -> Self {
        Self {
            urls: HashSet::new(),
            kind: PhantomData,
        }
    }

    /// Returns true if the URL is a member
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Inserts a URL, returning true if it was not already a member
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    /// Returns the number of members
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if the set has no members
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Iterates over members in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Returns the members sorted, for stable output
    pub fn sorted(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.iter().collect();
        urls.sort_unstable();
        urls
    }
}

impl<K, S: Into<String>> FromIterator<S> for UrlSet<K> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().map(Into::into).collect(),
            kind: PhantomData,
        }
    }
}

// Sets are written sorted so snapshot files diff cleanly between saves
impl<K> Serialize for UrlSet<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.sorted())
    }
}

impl<'de, K> Deserialize<'de> for UrlSet<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let urls = Vec::<String>::deserialize(deserializer)?;
        Ok(urls.into_iter().collect())
    }
}

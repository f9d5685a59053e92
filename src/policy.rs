//! Fetch policies and the backend operations they resolve to.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::ParsePolicyError;

/// Data source for a one-shot read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Source {
    /// Let the backend decide (server first, cache when offline)
    Default,
    /// Local cache only
    Cache,
    /// Server only
    Server,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Source::Default => "default",
            Source::Cache => "cache",
            Source::Server => "server",
        })
    }
}

/// Data source for a live subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListenSource {
    #[default]
    Default,
    Cache,
}

/// Options passed to [`Backend::subscribe`](crate::backend::Backend::subscribe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenOptions {
    /// Also notify when only snapshot metadata changed
    pub include_metadata_changes: bool,
    pub source: ListenSource,
}

/// How data for a reference is fetched
///
/// The serialized names match [`FetchPolicy::as_str`], so a policy can be read
/// from configuration:
///
/// ```rust
/// use dioxus_backend_hooks::policy::FetchPolicy;
///
/// let policy: FetchPolicy = "oneShotCacheThenServer".parse().unwrap();
/// assert_eq!(policy, FetchPolicy::OneShotCacheThenServer);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchPolicy {
    /// Live subscription against the default source
    #[default]
    LiveDefault,
    /// Live subscription, also notified on metadata-only changes
    LiveDefaultWithMetadata,
    /// Live subscription restricted to the local cache
    LiveCacheOnly,
    /// Cache-only live subscription with metadata notifications
    LiveCacheOnlyWithMetadata,
    /// Single read with the backend's default source resolution
    OneShotDefault,
    /// Cache read, falling back to a server read on any cache failure
    OneShotCacheThenServer,
    /// Cached value first, then one authoritative server value
    OneShotCacheAndServerMerge,
    /// Single cache read; fails if absent from cache
    OneShotCacheOnly,
    /// Single server read; fails if unreachable
    OneShotServerOnly,
}

/// Backend operations a policy resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// Open a subscription. With `until_server` it closes itself after the
    /// first snapshot that did not come from the cache.
    Subscribe {
        options: ListenOptions,
        until_server: bool,
    },
    /// Issue one read, optionally retried against `fallback` on failure
    Read {
        primary: Source,
        fallback: Option<Source>,
    },
}

impl FetchPolicy {
    pub const ALL: [FetchPolicy; 9] = [
        FetchPolicy::LiveDefault,
        FetchPolicy::LiveDefaultWithMetadata,
        FetchPolicy::LiveCacheOnly,
        FetchPolicy::LiveCacheOnlyWithMetadata,
        FetchPolicy::OneShotDefault,
        FetchPolicy::OneShotCacheThenServer,
        FetchPolicy::OneShotCacheAndServerMerge,
        FetchPolicy::OneShotCacheOnly,
        FetchPolicy::OneShotServerOnly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchPolicy::LiveDefault => "liveDefault",
            FetchPolicy::LiveDefaultWithMetadata => "liveDefaultWithMetadata",
            FetchPolicy::LiveCacheOnly => "liveCacheOnly",
            FetchPolicy::LiveCacheOnlyWithMetadata => "liveCacheOnlyWithMetadata",
            FetchPolicy::OneShotDefault => "oneShotDefault",
            FetchPolicy::OneShotCacheThenServer => "oneShotCacheThenServer",
            FetchPolicy::OneShotCacheAndServerMerge => "oneShotCacheAndServerMerge",
            FetchPolicy::OneShotCacheOnly => "oneShotCacheOnly",
            FetchPolicy::OneShotServerOnly => "oneShotServerOnly",
        }
    }

    /// Returns true for the `live*` policies
    pub fn is_live(&self) -> bool {
        self.as_str().starts_with("live")
    }

    /// Returns true if the policy is served by a subscription
    pub fn subscribes(&self) -> bool {
        self.is_live() || *self == FetchPolicy::OneShotCacheAndServerMerge
    }

    /// Resolve the policy to backend operations
    pub fn plan(&self) -> FetchPlan {
        let read = |primary, fallback| FetchPlan::Read { primary, fallback };
        match self {
            FetchPolicy::OneShotDefault => read(Source::Default, None),
            FetchPolicy::OneShotCacheThenServer => read(Source::Cache, Some(Source::Server)),
            FetchPolicy::OneShotCacheOnly => read(Source::Cache, None),
            FetchPolicy::OneShotServerOnly => read(Source::Server, None),
            subscribing => {
                let name = subscribing.as_str();
                FetchPlan::Subscribe {
                    options: ListenOptions {
                        include_metadata_changes: name.ends_with("WithMetadata"),
                        source: if name.starts_with("liveCache") {
                            ListenSource::Cache
                        } else {
                            ListenSource::Default
                        },
                    },
                    until_server: *subscribing == FetchPolicy::OneShotCacheAndServerMerge,
                }
            }
        }
    }
}

impl fmt::Display for FetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FetchPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FetchPolicy::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s)
            .ok_or_else(|| ParsePolicyError(s.to_string()))
    }
}

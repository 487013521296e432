//! Static + environment header construction.

use crate::types::EnvMeta;
use std::collections::BTreeMap;

pub const HEADER_CLIENT_ENV: &str = "x-client-env";
pub const HEADER_CLIENT_VERSION: &str = "x-client-version";
pub const HEADER_CORE_VERSION: &str = "x-core-version";
pub const HEADER_PLATFORM: &str = "x-platform";
pub const HEADER_USER_AGENT: &str = "x-user-agent";
pub const HEADER_PRIORITY: &str = "x-priority";
pub const DEFAULT_IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Header set with case-insensitive names.
///
/// Names are stored lowercased, so `X-Foo` and `x-foo` collide and the later
/// insert wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: BTreeMap<String, String>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `self` overlaid with `extra`; `extra` wins on collisions.
    pub fn merged(&self, extra: &HeaderSet) -> HeaderSet {
        let mut out = self.clone();
        for (k, v) in extra.iter() {
            out.insert(k, v);
        }
        out
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Base headers for every call: static headers first, then env metadata.
///
/// Env metadata overrides a static header of the same name.
pub fn build_headers(static_headers: &HeaderSet, env: Option<&EnvMeta>) -> HeaderSet {
    let mut out = static_headers.clone();
    if let Some(m) = env {
        out.insert(HEADER_CLIENT_ENV, m.env.as_str());
        if !m.extension_version.is_empty() {
            out.insert(HEADER_CLIENT_VERSION, m.extension_version.clone());
        }
        if let Some(v) = m.core_version.as_deref().filter(|v| !v.is_empty()) {
            out.insert(HEADER_CORE_VERSION, v);
        }
        if let Some(os) = m.os.as_deref().filter(|v| !v.is_empty()) {
            out.insert(HEADER_PLATFORM, os);
        }
        if let Some(ua) = m.user_agent_sanitized.as_deref().filter(|v| !v.is_empty()) {
            out.insert(HEADER_USER_AGENT, ua);
        }
    }
    out
}

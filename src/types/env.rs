use serde::{Deserialize, Serialize};

/// Kind of host embedding the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostEnv {
    /// Browser extension (manifest v3 background worker)
    Mv3,
    /// Editor extension
    Vscode,
    /// Web dashboard service layer
    Dashboard,
}

impl HostEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostEnv::Mv3 => "mv3",
            HostEnv::Vscode => "vscode",
            HostEnv::Dashboard => "dashboard",
        }
    }
}

/// Environment metadata sent with every call as `X-Client-*` headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvMeta {
    pub env: HostEnv,
    pub extension_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent_sanitized: Option<String>,
}

impl EnvMeta {
    pub fn new(env: HostEnv, extension_version: impl Into<String>) -> Self {
        Self {
            env,
            extension_version: extension_version.into(),
            core_version: None,
            os: None,
            user_agent_sanitized: None,
        }
    }

    /// Metadata describing this crate running on the current OS.
    pub fn detect(env: HostEnv, extension_version: impl Into<String>) -> Self {
        Self::new(env, extension_version)
            .with_core_version(env!("CARGO_PKG_VERSION"))
            .with_os(std::env::consts::OS)
    }

    pub fn with_core_version(mut self, v: impl Into<String>) -> Self {
        self.core_version = Some(v.into());
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent_sanitized = Some(ua.into());
        self
    }
}

//! JSON bodies returned by the Nexus REST API.

use serde::Deserialize;

/// Envelope of `/service/local/artifact/maven/resolve`.
#[derive(Debug, Deserialize)]
pub struct ResolveResponse {
    pub data: ResolvedArtifact,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedArtifact {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
}

/// Envelope of `/service/local/global_settings/current`.
#[derive(Debug, Deserialize)]
pub struct SettingsResponse {
    pub data: GlobalSettings,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default)]
    pub security_anonymous_access_enabled: bool,
}

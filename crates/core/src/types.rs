use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a plugin. Kept open: any string the host drives
/// through a status update is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginStatus(String);

impl PluginStatus {
    pub const DRAFT: &'static str = "Draft";
    pub const PUBLIC: &'static str = "Public";

    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn draft() -> Self {
        Self::new(Self::DRAFT)
    }

    pub fn public() -> Self {
        Self::new(Self::PUBLIC)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_draft(&self) -> bool {
        self.0 == Self::DRAFT
    }
}

impl Default for PluginStatus {
    fn default() -> Self {
        Self::draft()
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginStatus {
    fn from(status: &str) -> Self {
        Self::new(status)
    }
}

/// Metadata of an uploaded plugin archive. The bytes themselves are not stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// A marketplace plugin, either from the static catalog or user-submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub status: PluginStatus,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub readme: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "slug")]
    pub marketplace_slug: String,
    #[serde(default)]
    pub owner_user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub function_tags: BTreeSet<String>,
    #[serde(default)]
    pub version_labels: BTreeSet<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub file_info: Option<FileInfo>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub company: String,
}

impl PluginRecord {
    /// Case-insensitive substring match on title, description, or any tag.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.title.to_lowercase().contains(&q)
            || self.description.to_lowercase().contains(&q)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&q))
    }
}

/// How the plugin payload was provided at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum UploadSource {
    #[serde(rename = "github")]
    GitHub { url: String },
    File(FileInfo),
}

/// Fields accepted by a plugin submission. `title`, `workspace_id` and
/// `owner_user_id` are required; everything else has a default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPluginRequest {
    pub title: Option<String>,
    pub workspace_id: Option<String>,
    pub owner_user_id: Option<String>,
    #[serde(default)]
    pub readme: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub function_tags: BTreeSet<String>,
    #[serde(default)]
    pub version_labels: BTreeSet<String>,
    pub upload: Option<UploadSource>,
}

/// A (workspace, project) pair a plugin is installed into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallationRef {
    pub workspace_id: String,
    pub project_id: String,
}

/// Catalog ordering offered by the browse page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    Likes,
    Downloads,
    #[default]
    DateUploaded,
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    /// Unknown keys fall back to upload order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "likes" => SortKey::Likes,
            "downloads" => SortKey::Downloads,
            _ => SortKey::DateUploaded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, tags: &[&str]) -> PluginRecord {
        let now = Utc::now();
        PluginRecord {
            id: "plugin-1".into(),
            title: title.into(),
            workspace_id: "workspace-1".into(),
            status: PluginStatus::draft(),
            thumbnail_url: None,
            readme: String::new(),
            description: "Sync contacts with your CRM".into(),
            marketplace_slug: "x".into(),
            owner_user_id: "dev@example.com".into(),
            created_at: now,
            updated_at: now,
            images: Vec::new(),
            version: "1.0.0".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            function_tags: BTreeSet::new(),
            version_labels: BTreeSet::new(),
            github_url: None,
            file_info: None,
            likes: 0,
            downloads: 0,
            company: "Acme Corporation".into(),
        }
    }

    #[test]
    fn test_matches_title_description_and_tags() {
        let plugin = record("Salesforce Bridge", &["Integrations"]);
        assert!(plugin.matches("salesforce"));
        assert!(plugin.matches("CRM"));
        assert!(plugin.matches("integr"));
        assert!(!plugin.matches("analytics"));
    }

    #[test]
    fn test_status_is_open() {
        let status: PluginStatus = serde_json::from_str("\"Private\"").unwrap();
        assert_eq!(status.as_str(), "Private");
        assert!(!status.is_draft());
        assert_eq!(serde_json::to_string(&PluginStatus::public()).unwrap(), "\"Public\"");
    }

    #[test]
    fn test_record_wire_layout() {
        let mut plugin = record("Layout", &[]);
        plugin.file_info = Some(FileInfo {
            name: "plugin.zip".into(),
            size: 2048,
            mime_type: "application/zip".into(),
        });
        let json = serde_json::to_value(&plugin).unwrap();
        assert_eq!(json["marketplaceSlug"], "x");
        assert_eq!(json["ownerUserId"], "dev@example.com");
        assert_eq!(json["fileInfo"]["type"], "application/zip");
        assert_eq!(json["status"], "Draft");
    }

    #[test]
    fn test_legacy_slug_field_is_accepted() {
        let json = serde_json::json!({
            "id": "legacy",
            "title": "Legacy",
            "slug": "legacy-plugin",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });
        let plugin: PluginRecord = serde_json::from_value(json).unwrap();
        assert_eq!(plugin.marketplace_slug, "legacy-plugin");
        assert!(plugin.status.is_draft());
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("likes".parse::<SortKey>().unwrap(), SortKey::Likes);
        assert_eq!("Downloads".parse::<SortKey>().unwrap(), SortKey::Downloads);
        assert_eq!("date-uploaded".parse::<SortKey>().unwrap(), SortKey::DateUploaded);
        assert_eq!("whatever".parse::<SortKey>().unwrap(), SortKey::DateUploaded);
    }
}

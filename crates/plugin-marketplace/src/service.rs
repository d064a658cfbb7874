//! Plugin service — the async facade over the catalog, submissions, and
//! installations.
//!
//! Every operation sleeps for the configured artificial latency before doing
//! its work. Read-modify-write cycles on each blob are serialised by a
//! per-blob lock, so at most one writer touches a blob at a time within the
//! process. Nothing guards against other processes sharing the same storage.

use crate::catalog::{sort_records, PluginCatalog};
use crate::directory::CompanyDirectory;
use crate::persistence::LocalPersistence;
use crate::slug::generate_unique_slug;
use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use chrono::Utc;
use marketplace_core::config::{LatencyConfig, StorageBackend, StorageConfig};
use marketplace_core::types::{
    InstallationRef, PluginRecord, PluginStatus, SortKey, SubmitPluginRequest, UploadSource,
};
use marketplace_core::{AppConfig, MarketplaceError, MarketplaceResult};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const DEFAULT_VERSION: &str = "1.0.0";
const DESCRIPTION_PREVIEW_CHARS: usize = 200;

pub struct PluginService {
    catalog: PluginCatalog,
    persistence: LocalPersistence,
    companies: CompanyDirectory,
    latency: LatencyConfig,
    installations_lock: Mutex<()>,
    plugins_lock: Mutex<()>,
}

impl PluginService {
    /// Service over `storage` with the seed catalog, default keys, and default latency.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            catalog: PluginCatalog::new(),
            persistence: LocalPersistence::new(storage, &StorageConfig::default()),
            companies: CompanyDirectory::new(),
            latency: LatencyConfig::default(),
            installations_lock: Mutex::new(()),
            plugins_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AppConfig) -> MarketplaceResult<Self> {
        let storage: Arc<dyn KeyValueStorage> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(match config.storage.quota_bytes {
                Some(quota) => MemoryStorage::with_quota(quota),
                None => MemoryStorage::new(),
            }),
            StorageBackend::File => Arc::new(FileStorage::open(
                &config.storage.data_dir,
                config.storage.quota_bytes,
            )?),
        };

        info!(
            backend = ?config.storage.backend,
            plugins_key = %config.storage.plugins_key,
            installations_key = %config.storage.installations_key,
            "Plugin service configured"
        );

        Ok(Self {
            catalog: PluginCatalog::new(),
            persistence: LocalPersistence::new(storage, &config.storage),
            companies: CompanyDirectory::with_overrides(&config.companies),
            latency: config.latency,
            installations_lock: Mutex::new(()),
            plugins_lock: Mutex::new(()),
        })
    }

    pub fn with_latency(mut self, latency: LatencyConfig) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_catalog(mut self, catalog: PluginCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_companies(mut self, companies: CompanyDirectory) -> Self {
        self.companies = companies;
        self
    }

    async fn simulate_latency(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    // ─── Catalog ───────────────────────────────────────────────────────────

    pub async fn get_all_plugins(&self) -> Vec<PluginRecord> {
        Self::simulate_latency(self.latency.read()).await;
        self.catalog.list_all()
    }

    pub async fn get_plugin_by_id(&self, id: &str) -> Option<PluginRecord> {
        Self::simulate_latency(self.latency.read()).await;
        let plugin = self.catalog.get(id);
        if plugin.is_none() {
            debug!(plugin_id = id, "Catalog plugin not found");
        }
        plugin
    }

    pub async fn search_plugins(&self, query: &str) -> Vec<PluginRecord> {
        Self::simulate_latency(self.latency.read()).await;
        self.catalog.search(query)
    }

    pub async fn sort_plugins(&self, key: SortKey) -> Vec<PluginRecord> {
        Self::simulate_latency(self.latency.read()).await;
        sort_records(self.catalog.list_all(), key)
    }

    // ─── Installations ─────────────────────────────────────────────────────

    pub async fn install_plugin(
        &self,
        plugin_id: &str,
        workspace_id: &str,
        project_id: &str,
    ) -> MarketplaceResult<()> {
        Self::simulate_latency(self.latency.write()).await;
        let _guard = self.installations_lock.lock().await;

        let mut installations = self.persistence.load_installations();
        let installed = installations
            .entry(workspace_id.to_string())
            .or_default()
            .entry(project_id.to_string())
            .or_default();

        if installed.iter().any(|id| id == plugin_id) {
            return Err(MarketplaceError::AlreadyInstalled {
                plugin_id: plugin_id.to_string(),
                workspace_id: workspace_id.to_string(),
                project_id: project_id.to_string(),
            });
        }
        installed.push(plugin_id.to_string());
        self.persistence.save_installations(&installations)?;

        info!(
            plugin_id = plugin_id,
            workspace_id = workspace_id,
            project_id = project_id,
            "Plugin installed"
        );
        Ok(())
    }

    pub fn is_plugin_installed(&self, plugin_id: &str, workspace_id: &str, project_id: &str) -> bool {
        self.persistence
            .load_installations()
            .get(workspace_id)
            .and_then(|projects| projects.get(project_id))
            .is_some_and(|installed| installed.iter().any(|id| id == plugin_id))
    }

    /// Every (workspace, project) pair holding `plugin_id`. Scans the whole blob.
    pub async fn get_plugin_installations(&self, plugin_id: &str) -> Vec<InstallationRef> {
        Self::simulate_latency(self.latency.read()).await;
        let installations = self.persistence.load_installations();

        let mut found = Vec::new();
        for (workspace_id, projects) in &installations {
            for (project_id, installed) in projects {
                if installed.iter().any(|id| id == plugin_id) {
                    found.push(InstallationRef {
                        workspace_id: workspace_id.clone(),
                        project_id: project_id.clone(),
                    });
                }
            }
        }
        found
    }

    pub async fn get_installed_plugins(&self, workspace_id: &str, project_id: &str) -> Vec<String> {
        Self::simulate_latency(self.latency.read()).await;
        self.persistence
            .load_installations()
            .get(workspace_id)
            .and_then(|projects| projects.get(project_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Removes the first matching entry. Absent entries are not an error and
    /// leave storage untouched.
    pub async fn uninstall_plugin(
        &self,
        plugin_id: &str,
        workspace_id: &str,
        project_id: &str,
    ) -> MarketplaceResult<()> {
        Self::simulate_latency(self.latency.write()).await;
        let _guard = self.installations_lock.lock().await;

        let mut installations = self.persistence.load_installations();
        let removed = installations
            .get_mut(workspace_id)
            .and_then(|projects| projects.get_mut(project_id))
            .and_then(|installed| {
                let pos = installed.iter().position(|id| id == plugin_id)?;
                Some(installed.remove(pos))
            });
        if removed.is_none() {
            debug!(plugin_id = plugin_id, project_id = project_id, "Plugin not installed, nothing to remove");
            return Ok(());
        }

        self.persistence.save_installations(&installations)?;

        info!(
            plugin_id = plugin_id,
            workspace_id = workspace_id,
            project_id = project_id,
            "Plugin uninstalled"
        );
        Ok(())
    }

    // ─── Submissions ───────────────────────────────────────────────────────

    pub async fn submit_plugin(&self, request: SubmitPluginRequest) -> MarketplaceResult<PluginRecord> {
        let title = required(request.title, "title")?;
        let workspace_id = required(request.workspace_id, "workspaceId")?;
        let owner_user_id = required(request.owner_user_id, "ownerUserId")?;

        Self::simulate_latency(self.latency.submit()).await;
        let _guard = self.plugins_lock.lock().await;

        let mut plugins = self.persistence.load_submitted_plugins();
        let marketplace_slug = generate_unique_slug(Some(title.as_str()), &plugins);
        let description = request
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| readme_preview(&request.readme));
        let version = request
            .version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let (github_url, file_info) = match request.upload {
            Some(UploadSource::GitHub { url }) => (Some(url), None),
            Some(UploadSource::File(info)) => (None, Some(info)),
            None => (None, None),
        };

        let now = Utc::now();
        let record = PluginRecord {
            id: generate_plugin_id(),
            title,
            company: self.companies.company_for(&workspace_id).to_string(),
            workspace_id,
            status: PluginStatus::draft(),
            thumbnail_url: request.thumbnail_url,
            readme: request.readme,
            description,
            marketplace_slug,
            owner_user_id,
            created_at: now,
            updated_at: now,
            images: request.images,
            version,
            tags: request.tags,
            function_tags: request.function_tags,
            version_labels: request.version_labels,
            github_url,
            file_info,
            likes: 0,
            downloads: 0,
        };

        plugins.push(record.clone());
        if let Err(e) = self.persistence.save_submitted_plugins(&plugins) {
            warn!(
                title = %record.title,
                images = record.images.len(),
                error = %e,
                "Plugin submission could not be persisted"
            );
            return Err(e);
        }

        info!(
            plugin_id = %record.id,
            slug = %record.marketplace_slug,
            workspace_id = %record.workspace_id,
            "Plugin submitted"
        );
        Ok(record)
    }

    pub async fn list_submitted_plugins(&self) -> Vec<PluginRecord> {
        Self::simulate_latency(self.latency.read()).await;
        self.persistence.load_submitted_plugins()
    }

    /// Looks only at user-submitted plugins, never the static catalog.
    pub async fn get_plugin_by_slug(&self, slug: &str) -> Option<PluginRecord> {
        Self::simulate_latency(self.latency.read()).await;
        self.persistence
            .load_submitted_plugins()
            .into_iter()
            .find(|p| p.marketplace_slug == slug)
    }

    /// Any status value is accepted; no transition graph is enforced.
    pub async fn update_plugin_status(
        &self,
        plugin_id: &str,
        status: impl Into<PluginStatus>,
    ) -> MarketplaceResult<PluginRecord> {
        let status = status.into();
        Self::simulate_latency(self.latency.write()).await;
        let _guard = self.plugins_lock.lock().await;

        let mut plugins = self.persistence.load_submitted_plugins();
        let plugin = plugins
            .iter_mut()
            .find(|p| p.id == plugin_id)
            .ok_or_else(|| MarketplaceError::PluginNotFound(plugin_id.to_string()))?;

        let previous = std::mem::replace(&mut plugin.status, status);
        plugin.updated_at = Utc::now();
        let updated = plugin.clone();

        self.persistence.save_submitted_plugins(&plugins)?;
        info!(
            plugin_id = plugin_id,
            from = %previous,
            to = %updated.status,
            "Plugin status updated"
        );
        Ok(updated)
    }

    pub async fn get_plugins_by_workspace(&self, workspace_id: &str) -> Vec<PluginRecord> {
        Self::simulate_latency(self.latency.read()).await;
        self.persistence
            .load_submitted_plugins()
            .into_iter()
            .filter(|p| p.workspace_id == workspace_id)
            .collect()
    }
}

fn required(value: Option<String>, field: &'static str) -> MarketplaceResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(MarketplaceError::MissingField { field })
}

/// `plugin-<epoch millis>-<9 random base36 chars>`
fn generate_plugin_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("plugin-{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn readme_preview(readme: &str) -> String {
    if readme.is_empty() {
        return String::new();
    }
    let prefix: String = readme.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    format!("{prefix}...")
}

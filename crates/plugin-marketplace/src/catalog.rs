//! Static plugin catalog — read-only seed listings shown on the browse page.

use chrono::{Duration, TimeZone, Utc};
use marketplace_core::types::{PluginRecord, PluginStatus, SortKey};
use std::collections::BTreeSet;

pub struct PluginCatalog {
    plugins: Vec<PluginRecord>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::from_records(seed_plugins())
    }

    /// Catalog over externally supplied records, kept in the given order.
    pub fn from_records(plugins: Vec<PluginRecord>) -> Self {
        Self { plugins }
    }

    pub fn list_all(&self) -> Vec<PluginRecord> {
        self.plugins.clone()
    }

    pub fn get(&self, id: &str) -> Option<PluginRecord> {
        self.plugins.iter().find(|p| p.id == id).cloned()
    }

    pub fn search(&self, query: &str) -> Vec<PluginRecord> {
        self.plugins
            .iter()
            .filter(|p| p.matches(query))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable sort: likes and downloads descending, upload order left untouched.
pub fn sort_records(mut plugins: Vec<PluginRecord>, key: SortKey) -> Vec<PluginRecord> {
    match key {
        SortKey::Likes => plugins.sort_by(|a, b| b.likes.cmp(&a.likes)),
        SortKey::Downloads => plugins.sort_by(|a, b| b.downloads.cmp(&a.downloads)),
        SortKey::DateUploaded => {}
    }
    plugins
}

fn seed_plugins() -> Vec<PluginRecord> {
    let listings = [
        (
            "Segment CDP",
            "segment-cdp",
            "Integrations",
            "Sync user profiles and events with Segment",
        ),
        (
            "Salesforce CRM",
            "salesforce-crm",
            "Integrations",
            "Bidirectional sync with Salesforce leads and contacts",
        ),
        (
            "Snowflake Export",
            "snowflake-export",
            "Data",
            "Export project data to a Snowflake data warehouse",
        ),
        (
            "Custom ML Model",
            "custom-ml",
            "Machine Learning",
            "Bring your own ML model for scoring",
        ),
        (
            "Slack Notifications",
            "slack-notify",
            "Channels",
            "Send project alerts to Slack channels",
        ),
        (
            "WhatsApp Business",
            "whatsapp-biz",
            "Channels",
            "WhatsApp Business API messaging",
        ),
        (
            "Google Analytics 4",
            "ga4",
            "Analytics",
            "Export conversion events to GA4",
        ),
        (
            "Mixpanel Sync",
            "mixpanel-sync",
            "Analytics",
            "Bidirectional event sync with Mixpanel",
        ),
        (
            "Shopify E-Commerce",
            "shopify-ecom",
            "Integrations",
            "Product catalog and purchase sync",
        ),
        (
            "Stripe Revenue",
            "stripe-revenue",
            "Integrations",
            "Revenue attribution with Stripe",
        ),
        (
            "Data Anonymizer",
            "data-anon",
            "Data",
            "GDPR-compliant data anonymization",
        ),
        (
            "Webhook Relay",
            "webhook-relay",
            "Automation",
            "Forward events to external webhooks",
        ),
    ];

    let epoch = Utc
        .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);

    listings
        .into_iter()
        .enumerate()
        .map(|(i, (title, slug, category, desc))| {
            let uploaded = epoch + Duration::days(i as i64 * 7);
            let n = i as u64;
            PluginRecord {
                id: format!("catalog-{:03}", i + 1),
                title: title.to_string(),
                workspace_id: String::new(),
                status: PluginStatus::public(),
                thumbnail_url: None,
                readme: format!(
                    "# {title}\n\n{desc}.\n\nFull-featured integration with automatic sync, error handling, and monitoring."
                ),
                description: desc.to_string(),
                marketplace_slug: slug.to_string(),
                owner_user_id: String::new(),
                created_at: uploaded,
                updated_at: uploaded,
                images: Vec::new(),
                version: "1.0.0".to_string(),
                tags: BTreeSet::from([category.to_string(), slug.to_string()]),
                function_tags: BTreeSet::new(),
                version_labels: BTreeSet::from(["stable".to_string()]),
                github_url: None,
                file_info: None,
                // Spread the counters so the two orderings differ.
                likes: (n * 37 + 11) % 97 * 10,
                downloads: (12 - n) * 500 + 100,
                company: if i < 5 {
                    "Marketplace Labs".to_string()
                } else {
                    format!("Partner {i}")
                },
            }
        })
        .collect()
}

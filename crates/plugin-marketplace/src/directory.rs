//! Workspace → company display name lookup used when stamping submissions.

use std::collections::HashMap;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";

const BUILTIN_COMPANIES: &[(&str, &str)] = &[
    ("workspace-1", "Acme Corporation"),
    ("workspace-2", "Globex Industries"),
    ("workspace-3", "Initech Labs"),
    ("workspace-4", "Umbrella Analytics"),
    ("workspace-5", "Stark Digital"),
];

#[derive(Debug, Clone)]
pub struct CompanyDirectory {
    companies: HashMap<String, String>,
}

impl CompanyDirectory {
    pub fn new() -> Self {
        Self {
            companies: BUILTIN_COMPANIES
                .iter()
                .map(|(ws, name)| (ws.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// Built-in table with `overrides` layered on top.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut directory = Self::new();
        directory
            .companies
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        directory
    }

    pub fn company_for(&self, workspace_id: &str) -> &str {
        self.companies
            .get(workspace_id)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_COMPANY)
    }
}

impl Default for CompanyDirectory {
    fn default() -> Self {
        Self::new()
    }
}

//! Marketplace slugs — URL-safe identifiers derived from plugin titles.

use chrono::Utc;
use marketplace_core::types::PluginRecord;
use std::collections::HashSet;

/// Returned whenever a title has nothing usable left after cleaning.
pub const FALLBACK_SLUG: &str = "untitled-plugin";

/// Anything that may already hold a slug.
pub trait SlugSource {
    fn existing_slug(&self) -> Option<&str>;
}

impl SlugSource for PluginRecord {
    fn existing_slug(&self) -> Option<&str> {
        Some(self.marketplace_slug.as_str()).filter(|s| !s.is_empty())
    }
}

/// Loosely-typed records read `marketplaceSlug` first, then `slug`.
impl SlugSource for serde_json::Value {
    fn existing_slug(&self) -> Option<&str> {
        ["marketplaceSlug", "slug"]
            .iter()
            .filter_map(|field| self.get(field).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty())
    }
}

/// Lower-case `title`, turn whitespace/underscore runs into single hyphens,
/// drop everything outside `[a-z0-9-]` and trim stray hyphens.
pub fn generate_slug(title: Option<&str>) -> String {
    let Some(title) = title else {
        return FALLBACK_SLUG.to_string();
    };

    let mut slug = String::with_capacity(title.len());
    for c in title.trim().to_lowercase().chars() {
        let c = if c.is_whitespace() || c == '_' { '-' } else { c };
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            continue;
        }
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Base slug for `title`, suffixed `-1`, `-2`, ... until no record in
/// `existing` holds it. Probing is unbounded.
pub fn generate_unique_slug<'a, S, I>(title: Option<&str>, existing: I) -> String
where
    S: SlugSource + 'a,
    I: IntoIterator<Item = &'a S>,
{
    let base = generate_slug(title);
    let taken: HashSet<&str> = existing
        .into_iter()
        .filter_map(|record| record.existing_slug())
        .collect();

    if !taken.contains(base.as_str()) {
        return base;
    }

    (1u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or(base)
}

/// Base slug plus the last six digits of the epoch-millisecond clock, for
/// callers that cannot check existing slugs.
pub fn generate_slug_with_timestamp(title: Option<&str>) -> String {
    let millis = Utc::now().timestamp_millis().rem_euclid(1_000_000);
    format!("{}-{:06}", generate_slug(title), millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn is_well_formed(slug: &str) -> bool {
        !slug.is_empty()
            && slug.split('-').all(|part| {
                !part.is_empty()
                    && part
                        .chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            })
    }

    #[test]
    fn test_basic_slugs() {
        assert_eq!(generate_slug(Some("My Plugin!!")), "my-plugin");
        assert_eq!(generate_slug(Some("  Data__Sync   Tool ")), "data-sync-tool");
        assert_eq!(generate_slug(Some("--a---b--")), "a-b");
        assert_eq!(generate_slug(Some("Café Münster 2")), "caf-mnster-2");
    }

    #[test]
    fn test_fallback_slug() {
        assert_eq!(generate_slug(Some("")), FALLBACK_SLUG);
        assert_eq!(generate_slug(None), FALLBACK_SLUG);
        assert_eq!(generate_slug(Some("!!!")), FALLBACK_SLUG);
        assert_eq!(generate_slug(Some(" - _ ")), FALLBACK_SLUG);
    }

    #[test]
    fn test_slug_shape_holds_for_awkward_titles() {
        let titles = [
            "Hello, World",
            "a - b",
            "__init__",
            "Ünïcödé only",
            "Tabs\tand\nnewlines",
            "C++ / Rust #1",
            "-leading and trailing-",
        ];
        for title in titles {
            let slug = generate_slug(Some(title));
            assert!(
                is_well_formed(&slug) || slug == FALLBACK_SLUG,
                "bad slug {slug:?} for {title:?}"
            );
        }
    }

    #[test]
    fn test_unique_slug_suffixes() {
        let one = vec![json!({"marketplaceSlug": "foo"})];
        assert_eq!(generate_unique_slug(Some("Foo"), &one), "foo-1");

        let two = vec![
            json!({"marketplaceSlug": "foo"}),
            json!({"marketplaceSlug": "foo-1"}),
        ];
        assert_eq!(generate_unique_slug(Some("Foo"), &two), "foo-2");
    }

    #[test]
    fn test_unique_slug_reads_either_field_and_skips_empty() {
        let records = vec![
            json!({"slug": "bar"}),
            json!({"marketplaceSlug": "", "slug": "bar-1"}),
            json!({"marketplaceSlug": null}),
        ];
        assert_eq!(generate_unique_slug(Some("Bar"), &records), "bar-2");

        let empty: Vec<serde_json::Value> = Vec::new();
        assert_eq!(generate_unique_slug(Some("Bar"), &empty), "bar");
    }

    #[test]
    fn test_unique_slug_fills_gaps_in_order() {
        let records = vec![json!({"slug": "baz"}), json!({"slug": "baz-2"})];
        assert_eq!(generate_unique_slug(Some("baz"), &records), "baz-1");
    }

    #[test]
    fn test_timestamp_slug() {
        let slug = generate_slug_with_timestamp(Some("Timed Plugin"));
        let suffix = slug.strip_prefix("timed-plugin-").unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }
}

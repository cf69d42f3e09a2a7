//! Raw record → normalized [`Resource`].
//!
//! Normalization only fills defaults and resolves the category; it never
//! rejects a record.

use corpusgen_shared::{Author, BuildConfig, RawRecord, Resource, ResourceType, Stats};

use crate::category_map::CategoryMap;

/// Category table and fallback values applied to every record.
#[derive(Debug, Clone)]
pub struct NormalizeRules {
    pub categories: CategoryMap,
    pub fallback_author: Author,
    pub fallback_difficulty: String,
    pub fallback_last_updated: String,
}

impl NormalizeRules {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            categories: CategoryMap::from(&config.categories),
            fallback_author: Author {
                name: config.defaults.author_name.clone(),
                url: config.defaults.author_url.clone(),
            },
            fallback_difficulty: config.defaults.difficulty.clone(),
            fallback_last_updated: config.defaults.last_updated.clone(),
        }
    }
}

impl Default for NormalizeRules {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}

/// Build a fully populated [`Resource`] from a raw record.
///
/// `content_override` replaces the record's own `content` when present; the
/// prompt collection uses it to promote its alternate body field.
pub fn normalize_record(
    raw: RawRecord,
    resource_type: ResourceType,
    content_override: Option<String>,
    rules: &NormalizeRules,
) -> Resource {
    let slug = non_empty(raw.slug).unwrap_or_else(|| raw.id.clone());
    let tagline = non_empty(raw.tagline).unwrap_or_else(|| derive_tagline(&raw.description));

    let category_id = match raw.category.as_deref() {
        Some(name) => rules.categories.resolve(name),
        None => rules.categories.default_id(),
    }
    .to_string();

    let author = match raw.author {
        Some(a) => Author {
            name: a.name.unwrap_or_else(|| rules.fallback_author.name.clone()),
            url: a.url.unwrap_or_else(|| rules.fallback_author.url.clone()),
        },
        None => rules.fallback_author.clone(),
    };

    let stats = raw
        .stats
        .map(|s| Stats {
            votes: s.votes.unwrap_or(0),
            copies: s.copies.unwrap_or(0),
        })
        .unwrap_or_default();

    Resource {
        id: raw.id,
        title: raw.title,
        slug,
        tagline,
        description: raw.description,
        category_id,
        resource_type,
        tags: raw.tags.unwrap_or_default(),
        author,
        stats,
        difficulty: raw
            .difficulty
            .unwrap_or_else(|| rules.fallback_difficulty.clone()),
        last_updated: raw
            .last_updated
            .unwrap_or_else(|| rules.fallback_last_updated.clone()),
        featured: raw.featured.unwrap_or(false),
        content: content_override.or(raw.content),
        url: raw.url,
        language: raw.language,
        framework: raw.framework,
    }
}

/// The description up to and including its first `.`, or the whole trimmed
/// description when it has none.
pub fn derive_tagline(description: &str) -> String {
    match description.find('.') {
        Some(end) => description[..=end].to_string(),
        None => description.trim().to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn tagline_is_first_sentence() {
        assert_eq!(derive_tagline("Does X. Does Y."), "Does X.");
        assert_eq!(derive_tagline("  No period here  "), "No period here");
        assert_eq!(derive_tagline("\n  Indented. Rest."), "\n  Indented.");
        assert_eq!(derive_tagline("v1.2 support"), "v1.");
        assert_eq!(derive_tagline(""), "");
    }

    #[test]
    fn minimal_record_gets_every_default() {
        let rules = NormalizeRules::default();
        let r = normalize_record(
            raw(json!({ "id": "a", "title": "A", "description": "Does X. More." })),
            ResourceType::Config,
            None,
            &rules,
        );

        assert_eq!(r.slug, "a");
        assert_eq!(r.tagline, "Does X.");
        assert_eq!(r.category_id, "claude-md");
        assert!(r.tags.is_empty());
        assert_eq!(r.author, rules.fallback_author);
        assert_eq!(r.stats, Stats { votes: 0, copies: 0 });
        assert_eq!(r.difficulty, "intermediate");
        assert_eq!(r.last_updated, "2024-01-01");
        assert!(!r.featured);
        assert_eq!(r.content, None);
    }

    #[test]
    fn authored_values_win_over_defaults() {
        let r = normalize_record(
            raw(json!({
                "id": "next",
                "slug": "nextjs-app",
                "title": "Next.js",
                "description": "Long text.",
                "tagline": "Short.",
                "category": "Prompt Templates",
                "tags": ["react", "ssr"],
                "difficulty": "advanced",
                "author": { "name": "Ada", "url": "https://ada.dev" },
                "stats": { "votes": 3, "copies": 7 },
                "lastUpdated": "2024-05-01",
                "featured": true,
                "language": "typescript",
            })),
            ResourceType::Prompt,
            None,
            &NormalizeRules::default(),
        );

        assert_eq!(r.slug, "nextjs-app");
        assert_eq!(r.tagline, "Short.");
        assert_eq!(r.category_id, "prompts");
        assert_eq!(r.tags, vec!["react", "ssr"]);
        assert_eq!(r.difficulty, "advanced");
        assert_eq!(r.author.name, "Ada");
        assert_eq!(r.stats, Stats { votes: 3, copies: 7 });
        assert_eq!(r.last_updated, "2024-05-01");
        assert!(r.featured);
        assert_eq!(r.language.as_deref(), Some("typescript"));
        assert_eq!(r.resource_type, ResourceType::Prompt);
    }

    #[test]
    fn empty_slug_and_tagline_fall_back() {
        let r = normalize_record(
            raw(json!({ "id": "a", "slug": "", "tagline": " ", "title": "A", "description": "Hi. There." })),
            ResourceType::Tool,
            None,
            &NormalizeRules::default(),
        );
        assert_eq!(r.slug, "a");
        assert_eq!(r.tagline, "Hi.");
    }

    #[test]
    fn unmapped_category_uses_default_id() {
        let rules = NormalizeRules {
            categories: CategoryMap::new("misc").with("Guides", "guides"),
            ..NormalizeRules::default()
        };
        let r = normalize_record(
            raw(json!({ "id": "a", "title": "A", "description": "d", "category": "Unknown" })),
            ResourceType::Config,
            None,
            &rules,
        );
        assert_eq!(r.category_id, "misc");
    }

    #[test]
    fn partial_author_and_stats_are_completed() {
        let r = normalize_record(
            raw(json!({
                "id": "a", "title": "A", "description": "d",
                "author": { "name": "Ada" },
                "stats": { "votes": 4 },
                "tags": null,
            })),
            ResourceType::Config,
            None,
            &NormalizeRules::default(),
        );
        assert_eq!(r.author.name, "Ada");
        assert_eq!(r.author.url, "https://github.com");
        assert_eq!(r.stats, Stats { votes: 4, copies: 0 });
        assert!(r.tags.is_empty());
    }

    #[test]
    fn content_override_replaces_inline_content() {
        let record = raw(json!({ "id": "p", "title": "P", "description": "d", "content": "old" }));
        let r = normalize_record(
            record.clone(),
            ResourceType::Prompt,
            Some("promoted".into()),
            &NormalizeRules::default(),
        );
        assert_eq!(r.content.as_deref(), Some("promoted"));

        let r = normalize_record(record, ResourceType::Prompt, None, &NormalizeRules::default());
        assert_eq!(r.content.as_deref(), Some("old"));
    }

    #[test]
    fn unknown_fields_do_not_reach_output() {
        let r = normalize_record(
            raw(json!({ "id": "a", "title": "A", "description": "d", "internalNote": "x" })),
            ResourceType::Config,
            None,
            &NormalizeRules::default(),
        );
        let out = serde_json::to_value(&r).unwrap();
        assert!(out.get("internalNote").is_none());
        assert!(out.get("url").is_none());
        assert_eq!(out["type"], "config");
        assert_eq!(out["categoryId"], "claude-md");
    }
}

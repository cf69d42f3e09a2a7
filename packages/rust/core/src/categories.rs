//! Category descriptors: passthrough with the `featured` default applied.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use corpusgen_extract::{ExtractOptions, extract_literal};
use corpusgen_shared::{Category, Result};

use crate::reader::read_source_file;

/// Load the categories file.
///
/// A missing or unreadable file is fatal. A literal that cannot be
/// extracted yields an empty list with a warning.
#[instrument(skip(opts), fields(path = %path.display()))]
pub fn load_categories(path: &Path, opts: &ExtractOptions) -> Result<Vec<Category>> {
    let source = read_source_file(path)?;

    let records = extract_literal(&source.text, opts).and_then(|literal| {
        if literal.ignored_exports > 0 {
            warn!(file = %source.name, ignored = literal.ignored_exports, "multiple data exports, using the first");
        }
        literal.into_records()
    });

    let values = match records {
        Ok(values) => values,
        Err(e) => {
            warn!(file = %source.name, error = %e, "skipping categories file");
            return Ok(Vec::new());
        }
    };

    let categories = transform_categories(values);
    debug!(count = categories.len(), "categories loaded");
    Ok(categories)
}

/// Keep object entries, defaulting `featured`; drop everything else.
pub fn transform_categories(values: Vec<Value>) -> Vec<Category> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match value {
            Value::Object(map) => Some(normalize_category(map)),
            other => {
                warn!(index, value = %other, "dropping non-object category entry");
                None
            }
        })
        .collect()
}

fn normalize_category(mut map: Map<String, Value>) -> Category {
    if matches!(map.get("featured"), None | Some(Value::Null)) {
        map.insert("featured".to_string(), Value::Bool(false));
    }
    Category(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn featured_defaults_to_false() {
        let categories = transform_categories(vec![
            json!({ "id": "a", "name": "A" }),
            json!({ "id": "b", "featured": null }),
            json!({ "id": "c", "featured": true }),
        ]);
        assert_eq!(categories[0].0["featured"], false);
        assert_eq!(categories[1].0["featured"], false);
        assert!(categories[2].featured());
    }

    #[test]
    fn authored_key_order_is_kept() {
        let categories = transform_categories(vec![json!({
            "slug": "tools", "id": "tools", "icon": "wrench", "featured": true, "name": "Tools"
        })]);
        let keys: Vec<_> = categories[0].0.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["slug", "id", "icon", "featured", "name"]);
    }

    #[test]
    fn non_object_entries_are_dropped() {
        let categories =
            transform_categories(vec![json!("stray"), json!({ "id": "a" }), json!(null)]);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id(), Some("a"));
    }

    #[test]
    fn loads_array_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("categories.ts");
        std::fs::write(
            &path,
            r#"import type { Category } from './types';

export const categories: Category[] = [
  { id: 'claude-md', name: 'Claude.md Configurations', featured: true },
  { id: 'prompts', name: 'Prompt Templates' },
];
"#,
        )
        .unwrap();

        let categories = load_categories(&path, &ExtractOptions::default()).unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].id(), Some("claude-md"));
        assert!(!categories[1].featured());
    }

    #[test]
    fn unparsable_file_yields_empty_list() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("categories.ts");
        std::fs::write(&path, "export default [ buildCategories() ];").unwrap();

        let categories = load_categories(&path, &ExtractOptions::default()).unwrap();
        assert!(categories.is_empty());
    }

    #[test]
    fn missing_file_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_categories(&tmp.path().join("categories.ts"), &ExtractOptions::default())
            .unwrap_err();
        assert!(!err.is_recoverable());
    }
}

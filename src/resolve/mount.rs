//! Mounting strategies for resolved include data.
//!
//! A strategy owns the policy for attaching resolved content at a
//! document's mount point: which part of the resolved value to take,
//! how to combine it with existing data, and what to do when the
//! lookup produced nothing. The resolver routes to a strategy through
//! [`MountTable`], keyed by the normalized suffix of the include key;
//! the table is open to extension without touching dispatch logic.
//!
//! Every builtin strategy removes the include key and attaches data
//! under the alias: the include key with its trailing `Include`
//! stripped (`entityInclude` → `entity`).

use serde_json::{Map, Value};

/// Policy for attaching resolved data at a mount point.
///
/// `slot` is the object containing the include key; `resolved` is the
/// looked-up content, `None` when the lookup missed.
pub trait MountStrategy: Send + Sync {
    fn mount(&self, slot: &mut Map<String, Value>, include_key: &str, resolved: Option<Value>);
}

/// The alias an include key mounts under: the key with its trailing
/// `Include` stripped, case-insensitively.
///
/// A bare `include` key has no alias.
pub fn alias_for(include_key: &str) -> Option<&str> {
    const SUFFIX: &str = "include";
    if include_key.len() <= SUFFIX.len() {
        return None;
    }
    let split = include_key.len() - SUFFIX.len();
    if !include_key.is_char_boundary(split) || !include_key[split..].eq_ignore_ascii_case(SUFFIX) {
        return None;
    }
    Some(&include_key[..split])
}

// ============================================================================
// Builtin Strategies
// ============================================================================

/// Mounts the resolved document's inner content (`data.content`).
///
/// Mounts nothing when the lookup missed or the shape does not match.
pub struct EntityMount;

impl MountStrategy for EntityMount {
    fn mount(&self, slot: &mut Map<String, Value>, include_key: &str, resolved: Option<Value>) {
        slot.remove(include_key);
        let Some(alias) = alias_for(include_key) else {
            return;
        };
        let inner = resolved
            .as_ref()
            .and_then(|value| value.pointer("/data/content"))
            .cloned();
        if let Some(inner) = inner {
            slot.insert(alias.to_owned(), inner);
        }
    }
}

/// Mounts the resolved document's `data` field, falling back to the
/// whole value. Mounts nothing when the lookup missed.
pub struct ConfigMount;

impl MountStrategy for ConfigMount {
    fn mount(&self, slot: &mut Map<String, Value>, include_key: &str, resolved: Option<Value>) {
        slot.remove(include_key);
        let Some(alias) = alias_for(include_key) else {
            return;
        };
        if let Some(value) = resolved {
            let selected = match value.get("data") {
                Some(data) => data.clone(),
                None => value,
            };
            slot.insert(alias.to_owned(), selected);
        }
    }
}

/// Mounts the whole resolved value verbatim; a missed lookup leaves a
/// null placeholder so consumers can tell "resolved to nothing" from
/// "never referenced".
pub struct CustomMount;

impl MountStrategy for CustomMount {
    fn mount(&self, slot: &mut Map<String, Value>, include_key: &str, resolved: Option<Value>) {
        slot.remove(include_key);
        let Some(alias) = alias_for(include_key) else {
            return;
        };
        slot.insert(alias.to_owned(), resolved.unwrap_or(Value::Null));
    }
}

/// Shallow-merges an object result over an existing object at the
/// alias; any other shape replaces it. Mounts nothing on a miss.
pub struct LocaleMount;

impl MountStrategy for LocaleMount {
    fn mount(&self, slot: &mut Map<String, Value>, include_key: &str, resolved: Option<Value>) {
        slot.remove(include_key);
        let Some(alias) = alias_for(include_key) else {
            return;
        };
        let Some(value) = resolved else {
            return;
        };
        match (slot.get_mut(alias), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                for (key, val) in incoming {
                    existing.insert(key, val);
                }
            }
            (_, value) => {
                slot.insert(alias.to_owned(), value);
            }
        }
    }
}

/// Generic alias-without-type mount: the resolved value verbatim,
/// nothing on a miss. Used for query-sourced data.
pub struct AliasMount;

impl MountStrategy for AliasMount {
    fn mount(&self, slot: &mut Map<String, Value>, include_key: &str, resolved: Option<Value>) {
        slot.remove(include_key);
        let Some(alias) = alias_for(include_key) else {
            return;
        };
        if let Some(value) = resolved {
            slot.insert(alias.to_owned(), value);
        }
    }
}

// ============================================================================
// Dispatch Table
// ============================================================================

/// Suffix-keyed dispatch table of mounting strategies.
pub struct MountTable {
    entries: Vec<(String, Box<dyn MountStrategy>)>,
}

impl MountTable {
    /// The builtin strategies: entity, config, custom, locale.
    pub fn builtin() -> Self {
        let mut table = Self {
            entries: Vec::new(),
        };
        table.register("entityInclude", Box::new(EntityMount));
        table.register("configInclude", Box::new(ConfigMount));
        table.register("customInclude", Box::new(CustomMount));
        table.register("localeInclude", Box::new(LocaleMount));
        table
    }

    /// Register a strategy for a key-name suffix. A later registration
    /// for the same suffix wins.
    pub fn register(&mut self, suffix: &str, strategy: Box<dyn MountStrategy>) {
        self.entries.push((suffix.to_lowercase(), strategy));
    }

    /// Find the strategy whose suffix matches `include_key`,
    /// case-insensitively.
    pub fn dispatch(&self, include_key: &str) -> Option<&dyn MountStrategy> {
        let key = include_key.to_lowercase();
        self.entries
            .iter()
            .rev()
            .find(|(suffix, _)| key.ends_with(suffix))
            .map(|(_, strategy)| strategy.as_ref())
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slot(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("slot fixture must be an object"),
        }
    }

    #[test]
    fn test_alias_for() {
        assert_eq!(alias_for("entityInclude"), Some("entity"));
        assert_eq!(alias_for("queryInclude"), Some("query"));
        assert_eq!(alias_for("relatedQueryInclude"), Some("relatedQuery"));
        assert_eq!(alias_for("entityINCLUDE"), Some("entity"));
        assert_eq!(alias_for("include"), None);
        assert_eq!(alias_for("entity"), None);
    }

    #[test]
    fn test_entity_mount_inner_content() {
        let mut slot = slot(json!({"entityInclude": "en/node/article/1.json"}));
        let resolved = json!({"data": {"content": {"title": "one"}}});

        EntityMount.mount(&mut slot, "entityInclude", Some(resolved));

        assert!(!slot.contains_key("entityInclude"));
        assert_eq!(slot["entity"], json!({"title": "one"}));
    }

    #[test]
    fn test_entity_mount_shape_mismatch() {
        let mut slot = slot(json!({"entityInclude": "en/node/article/1.json"}));
        let resolved = json!({"title": "no data.content here"});

        EntityMount.mount(&mut slot, "entityInclude", Some(resolved));

        assert!(!slot.contains_key("entityInclude"));
        assert!(!slot.contains_key("entity"));
    }

    #[test]
    fn test_entity_mount_miss() {
        let mut slot = slot(json!({"entityInclude": "en/missing.json"}));
        EntityMount.mount(&mut slot, "entityInclude", None);
        assert!(slot.is_empty());
    }

    #[test]
    fn test_config_mount_prefers_data() {
        let mut slot = slot(json!({"configInclude": "en/config/site.json"}));
        ConfigMount.mount(
            &mut slot,
            "configInclude",
            Some(json!({"data": {"theme": "dark"}, "meta": 1})),
        );
        assert_eq!(slot["config"], json!({"theme": "dark"}));
    }

    #[test]
    fn test_config_mount_whole_value_fallback() {
        let mut slot = slot(json!({"configInclude": "en/config/site.json"}));
        ConfigMount.mount(&mut slot, "configInclude", Some(json!({"theme": "dark"})));
        assert_eq!(slot["config"], json!({"theme": "dark"}));
    }

    #[test]
    fn test_custom_mount_null_placeholder_on_miss() {
        let mut slot = slot(json!({"customInclude": "en/missing.json"}));
        CustomMount.mount(&mut slot, "customInclude", None);
        assert_eq!(slot["custom"], Value::Null);
    }

    #[test]
    fn test_locale_mount_merges_objects() {
        let mut slot = slot(json!({
            "locale": {"greeting": "hello", "farewell": "bye"},
            "localeInclude": "en/locale/common.json"
        }));
        LocaleMount.mount(
            &mut slot,
            "localeInclude",
            Some(json!({"greeting": "hi", "welcome": "welcome"})),
        );

        assert_eq!(
            slot["locale"],
            json!({"greeting": "hi", "farewell": "bye", "welcome": "welcome"})
        );
    }

    #[test]
    fn test_locale_mount_replaces_non_object() {
        let mut slot = slot(json!({"localeInclude": "en/locale/common.json"}));
        LocaleMount.mount(&mut slot, "localeInclude", Some(json!(["a", "b"])));
        assert_eq!(slot["locale"], json!(["a", "b"]));
    }

    #[test]
    fn test_alias_mount_verbatim() {
        let mut slot = slot(json!({"queryInclude": "related?tag=x"}));
        AliasMount.mount(&mut slot, "queryInclude", Some(json!([1, 2, 3])));
        assert_eq!(slot["query"], json!([1, 2, 3]));
    }

    #[test]
    fn test_table_dispatch_by_suffix() {
        let table = MountTable::builtin();
        assert!(table.dispatch("entityInclude").is_some());
        assert!(table.dispatch("heroEntityInclude").is_some());
        assert!(table.dispatch("ENTITYINCLUDE").is_some());
        assert!(table.dispatch("queryInclude").is_none());
        assert!(table.dispatch("somethingElse").is_none());
    }

    #[test]
    fn test_table_later_registration_wins() {
        struct Marker;
        impl MountStrategy for Marker {
            fn mount(&self, slot: &mut Map<String, Value>, key: &str, _resolved: Option<Value>) {
                slot.remove(key);
                slot.insert("marker".into(), json!(true));
            }
        }

        let mut table = MountTable::builtin();
        table.register("entityInclude", Box::new(Marker));

        let mut slot = slot(json!({"entityInclude": "x"}));
        table
            .dispatch("entityInclude")
            .unwrap()
            .mount(&mut slot, "entityInclude", None);
        assert_eq!(slot["marker"], json!(true));
    }
}

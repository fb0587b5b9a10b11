//! Define table types and extraction from a parsed config document.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{kind_of, SchemaError};

/// Top-level document key holding the define table.
pub const DEFINE_KEY: &str = "define";

/// Replacement source text for a define.
///
/// The text is inserted into program source exactly as written. It is never
/// quoted or escaped: `'butterfly'` stays a single-quoted string expression,
/// `butterfly` stays an identifier reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RawExpr(String);

impl RawExpr {
    /// Wrap replacement text without touching it.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z_$][A-Za-z0-9_$]*)*$")
            .expect("define key pattern is valid")
    })
}

/// Check that `key` is an identifier or a dotted identifier chain.
pub fn validate_key(key: &str) -> Result<(), SchemaError> {
    if key_pattern().is_match(key) {
        Ok(())
    } else {
        Err(SchemaError::InvalidKey(key.to_string()))
    }
}

/// Mapping from define key to replacement expression.
///
/// Keys and expressions are validated by `insert`, the only way to add an
/// entry. Iteration order is sorted by key so that listing and serializing
/// the same table always gives the same output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DefineMap {
    entries: BTreeMap<String, RawExpr>,
}

impl DefineMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a define, returning the replaced expression if the key existed.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        expr: RawExpr,
    ) -> Result<Option<RawExpr>, SchemaError> {
        let key = key.into();
        validate_key(&key)?;
        if expr.as_str().trim().is_empty() {
            return Err(SchemaError::EmptyExpression(key));
        }
        Ok(self.entries.insert(key, expr))
    }

    pub fn get(&self, key: &str) -> Option<&RawExpr> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawExpr)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Layer `overlay` on top of this table. Overlay entries win on key
    /// collisions; the keys that were overridden are returned in order.
    pub fn overlay(&mut self, overlay: DefineMap) -> Vec<String> {
        let mut overridden = Vec::new();
        for (key, expr) in overlay.entries {
            if self.entries.insert(key.clone(), expr).is_some() {
                overridden.push(key);
            }
        }
        overridden
    }
}

impl<'a> IntoIterator for &'a DefineMap {
    type Item = (&'a String, &'a RawExpr);
    type IntoIter = std::collections::btree_map::Iter<'a, String, RawExpr>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Pull the `define` table out of a parsed config document.
///
/// A missing `define` key (or a document that is not a table at all) gives an
/// empty map. Values are taken exactly as the format parser produced them.
pub fn extract_defines(doc: &Value) -> Result<DefineMap, SchemaError> {
    let mut defines = DefineMap::new();

    let table = match doc.get(DEFINE_KEY) {
        None => return Ok(defines),
        Some(Value::Object(table)) => table,
        Some(other) => {
            return Err(SchemaError::NotATable {
                found: kind_of(other),
            })
        }
    };

    for (key, value) in table {
        let text = match value {
            Value::String(s) => s,
            other => {
                return Err(SchemaError::NonStringValue {
                    key: key.clone(),
                    found: kind_of(other),
                })
            }
        };
        defines.insert(key.as_str(), RawExpr::new(text.as_str()))?;
    }

    Ok(defines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_define_is_empty() {
        let doc = json!({"logLevel": "debug"});
        let defines = extract_defines(&doc).unwrap();
        assert!(defines.is_empty());
    }

    #[test]
    fn test_non_object_document_is_empty() {
        let defines = extract_defines(&json!([1, 2, 3])).unwrap();
        assert!(defines.is_empty());
    }

    #[test]
    fn test_value_kept_verbatim() {
        let doc = json!({"define": {"caterpillar": "'butterfly'"}});
        let defines = extract_defines(&doc).unwrap();
        assert_eq!(defines.get("caterpillar").unwrap().as_str(), "'butterfly'");
    }

    #[test]
    fn test_unquoted_value_stays_unquoted() {
        let doc = json!({"define": {"DEBUG": "false", "ALIAS": "window.other"}});
        let defines = extract_defines(&doc).unwrap();
        assert_eq!(defines.get("DEBUG").unwrap().as_str(), "false");
        assert_eq!(defines.get("ALIAS").unwrap().as_str(), "window.other");
    }

    #[test]
    fn test_define_not_a_table() {
        let doc = json!({"define": ["caterpillar"]});
        let err = extract_defines(&doc).unwrap_err();
        assert_eq!(err, SchemaError::NotATable { found: "an array" });
    }

    #[test]
    fn test_non_string_value() {
        let doc = json!({"define": {"caterpillar": 1}});
        let err = extract_defines(&doc).unwrap_err();
        assert_eq!(
            err,
            SchemaError::NonStringValue {
                key: "caterpillar".to_string(),
                found: "a number"
            }
        );
    }

    #[test]
    fn test_nested_table_rejected() {
        let doc = json!({"define": {"process": {"env": "{}"}}});
        assert!(matches!(
            extract_defines(&doc),
            Err(SchemaError::NonStringValue { .. })
        ));
    }

    #[test]
    fn test_dotted_key_accepted() {
        let doc = json!({"define": {"process.env.NODE_ENV": "\"production\""}});
        let defines = extract_defines(&doc).unwrap();
        assert!(defines.contains_key("process.env.NODE_ENV"));
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["", "1abc", "a-b", "a..b", ".a", "a.", "a b"] {
            assert_eq!(
                validate_key(key),
                Err(SchemaError::InvalidKey(key.to_string())),
                "key {:?} should be rejected",
                key
            );
        }
        for key in ["a", "_a1", "$", "a.b.c", "process.env.$X"] {
            assert!(validate_key(key).is_ok(), "key {:?} should be accepted", key);
        }
    }

    #[test]
    fn test_insert_rejects_invalid_entries() {
        let mut defines = DefineMap::new();
        assert!(defines.insert("a b", RawExpr::new("1")).is_err());
        assert!(defines.insert("ok", RawExpr::new("")).is_err());
        assert!(defines.is_empty());
    }

    #[test]
    fn test_empty_expression_rejected() {
        let doc = json!({"define": {"caterpillar": "  "}});
        assert_eq!(
            extract_defines(&doc),
            Err(SchemaError::EmptyExpression("caterpillar".to_string()))
        );
    }

    #[test]
    fn test_overlay_last_wins() {
        let mut base = DefineMap::new();
        base.insert("a", RawExpr::new("1")).unwrap();
        base.insert("b", RawExpr::new("2")).unwrap();

        let mut top = DefineMap::new();
        top.insert("b", RawExpr::new("3")).unwrap();
        top.insert("c", RawExpr::new("4")).unwrap();

        let overridden = base.overlay(top);
        assert_eq!(overridden, vec!["b".to_string()]);
        assert_eq!(base.get("a").unwrap().as_str(), "1");
        assert_eq!(base.get("b").unwrap().as_str(), "3");
        assert_eq!(base.get("c").unwrap().as_str(), "4");
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut defines = DefineMap::new();
        defines.insert("caterpillar", RawExpr::new("'butterfly'")).unwrap();
        let json = serde_json::to_value(&defines).unwrap();
        assert_eq!(json, json!({"caterpillar": "'butterfly'"}));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut defines = DefineMap::new();
        defines.insert("zeta", RawExpr::new("1")).unwrap();
        defines.insert("alpha", RawExpr::new("2")).unwrap();
        let keys: Vec<&str> = defines.keys().collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }
}

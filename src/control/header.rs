//! Header mappings and the deep merge used to reconcile them
//!
//! Markdown headers are open-ended YAML mappings. They are held as an
//! insertion-ordered [`HeaderMap`] of [`HeaderValue`]s so a merge never
//! reorders the keys an author wrote.

use serde_yaml::{Mapping, Value};

/// A header value: a scalar, a list, or a nested mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Scalar(String),
    List(Vec<HeaderValue>),
    Map(HeaderMap),
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<HeaderMap> for HeaderValue {
    fn from(map: HeaderMap) -> Self {
        Self::Map(map)
    }
}

impl<T: Into<HeaderValue>> From<Vec<T>> for HeaderValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Insertion-ordered string-keyed mapping
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderMap {
    entries: Vec<(String, HeaderValue)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut HeaderValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; a replaced key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HeaderValue>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<HeaderValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Build from a YAML value; `None` unless the value is a mapping
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match HeaderValue::from_yaml(value) {
            HeaderValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn to_yaml(&self) -> Value {
        let mut mapping = Mapping::new();
        for (key, value) in self.iter() {
            mapping.insert(Value::String(key.to_string()), value.to_yaml());
        }
        Value::Mapping(mapping)
    }
}

impl<K: Into<String>, V: Into<HeaderValue>> FromIterator<(K, V)> for HeaderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        // non-scalar keys are flattened to their YAML text
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl HeaderValue {
    /// Convert a YAML value; numbers, booleans and null become scalar text
    pub fn from_yaml(value: &Value) -> Self {
        match value {
            Value::Sequence(items) => Self::List(items.iter().map(Self::from_yaml).collect()),
            Value::Mapping(mapping) => Self::Map(HeaderMap {
                entries: mapping
                    .iter()
                    .map(|(k, v)| (scalar_text(k), Self::from_yaml(v)))
                    .collect(),
            }),
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
            scalar => Self::Scalar(scalar_text(scalar)),
        }
    }

    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Scalar(s) => Value::String(s.clone()),
            Self::List(items) => Value::Sequence(items.iter().map(Self::to_yaml).collect()),
            Self::Map(map) => map.to_yaml(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HeaderMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Merge `src` into `dest`.
///
/// Keys only in `src` are always added. When both sides hold a mapping the
/// merge recurses; when both hold a list, items of `src` not already in
/// `dest` are appended. Any other collision keeps `dest` unless `overwrite`.
pub fn merge_dicts_deep(dest: &mut HeaderMap, src: &HeaderMap, overwrite: bool) {
    for (key, src_value) in src.iter() {
        let Some(dest_value) = dest.get_mut(key) else {
            dest.insert(key, src_value.clone());
            continue;
        };
        match (dest_value, src_value) {
            (HeaderValue::Map(dest_map), HeaderValue::Map(src_map)) => {
                merge_dicts_deep(dest_map, src_map, overwrite);
            }
            (HeaderValue::List(dest_items), HeaderValue::List(src_items)) => {
                for item in src_items {
                    if !dest_items.contains(item) {
                        dest_items.push(item.clone());
                    }
                }
            }
            (slot, _) if overwrite => *slot = src_value.clone(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, HeaderValue)>) -> HeaderMap {
        entries.into_iter().collect()
    }

    #[test]
    fn test_merge_into_empty_adds_keys() {
        let mut dest = HeaderMap::new();
        merge_dicts_deep(&mut dest, &map(vec![("a", "1".into())]), false);
        assert_eq!(dest, map(vec![("a", "1".into())]));
    }

    #[test]
    fn test_merge_scalar_collision_keeps_dest() {
        let mut dest = map(vec![("a", "1".into())]);
        merge_dicts_deep(&mut dest, &map(vec![("a", "2".into())]), false);
        assert_eq!(dest, map(vec![("a", "1".into())]));
    }

    #[test]
    fn test_merge_scalar_collision_overwrites() {
        let mut dest = map(vec![("a", "1".into())]);
        merge_dicts_deep(&mut dest, &map(vec![("a", "2".into())]), true);
        assert_eq!(dest, map(vec![("a", "2".into())]));
    }

    #[test]
    fn test_merge_lists_append_novel_items() {
        let mut dest = map(vec![("a", vec!["1"].into())]);
        merge_dicts_deep(&mut dest, &map(vec![("a", vec!["1", "2"].into())]), false);
        assert_eq!(dest, map(vec![("a", vec!["1", "2"].into())]));
    }

    #[test]
    fn test_merge_nested_maps_recurse() {
        let mut dest = map(vec![
            ("title", "Edited".into()),
            ("params", map(vec![("p1", "mine".into())]).into()),
        ]);
        let src = map(vec![
            ("params", map(vec![("p1", "new".into()), ("p2", "added".into())]).into()),
            ("title", "Generated".into()),
            ("sort-id", "ac-01".into()),
        ]);
        merge_dicts_deep(&mut dest, &src, false);

        let keys: Vec<&str> = dest.keys().collect();
        assert_eq!(keys, vec!["title", "params", "sort-id"]);
        assert_eq!(dest.get("title").and_then(HeaderValue::as_str), Some("Edited"));
        let params = dest.get("params").and_then(HeaderValue::as_map).unwrap();
        assert_eq!(params.get("p1").and_then(HeaderValue::as_str), Some("mine"));
        assert_eq!(params.get("p2").and_then(HeaderValue::as_str), Some("added"));
    }

    #[test]
    fn test_merge_mismatched_kinds_follow_overwrite() {
        let mut dest = map(vec![("a", "scalar".into())]);
        let src = map(vec![("a", vec!["x"].into())]);
        merge_dicts_deep(&mut dest, &src, false);
        assert_eq!(dest.get("a"), Some(&HeaderValue::from("scalar")));
        merge_dicts_deep(&mut dest, &src, true);
        assert_eq!(dest.get("a"), Some(&HeaderValue::from(vec!["x"])));
    }

    #[test]
    fn test_yaml_conversion_preserves_order() {
        let yaml: Value = serde_yaml::from_str("z: 1\na: [x, true]\nm:\n  k: ~\n").unwrap();
        let header = HeaderMap::from_yaml(&yaml).unwrap();
        let keys: Vec<&str> = header.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(header.get("z"), Some(&HeaderValue::from("1")));
        assert_eq!(header.get("a"), Some(&HeaderValue::from(vec!["x", "true"])));

        let back = HeaderMap::from_yaml(&header.to_yaml()).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn test_from_yaml_rejects_non_mapping() {
        assert!(HeaderMap::from_yaml(&Value::String("x".into())).is_none());
    }
}

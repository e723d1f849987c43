use crate::error::LoadError;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TAGS_DIR: &str = "tags";

/// Ordered key/value tags of one way. Keys are unique and keep their
/// declaration order, which is the order they are reported in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    entries: Vec<(String, String)>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replaces the value of an existing key in place, otherwise appends.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (key, value) in iter {
            tags.insert(key, value);
        }
        tags
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TagsVisitor;

        impl<'de> Visitor<'de> for TagsVisitor {
            type Value = Tags;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of string tags")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Tags, A::Error> {
                let mut tags = Tags::new();
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    tags.insert(key, value);
                }
                Ok(tags)
            }
        }

        deserializer.deserialize_map(TagsVisitor)
    }
}

impl Serialize for Tags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Up,
    Down,
}

/// One way worth of tags, as declared in an example.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagGroup {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub tags: Tags,
}

impl TagGroup {
    pub fn new(name: Option<&str>, tags: Tags) -> Self {
        Self {
            name: name.map(str::to_string),
            direction: Direction::Up,
            tags,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExampleData {
    #[serde(default)]
    sort_weight: f64,
    #[serde(default)]
    ways: Vec<TagGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub name: String,
    pub sort_weight: f64,
    pub groups: Vec<TagGroup>,
}

impl Example {
    pub fn new(name: impl Into<String>, sort_weight: f64, groups: Vec<TagGroup>) -> Self {
        Self {
            name: name.into(),
            sort_weight,
            groups,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TagGroup> {
        self.groups.iter()
    }
}

/// Parses one tag file: a JSON object of example name to example data.
/// Examples keep the order they are declared in.
pub fn parse_examples(contents: &str, path: &Path) -> Result<Vec<Example>, LoadError> {
    let root: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(contents).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    let mut examples = Vec::with_capacity(root.len());
    for (name, value) in root {
        let data: ExampleData =
            serde_json::from_value(value).map_err(|source| LoadError::Example {
                path: path.to_path_buf(),
                example: name.clone(),
                source,
            })?;
        examples.push(Example::new(name, data.sort_weight, data.ways));
    }
    Ok(examples)
}

/// Reads every `*.json` file in `dir` and returns all examples ordered by
/// ascending sort weight. Equal weights keep discovery order (files by name,
/// then declaration order within a file). Any unreadable or malformed file
/// fails the whole load.
pub fn load_examples(dir: &Path) -> Result<Vec<Example>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| ext == "json")
            .unwrap_or(false);
        if is_json && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut examples = Vec::new();
    for path in files {
        let contents = std::fs::read_to_string(&path).map_err(|source| LoadError::Read {
            path: path.clone(),
            source,
        })?;
        let parsed = parse_examples(&contents, &path)?;
        debug!(path = %path.display(), examples = parsed.len(), "loaded tag file");
        examples.extend(parsed);
    }
    sort_examples(&mut examples);
    Ok(examples)
}

/// Stable ascending sort by sort weight.
pub fn sort_examples(examples: &mut [Example]) {
    examples.sort_by(|a, b| {
        a.sort_weight
            .partial_cmp(&b.sort_weight)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_keep_declaration_order() {
        let tags: Tags = serde_json::from_str(r#"{"zeta": "1", "alpha": "2", "mid": "3"}"#).unwrap();
        let keys: Vec<&str> = tags.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn tags_insert_replaces_existing_key() {
        let mut tags = Tags::new();
        tags.insert("highway", "road");
        tags.insert("lanes", "2");
        tags.insert("highway", "path");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("highway"), Some("path"));
    }

    #[test]
    fn tags_reject_non_string_values() {
        assert!(serde_json::from_str::<Tags>(r#"{"lanes": 2}"#).is_err());
    }

    #[test]
    fn parse_example_defaults() {
        let examples = parse_examples(
            r#"{"Plain": {"ways": [{"tags": {"highway": "road"}}]}}"#,
            Path::new("inline.json"),
        )
        .unwrap();
        assert_eq!(examples.len(), 1);
        let example = &examples[0];
        assert_eq!(example.name, "Plain");
        assert_eq!(example.sort_weight, 0.0);
        assert_eq!(example.groups[0].name, None);
        assert_eq!(example.groups[0].direction, Direction::Up);
        assert_eq!(example.groups[0].tags.get("highway"), Some("road"));
    }

    #[test]
    fn parse_keeps_example_and_way_order() {
        let examples = parse_examples(
            r#"{
                "B": {"ways": [{"name": "first", "direction": "down", "tags": {}}, {"name": "second"}]},
                "A": {"sort_weight": 2}
            }"#,
            Path::new("inline.json"),
        )
        .unwrap();
        assert_eq!(examples[0].name, "B");
        assert_eq!(examples[1].name, "A");
        assert_eq!(examples[0].groups[0].name.as_deref(), Some("first"));
        assert_eq!(examples[0].groups[0].direction, Direction::Down);
        assert_eq!(examples[0].groups[1].name.as_deref(), Some("second"));
        assert!(examples[1].is_empty());
    }

    #[test]
    fn malformed_example_names_file_and_example() {
        let err = parse_examples(r#"{"Broken": {"ways": 3}}"#, Path::new("bad.json")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("bad.json"));
        assert!(message.contains("Broken"));
    }

    #[test]
    fn sort_is_stable_by_weight() {
        let mut examples = vec![
            Example::new("three", 3.0, Vec::new()),
            Example::new("one", 1.0, Vec::new()),
            Example::new("two-a", 2.0, Vec::new()),
            Example::new("two-b", 2.0, Vec::new()),
        ];
        sort_examples(&mut examples);
        let names: Vec<&str> = examples.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two-a", "two-b", "three"]);
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;

use crate::error::{Error, Result, ensure_parent_dir};

pub const SEGMENT_PREFIX: &str = "Segment ";
pub const RIGHT_EDGE: &str = "Right Edge";
pub const TOP_EDGE: &str = "Top Edge";
pub const LEFT_EDGE: &str = "Left Edge";
pub const SURFACE: &str = "Square Surface";

/// Physical tag -> name for the 1D boundary groups of a mesh.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagDictionary {
    entries: BTreeMap<i32, String>,
}

impl TagDictionary {
    pub fn new() -> Self {
        Self::default()
    }
    /// Numbering of a rectangle whose bottom edge is cut into `num_segments`:
    /// segments `1..=n`, then right, top and left edges.
    pub fn segmented_rectangle(num_segments: usize) -> Self {
        let mut dict = Self::new();
        for i in 1..=num_segments {
            dict.insert(i as i32, segment_name(i));
        }
        let n = num_segments as i32;
        dict.insert(n + 1, RIGHT_EDGE);
        dict.insert(n + 2, TOP_EDGE);
        dict.insert(n + 3, LEFT_EDGE);
        dict
    }
    pub fn insert(&mut self, tag: i32, name: impl Into<String>) {
        self.entries.insert(tag, name.into());
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn name(&self, tag: i32) -> Option<&str> {
        self.entries.get(&tag).map(String::as_str)
    }
    pub fn tag_of(&self, name: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(&tag, _)| tag)
    }
    /// Tags of every `"Segment i"` entry, in tag order.
    pub fn segment_tags(&self) -> Vec<i32> {
        self.entries
            .iter()
            .filter(|(_, name)| {
                name.strip_prefix(SEGMENT_PREFIX)
                    .is_some_and(|idx| idx.parse::<usize>().is_ok())
            })
            .map(|(&tag, _)| tag)
            .collect()
    }
    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.entries.iter().map(|(&tag, name)| (tag, name.as_str()))
    }
    pub fn write(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        let mut buf = Vec::new();
        let mut ser =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut ser)?;
        fs::write(path, buf).map_err(|e| Error::io(path, e))?;
        Ok(())
    }
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}

pub fn segment_name(i: usize) -> String {
    format!("{SEGMENT_PREFIX}{i}")
}

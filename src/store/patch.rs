//! Typed structural patches against the torrent collection.
//!
//! The server describes incremental changes as JSON Patch operations whose
//! paths address a torrent (`/<hash>`), one of its properties
//! (`/<hash>/<property>`), or an element of a list property
//! (`/<hash>/tags/0`, `/<hash>/tags/-`). This module turns those into a
//! tagged [`PatchOperation`] with a typed [`PatchPath`] and applies them.
//!
//! Property edits go through the record's serialized form, so the value type
//! is checked by the same rules that govern snapshots: a string written into
//! `sizeBytes` is rejected, an unknown property lands in
//! [`TorrentRecord::extra`](crate::domain::TorrentRecord::extra).

use crate::domain::{MirrorError, Result, TorrentList, TorrentRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Position inside a list-valued property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementIndex {
    At(usize),
    /// One past the last element (`-` in a JSON pointer). Only valid for add.
    End,
}

impl fmt::Display for ElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(index) => write!(f, "{index}"),
            Self::End => f.write_str("-"),
        }
    }
}

/// What part of a torrent an operation addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatchTarget {
    /// The whole record.
    Torrent,
    /// One property, by wire name.
    Field(String),
    /// One element of a list property such as `tags` or `status`.
    Element { field: String, index: ElementIndex },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatchPath {
    pub hash: String,
    pub target: PatchTarget,
}

impl PatchPath {
    pub fn torrent(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            target: PatchTarget::Torrent,
        }
    }

    pub fn field(hash: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            target: PatchTarget::Field(field.into()),
        }
    }

    pub fn element(hash: impl Into<String>, field: impl Into<String>, index: ElementIndex) -> Self {
        Self {
            hash: hash.into(),
            target: PatchTarget::Element {
                field: field.into(),
                index,
            },
        }
    }

    /// Parses a JSON pointer of one to three segments.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem for empty pointers, pointers
    /// without a leading `/`, empty hashes, bad list indices, or pointers
    /// nested deeper than a list element.
    ///
    /// # Examples
    ///
    /// ```
    /// use torrent_mirror::store::{ElementIndex, PatchPath};
    ///
    /// assert_eq!(PatchPath::parse("/abc").unwrap(), PatchPath::torrent("abc"));
    /// assert_eq!(PatchPath::parse("/abc/name").unwrap(), PatchPath::field("abc", "name"));
    /// assert_eq!(
    ///     PatchPath::parse("/abc/tags/-").unwrap(),
    ///     PatchPath::element("abc", "tags", ElementIndex::End)
    /// );
    /// ```
    pub fn parse(pointer: &str) -> std::result::Result<Self, String> {
        let rest = pointer
            .strip_prefix('/')
            .ok_or_else(|| format!("path must start with '/': {pointer:?}"))?;

        let segments: Vec<String> = rest.split('/').map(unescape_segment).collect();
        let path = match segments.as_slice() {
            [hash] => Self::torrent(hash.as_str()),
            [hash, field] => Self::field(hash.as_str(), field.as_str()),
            [hash, field, index] => {
                let index = if index == "-" {
                    ElementIndex::End
                } else {
                    index
                        .parse::<usize>()
                        .map(ElementIndex::At)
                        .map_err(|_| format!("invalid list index {index:?} in {pointer:?}"))?
                };
                Self::element(hash.as_str(), field.as_str(), index)
            }
            _ => return Err(format!("path nests too deep: {pointer:?}")),
        };

        if path.hash.is_empty() {
            return Err(format!("path has an empty torrent hash: {pointer:?}"));
        }
        Ok(path)
    }

    /// Renders the path back to a JSON pointer.
    #[must_use]
    pub fn to_pointer(&self) -> String {
        let hash = escape_segment(&self.hash);
        match &self.target {
            PatchTarget::Torrent => format!("/{hash}"),
            PatchTarget::Field(field) => format!("/{hash}/{}", escape_segment(field)),
            PatchTarget::Element { field, index } => {
                format!("/{hash}/{}/{index}", escape_segment(field))
            }
        }
    }
}

impl fmt::Display for PatchPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer())
    }
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// One structural change to the collection.
///
/// Deserializes from, and serializes to, a JSON Patch object such as
/// `{"op": "replace", "path": "/abc/name", "value": "x"}`. The `move` and
/// `copy` operations are not part of the protocol and are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOperation", into = "RawOperation")]
pub enum PatchOperation {
    /// Insert, or overwrite if present.
    Add { path: PatchPath, value: Value },
    /// Overwrite; the target must exist.
    Replace { path: PatchPath, value: Value },
    /// Delete; the target must exist.
    Remove { path: PatchPath },
    /// Assert that the target exists and equals `value`.
    Test { path: PatchPath, value: Value },
}

impl PatchOperation {
    #[must_use]
    pub const fn path(&self) -> &PatchPath {
        match self {
            Self::Add { path, .. }
            | Self::Replace { path, .. }
            | Self::Remove { path }
            | Self::Test { path, .. } => path,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Replace { .. } => "replace",
            Self::Remove { .. } => "remove",
            Self::Test { .. } => "test",
        }
    }

    /// Adds or overwrites a whole torrent.
    ///
    /// # Errors
    ///
    /// Fails only if `record` cannot be serialized.
    pub fn add_torrent(record: &TorrentRecord) -> Result<Self> {
        Ok(Self::Add {
            path: PatchPath::torrent(record.hash.as_str()),
            value: serde_json::to_value(record)?,
        })
    }

    pub fn replace_field(hash: impl Into<String>, field: impl Into<String>, value: Value) -> Self {
        Self::Replace {
            path: PatchPath::field(hash, field),
            value,
        }
    }

    pub fn remove_torrent(hash: impl Into<String>) -> Self {
        Self::Remove {
            path: PatchPath::torrent(hash),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawOperation {
    op: String,
    path: String,
    #[serde(default, deserialize_with = "present_value", skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

/// A `value` key that is present, even as `null`, is `Some`. Only an absent
/// key falls back to `None` through `#[serde(default)]`.
fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawOperation> for PatchOperation {
    type Error = String;

    fn try_from(raw: RawOperation) -> std::result::Result<Self, Self::Error> {
        let path = PatchPath::parse(&raw.path)?;
        let value = || {
            raw.value
                .clone()
                .ok_or_else(|| format!("{} at {} needs a value", raw.op, raw.path))
        };
        match raw.op.as_str() {
            "add" => Ok(Self::Add { path, value: value()? }),
            "replace" => Ok(Self::Replace { path, value: value()? }),
            "remove" => Ok(Self::Remove { path }),
            "test" => Ok(Self::Test { path, value: value()? }),
            other => Err(format!("unsupported patch op {other:?}")),
        }
    }
}

impl From<PatchOperation> for RawOperation {
    fn from(op: PatchOperation) -> Self {
        let name = op.name().to_string();
        let (path, value) = match op {
            PatchOperation::Add { path, value }
            | PatchOperation::Replace { path, value }
            | PatchOperation::Test { path, value } => (path, Some(value)),
            PatchOperation::Remove { path } => (path, None),
        };
        Self {
            op: name,
            path: path.to_pointer(),
            value,
        }
    }
}

/// Decodes a JSON Patch document (an array of operation objects).
///
/// # Errors
///
/// [`MirrorError::Decode`] if the document is not an array of objects with
/// string `op` and `path`; [`MirrorError::MalformedPatch`] naming the first
/// operation whose op or path is not supported.
pub fn parse_json_patch(document: &Value) -> Result<Vec<PatchOperation>> {
    let items = document
        .as_array()
        .ok_or_else(|| MirrorError::Decode("patch document must be a JSON array".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw: RawOperation = serde_json::from_value(item.clone())?;
            PatchOperation::try_from(raw).map_err(|reason| MirrorError::malformed_patch(index, reason))
        })
        .collect()
}

/// Applies `ops` in order, directly to `torrents`.
///
/// On error the collection may hold the effects of the operations before the
/// failing one. Callers that need all-or-nothing behavior apply to a copy.
///
/// # Errors
///
/// [`MirrorError::MalformedPatch`] for the first operation that cannot be
/// resolved against the collection as it stands at that point.
pub fn apply_operations(torrents: &mut TorrentList, ops: &[PatchOperation]) -> Result<()> {
    for (index, op) in ops.iter().enumerate() {
        apply_operation(torrents, op).map_err(|reason| {
            tracing::debug!(index, op = op.name(), path = %op.path(), %reason, "patch operation rejected");
            MirrorError::malformed_patch(index, reason)
        })?;
    }
    Ok(())
}

fn apply_operation(torrents: &mut TorrentList, op: &PatchOperation) -> std::result::Result<(), String> {
    let path = op.path();
    let missing = || format!("no torrent with hash {}", path.hash);

    if path.target == PatchTarget::Torrent {
        return match op {
            PatchOperation::Add { value, .. } => {
                torrents.insert(path.hash.clone(), decode_record(path, value)?);
                Ok(())
            }
            PatchOperation::Replace { value, .. } => {
                let slot = torrents.get_mut(&path.hash).ok_or_else(missing)?;
                *slot = decode_record(path, value)?;
                Ok(())
            }
            PatchOperation::Remove { .. } => torrents.remove(&path.hash).map(drop).ok_or_else(missing),
            PatchOperation::Test { value, .. } => {
                let current = torrents.get(&path.hash).ok_or_else(missing)?;
                if *current == decode_record(path, value)? {
                    Ok(())
                } else {
                    Err(format!("test failed at {path}"))
                }
            }
        };
    }

    let record = torrents.get_mut(&path.hash).ok_or_else(missing)?;
    let mut object = record_to_object(record)?;
    edit_object(&mut object, &path.target, op)?;
    if !matches!(op, PatchOperation::Test { .. }) {
        let edited: TorrentRecord = serde_json::from_value(Value::Object(object))
            .map_err(|e| format!("invalid value at {path}: {e}"))?;
        if edited.hash != path.hash {
            return Err(format!("{} at {path} would change the torrent's hash", op.name()));
        }
        *record = edited;
    }
    Ok(())
}

/// The collection key is authoritative: whatever hash the body carries, the
/// decoded record takes the one from the path.
fn decode_record(path: &PatchPath, value: &Value) -> std::result::Result<TorrentRecord, String> {
    let mut record = TorrentRecord::deserialize(value).map_err(|e| format!("invalid torrent record: {e}"))?;
    if record.hash != path.hash {
        if !record.hash.is_empty() {
            tracing::debug!(body = %record.hash, key = %path.hash, "record hash overridden by patch path");
        }
        record.hash.clone_from(&path.hash);
    }
    Ok(record)
}

fn record_to_object(record: &TorrentRecord) -> std::result::Result<Map<String, Value>, String> {
    match serde_json::to_value(record) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err("torrent record did not serialize to an object".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn edit_object(
    object: &mut Map<String, Value>,
    target: &PatchTarget,
    op: &PatchOperation,
) -> std::result::Result<(), String> {
    match target {
        PatchTarget::Torrent => Err("whole-torrent operations are not property edits".to_string()),
        PatchTarget::Field(field) => {
            let absent = || format!("torrent has no property {field}");
            match op {
                PatchOperation::Add { value, .. } => {
                    object.insert(field.clone(), value.clone());
                }
                PatchOperation::Replace { value, .. } => {
                    *object.get_mut(field).ok_or_else(absent)? = value.clone();
                }
                PatchOperation::Remove { .. } => {
                    object.remove(field).ok_or_else(absent)?;
                }
                PatchOperation::Test { value, .. } => {
                    if object.get(field).ok_or_else(absent)? != value {
                        return Err(format!("test failed at property {field}"));
                    }
                }
            }
            Ok(())
        }
        PatchTarget::Element { field, index } => {
            let list = object
                .get_mut(field)
                .and_then(Value::as_array_mut)
                .ok_or_else(|| format!("property {field} is not a list"))?;
            let len = list.len();
            match (op, *index) {
                (PatchOperation::Add { value, .. }, ElementIndex::End) => list.push(value.clone()),
                (PatchOperation::Add { value, .. }, ElementIndex::At(i)) if i <= len => {
                    list.insert(i, value.clone());
                }
                (PatchOperation::Replace { value, .. }, ElementIndex::At(i)) if i < len => {
                    list[i] = value.clone();
                }
                (PatchOperation::Remove { .. }, ElementIndex::At(i)) if i < len => {
                    list.remove(i);
                }
                (PatchOperation::Test { value, .. }, ElementIndex::At(i)) if i < len => {
                    if list[i] != *value {
                        return Err(format!("test failed at {field}/{i}"));
                    }
                }
                _ => return Err(format!("index {index} out of bounds for {field} (len {len})")),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TorrentStatus;
    use serde_json::json;

    fn collection() -> TorrentList {
        let mut torrents = TorrentList::new();
        for record in [
            TorrentRecord::new("h1", "one", 100).with_tags(["a"]),
            TorrentRecord::new("h2", "two", 200),
        ] {
            torrents.insert(record.hash.clone(), record);
        }
        torrents
    }

    fn decode(ops: Value) -> Vec<PatchOperation> {
        serde_json::from_value(ops).unwrap()
    }

    #[test]
    fn decodes_json_patch_objects() {
        let ops = decode(json!([
            {"op": "replace", "path": "/h1/name", "value": "renamed"},
            {"op": "remove", "path": "/h2"},
            {"op": "add", "path": "/h1/tags/-", "value": "b"}
        ]));
        assert_eq!(ops[0], PatchOperation::replace_field("h1", "name", json!("renamed")));
        assert_eq!(ops[1], PatchOperation::remove_torrent("h2"));
        assert_eq!(
            ops[2].path(),
            &PatchPath::element("h1", "tags", ElementIndex::End)
        );
    }

    #[test]
    fn serializes_back_to_json_patch() {
        let op = PatchOperation::replace_field("a/b", "name", json!("x"));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"op": "replace", "path": "/a~1b/name", "value": "x"})
        );
        let round: PatchOperation = serde_json::from_value(serde_json::to_value(&op).unwrap()).unwrap();
        assert_eq!(round, op);
    }

    #[test]
    fn rejects_move_and_copy() {
        let err = serde_json::from_value::<PatchOperation>(json!({"op": "move", "from": "/a", "path": "/b"}));
        assert!(err.is_err());
    }

    #[test]
    fn parse_json_patch_reports_index_of_bad_operation() {
        let err = parse_json_patch(&json!([
            {"op": "remove", "path": "/h1"},
            {"op": "copy", "path": "/h2"}
        ]))
        .unwrap_err();
        assert!(matches!(err, MirrorError::MalformedPatch { index: 1, .. }));

        let err = parse_json_patch(&json!({"op": "remove"})).unwrap_err();
        assert!(matches!(err, MirrorError::Decode(_)));
    }

    #[test]
    fn pointer_rejects_bad_paths() {
        assert!(PatchPath::parse("").is_err());
        assert!(PatchPath::parse("h1").is_err());
        assert!(PatchPath::parse("/").is_err());
        assert!(PatchPath::parse("/h1/tags/x").is_err());
        assert!(PatchPath::parse("/h1/tags/0/deeper").is_err());
    }

    #[test]
    fn adds_replaces_and_removes_torrents() {
        let mut torrents = collection();
        let ops = vec![
            PatchOperation::add_torrent(&TorrentRecord::new("h3", "three", 300)).unwrap(),
            PatchOperation::Replace {
                path: PatchPath::torrent("h1"),
                value: json!({"hash": "h1", "name": "uno", "sizeBytes": 1}),
            },
            PatchOperation::remove_torrent("h2"),
        ];
        apply_operations(&mut torrents, &ops).unwrap();

        assert_eq!(torrents.keys().collect::<Vec<_>>(), vec!["h1", "h3"]);
        assert_eq!(torrents["h1"].name, "uno");
        assert_eq!(torrents["h1"].size_bytes, 1);
        assert!(torrents["h1"].tags.is_empty());
    }

    #[test]
    fn added_record_without_hash_takes_it_from_the_path() {
        let mut torrents = collection();
        let ops = decode(json!([{"op": "add", "path": "/h9", "value": {"name": "nine"}}]));
        apply_operations(&mut torrents, &ops).unwrap();
        assert_eq!(torrents["h9"].hash, "h9");
    }

    #[test]
    fn edits_single_properties_and_list_elements() {
        let mut torrents = collection();
        let ops = decode(json!([
            {"op": "replace", "path": "/h1/sizeBytes", "value": 150},
            {"op": "add", "path": "/h1/status/-", "value": "seeding"},
            {"op": "replace", "path": "/h1/tags/0", "value": "z"},
            {"op": "add", "path": "/h1/label", "value": "custom"},
            {"op": "test", "path": "/h1/name", "value": "one"}
        ]));
        apply_operations(&mut torrents, &ops).unwrap();

        let h1 = &torrents["h1"];
        assert_eq!(h1.size_bytes, 150);
        assert_eq!(h1.status, vec![TorrentStatus::Seeding]);
        assert_eq!(h1.tags, vec!["z"]);
        assert_eq!(h1.extra.get("label"), Some(&json!("custom")));
    }

    #[test]
    fn unresolvable_operations_are_malformed() {
        let cases = [
            json!([{"op": "remove", "path": "/missing"}]),
            json!([{"op": "replace", "path": "/missing", "value": {}}]),
            json!([{"op": "replace", "path": "/h1/nope", "value": 1}]),
            json!([{"op": "replace", "path": "/h1/sizeBytes", "value": "big"}]),
            json!([{"op": "remove", "path": "/h1/tags/3"}]),
            json!([{"op": "replace", "path": "/h1/name/0", "value": "x"}]),
            json!([{"op": "test", "path": "/h1/name", "value": "other"}]),
        ];
        for case in cases {
            let mut torrents = collection();
            let err = apply_operations(&mut torrents, &decode(case.clone())).unwrap_err();
            assert!(err.is_malformed_patch(), "expected malformed patch for {case}");
        }
    }

    #[test]
    fn path_hash_wins_over_body_hash() {
        let mut torrents = collection();
        let ops = decode(json!([{"op": "add", "path": "/h3", "value": {"hash": "h1", "name": "three", "sizeBytes": 50}}]));
        apply_operations(&mut torrents, &ops).unwrap();

        assert_eq!(torrents["h3"].hash, "h3");
        assert_eq!(torrents["h1"].name, "one");
        assert!(torrents.iter().all(|(key, record)| *key == record.hash));
    }

    #[test]
    fn property_edits_cannot_change_the_hash() {
        for case in [
            json!([{"op": "replace", "path": "/h1/hash", "value": "zz"}]),
            json!([{"op": "remove", "path": "/h1/hash"}]),
        ] {
            let mut torrents = collection();
            let err = apply_operations(&mut torrents, &decode(case.clone())).unwrap_err();
            assert!(err.is_malformed_patch(), "expected malformed patch for {case}");
            assert_eq!(torrents["h1"].hash, "h1");
        }

        let mut torrents = collection();
        let same = decode(json!([{"op": "replace", "path": "/h1/hash", "value": "h1"}]));
        apply_operations(&mut torrents, &same).unwrap();
    }

    #[test]
    fn null_values_are_kept_as_null() {
        let ops = decode(json!([
            {"op": "add", "path": "/h1/label", "value": "custom"},
            {"op": "replace", "path": "/h1/label", "value": null},
            {"op": "test", "path": "/h1/label", "value": null}
        ]));
        assert_eq!(ops[1], PatchOperation::replace_field("h1", "label", Value::Null));

        let mut torrents = collection();
        apply_operations(&mut torrents, &ops).unwrap();
        assert_eq!(torrents["h1"].extra.get("label"), Some(&Value::Null));

        assert_eq!(
            serde_json::to_value(&ops[1]).unwrap(),
            json!({"op": "replace", "path": "/h1/label", "value": null})
        );
    }

    #[test]
    fn missing_value_is_still_rejected() {
        let err = serde_json::from_value::<PatchOperation>(json!({"op": "add", "path": "/h1/label"}));
        assert!(err.is_err());
    }

    #[test]
    fn failing_operation_is_reported_by_position() {
        let mut torrents = collection();
        let ops = vec![PatchOperation::remove_torrent("h1"), PatchOperation::remove_torrent("h1")];
        let err = apply_operations(&mut torrents, &ops).unwrap_err();
        assert!(matches!(err, MirrorError::MalformedPatch { index: 1, .. }));
    }
}

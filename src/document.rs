//! The state document and path traversal
//!
//! The document is a plain `serde_json::Value` whose root is always an
//! object. Reads never modify it; writes create whatever intermediate
//! objects the path needs.

use serde_json::{Map, Value, json};

use crate::config::InitMerge;
use crate::path::{StatePath, as_index};

/// Default document shape used before anything has been persisted
pub fn skeleton() -> Value {
    json!({
        "user": {
            "name": "",
            "visitCount": 0,
            "lastVisit": null,
            "preferences": {}
        },
        "ui": {
            "theme": "romantic",
            "soundEnabled": true,
            "particlesEnabled": true,
            "currentPage": "",
            "isLoading": false
        },
        "game": {
            "currentLevel": 1,
            "score": 0,
            "highScore": 0
        },
        "memories": [],
        "gallery": {
            "currentIndex": 0,
            "images": []
        }
    })
}

/// Short type name for log messages
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolve `path` against `root`.
///
/// Returns `None` when a segment is missing or the walk reaches a scalar
/// before the last segment. Arrays are indexed by decimal segments.
pub fn lookup<'a>(root: &'a Value, path: &StatePath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| child(node, segment))
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => as_index(segment).and_then(|index| items.get(index)),
        _ => None,
    }
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// Returns the previous value, or `None` when the path did not exist.
/// A scalar sitting where the path needs a container is replaced with an
/// empty object. An array accepts indexes up to its length, so a write can
/// append one element; any other segment turns the array into an object.
pub fn assign(root: &mut Value, path: &StatePath, value: Value) -> Option<Value> {
    let mut node = root;
    for segment in path.parent_segments() {
        node = slot(node, segment, path);
    }

    let leaf = path.leaf();
    let existed = child(node, leaf).is_some();
    let previous = std::mem::replace(slot(node, leaf, path), value);
    existed.then_some(previous)
}

/// Mutable slot for `segment` under `node`, converting `node` into a
/// container first when it cannot hold the segment.
fn slot<'a>(node: &'a mut Value, segment: &str, path: &StatePath) -> &'a mut Value {
    let index = match &*node {
        Value::Array(items) => as_index(segment).filter(|index| *index <= items.len()),
        _ => None,
    };
    if let Some(index) = index {
        if let Some(items) = node.as_array_mut() {
            if index == items.len() {
                items.push(Value::Null);
            }
        }
        return &mut node[index];
    }

    if !node.is_object() {
        if !node.is_null() {
            log::warn!(
                "Overwriting {} with an object while writing {}",
                kind_name(node),
                path
            );
        }
        *node = Value::Object(Map::new());
    }
    &mut node[segment]
}

/// Copy `overlay`'s keys over `base`; overlay wins, nested values are not merged
pub fn shallow_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

/// Recursively merge `overlay` into `base`; non-object values replace
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Lay a persisted copy over `document`
pub fn overlay_saved(mut document: Value, saved: Map<String, Value>, merge: InitMerge) -> Value {
    match merge {
        InitMerge::Shallow => {
            if let Value::Object(base) = &mut document {
                shallow_merge(base, saved);
            }
        }
        InitMerge::Deep => deep_merge(&mut document, Value::Object(saved)),
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn path(raw: &str) -> StatePath {
        StatePath::parse(raw)
    }

    #[test]
    fn test_skeleton_shape() {
        let doc = skeleton();
        assert_eq!(doc["user"]["visitCount"], json!(0));
        assert_eq!(doc["user"]["lastVisit"], Value::Null);
        assert_eq!(doc["ui"]["theme"], json!("romantic"));
        assert_eq!(doc["game"]["currentLevel"], json!(1));
        assert_eq!(doc["memories"], json!([]));
        assert_eq!(doc["gallery"]["images"], json!([]));
    }

    #[test]
    fn test_lookup_missing_and_scalar() {
        let doc = skeleton();
        assert_eq!(lookup(&doc, &path("user.name")), Some(&json!("")));
        assert_eq!(lookup(&doc, &path("user.nickname")), None);
        // name is a string, nothing below it
        assert_eq!(lookup(&doc, &path("user.name.first")), None);
        assert_eq!(lookup(&doc, &path("nope.deeper")), None);
    }

    #[test]
    fn test_lookup_null_is_present() {
        let doc = skeleton();
        assert_eq!(lookup(&doc, &path("user.lastVisit")), Some(&Value::Null));
        assert_eq!(lookup(&doc, &path("user.lastVisit.x")), None);
    }

    #[test]
    fn test_assign_creates_intermediates() {
        let mut doc = skeleton();
        let previous = assign(&mut doc, &path("game.memory.score"), json!(12));
        assert_eq!(previous, None);
        assert_eq!(doc["game"]["memory"], json!({ "score": 12 }));
        // siblings untouched
        assert_eq!(doc["game"]["highScore"], json!(0));
    }

    #[test]
    fn test_assign_returns_previous() {
        let mut doc = skeleton();
        let previous = assign(&mut doc, &path("user.name"), json!("Ada"));
        assert_eq!(previous, Some(json!("")));
        let previous = assign(&mut doc, &path("user.lastVisit"), json!("now"));
        assert_eq!(previous, Some(Value::Null));
    }

    #[test]
    fn test_assign_overwrites_scalar_intermediate() {
        let mut doc = skeleton();
        assign(&mut doc, &path("game.score.best"), json!(5));
        assert_eq!(doc["game"]["score"], json!({ "best": 5 }));
    }

    #[test]
    fn test_assign_into_array_index() {
        let mut doc = skeleton();
        assign(&mut doc, &path("gallery.images"), json!(["a.jpg", "b.jpg"]));
        let previous = assign(&mut doc, &path("gallery.images.1"), json!("c.jpg"));
        assert_eq!(previous, Some(json!("b.jpg")));
        assert_eq!(doc["gallery"]["images"], json!(["a.jpg", "c.jpg"]));

        let previous = assign(&mut doc, &path("gallery.images.2"), json!("d.jpg"));
        assert_eq!(previous, None);
        assert_eq!(doc["gallery"]["images"], json!(["a.jpg", "c.jpg", "d.jpg"]));
        assert_eq!(lookup(&doc, &path("gallery.images.2")), Some(&json!("d.jpg")));
    }

    #[test]
    fn test_assign_index_past_end_keys_an_object() {
        let mut doc = skeleton();
        assign(&mut doc, &path("gallery.images"), json!(["a.jpg"]));
        assign(&mut doc, &path("gallery.images.3"), json!("d.jpg"));
        assert_eq!(doc["gallery"]["images"], json!({ "3": "d.jpg" }));
        assert_eq!(lookup(&doc, &path("gallery.images.3")), Some(&json!("d.jpg")));
    }

    #[test]
    fn test_assign_huge_index_does_not_allocate() {
        let mut doc = skeleton();
        assign(&mut doc, &path("memories.99999999999999"), json!(1));
        assert_eq!(doc["memories"], json!({ "99999999999999": 1 }));

        let mut doc = skeleton();
        assign(&mut doc, &path("memories.18446744073709551615"), json!(2));
        assert_eq!(doc["memories"], json!({ "18446744073709551615": 2 }));

        let mut doc = skeleton();
        assign(&mut doc, &path("memories.99999999999999999999.note"), json!(3));
        assert_eq!(
            lookup(&doc, &path("memories.99999999999999999999.note")),
            Some(&json!(3))
        );
    }

    #[test]
    fn test_assign_named_key_on_array_replaces_it() {
        let mut doc = skeleton();
        assign(&mut doc, &path("memories.latest"), json!("first date"));
        assert_eq!(doc["memories"], json!({ "latest": "first date" }));
    }

    #[test]
    fn test_shallow_merge_replaces_sections() {
        let saved = json!({ "user": { "name": "Ada" }, "extra": true });
        let Value::Object(saved) = saved else {
            panic!("object literal");
        };
        let doc = overlay_saved(skeleton(), saved, InitMerge::Shallow);
        // nested defaults are lost when a section is replaced
        assert_eq!(doc["user"], json!({ "name": "Ada" }));
        assert_eq!(doc["ui"]["theme"], json!("romantic"));
        assert_eq!(doc["extra"], json!(true));
    }

    #[test]
    fn test_deep_merge_keeps_nested_defaults() {
        let saved = json!({ "user": { "name": "Ada" }, "memories": ["x"] });
        let Value::Object(saved) = saved else {
            panic!("object literal");
        };
        let doc = overlay_saved(skeleton(), saved, InitMerge::Deep);
        assert_eq!(doc["user"]["name"], json!("Ada"));
        assert_eq!(doc["user"]["visitCount"], json!(0));
        assert_eq!(doc["memories"], json!(["x"]));
    }

    proptest! {
        #[test]
        fn prop_sibling_paths_unaffected(
            section in "[a-z]{1,8}",
            written in "[a-z]{1,8}",
            sibling in "[a-z]{1,8}",
            value in any::<i64>(),
        ) {
            prop_assume!(written != sibling);
            let mut doc = skeleton();
            let sibling_path = path(&format!("{section}.{sibling}"));
            let before = lookup(&doc, &sibling_path).cloned();

            assign(&mut doc, &path(&format!("{section}.{written}")), json!(value));

            prop_assert_eq!(lookup(&doc, &sibling_path).cloned(), before);
            prop_assert_eq!(
                lookup(&doc, &path(&format!("{section}.{written}"))).cloned(),
                Some(json!(value))
            );
        }
    }
}

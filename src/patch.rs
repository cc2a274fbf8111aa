//! JSON Patch (RFC 6902) over `serde_json` documents.
//!
//! Object keys in paths fall back to a case-insensitive match, so `/Name`
//! and `/name` address the same DTO field.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    pub fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Move { .. } => "move",
            PatchOperation::Copy { .. } => "copy",
            PatchOperation::Test { .. } => "test",
        }
    }

    fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(pub Vec<PatchOperation>);

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Operation {index} ({op}): path '{path}' does not exist")]
    MissingPath {
        index: usize,
        op: &'static str,
        path: String,
    },

    #[error("Operation {index} ({op}): path '{path}' is not valid here")]
    InvalidPath {
        index: usize,
        op: &'static str,
        path: String,
    },

    #[error("Operation {index} (test): value at '{path}' does not match")]
    TestFailed { index: usize, path: String },

    #[error("Patched document is not valid: {0}")]
    Conversion(#[from] serde_json::Error),
}

enum Fault {
    Missing,
    Invalid,
    TestFailed,
}

impl Fault {
    fn at(self, index: usize, op: &PatchOperation, path: &str) -> PatchError {
        let path = path.to_string();
        match self {
            Fault::Missing => PatchError::MissingPath {
                index,
                op: op.name(),
                path,
            },
            Fault::Invalid => PatchError::InvalidPath {
                index,
                op: op.name(),
                path,
            },
            Fault::TestFailed => PatchError::TestFailed { index, path },
        }
    }
}

/// Applies every operation in order. On failure `doc` is left untouched.
pub fn apply(doc: &mut Value, patch: &Patch) -> Result<(), PatchError> {
    let mut working = doc.clone();
    for (index, operation) in patch.0.iter().enumerate() {
        apply_operation(&mut working, operation).map_err(|(fault, path)| {
            fault.at(index, operation, path.unwrap_or_else(|| operation.path()))
        })?;
    }
    *doc = working;
    Ok(())
}

/// Patches the JSON form of `target` and converts the result back.
pub fn apply_to<T>(target: &T, patch: &Patch) -> Result<T, PatchError>
where
    T: Serialize + DeserializeOwned,
{
    let mut doc = serde_json::to_value(target)?;
    apply(&mut doc, patch)?;
    Ok(serde_json::from_value(doc)?)
}

type OpResult<'a> = Result<(), (Fault, Option<&'a str>)>;

fn apply_operation<'a>(doc: &mut Value, operation: &'a PatchOperation) -> OpResult<'a> {
    let at_path = |fault| (fault, None);
    match operation {
        PatchOperation::Add { path, value } => {
            let tokens = parse_pointer(path).map_err(at_path)?;
            add(doc, &tokens, value.clone()).map_err(at_path)
        }
        PatchOperation::Remove { path } => {
            let tokens = parse_pointer(path).map_err(at_path)?;
            remove(doc, &tokens).map(|_| ()).map_err(at_path)
        }
        PatchOperation::Replace { path, value } => {
            let tokens = parse_pointer(path).map_err(at_path)?;
            let target = resolve_mut(doc, &tokens).ok_or((Fault::Missing, None))?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            let from_tokens = parse_pointer(from).map_err(|f| (f, Some(from.as_str())))?;
            let tokens = parse_pointer(path).map_err(at_path)?;
            if tokens.len() > from_tokens.len() && tokens.starts_with(&from_tokens) {
                return Err((Fault::Invalid, None));
            }
            let value = remove(doc, &from_tokens).map_err(|f| (f, Some(from.as_str())))?;
            add(doc, &tokens, value).map_err(at_path)
        }
        PatchOperation::Copy { from, path } => {
            let from_tokens = parse_pointer(from).map_err(|f| (f, Some(from.as_str())))?;
            let tokens = parse_pointer(path).map_err(at_path)?;
            let value = resolve(doc, &from_tokens)
                .cloned()
                .ok_or((Fault::Missing, Some(from.as_str())))?;
            add(doc, &tokens, value).map_err(at_path)
        }
        PatchOperation::Test { path, value } => {
            let tokens = parse_pointer(path).map_err(at_path)?;
            match resolve(doc, &tokens) {
                Some(actual) if json_eq(actual, value) => Ok(()),
                Some(_) => Err((Fault::TestFailed, None)),
                None => Err((Fault::Missing, None)),
            }
        }
    }
}

/// Equality where numbers compare by value, so `3000` equals `3000.0`.
fn json_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| b.get(key).map_or(false, |y| json_eq(x, y)))
        }
        _ => left == right,
    }
}

/// Array index token: `0` or a decimal without leading zeros or sign.
fn parse_index(token: &str) -> Option<usize> {
    let canonical = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if canonical {
        token.parse().ok()
    } else {
        None
    }
}

fn parse_pointer(path: &str) -> Result<Vec<String>, Fault> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let rest = path.strip_prefix('/').ok_or(Fault::Invalid)?;
    Ok(rest
        .split('/')
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect())
}

fn object_key(map: &Map<String, Value>, token: &str) -> Option<String> {
    if map.contains_key(token) {
        return Some(token.to_string());
    }
    map.keys().find(|key| key.eq_ignore_ascii_case(token)).cloned()
}

fn child<'v>(value: &'v Value, token: &str) -> Option<&'v Value> {
    match value {
        Value::Object(map) => map.get(&object_key(map, token)?),
        Value::Array(items) => items.get(parse_index(token)?),
        _ => None,
    }
}

fn child_mut<'v>(value: &'v mut Value, token: &str) -> Option<&'v mut Value> {
    match value {
        Value::Object(map) => {
            let key = object_key(map, token)?;
            map.get_mut(&key)
        }
        Value::Array(items) => items.get_mut(parse_index(token)?),
        _ => None,
    }
}

fn resolve<'v>(doc: &'v Value, tokens: &[String]) -> Option<&'v Value> {
    tokens.iter().try_fold(doc, |node, token| child(node, token))
}

fn resolve_mut<'v>(doc: &'v mut Value, tokens: &[String]) -> Option<&'v mut Value> {
    tokens.iter().try_fold(doc, |node, token| child_mut(node, token))
}

fn add(doc: &mut Value, tokens: &[String], value: Value) -> Result<(), Fault> {
    let Some((last, parents)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };
    match resolve_mut(doc, parents).ok_or(Fault::Missing)? {
        Value::Object(map) => {
            let key = object_key(map, last).unwrap_or_else(|| last.clone());
            map.insert(key, value);
            Ok(())
        }
        Value::Array(items) => {
            let at = if last == "-" {
                items.len()
            } else {
                parse_index(last).ok_or(Fault::Invalid)?
            };
            if at > items.len() {
                return Err(Fault::Missing);
            }
            items.insert(at, value);
            Ok(())
        }
        _ => Err(Fault::Invalid),
    }
}

fn remove(doc: &mut Value, tokens: &[String]) -> Result<Value, Fault> {
    let (last, parents) = tokens.split_last().ok_or(Fault::Invalid)?;
    match resolve_mut(doc, parents).ok_or(Fault::Missing)? {
        Value::Object(map) => {
            let key = object_key(map, last).ok_or(Fault::Missing)?;
            map.remove(&key).ok_or(Fault::Missing)
        }
        Value::Array(items) => {
            let at = parse_index(last).ok_or(Fault::Invalid)?;
            if at >= items.len() {
                return Err(Fault::Missing);
            }
            Ok(items.remove(at))
        }
        _ => Err(Fault::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(ops: Value) -> Patch {
        serde_json::from_value(ops).unwrap()
    }

    #[test]
    fn test_replace_field() {
        let mut doc = json!({"name": "Pool View", "rate": 3000.0});
        apply(&mut doc, &patch(json!([{"op": "replace", "path": "/name", "value": "Sea View"}]))).unwrap();
        assert_eq!(doc["name"], "Sea View");
    }

    #[test]
    fn test_path_matches_case_insensitively() {
        let mut doc = json!({"imageUrl": ""});
        apply(&mut doc, &patch(json!([{"op": "replace", "path": "/ImageUrl", "value": "x.png"}]))).unwrap();
        assert_eq!(doc, json!({"imageUrl": "x.png"}));
    }

    #[test]
    fn test_replace_missing_path_fails_with_index() {
        let mut doc = json!({"name": "a"});
        let err = apply(
            &mut doc,
            &patch(json!([
                {"op": "test", "path": "/name", "value": "a"},
                {"op": "replace", "path": "/missing", "value": 1}
            ])),
        )
        .unwrap_err();
        match err {
            PatchError::MissingPath { index, op, path } => {
                assert_eq!(index, 1);
                assert_eq!(op, "replace");
                assert_eq!(path, "/missing");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_failed_patch_leaves_document_untouched() {
        let mut doc = json!({"name": "a", "rate": 1});
        let result = apply(
            &mut doc,
            &patch(json!([
                {"op": "replace", "path": "/name", "value": "b"},
                {"op": "test", "path": "/rate", "value": 2}
            ])),
        );
        assert!(matches!(result, Err(PatchError::TestFailed { index: 1, .. })));
        assert_eq!(doc, json!({"name": "a", "rate": 1}));
    }

    #[test]
    fn test_array_add_remove_and_append() {
        let mut doc = json!({"tags": ["a", "c"]});
        apply(
            &mut doc,
            &patch(json!([
                {"op": "add", "path": "/tags/1", "value": "b"},
                {"op": "add", "path": "/tags/-", "value": "d"},
                {"op": "remove", "path": "/tags/0"}
            ])),
        )
        .unwrap();
        assert_eq!(doc["tags"], json!(["b", "c", "d"]));
    }

    #[test]
    fn test_numbers_compare_by_value() {
        let mut doc = json!({"rate": 3000.0, "sizes": [1.0, 2], "nested": {"sqft": 100}});
        apply(
            &mut doc,
            &patch(json!([
                {"op": "test", "path": "/rate", "value": 3000},
                {"op": "test", "path": "/sizes", "value": [1, 2.0]},
                {"op": "test", "path": "/nested", "value": {"sqft": 100.0}}
            ])),
        )
        .unwrap();

        let err = apply(&mut doc, &patch(json!([{"op": "test", "path": "/rate", "value": "3000"}]))).unwrap_err();
        assert!(matches!(err, PatchError::TestFailed { index: 0, .. }));
    }

    #[test]
    fn test_array_index_must_be_canonical() {
        let mut doc = json!({"tags": ["a", "b", "c"]});
        for token in ["01", "+1", "-0", " 1", ""] {
            let path = format!("/tags/{}", token);
            let err = apply(&mut doc, &patch(json!([{"op": "remove", "path": path.as_str()}]))).unwrap_err();
            assert!(
                matches!(err, PatchError::InvalidPath { .. }),
                "token {:?} was accepted",
                token
            );

            let err = apply(&mut doc, &patch(json!([{"op": "replace", "path": path.as_str(), "value": "z"}]))).unwrap_err();
            assert!(matches!(err, PatchError::MissingPath { .. }));
        }
        assert_eq!(doc, json!({"tags": ["a", "b", "c"]}));

        apply(&mut doc, &patch(json!([{"op": "replace", "path": "/tags/0", "value": "z"}]))).unwrap();
        assert_eq!(doc["tags"][0], "z");
    }

    #[test]
    fn test_move_and_copy() {
        let mut doc = json!({"details": "old", "amenity": ""});
        apply(
            &mut doc,
            &patch(json!([
                {"op": "copy", "from": "/details", "path": "/amenity"},
                {"op": "move", "from": "/details", "path": "/notes"}
            ])),
        )
        .unwrap();
        assert_eq!(doc, json!({"amenity": "old", "notes": "old"}));
    }

    #[test]
    fn test_move_into_own_child_rejected() {
        let mut doc = json!({"a": {"b": 1}});
        let err = apply(&mut doc, &patch(json!([{"op": "move", "from": "/a", "path": "/a/c"}]))).unwrap_err();
        assert!(matches!(err, PatchError::InvalidPath { index: 0, .. }));
    }

    #[test]
    fn test_escaped_pointer_tokens() {
        let mut doc = json!({"a/b": 1, "m~n": 2});
        apply(
            &mut doc,
            &patch(json!([
                {"op": "replace", "path": "/a~1b", "value": 10},
                {"op": "replace", "path": "/m~0n", "value": 20}
            ])),
        )
        .unwrap();
        assert_eq!(doc, json!({"a/b": 10, "m~n": 20}));
    }

    #[test]
    fn test_pointer_without_leading_slash_is_invalid() {
        let mut doc = json!({"name": "a"});
        let err = apply(&mut doc, &patch(json!([{"op": "remove", "path": "name"}]))).unwrap_err();
        assert!(matches!(err, PatchError::InvalidPath { .. }));
    }

    #[test]
    fn test_unknown_operation_does_not_parse() {
        let result: Result<Patch, _> = serde_json::from_value(json!([{"op": "frobnicate", "path": "/a"}]));
        assert!(result.is_err());
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Shape {
        name: String,
        rate: f64,
    }

    #[test]
    fn test_apply_to_typed_value() {
        let shape = Shape {
            name: "a".to_string(),
            rate: 1.0,
        };
        let patched = apply_to(&shape, &patch(json!([{"op": "replace", "path": "/rate", "value": 2.5}]))).unwrap();
        assert_eq!(patched.rate, 2.5);

        let broken = apply_to(&shape, &patch(json!([{"op": "remove", "path": "/name"}])));
        assert!(matches!(broken, Err(PatchError::Conversion(_))));
    }
}

//! Diff parser
//!
//! Normalizes loosely structured diff JSON into a [`ChangeSet`].
//!
//! Accepted shapes:
//!
//! ```text
//! { "stacks": { "<stack>": <stack body>, ... } }   // cdk diff envelope
//! { "<stack>": <stack body>, ... }                 // bare stack map
//!
//! <stack body>    = { "create"|"update"|"delete"|"destroy": truthy,
//!                     "actions": ["update", ...],
//!                     "resources": { "<id>": <resource body>, ... } }
//! <resource body> = { "type": "AWS::IAM::Role",
//!                     "create"|"update"|"delete"|"destroy"|"replace": truthy,
//!                     "actions": ["replace", ...] }
//! ```
//!
//! Object members are visited in sorted key order (`serde_json::Map` is a
//! `BTreeMap`), so identical input always yields an identical `ChangeSet`.

use crate::errors::{InfraLensError, Result};
use crate::model::{Action, ChangeSet, ResourceChange, StackChange};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

const STACKS_KEY: &str = "stacks";
const RESOURCES_KEY: &str = "resources";
const TYPE_KEY: &str = "type";
const ACTIONS_KEY: &str = "actions";

/// Type recorded for resources that carry no `type` member
pub const UNKNOWN_RESOURCE_TYPE: &str = "Unknown";

/// Keys whose truthy value marks an action
const MARKER_KEYS: &[&str] = &["create", "update", "delete", "destroy", "replace"];

/// Parse raw diff bytes.
///
/// Empty or whitespace-only input is an empty `ChangeSet`.
///
/// # Errors
///
/// `MalformedInput` for invalid UTF-8, invalid JSON or a structurally
/// invalid document.
pub fn parse_diff_bytes(bytes: &[u8]) -> Result<ChangeSet> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| InfraLensError::malformed("$", format!("input is not valid UTF-8: {}", e)))?;

    if text.trim().is_empty() {
        return Ok(ChangeSet::new());
    }

    let raw: Value = serde_json::from_str(text)
        .map_err(|e| InfraLensError::malformed("$", format!("input is not valid JSON: {}", e)))?;

    parse_diff(&raw)
}

/// Parse an already-decoded diff document.
///
/// # Errors
///
/// `MalformedInput` naming the JSON path of the first offending value.
pub fn parse_diff(raw: &Value) -> Result<ChangeSet> {
    let root = raw
        .as_object()
        .ok_or_else(|| InfraLensError::malformed("$", describe_mismatch("object", raw)))?;

    let (stacks, base_path) = match root.get(STACKS_KEY) {
        Some(Value::Object(stacks)) => (stacks, "$.stacks"),
        _ => (root, "$"),
    };

    let mut change_set = ChangeSet::new();
    for (stack_name, body) in stacks {
        let path = format!("{}.{}", base_path, stack_name);
        let stack = parse_stack(stack_name, body, &path)?;
        if stack.is_noop() {
            continue;
        }
        change_set.add_stack(stack)?;
    }

    Ok(change_set)
}

fn parse_stack(name: &str, body: &Value, path: &str) -> Result<StackChange> {
    let body = body
        .as_object()
        .ok_or_else(|| InfraLensError::malformed(path, describe_mismatch("object", body)))?;

    let mut stack = StackChange::new(name, collect_actions(body, path)?);

    let resources = match body.get(RESOURCES_KEY) {
        None | Some(Value::Null) => return Ok(stack),
        Some(Value::Object(resources)) => resources,
        Some(other) => {
            return Err(InfraLensError::malformed(
                format!("{}.{}", path, RESOURCES_KEY),
                describe_mismatch("object", other),
            ))
        }
    };

    for (resource_id, resource_body) in resources {
        let resource_path = format!("{}.{}.{}", path, RESOURCES_KEY, resource_id);
        if let Some(resource) = parse_resource(resource_id, resource_body, &resource_path)? {
            stack.add_resource(resource)?;
        }
    }

    Ok(stack)
}

/// `Ok(None)` when the resource carries no recognised action
fn parse_resource(id: &str, body: &Value, path: &str) -> Result<Option<ResourceChange>> {
    let body = body
        .as_object()
        .ok_or_else(|| InfraLensError::malformed(path, describe_mismatch("object", body)))?;

    let resource_type = match body.get(TYPE_KEY) {
        None | Some(Value::Null) => UNKNOWN_RESOURCE_TYPE,
        Some(Value::String(t)) => t.as_str(),
        Some(other) => {
            return Err(InfraLensError::malformed(
                format!("{}.{}", path, TYPE_KEY),
                describe_mismatch("string", other),
            ))
        }
    };

    let actions = collect_actions(body, path)?;
    Ok(ResourceChange::new(id, resource_type, actions))
}

/// Union of keyed markers and the optional `actions` list.
fn collect_actions(body: &Map<String, Value>, path: &str) -> Result<BTreeSet<Action>> {
    let mut actions: BTreeSet<Action> = MARKER_KEYS
        .iter()
        .filter(|key| body.get(**key).is_some_and(is_truthy))
        .filter_map(|key| Action::from_marker(key))
        .collect();

    match body.get(ACTIONS_KEY) {
        None | Some(Value::Null) => {}
        Some(Value::Array(markers)) => {
            actions.extend(
                markers
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(Action::from_marker),
            );
        }
        Some(Value::String(marker)) => actions.extend(Action::from_marker(marker)),
        Some(other) => {
            return Err(InfraLensError::malformed(
                format!("{}.{}", path, ACTIONS_KEY),
                describe_mismatch("array of strings", other),
            ))
        }
    }

    Ok(actions)
}

/// Truthiness of a marker value: `false`, `0`, `""`, `[]`, `{}` and
/// `null` are all "no marker".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn describe_mismatch(expected: &str, found: &Value) -> String {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("expected {}, found {}", expected, found)
}

//! Outgoing payload normalization.
//!
//! Form data is reshaped before every create/update:
//! a nested object under `key` becomes `key_id` holding the object's `id`,
//! and a string containing a comma becomes an array of its comma separated parts
//! (single quotes are first turned into double quotes).

use serde_json::Value;

use crate::record::Record;

pub fn normalize_payload(mut payload: Record) -> Record {
    // Decisions are made against the submitted values, not the partially rewritten map.
    let snapshot: Vec<(String, Value)> = payload
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for (key, value) in snapshot {
        match value {
            Value::Object(nested) => {
                payload.remove(&key);
                match nested.get("id") {
                    Some(id) => {
                        payload.insert(format!("{key}_id"), id.clone());
                    }
                    None => {
                        payload.remove(&format!("{key}_id"));
                    }
                }
            }
            Value::String(text) if text.contains(',') => {
                payload.insert(key, split_list(&text));
            }
            _ => {}
        }
    }

    payload
}

fn split_list(text: &str) -> Value {
    Value::Array(
        text.replace('\'', "\"")
            .split(',')
            .map(|part| Value::String(part.to_string()))
            .collect(),
    )
}

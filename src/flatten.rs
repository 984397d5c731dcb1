// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattening of gNMI responses into xpath/value pairs.
//!
//! Notifications nest prefixes, paths and typed values; for display and
//! scripting it is convenient to reduce each update to a single xpath
//! string and a `serde_json::Value`.

use serde_json::{json, Value};

use crate::api::gnmi::{typed_value, GetResponse, Notification, Path, SubscribeResponse, TypedValue};
use crate::path::path_to_xpath;

/// A single flattened update.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatUpdate {
    /// Full xpath of the updated leaf or subtree.
    pub xpath: String,
    /// Decoded value; `Value::Null` for deletes.
    pub value: Value,
    /// True when this entry records a delete.
    pub deleted: bool,
    /// Timestamp of the enclosing notification, nanoseconds since epoch.
    pub timestamp: i64,
}

/// Decode a `TypedValue` into JSON.
///
/// JSON-family encodings are parsed; scalar variants map onto the obvious
/// JSON scalars; byte variants fall back to lossy UTF-8 strings.
pub fn value_to_json(value: &TypedValue) -> Value {
    let Some(inner) = &value.value else {
        return Value::Null;
    };
    match inner {
        typed_value::Value::StringVal(s) => Value::String(s.clone()),
        typed_value::Value::IntVal(i) => json!(i),
        typed_value::Value::UintVal(u) => json!(u),
        typed_value::Value::BoolVal(b) => Value::Bool(*b),
        typed_value::Value::BytesVal(b) | typed_value::Value::ProtoBytes(b) => {
            Value::String(String::from_utf8_lossy(b).into_owned())
        }
        typed_value::Value::FloatVal(f) => {
            serde_json::Number::from_f64(f64::from(*f)).map_or(Value::Null, Value::Number)
        }
        typed_value::Value::DoubleVal(d) => {
            serde_json::Number::from_f64(*d).map_or(Value::Null, Value::Number)
        }
        typed_value::Value::DecimalVal(d) => {
            let scaled = d.digits as f64 / 10f64.powi(d.precision as i32);
            serde_json::Number::from_f64(scaled).map_or(Value::Null, Value::Number)
        }
        typed_value::Value::LeaflistVal(list) => {
            Value::Array(list.element.iter().map(value_to_json).collect())
        }
        typed_value::Value::AsciiVal(s) => Value::String(s.clone()),
        typed_value::Value::JsonVal(bytes) | typed_value::Value::JsonIetfVal(bytes) => {
            serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
        }
    }
}

/// Join a notification prefix and an update path into one xpath.
fn joined_xpath(prefix: Option<&Path>, path: Option<&Path>) -> String {
    let mut combined = Path::default();
    if let Some(prefix) = prefix {
        combined.origin = prefix.origin.clone();
        combined.elem.extend(prefix.elem.iter().cloned());
    }
    if let Some(path) = path {
        if combined.origin.is_empty() {
            combined.origin = path.origin.clone();
        }
        combined.elem.extend(path.elem.iter().cloned());
    }
    path_to_xpath(&combined)
}

/// Flatten one notification into xpath/value pairs.
pub fn flatten_notification(notification: &Notification) -> Vec<FlatUpdate> {
    let prefix = notification.prefix.as_ref();
    let mut flat = Vec::new();
    for update in &notification.update {
        flat.push(FlatUpdate {
            xpath: joined_xpath(prefix, update.path.as_ref()),
            value: update.val.as_ref().map_or(Value::Null, value_to_json),
            deleted: false,
            timestamp: notification.timestamp,
        });
    }
    for delete in &notification.delete {
        flat.push(FlatUpdate {
            xpath: joined_xpath(prefix, Some(delete)),
            value: Value::Null,
            deleted: true,
            timestamp: notification.timestamp,
        });
    }
    flat
}

/// Flatten every notification in a Get response.
pub fn flatten_get_response(response: &GetResponse) -> Vec<FlatUpdate> {
    response
        .notification
        .iter()
        .flat_map(flatten_notification)
        .collect()
}

/// Flatten a Subscribe response; sync markers and legacy error messages
/// produce no entries.
pub fn flatten_subscribe_response(response: &SubscribeResponse) -> Vec<FlatUpdate> {
    use crate::api::gnmi::subscribe_response::Response;
    match &response.response {
        Some(Response::Update(notification)) => flatten_notification(notification),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::gnmi::{Decimal64, PathElem, ScalarArray, Update};
    use std::collections::HashMap;

    fn tv(value: typed_value::Value) -> TypedValue {
        TypedValue { value: Some(value) }
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(
            value_to_json(&tv(typed_value::Value::StringVal("up".into()))),
            json!("up")
        );
        assert_eq!(value_to_json(&tv(typed_value::Value::IntVal(-7))), json!(-7));
        assert_eq!(value_to_json(&tv(typed_value::Value::UintVal(42))), json!(42));
        assert_eq!(
            value_to_json(&tv(typed_value::Value::BoolVal(true))),
            json!(true)
        );
        assert_eq!(value_to_json(&TypedValue { value: None }), Value::Null);
    }

    #[test]
    fn test_decimal_value() {
        let value = value_to_json(&tv(typed_value::Value::DecimalVal(Decimal64 {
            digits: 12345,
            precision: 2,
        })));
        assert_eq!(value, json!(123.45));
    }

    #[test]
    fn test_leaflist_value() {
        let value = value_to_json(&tv(typed_value::Value::LeaflistVal(ScalarArray {
            element: vec![
                tv(typed_value::Value::StringVal("a".into())),
                tv(typed_value::Value::UintVal(1)),
            ],
        })));
        assert_eq!(value, json!(["a", 1]));
    }

    #[test]
    fn test_json_value_parses() {
        let value = value_to_json(&tv(typed_value::Value::JsonIetfVal(
            br#"{"mtu": 1500}"#.to_vec(),
        )));
        assert_eq!(value, json!({"mtu": 1500}));
    }

    #[test]
    fn test_invalid_json_falls_back_to_string() {
        let value = value_to_json(&tv(typed_value::Value::JsonVal(b"not json".to_vec())));
        assert_eq!(value, json!("not json"));
    }

    #[test]
    fn test_flatten_notification_joins_prefix() {
        let elem = |name: &str| PathElem {
            name: name.to_string(),
            key: HashMap::new(),
        };
        let notification = Notification {
            timestamp: 1700000000000000000,
            prefix: Some(Path {
                origin: "openconfig".into(),
                elem: vec![elem("interfaces"), elem("interface")],
                target: String::new(),
            }),
            update: vec![Update {
                path: Some(Path {
                    origin: String::new(),
                    elem: vec![elem("state"), elem("mtu")],
                    target: String::new(),
                }),
                val: Some(tv(typed_value::Value::UintVal(1500))),
                duplicates: 0,
            }],
            delete: vec![Path {
                origin: String::new(),
                elem: vec![elem("config"), elem("description")],
                target: String::new(),
            }],
            atomic: false,
        };

        let flat = flatten_notification(&notification);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].xpath, "openconfig:/interfaces/interface/state/mtu");
        assert_eq!(flat[0].value, json!(1500));
        assert!(!flat[0].deleted);
        assert_eq!(
            flat[1].xpath,
            "openconfig:/interfaces/interface/config/description"
        );
        assert!(flat[1].deleted);
        assert_eq!(flat[1].timestamp, 1700000000000000000);
    }
}

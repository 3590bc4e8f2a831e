use std::fmt;

use serde_json::Value;

use crate::schema::{SchemaKind, SchemaNode};

/// 单条结构违规，`path` 为自根节点起的属性名/下标序列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: Vec<String>,
    pub message: String,
}

impl SchemaViolation {
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            "(root)".to_string()
        } else {
            self.path.join("/")
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.message)
    }
}

/// 校验整棵文档树，收集全部违规而非遇错即停。
pub fn check_structure(schema: &SchemaNode, instance: &Value) -> Vec<SchemaViolation> {
    let mut violations = Vec::new();
    let mut path = Vec::new();
    visit(schema, instance, &mut path, &mut violations);
    violations
}

fn visit(
    schema: &SchemaNode,
    instance: &Value,
    path: &mut Vec<String>,
    violations: &mut Vec<SchemaViolation>,
) {
    let mut report = |path: &[String], message: String| {
        violations.push(SchemaViolation {
            path: path.to_vec(),
            message,
        });
    };

    if !matches_type(&schema.kind, instance) {
        report(
            &path[..],
            format!(
                "{} is not of type '{}'",
                describe(instance),
                schema.kind.type_name()
            ),
        );
        return;
    }

    if let (Some(allowed), Some(text)) = (schema.allowed, instance.as_str()) {
        if !allowed.iter().any(|option| *option == text) {
            let options: Vec<String> = allowed.iter().map(|option| format!("'{option}'")).collect();
            report(
                &path[..],
                format!("'{text}' is not one of [{}]", options.join(", ")),
            );
        }
    }

    if let Some(number) = instance.as_f64() {
        if let Some(minimum) = schema.minimum {
            if number < minimum {
                report(&path[..], format!("{number} is less than the minimum of {minimum}"));
            }
        }
        if let Some(bound) = schema.exclusive_minimum {
            if number <= bound {
                report(
                    &path[..],
                    format!("{number} is less than or equal to the minimum of {bound}"),
                );
            }
        }
    }

    match (&schema.kind, instance) {
        (SchemaKind::Object(object), Value::Object(map)) => {
            for required in object.required {
                if !map.contains_key(*required) {
                    violations.push(SchemaViolation {
                        path: path.clone(),
                        message: format!("'{required}' is a required property"),
                    });
                }
            }
            for (name, node) in &object.properties {
                if let Some(value) = map.get(*name) {
                    path.push((*name).to_string());
                    visit(node, value, path, violations);
                    path.pop();
                }
            }
        }
        (SchemaKind::Array(items), Value::Array(values)) => {
            for (index, value) in values.iter().enumerate() {
                path.push(index.to_string());
                visit(items, value, path, violations);
                path.pop();
            }
        }
        _ => {}
    }
}

fn matches_type(kind: &SchemaKind, instance: &Value) -> bool {
    match kind {
        SchemaKind::Object(_) => instance.is_object(),
        SchemaKind::Array(_) => instance.is_array(),
        SchemaKind::Number => instance.as_f64().is_some_and(f64::is_finite),
        SchemaKind::Integer => {
            instance.is_i64()
                || instance.is_u64()
                || instance
                    .as_f64()
                    .is_some_and(|value| value.is_finite() && value.fract() == 0.0)
        }
        SchemaKind::String => instance.is_string(),
        SchemaKind::Boolean => instance.is_boolean(),
    }
}

fn describe(instance: &Value) -> String {
    match instance {
        Value::String(text) => format!("'{text}'"),
        Value::Object(_) => "object".to_string(),
        Value::Array(_) => "array".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::normalize;
    use crate::schema::floorplan_schema;

    fn check(candidate: Value) -> Vec<String> {
        let schema = floorplan_schema();
        let normalized = normalize(&schema, candidate);
        check_structure(&schema, &normalized)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn valid_document_has_no_violations() {
        let messages = check(json!({
            "land_width": 10, "land_height": 10,
            "rooms": [{
                "type": "bedroom", "x": 0, "y": 0, "width": 3, "height": 3,
                "openings": [{ "type": "door", "wall": "south", "pos": 0.2, "width": 0.8 }]
            }]
        }));
        assert!(messages.is_empty(), "unexpected: {messages:?}");
    }

    #[test]
    fn collects_every_violation_with_paths() {
        let messages = check(json!({
            "land_width": "ten",
            "rooms": [
                { "type": "ballroom", "x": 0, "y": 0, "width": 3 },
                { "type": "hall", "x": 0, "y": 0, "width": 3, "height": 3,
                  "openings": [{ "type": "portal", "wall": "up", "pos": -1 }] }
            ],
            "floor_count": 1.5
        }));
        assert!(messages.contains(&"(root): 'land_height' is a required property".to_string()));
        assert!(messages.contains(&"land_width: 'ten' is not of type 'number'".to_string()));
        assert!(messages.contains(&"floor_count: 1.5 is not of type 'integer'".to_string()));
        assert!(messages.contains(&"rooms/0: 'height' is a required property".to_string()));
        assert!(
            messages
                .iter()
                .any(|message| message.starts_with("rooms/0/type: 'ballroom' is not one of"))
        );
        assert!(
            messages
                .iter()
                .any(|message| message.starts_with("rooms/1/openings/0/type: 'portal'"))
        );
        assert!(
            messages
                .iter()
                .any(|message| message.starts_with("rooms/1/openings/0/wall: 'up'"))
        );
        assert!(messages.contains(
            &"rooms/1/openings/0/pos: -1 is less than the minimum of 0".to_string()
        ));
        assert_eq!(messages.len(), 8, "{messages:?}");
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let messages = check(json!({
            "land_width": 0, "land_height": 10, "walls_thickness": 0,
            "rooms": [{ "type": "hall", "x": 0, "y": 0, "width": 0, "height": 2 }]
        }));
        assert!(messages.contains(
            &"land_width: 0 is less than or equal to the minimum of 0".to_string()
        ));
        assert!(messages.contains(
            &"walls_thickness: 0 is less than or equal to the minimum of 0".to_string()
        ));
        assert!(messages.contains(
            &"rooms/0/width: 0 is less than or equal to the minimum of 0".to_string()
        ));
    }
}

use serde_json::{Map, Value};

use crate::schema::{SchemaKind, SchemaNode};

/// 按结构契约递归补全缺省字段。
///
/// - 对象节点：缺失（或为 `null`）的属性使用新构造的默认值；没有默认值且非必填的
///   `null` 属性被移除；已存在的属性递归处理。
/// - 数组节点：缺失时使用默认列表，否则逐项按元素契约处理。
/// - 整数节点上的整值浮点数（如 `2.0`）改写为整数。
/// - 类型不符的值原样保留，交由结构校验报告。
///
/// 对已规范化的文档再次调用不会产生变化。
pub fn normalize(schema: &SchemaNode, instance: Value) -> Value {
    match (&schema.kind, instance) {
        (_, Value::Null) if schema.default.is_some() => schema.fresh_default().unwrap_or(Value::Null),
        (SchemaKind::Object(object), Value::Null) => normalize_object(object, Map::new()),
        (SchemaKind::Object(object), Value::Object(map)) => normalize_object(object, map),
        (SchemaKind::Array(items), Value::Array(values)) => Value::Array(
            values
                .into_iter()
                .map(|value| normalize(items, value))
                .collect(),
        ),
        (SchemaKind::Integer, Value::Number(number)) => Value::Number(whole_number(number)),
        (_, other) => other,
    }
}

fn whole_number(number: serde_json::Number) -> serde_json::Number {
    if number.is_i64() || number.is_u64() {
        return number;
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64 => {
            serde_json::Number::from(value as u64)
        }
        Some(value) if value.fract() == 0.0 && value >= i64::MIN as f64 && value < 0.0 => {
            serde_json::Number::from(value as i64)
        }
        _ => number,
    }
}

fn normalize_object(object: &crate::schema::ObjectSchema, mut map: Map<String, Value>) -> Value {
    for (name, node) in &object.properties {
        match map.remove(*name) {
            None | Some(Value::Null) if node.default.is_some() => {
                if let Some(default) = node.fresh_default() {
                    map.insert((*name).to_string(), default);
                }
            }
            Some(Value::Null) if !object.required.contains(name) => {}
            Some(value) => {
                map.insert((*name).to_string(), normalize(node, value));
            }
            None => {}
        }
    }
    Value::Object(map)
}

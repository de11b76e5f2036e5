//! 도구 인자 검증 (JSON Schema 부분 집합)
//!
//! `required` 와 각 속성의 기본 `type` 만 본다. 중첩 스키마나 `enum`,
//! 포맷 제약은 도구 쪽 책임이다.

use serde_json::Value;
use toolgate_foundation::{Error, Result};

/// 스키마에 맞는 인자인지 확인
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Result<()> {
    let expects_object = schema.get("type").and_then(Value::as_str) == Some("object")
        || schema.get("properties").is_some();
    if !expects_object {
        return Ok(());
    }

    let args = match arguments {
        Value::Object(map) => map,
        // 인자 없이 호출된 경우
        Value::Null => {
            return match first_required(schema) {
                Some(name) => Err(missing(name)),
                None => Ok(()),
            };
        }
        other => {
            return Err(Error::InvalidInput(format!(
                "arguments must be an object, got {}",
                type_name(other)
            )));
        }
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for name in required.iter().filter_map(Value::as_str) {
            match args.get(name) {
                None | Some(Value::Null) => return Err(missing(name)),
                Some(_) => {}
            }
        }
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };

    for (name, value) in args {
        let Some(expected) = properties
            .get(name)
            .and_then(|prop| prop.get("type"))
        else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        if !type_matches(expected, value) {
            return Err(Error::InvalidInput(format!(
                "argument '{}' must be {}, got {}",
                name,
                describe(expected),
                type_name(value)
            )));
        }
    }

    Ok(())
}

fn first_required(schema: &Value) -> Option<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .and_then(|required| required.iter().find_map(Value::as_str))
}

fn missing(name: &str) -> Error {
    Error::InvalidInput(format!("missing required argument '{}'", name))
}

/// `"type": "string"` 또는 `"type": ["string", "null"]`
fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(ty) => primitive_matches(ty, value),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|ty| primitive_matches(ty, value)),
        _ => true,
    }
}

fn primitive_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        // 모르는 타입은 통과
        _ => true,
    }
}

fn describe(expected: &Value) -> String {
    match expected {
        Value::String(ty) => ty.clone(),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" | "),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

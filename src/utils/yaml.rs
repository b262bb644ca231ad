//! 结构化记录编解码：元数据文件统一为 `字段名 → 标量/列表` 的有序映射
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::{LicResult, LicenseDbError};

/// 读取 YAML 元数据文件为有序映射
/// 空文件视为空映射；顶层不是映射时报错
pub fn read_mapping(path: &Path) -> LicResult<Mapping> {
    let content = fs::read_to_string(path).map_err(|e| LicenseDbError::io(path, e))?;
    parse_mapping(&content).map_err(|reason| LicenseDbError::malformed(path, reason))
}

/// 解析 YAML 文本为映射，错误以字符串返回，由调用方附加文件路径
pub fn parse_mapping(content: &str) -> Result<Mapping, String> {
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(format!("expected a mapping at top level, got: {}", value_kind(&other))),
    }
}

/// 映射中的所有字段名（非字符串键按 YAML 文本展示）
pub fn field_names(mapping: &Mapping) -> Vec<String> {
    mapping
        .keys()
        .map(|k| match k {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)
                .map(|s| s.trim().to_string())
                .unwrap_or_default(),
        })
        .collect()
}

/// 数值字段强制转为整数：接受整数、浮点数与数字字符串，浮点向零取整
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

/// 把映射中指定的数值字段原地替换为整数，无法转换时报错
pub fn coerce_integer_fields(mapping: &mut Mapping, fields: &[&str]) -> Result<(), String> {
    for field in fields {
        let Some(value) = mapping.get_mut(*field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let coerced = coerce_integer(value)
            .ok_or_else(|| format!("field {:?} is not a number: {}", field, value_kind(value)))?;
        *value = Value::Number(coerced.into());
    }
    Ok(())
}

/// 序列化为 YAML 并写入文件（UTF-8）
pub fn write_record<T: Serialize>(path: &Path, record: &T) -> LicResult<()> {
    let as_yaml = serde_yaml::to_string(record)
        .map_err(|e| LicenseDbError::malformed(path, format!("cannot serialize record: {}", e)))?;
    fs::write(path, as_yaml.as_bytes()).map_err(|e| LicenseDbError::io(path, e))
}

/// 简短的值类型描述，用于错误信息
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping_rejects_non_mapping() {
        assert!(parse_mapping("- a\n- b\n").is_err());
        assert!(parse_mapping("").unwrap().is_empty());
        assert!(parse_mapping("~").unwrap().is_empty());
        assert!(parse_mapping("key: [unclosed").is_err());
    }

    #[test]
    fn test_coerce_integer_fields() {
        let mut mapping = parse_mapping("relevance: '90'\nminimum_coverage: 70.9\nname: x\n").unwrap();
        coerce_integer_fields(&mut mapping, &["relevance", "minimum_coverage", "missing"]).unwrap();
        assert_eq!(mapping.get("relevance"), Some(&Value::Number(90.into())));
        assert_eq!(mapping.get("minimum_coverage"), Some(&Value::Number(70.into())));

        let mut bad = parse_mapping("relevance: high\n").unwrap();
        assert!(coerce_integer_fields(&mut bad, &["relevance"]).is_err());
    }
}

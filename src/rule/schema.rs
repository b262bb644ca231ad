//! 规则元数据文件结构（`<name>.yml`）
//! 与许可证不同，规则文件出现未知字段即视为格式错误
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{LicResult, LicenseDbError};
use crate::rule::thresholds::{FULL_COVERAGE, MAX_RELEVANCE};
use crate::utils::yaml;

/// 规则元数据文件扩展名
pub const RULE_DATA_EXT: &str = "yml";
/// 规则文本文件扩展名
pub const RULE_TEXT_EXT: &str = "RULE";

/// 规则文件可识别的字段（即写出顺序）
pub const RULE_FIELDS: &[&str] = &[
    "license_expression",
    "is_false_positive",
    "is_negative",
    "is_license_text",
    "is_license_notice",
    "is_license_reference",
    "is_license_tag",
    "only_known_words",
    "relevance",
    "minimum_coverage",
    "referenced_filenames",
    "notes",
];

const NUMERIC_FIELDS: &[&str] = &["relevance", "minimum_coverage"];

/// 规则的持久化记录：省略 false 标志、未显式设置的相关度与 0 覆盖率
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_expression: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub is_false_positive: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_negative: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_license_text: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_license_notice: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_license_reference: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_license_tag: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub only_known_words: bool,
    /// 仅在显式设置时存在
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u8>,
    #[serde(skip_serializing_if = "is_zero")]
    pub minimum_coverage: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub referenced_filenames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &u8) -> bool {
    *v == 0
}

impl RuleRecord {
    /// 读取并校验规则元数据文件
    ///
    /// 校验项：未知字段（全部列出）、数值字段可转整数、显式相关度在 (0, 100]、
    /// 覆盖率在 [0, 100]、`referenced_filenames` 必须是列表
    pub fn read(data_file: &Path) -> LicResult<Self> {
        let mapping = yaml::read_mapping(data_file)?;
        Self::from_mapping(mapping).map_err(|reason| LicenseDbError::malformed(data_file, reason))
    }

    pub fn from_mapping(mut mapping: Mapping) -> Result<Self, String> {
        let mut unknown: Vec<String> = yaml::field_names(&mapping)
            .into_iter()
            .filter(|name| !RULE_FIELDS.contains(&name.as_str()))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(format!(
                "License rule data file has unknown attributes: {}",
                unknown.join(", ")
            ));
        }

        yaml::coerce_integer_fields(&mut mapping, NUMERIC_FIELDS)?;

        if let Some(relevance) = mapping.get("relevance").and_then(yaml::coerce_integer) {
            if !(1..=i64::from(MAX_RELEVANCE)).contains(&relevance) {
                return Err(format!(
                    "License rule data file has an invalid relevance. Should be between 0 and 100: {}",
                    relevance
                ));
            }
        }
        if let Some(coverage) = mapping.get("minimum_coverage").and_then(yaml::coerce_integer) {
            if !(0..=i64::from(FULL_COVERAGE)).contains(&coverage) {
                return Err(format!(
                    "License rule data file has an invalid minimum_coverage. Should be between 0 and 100: {}",
                    coverage
                ));
            }
        }
        if let Some(filenames) = mapping.get("referenced_filenames") {
            if !matches!(filenames, Value::Null | Value::Sequence(_)) {
                return Err(format!(
                    "License rule data file has an invalid referenced_filenames. Should be a list: {}",
                    yaml::value_kind(filenames)
                ));
            }
        }

        // 空值按默认值处理
        let mapping: Mapping = mapping
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();

        let mut record: RuleRecord =
            serde_yaml::from_value(Value::Mapping(mapping)).map_err(|e| e.to_string())?;
        record.notes = record
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());
        record.license_expression = record.license_expression.filter(|e| !e.trim().is_empty());
        Ok(record)
    }

    /// 是否为否定规则或误报规则
    pub fn is_special(&self) -> bool {
        self.is_negative || self.is_false_positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml_text: &str) -> Result<RuleRecord, String> {
        RuleRecord::from_mapping(yaml::parse_mapping(yaml_text)?)
    }

    #[test]
    fn test_unknown_fields_are_listed_sorted() {
        let err = parse("license_expression: mit\nzeta: 1\nalpha: 2\n").unwrap_err();
        assert!(err.ends_with("unknown attributes: alpha, zeta"));
    }

    #[test]
    fn test_relevance_range() {
        assert_eq!(parse("relevance: 100\n").unwrap().relevance, Some(100));
        assert_eq!(parse("relevance: '75.5'\n").unwrap().relevance, Some(75));
        assert!(parse("relevance: 0\n").unwrap_err().contains("invalid relevance"));
        assert!(parse("relevance: 101\n").unwrap_err().contains("invalid relevance"));
        assert!(parse("relevance: -3\n").is_err());
        assert!(parse("minimum_coverage: 120\n").unwrap_err().contains("invalid minimum_coverage"));
    }

    #[test]
    fn test_referenced_filenames_must_be_list() {
        let err = parse("referenced_filenames: COPYING\n").unwrap_err();
        assert!(err.contains("Should be a list"));
        let ok = parse("referenced_filenames:\n  - COPYING\n  - LICENSE\n").unwrap();
        assert_eq!(ok.referenced_filenames, vec!["COPYING", "LICENSE"]);
        assert!(parse("referenced_filenames:\n").unwrap().referenced_filenames.is_empty());
    }

    #[test]
    fn test_notes_are_trimmed() {
        let record = parse("is_negative: yes\nnotes: '  not a license  '\n");
        // YAML 1.2：`yes` 不是布尔值
        assert!(record.is_err());
        let record = parse("is_negative: true\nnotes: '  not a license  '\n").unwrap();
        assert_eq!(record.notes.as_deref(), Some("not a license"));
        assert!(record.is_special());
    }
}

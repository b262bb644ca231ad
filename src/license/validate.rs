//! 许可证库批量校验
//! 仅供测试/校验工具使用，不在正常加载流程中运行；永不返回错误，只汇总分级消息
use std::collections::BTreeMap;

use log::{error, info, warn};
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::license::category::LicenseCategory;
use crate::license::model::License;
use crate::utils::tokenizer::{tokens_of, Tokenizer};

/// 全局（跨许可证）问题使用的分组 key
pub const GLOBAL_KEY: &str = "GLOBAL";

/// key → 消息列表
pub type Messages = BTreeMap<String, Vec<String>>;

/// 校验结果：错误 / 警告 / 提示 三级，只保留有消息的 key
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Messages,
    pub warnings: Messages,
    pub infos: Messages,
}

impl ValidationReport {
    /// 无任何错误级消息
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// 按级别输出全部消息
    pub fn log(&self) {
        for (key, messages) in &self.errors {
            for message in messages {
                error!("{}: {}", key, message);
            }
        }
        for (key, messages) in &self.warnings {
            for message in messages {
                warn!("{}: {}", key, message);
            }
        }
        for (key, messages) in &self.infos {
            for message in messages {
                info!("{}: {}", key, message);
            }
        }
    }

    fn push(bucket: &mut Messages, key: &str, message: impl Into<String>) {
        bucket.entry(key.to_string()).or_default().push(message.into());
    }
}

/// 全库一致性校验
///
/// - 单个许可证：缺少短名/全名/分类/所有者、分类不在封闭集合内 → 错误
/// - `no_dupe_urls`：URL 列表中的空值与重复 → 警告
/// - 全文分词结果为空 → 提示
/// - 全局：同一 SPDX key 被多个许可证占用、全文/短名/全名重复 → 错误
pub fn validate(
    licenses: &BTreeMap<String, License>,
    tokenizer: &dyn Tokenizer,
    verbose: bool,
    no_dupe_urls: bool,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    // 值 → 占用该值的许可证 key（或消息），桶大小 > 1 即重复
    let mut by_spdx_key: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut by_text: BTreeMap<Vec<String>, Vec<String>> = BTreeMap::new();
    let mut by_short_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (key, license) in licenses {
        let data = &license.data;
        let key = key.as_str();

        // ===================== 必填字段 =====================
        if is_blank(&data.short_name) {
            ValidationReport::push(&mut report.errors, key, "No short name");
        }
        if is_blank(&data.name) {
            ValidationReport::push(&mut report.errors, key, "No name");
        }
        match data.category.as_deref().filter(|c| !c.is_empty()) {
            None => ValidationReport::push(&mut report.errors, key, "No category"),
            Some(category) => {
                if let Err(message) = category.parse::<LicenseCategory>() {
                    ValidationReport::push(&mut report.errors, key, message);
                }
            }
        }
        if is_blank(&data.owner) {
            ValidationReport::push(&mut report.errors, key, "No owner");
        }

        // ===================== URL 检查 =====================
        if no_dupe_urls {
            for message in url_warnings(license) {
                ValidationReport::push(&mut report.warnings, key, message);
            }
        }

        // ===================== 全文 =====================
        match license.text() {
            Ok(text) => {
                let tokens = tokens_of(tokenizer, &text, true);
                if tokens.is_empty() {
                    ValidationReport::push(&mut report.infos, key, "No license text");
                } else {
                    by_text.entry(tokens).or_default().push(format!("{}: TEXT", key));
                }
            }
            Err(e) => {
                ValidationReport::push(&mut report.errors, key, format!("Cannot read license text: {}", e))
            }
        }

        for spdx_key in license.spdx_keys() {
            by_spdx_key.entry(spdx_key).or_default().push(key);
        }
        if let Some(short_name) = data.short_name.as_deref().filter(|s| !s.is_empty()) {
            by_short_name.entry(short_name).or_default().push(key);
        }
        if let Some(name) = data.name.as_deref().filter(|s| !s.is_empty()) {
            by_name.entry(name).or_default().push(key);
        }
    }

    // ===================== 全局重复检查 =====================
    for (spdx_key, mut keys) in by_spdx_key {
        if keys.len() > 1 {
            keys.sort_unstable();
            ValidationReport::push(
                &mut report.errors,
                GLOBAL_KEY,
                format!("SPDX key: {} used in multiple licenses: {}", spdx_key, keys.join(", ")),
            );
        }
    }
    for (_, mut messages) in by_text {
        if messages.len() > 1 {
            messages.sort_unstable();
            ValidationReport::push(
                &mut report.errors,
                GLOBAL_KEY,
                format!("Duplicate texts in multiple licenses: {}", messages.join(", ")),
            );
        }
    }
    for (short_name, keys) in by_short_name {
        if keys.len() > 1 {
            ValidationReport::push(
                &mut report.errors,
                GLOBAL_KEY,
                format!("Duplicate short name: {} in licenses: {}", short_name, keys.join(", ")),
            );
        }
    }
    for (name, keys) in by_name {
        if keys.len() > 1 {
            ValidationReport::push(
                &mut report.errors,
                GLOBAL_KEY,
                format!("Duplicate name: {} in licenses: {}", name, keys.join(", ")),
            );
        }
    }

    if verbose {
        report.log();
    }
    report
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().unwrap_or_default().is_empty()
}

/// 单个许可证的 URL 警告
fn url_warnings(license: &License) -> Vec<&'static str> {
    let data = &license.data;
    let mut warnings = Vec::new();

    let homepage = data.homepage_url.as_deref().filter(|u| !u.is_empty());
    let osi = data.osi_url.as_deref().filter(|u| !u.is_empty());
    let faq = data.faq_url.as_deref().filter(|u| !u.is_empty());

    if data.text_urls.iter().any(String::is_empty) {
        warnings.push("Some empty text_urls values");
    }
    if data.other_urls.iter().any(String::is_empty) {
        warnings.push("Some empty other_urls values");
    }

    if let Some(homepage) = homepage {
        if data.text_urls.iter().any(|u| u == homepage) {
            warnings.push("Homepage URL also in text_urls");
        }
        if data.other_urls.iter().any(|u| u == homepage) {
            warnings.push("Homepage URL also in other_urls");
        }
        if faq == Some(homepage) {
            warnings.push("Homepage URL same as faq_url");
        }
        if osi == Some(homepage) {
            warnings.push("Homepage URL same as osi_url");
        }
    }
    if osi.is_some() && osi == faq {
        warnings.push("osi_url same as faq_url");
    }

    let all_urls: Vec<&str> = homepage
        .into_iter()
        .chain(osi)
        .chain(faq)
        .chain(data.text_urls.iter().map(String::as_str))
        .chain(data.other_urls.iter().map(String::as_str))
        .filter(|u| !u.is_empty())
        .collect();
    let unique: FxHashSet<&str> = all_urls.iter().copied().collect();
    if unique.len() != all_urls.len() {
        warnings.push("Some duplicated URLs");
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::QueryTokenizer;
    use std::path::Path;

    fn license(dir: &Path, key: &str, name: &str, text: &str) -> License {
        let mut lic = License::empty(key, dir);
        lic.data.short_name = Some(format!("{} short", name));
        lic.data.name = Some(name.to_string());
        lic.data.category = Some("Permissive".into());
        lic.data.owner = Some("Someone".into());
        if !text.is_empty() {
            lic.write_text(text).unwrap();
        }
        lic
    }

    fn by_key(licenses: Vec<License>) -> BTreeMap<String, License> {
        licenses.into_iter().map(|l| (l.key().to_string(), l)).collect()
    }

    #[test]
    fn test_validate_clean_corpus() {
        let tmp = tempfile::tempdir().unwrap();
        let licenses = by_key(vec![
            license(tmp.path(), "mit", "MIT", "Permission is hereby granted"),
            license(tmp.path(), "zlib", "ZLIB", "This software is provided 'as-is'"),
        ]);
        let report = validate(&licenses, &QueryTokenizer, false, true);
        assert!(report.is_clean());
        assert!(report.warnings.is_empty());
        assert!(report.infos.is_empty());
    }

    #[test]
    fn test_validate_missing_fields_and_unknown_category() {
        let tmp = tempfile::tempdir().unwrap();
        let mut bare = License::empty("bare", tmp.path());
        bare.data.category = Some("Shareware".into());
        let report = validate(&by_key(vec![bare]), &QueryTokenizer, false, false);

        let errors = &report.errors["bare"];
        assert!(errors.contains(&"No short name".to_string()));
        assert!(errors.contains(&"No name".to_string()));
        assert!(errors.contains(&"No owner".to_string()));
        assert!(errors.contains(&"Unknown license category: Shareware".to_string()));
        assert_eq!(report.infos["bare"], vec!["No license text".to_string()]);
    }

    #[test]
    fn test_validate_duplicate_texts_is_global_error() {
        let tmp = tempfile::tempdir().unwrap();
        let licenses = by_key(vec![
            license(tmp.path(), "foo", "Foo", "Same license text.\n"),
            license(tmp.path(), "bar", "Bar", "same   LICENSE text"),
        ]);
        let report = validate(&licenses, &QueryTokenizer, true, false);
        let global = &report.errors[GLOBAL_KEY];
        assert_eq!(global.len(), 1);
        assert!(global[0].contains("bar: TEXT"));
        assert!(global[0].contains("foo: TEXT"));
    }

    #[test]
    fn test_validate_spdx_key_claimed_twice() {
        let tmp = tempfile::tempdir().unwrap();
        let mut a = license(tmp.path(), "a", "A", "text a");
        a.data.spdx_license_key = Some("X-1.0".into());
        let mut b = license(tmp.path(), "b", "B", "text b");
        b.data.other_spdx_license_keys = vec!["X-1.0".into()];
        let report = validate(&by_key(vec![a, b]), &QueryTokenizer, false, false);
        assert_eq!(
            report.errors[GLOBAL_KEY],
            vec!["SPDX key: X-1.0 used in multiple licenses: a, b".to_string()]
        );
    }

    #[test]
    fn test_validate_url_warnings() {
        let tmp = tempfile::tempdir().unwrap();
        let mut lic = license(tmp.path(), "u", "U", "text");
        lic.data.homepage_url = Some("https://u.example".into());
        lic.data.faq_url = Some("https://u.example".into());
        lic.data.other_urls = vec!["".into()];
        let licenses = by_key(vec![lic]);

        let report = validate(&licenses, &QueryTokenizer, false, true);
        let warnings = &report.warnings["u"];
        assert!(warnings.contains(&"Homepage URL same as faq_url".to_string()));
        assert!(warnings.contains(&"Some empty other_urls values".to_string()));
        assert!(warnings.contains(&"Some duplicated URLs".to_string()));

        let quiet = validate(&licenses, &QueryTokenizer, false, false);
        assert!(quiet.warnings.is_empty());
    }
}

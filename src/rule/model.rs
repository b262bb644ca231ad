//! 检测规则数据模型
//! 规则 = 一段文本 + 许可证识别元数据；token 统计量在分词时写入，由匹配索引进一步细分为高/低区分度
use std::fs;
use std::path::{Path, PathBuf};

use log::trace;
use serde::Serialize;

use crate::error::{LicResult, LicenseDbError};
use crate::expression::{LicenseExpression, Licensing};
use crate::rule::schema::{RuleRecord, RULE_TEXT_EXT};
use crate::rule::thresholds::{
    occurrence_bars, relevance_for_length, unique_bars, Thresholds, FULL_COVERAGE, MAX_RELEVANCE,
    SMALL_RULE,
};
use crate::utils::tokenizer::Tokenizer;
use crate::utils::{file_name, file_url, preview_compact};

/// 判定"裸 URL 规则"时只看文本开头这么多字符
const BARE_URL_WINDOW: usize = 1000;
const URL_SCHEMES: [&str; 3] = ["http://", "https://", "ftp://"];

/// 规则种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleKind {
    /// 文件规则、测试规则、由许可证全文生成的规则
    Standard,
    /// 匹配时由 SPDX 表达式动态生成，不可加载/持久化，永不视为短规则
    Spdx,
}

/// 许可证检测规则
#[derive(Debug, Clone)]
pub struct Rule {
    /// 索引时分配的规则 id
    pub rid: Option<usize>,
    identifier: String,
    kind: RuleKind,

    /// 规范化渲染后的表达式字符串
    license_expression: Option<String>,
    expression: Option<LicenseExpression>,

    // ===================== 重要性标志 =====================
    pub is_license_text: bool,
    pub is_license_notice: bool,
    pub is_license_reference: bool,
    pub is_license_tag: bool,

    // ===================== 特殊标志 =====================
    pub is_false_positive: bool,
    pub is_negative: bool,
    pub only_known_words: bool,
    /// 由许可证全文生成，永不单独写出
    pub is_license: bool,

    pub minimum_coverage: u8,
    pub relevance: u8,
    pub has_stored_relevance: bool,
    pub referenced_filenames: Vec<String>,
    pub notes: Option<String>,

    data_file: Option<PathBuf>,
    text_file: Option<PathBuf>,
    stored_text: Option<String>,

    // ===================== token 统计量 =====================
    pub length: usize,
    pub high_length: usize,
    pub low_length: usize,
    pub high_unique: usize,
    pub low_unique: usize,
    pub length_unique: usize,

    thresholds: Option<Thresholds>,
    thresholds_unique: Option<Thresholds>,
}

impl Rule {
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// 由 SPDX 表达式构造动态规则
    /// `text` 为匹配到的原始标签文本；表达式为空或无法解析时报错
    pub fn spdx(licensing: &Licensing, expression: &str, text: impl Into<String>) -> LicResult<Rule> {
        let identifier = format!("spdx-license-identifier: {}", expression);
        let parsed = licensing
            .parse(expression)
            .map_err(|e| LicenseDbError::InvalidExpression {
                expression: expression.to_string(),
                location: identifier.clone(),
                reason: e.to_string(),
            })?;

        let mut rule = Rule::empty(identifier, RuleKind::Spdx);
        rule.license_expression = Some(parsed.render());
        rule.expression = Some(parsed);
        rule.stored_text = Some(text.into());
        rule.is_license_tag = true;
        rule.relevance = MAX_RELEVANCE;
        rule.has_stored_relevance = true;
        Ok(rule)
    }

    fn empty(identifier: String, kind: RuleKind) -> Rule {
        Rule {
            rid: None,
            identifier,
            kind,
            license_expression: None,
            expression: None,
            is_license_text: false,
            is_license_notice: false,
            is_license_reference: false,
            is_license_tag: false,
            is_false_positive: false,
            is_negative: false,
            only_known_words: false,
            is_license: false,
            minimum_coverage: 0,
            relevance: MAX_RELEVANCE,
            has_stored_relevance: false,
            referenced_filenames: Vec::new(),
            notes: None,
            data_file: None,
            text_file: None,
            stored_text: None,
            length: 0,
            high_length: 0,
            low_length: 0,
            high_unique: 0,
            low_unique: 0,
            length_unique: 0,
            thresholds: None,
            thresholds_unique: None,
        }
    }

    // ===================== 访问器 =====================

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn is_spdx(&self) -> bool {
        self.kind == RuleKind::Spdx
    }

    pub fn license_expression(&self) -> Option<&str> {
        self.license_expression.as_deref()
    }

    pub fn expression(&self) -> Option<&LicenseExpression> {
        self.expression.as_ref()
    }

    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    pub fn text_file(&self) -> Option<&Path> {
        self.text_file.as_deref()
    }

    pub fn stored_text(&self) -> Option<&str> {
        self.stored_text.as_deref()
    }

    /// 出错信息中用于定位规则的位置：有数据文件时为其 file:// 地址
    fn location(&self) -> String {
        match &self.data_file {
            Some(path) => file_url(path),
            None => self.identifier.clone(),
        }
    }

    // ===================== 文本与分词 =====================

    /// 规则文本：优先读取文本文件（每次访问重新读取），否则使用内存文本
    pub fn text(&self) -> LicResult<String> {
        if let Some(text_file) = self.text_file.as_ref().filter(|p| p.exists()) {
            let bytes = fs::read(text_file).map_err(|e| LicenseDbError::io(text_file, e))?;
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
        match self.stored_text.as_deref() {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(LicenseDbError::InconsistentText {
                identifier: match &self.text_file {
                    Some(path) => format!("{}\n{}", self.identifier, file_url(path)),
                    None => self.identifier.clone(),
                },
            }),
        }
    }

    /// 分词，副作用：更新 `length`、重新计算相关度；
    /// 文本为单行裸 URL 时强制 `minimum_coverage` 为 100
    pub fn tokens(&mut self, tokenizer: &dyn Tokenizer, lower: bool) -> LicResult<Vec<String>> {
        let text = self.text()?;
        if is_bare_url(text.trim()) {
            self.minimum_coverage = FULL_COVERAGE;
        }

        let tokens: Vec<String> = tokenizer.tokenize(&text, lower).collect();
        self.length = tokens.len();
        self.compute_relevance();
        trace!(
            "Tokenized rule {}: {} tokens [{}]",
            self.identifier,
            self.length,
            preview_compact(&text, 60)
        );
        Ok(tokens)
    }

    /// 计算相关度；显式设置过相关度时不做任何事
    /// 误报与否定规则保持 100，其余按长度计算
    pub fn compute_relevance(&mut self) {
        if self.has_stored_relevance {
            return;
        }
        if self.is_false_positive || self.is_negative {
            self.relevance = MAX_RELEVANCE;
            return;
        }
        self.relevance = relevance_for_length(self.length);
    }

    /// 是否为短规则（匹配时需特殊处理）
    pub fn small(&self) -> bool {
        match self.kind {
            RuleKind::Spdx => false,
            RuleKind::Standard => self.length < SMALL_RULE || self.minimum_coverage == FULL_COVERAGE,
        }
    }

    /// 全部 token 出现次数口径的门槛（首次调用时计算并缓存，短规则会改写 `minimum_coverage`）
    pub fn thresholds(&mut self) -> Thresholds {
        if let Some(cached) = self.thresholds {
            return cached;
        }
        let (min_high, min_len) =
            occurrence_bars(self.length, self.high_length, &mut self.minimum_coverage);
        let computed = Thresholds {
            high_len: self.high_length,
            low_len: self.low_length,
            length: self.length,
            small: self.small(),
            min_high,
            min_len,
        };
        self.thresholds = Some(computed);
        computed
    }

    /// 去重 token 口径的门槛（首次调用时计算并缓存）
    pub fn thresholds_unique(&mut self) -> Thresholds {
        if let Some(cached) = self.thresholds_unique {
            return cached;
        }
        let (min_high, min_len) = unique_bars(
            self.length,
            self.high_unique,
            self.length_unique,
            self.minimum_coverage,
        );
        let computed = Thresholds {
            high_len: self.high_unique,
            low_len: self.low_unique,
            length: self.length_unique,
            small: self.small(),
            min_high,
            min_len,
        };
        self.thresholds_unique = Some(computed);
        computed
    }

    /// 统计量变化后清空门槛缓存
    pub fn invalidate_thresholds(&mut self) {
        self.thresholds = None;
        self.thresholds_unique = None;
    }

    // ===================== 许可证表达式 =====================

    /// 表达式中的原子许可证 key；没有表达式时为空
    pub fn license_keys(&self, unique: bool) -> Vec<String> {
        self.expression
            .as_ref()
            .map(|e| e.license_keys(unique))
            .unwrap_or_default()
    }

    /// 两条规则的许可证表达式是否等价；任一方没有表达式时为 None
    pub fn same_licensing(&self, other: &Rule, licensing: &Licensing) -> Option<bool> {
        match (&self.expression, &other.expression) {
            (Some(a), Some(b)) => Some(licensing.is_equivalent(a, b)),
            _ => None,
        }
    }

    /// 本规则的许可证表达式是否包含另一条规则的；任一方没有表达式时为 None
    pub fn licensing_contains(&self, other: &Rule, licensing: &Licensing) -> Option<bool> {
        match (&self.expression, &other.expression) {
            (Some(a), Some(b)) => Some(licensing.contains(a, b)),
            _ => None,
        }
    }

    /// 是否至少声明了一个重要性标志
    pub fn has_importance_flags(&self) -> bool {
        self.is_license_text || self.is_license_notice || self.is_license_reference || self.is_license_tag
    }

    fn parse_expression(&mut self, licensing: &Licensing) -> LicResult<()> {
        let Some(raw) = self.license_expression.as_deref() else {
            self.expression = None;
            return Ok(());
        };
        let parsed = licensing
            .parse(raw)
            .map_err(|e| LicenseDbError::InvalidExpression {
                expression: raw.to_string(),
                location: self.location(),
                reason: e.to_string(),
            })?;
        self.license_expression = Some(parsed.render());
        self.expression = Some(parsed);
        Ok(())
    }

    // ===================== 持久化 =====================

    /// 从元数据文件加载字段（不读取文本）并重新解析表达式
    pub fn load(&mut self, licensing: &Licensing) -> LicResult<()> {
        if self.is_spdx() {
            return Err(LicenseDbError::UnsupportedOperation("load"));
        }
        let Some(data_file) = self.data_file.clone() else {
            return Ok(());
        };

        let record = RuleRecord::read(&data_file)?;
        if record.license_expression.is_none() && !record.is_special() {
            return Err(LicenseDbError::missing_evidence(
                &data_file,
                format!("License rule {} is missing a license_expression.", self.identifier),
            ));
        }
        if record.notes.is_none() && record.is_special() {
            return Err(LicenseDbError::missing_evidence(
                &data_file,
                format!("Special License rule {} is missing explanatory notes.", self.identifier),
            ));
        }

        self.license_expression = record.license_expression;
        self.is_false_positive = record.is_false_positive;
        self.is_negative = record.is_negative;
        self.is_license_text = record.is_license_text;
        self.is_license_notice = record.is_license_notice;
        self.is_license_reference = record.is_license_reference;
        self.is_license_tag = record.is_license_tag;
        self.only_known_words = record.only_known_words;
        if let Some(relevance) = record.relevance {
            self.relevance = relevance;
            self.has_stored_relevance = true;
        }
        self.minimum_coverage = record.minimum_coverage;
        self.referenced_filenames = record.referenced_filenames;
        self.notes = record.notes;

        self.parse_expression(licensing)?;
        trace!("Loaded rule {} from {}", self.identifier, file_url(&data_file));
        Ok(())
    }

    /// 转为持久化记录
    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            license_expression: self.license_expression.clone(),
            is_false_positive: self.is_false_positive,
            is_negative: self.is_negative,
            is_license_text: self.is_license_text,
            is_license_notice: self.is_license_notice,
            is_license_reference: self.is_license_reference,
            is_license_tag: self.is_license_tag,
            only_known_words: self.only_known_words,
            relevance: self.has_stored_relevance.then_some(self.relevance),
            minimum_coverage: self.minimum_coverage,
            referenced_filenames: self.referenced_filenames.clone(),
            notes: self.notes.clone(),
        }
    }

    /// 写出元数据与文本文件；由许可证生成的规则或没有数据文件的规则什么也不做
    pub fn dump(&self) -> LicResult<()> {
        if self.is_spdx() {
            return Err(LicenseDbError::UnsupportedOperation("dump"));
        }
        if self.is_license {
            return Ok(());
        }
        let Some(data_file) = self.data_file.as_deref() else {
            return Ok(());
        };
        let text = self.text()?;
        crate::utils::yaml::write_record(data_file, &self.to_record())?;
        let text_file = self
            .text_file
            .clone()
            .unwrap_or_else(|| data_file.with_extension(RULE_TEXT_EXT));
        fs::write(&text_file, text.as_bytes()).map_err(|e| LicenseDbError::io(&text_file, e))
    }
}

/// 单行裸 URL：以 URL scheme 开头，且前若干字符内没有换行
fn is_bare_url(text: &str) -> bool {
    URL_SCHEMES.iter().any(|scheme| text.starts_with(scheme))
        && !text.chars().take(BARE_URL_WINDOW).any(|c| c == '\n')
}

// ===================== 构建器 =====================

/// 规则构建器
/// 必须提供文本文件或非空内存文本之一；提供数据文件时从中加载字段
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
    data_file: Option<PathBuf>,
    /// 构建时是否从数据文件加载字段
    load_data_file: bool,
    text_file: Option<PathBuf>,
    stored_text: Option<String>,
    license_expression: Option<String>,
    is_license_text: bool,
    is_license_notice: bool,
    is_license_reference: bool,
    is_license_tag: bool,
    is_false_positive: bool,
    is_negative: bool,
    only_known_words: bool,
    is_license: bool,
    minimum_coverage: u8,
    relevance: Option<u8>,
    has_stored_relevance: bool,
    referenced_filenames: Vec<String>,
    notes: Option<String>,
}

impl RuleBuilder {
    /// 数据文件，构建时从中加载字段
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self.load_data_file = true;
        self
    }

    /// 只设置 `dump` 的写出位置，构建时不读取
    pub fn target_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self.load_data_file = false;
        self
    }

    pub fn text_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.text_file = Some(path.into());
        self
    }

    pub fn stored_text(mut self, text: impl Into<String>) -> Self {
        self.stored_text = Some(text.into());
        self
    }

    pub fn license_expression(mut self, expression: impl Into<String>) -> Self {
        self.license_expression = Some(expression.into());
        self
    }

    pub fn is_license_text(mut self, value: bool) -> Self {
        self.is_license_text = value;
        self
    }

    pub fn is_license_notice(mut self, value: bool) -> Self {
        self.is_license_notice = value;
        self
    }

    pub fn is_license_reference(mut self, value: bool) -> Self {
        self.is_license_reference = value;
        self
    }

    pub fn is_license_tag(mut self, value: bool) -> Self {
        self.is_license_tag = value;
        self
    }

    pub fn is_false_positive(mut self, value: bool) -> Self {
        self.is_false_positive = value;
        self
    }

    pub fn is_negative(mut self, value: bool) -> Self {
        self.is_negative = value;
        self
    }

    pub fn only_known_words(mut self, value: bool) -> Self {
        self.only_known_words = value;
        self
    }

    pub fn is_license(mut self, value: bool) -> Self {
        self.is_license = value;
        self
    }

    pub fn minimum_coverage(mut self, value: u8) -> Self {
        self.minimum_coverage = value;
        self
    }

    pub fn relevance(mut self, value: u8) -> Self {
        self.relevance = Some(value);
        self
    }

    pub fn has_stored_relevance(mut self, value: bool) -> Self {
        self.has_stored_relevance = value;
        self
    }

    pub fn referenced_filenames(mut self, filenames: Vec<String>) -> Self {
        self.referenced_filenames = filenames;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// 构建规则：确定标识 → 加载数据文件 → 标记显式相关度 → 解析表达式
    pub fn build(self, licensing: &Licensing) -> LicResult<Rule> {
        let identifier = match (&self.text_file, self.stored_text.as_deref()) {
            (Some(text_file), _) => file_name(text_file),
            (None, Some(text)) if !text.is_empty() => format!("_tst_{}", text.chars().count()),
            _ => {
                return Err(LicenseDbError::InconsistentText {
                    identifier: self
                        .data_file
                        .as_deref()
                        .map(file_url)
                        .unwrap_or_else(|| "<rule without text>".to_string()),
                })
            }
        };

        // 文本文件存在或内存文本非空，二者至少其一
        let has_text_file = self.text_file.as_deref().is_some_and(Path::is_file);
        let has_stored_text = self.stored_text.as_deref().is_some_and(|t| !t.is_empty());
        if !has_text_file && !has_stored_text {
            return Err(LicenseDbError::InconsistentText {
                identifier: match &self.text_file {
                    Some(path) => format!("{}\n{}", identifier, file_url(path)),
                    None => identifier,
                },
            });
        }

        let mut rule = Rule::empty(identifier, RuleKind::Standard);
        rule.data_file = self.data_file;
        rule.text_file = self.text_file;
        rule.stored_text = self.stored_text;
        rule.license_expression = self.license_expression.filter(|e| !e.trim().is_empty());
        rule.is_license_text = self.is_license_text;
        rule.is_license_notice = self.is_license_notice;
        rule.is_license_reference = self.is_license_reference;
        rule.is_license_tag = self.is_license_tag;
        rule.is_false_positive = self.is_false_positive;
        rule.is_negative = self.is_negative;
        rule.only_known_words = self.only_known_words;
        rule.is_license = self.is_license;
        rule.minimum_coverage = self.minimum_coverage.min(FULL_COVERAGE);
        rule.relevance = self.relevance.unwrap_or(MAX_RELEVANCE).min(MAX_RELEVANCE);
        rule.has_stored_relevance = self.has_stored_relevance;
        rule.referenced_filenames = self.referenced_filenames;
        rule.notes = self.notes;

        if self.load_data_file {
            // load 内部完成表达式解析
            rule.load(licensing)?;
        } else {
            rule.parse_expression(licensing)?;
        }

        if rule.relevance != 0 && rule.relevance != MAX_RELEVANCE {
            rule.has_stored_relevance = true;
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::QueryTokenizer;

    fn text_rule(text: &str) -> Rule {
        Rule::builder()
            .stored_text(text)
            .license_expression("mit")
            .is_license_notice(true)
            .build(&Licensing)
            .unwrap()
    }

    fn write_pair(dir: &Path, name: &str, yaml_text: &str, text: &str) -> (PathBuf, PathBuf) {
        let data_file = dir.join(format!("{}.yml", name));
        let text_file = dir.join(format!("{}.RULE", name));
        fs::write(&data_file, yaml_text).unwrap();
        fs::write(&text_file, text).unwrap();
        (data_file, text_file)
    }

    #[test]
    fn test_identifier_and_text_source() {
        let rule = text_rule("some rule text");
        assert_eq!(rule.identifier(), "_tst_14");
        assert_eq!(rule.text().unwrap(), "some rule text");

        let err = Rule::builder().license_expression("mit").build(&Licensing).unwrap_err();
        assert!(matches!(err, LicenseDbError::InconsistentText { .. }));

        let err = Rule::builder().stored_text("").build(&Licensing).unwrap_err();
        assert!(matches!(err, LicenseDbError::InconsistentText { .. }));
    }

    #[test]
    fn test_missing_text_file_is_rejected() {
        let err = Rule::builder()
            .text_file("/nonexistent/gpl_1.RULE")
            .license_expression("gpl")
            .build(&Licensing)
            .unwrap_err();
        match err {
            LicenseDbError::InconsistentText { identifier } => {
                assert!(identifier.starts_with("gpl_1.RULE\nfile://"));
            }
            other => panic!("unexpected: {}", other),
        }

        // 文本文件缺失但有内存文本时可以构建
        let rule = Rule::builder()
            .text_file("/nonexistent/gpl_1.RULE")
            .stored_text("GNU General Public License")
            .license_expression("gpl")
            .build(&Licensing)
            .unwrap();
        assert_eq!(rule.identifier(), "gpl_1.RULE");
        assert_eq!(rule.text().unwrap(), "GNU General Public License");
    }

    #[test]
    fn test_relevance_from_length() {
        let mut rule = text_rule("gpl");
        rule.tokens(&QueryTokenizer, true).unwrap();
        assert_eq!(rule.length, 1);
        assert_eq!(rule.relevance, 5);
        assert!(!rule.has_stored_relevance);

        let long = "word ".repeat(18);
        let mut rule = text_rule(&long);
        rule.tokens(&QueryTokenizer, true).unwrap();
        assert_eq!(rule.length, 18);
        assert_eq!(rule.relevance, 100);
    }

    #[test]
    fn test_stored_relevance_is_kept() {
        let mut rule = Rule::builder()
            .stored_text("gpl")
            .license_expression("gpl")
            .relevance(60)
            .build(&Licensing)
            .unwrap();
        assert!(rule.has_stored_relevance);
        rule.tokens(&QueryTokenizer, true).unwrap();
        assert_eq!(rule.relevance, 60);
    }

    #[test]
    fn test_special_rules_keep_full_relevance() {
        for negative in [true, false] {
            let mut rule = Rule::builder()
                .stored_text("not a license")
                .is_negative(negative)
                .is_false_positive(!negative)
                .notes("explained")
                .build(&Licensing)
                .unwrap();
            rule.tokens(&QueryTokenizer, true).unwrap();
            assert_eq!(rule.length, 3);
            assert_eq!(rule.relevance, 100);
        }
    }

    #[test]
    fn test_bare_url_forces_full_coverage() {
        let mut rule = text_rule("  https://example.org/license\n");
        assert_eq!(rule.minimum_coverage, 0);
        rule.tokens(&QueryTokenizer, true).unwrap();
        assert_eq!(rule.minimum_coverage, 100);
        assert!(rule.small());

        let mut multi_line = text_rule("https://example.org/license\nsee also this");
        multi_line.tokens(&QueryTokenizer, true).unwrap();
        assert_eq!(multi_line.minimum_coverage, 0);
    }

    #[test]
    fn test_small_rules() {
        let mut rule = text_rule(&"word ".repeat(14));
        rule.tokens(&QueryTokenizer, true).unwrap();
        assert!(rule.small());

        let mut rule = text_rule(&"word ".repeat(15));
        rule.tokens(&QueryTokenizer, true).unwrap();
        assert!(!rule.small());
        rule.minimum_coverage = 100;
        assert!(rule.small());
    }

    #[test]
    fn test_thresholds_are_cached_and_full_coverage() {
        let mut rule = text_rule(&"word ".repeat(250));
        rule.tokens(&QueryTokenizer, true).unwrap();
        rule.high_length = 40;
        rule.high_unique = 1;
        rule.length_unique = 1;
        rule.minimum_coverage = 100;

        let t = rule.thresholds();
        assert_eq!((t.min_high, t.min_len, t.length), (40, 250, 250));
        assert!(t.small);
        let u = rule.thresholds_unique();
        assert_eq!((u.min_high, u.min_len, u.length), (1, 1, 1));

        // 统计量变化后缓存不变，直到显式清空
        rule.high_length = 10;
        assert_eq!(rule.thresholds().min_high, 40);
        rule.invalidate_thresholds();
        assert_eq!(rule.thresholds().min_high, 10);
    }

    #[test]
    fn test_short_rule_thresholds_force_coverage() {
        let mut rule = text_rule("gnu gpl v2 or later");
        rule.tokens(&QueryTokenizer, true).unwrap();
        rule.high_length = 2;
        let t = rule.thresholds();
        assert_eq!(rule.minimum_coverage, 80);
        assert_eq!((t.min_high, t.min_len), (2, 5));
    }

    #[test]
    fn test_load_from_data_file() {
        let tmp = tempfile::tempdir().unwrap();
        let (data_file, text_file) = write_pair(
            tmp.path(),
            "mit_12",
            "license_expression: mit or Apache-2.0\nis_license_notice: yes\n",
            "Licensed under MIT or Apache",
        );
        // YAML 1.2 不认 `yes`，按字符串处理即类型错误
        assert!(Rule::builder()
            .data_file(&data_file)
            .text_file(&text_file)
            .build(&Licensing)
            .is_err());

        fs::write(
            &data_file,
            "license_expression: mit or Apache-2.0\nis_license_notice: true\nrelevance: 90\n\
             referenced_filenames:\n  - LICENSE-MIT\n",
        )
        .unwrap();
        let rule = Rule::builder()
            .data_file(&data_file)
            .text_file(&text_file)
            .build(&Licensing)
            .unwrap();
        assert_eq!(rule.identifier(), "mit_12.RULE");
        assert_eq!(rule.license_expression(), Some("mit OR Apache-2.0"));
        assert_eq!(rule.license_keys(true), vec!["mit", "Apache-2.0"]);
        assert!(rule.is_license_notice);
        assert!(rule.has_stored_relevance);
        assert_eq!(rule.relevance, 90);
        assert_eq!(rule.referenced_filenames, vec!["LICENSE-MIT"]);
    }

    #[test]
    fn test_load_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let build = |yaml_text: &str| {
            let (data_file, text_file) = write_pair(tmp.path(), "r", yaml_text, "text");
            Rule::builder()
                .data_file(data_file)
                .text_file(text_file)
                .build(&Licensing)
        };

        assert!(matches!(
            build("is_license_notice: true\n"),
            Err(LicenseDbError::MissingEvidence { .. })
        ));
        assert!(matches!(
            build("is_negative: true\n"),
            Err(LicenseDbError::MissingEvidence { .. })
        ));
        assert!(matches!(
            build("license_expression: mit\nis_license_tag: true\ncolor: blue\n"),
            Err(LicenseDbError::MalformedRecord { .. })
        ));
        assert!(matches!(
            build("license_expression: mit AND\n"),
            Err(LicenseDbError::InvalidExpression { .. })
        ));
        assert!(build("is_false_positive: true\nnotes: common word\n").is_ok());
    }

    #[test]
    fn test_dump_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let data_file = tmp.path().join("bsd-new_3.yml");
        let text_file = tmp.path().join("bsd-new_3.RULE");
        let rule = Rule::builder()
            .target_data_file(&data_file)
            .text_file(&text_file)
            .stored_text("Redistribution and use in source and binary forms")
            .license_expression("bsd-new")
            .is_license_notice(true)
            .minimum_coverage(70)
            .build(&Licensing)
            .unwrap();
        rule.dump().unwrap();

        let yaml_text = fs::read_to_string(&data_file).unwrap();
        assert!(yaml_text.starts_with("license_expression: bsd-new\n"));
        assert!(!yaml_text.contains("relevance"));
        assert!(!yaml_text.contains("is_license_text"));

        let reloaded = Rule::builder()
            .data_file(&data_file)
            .text_file(&text_file)
            .build(&Licensing)
            .unwrap();
        assert_eq!(reloaded.to_record(), rule.to_record());
        assert_eq!(reloaded.text().unwrap(), "Redistribution and use in source and binary forms");
    }

    #[test]
    fn test_license_rules_are_never_dumped() {
        let tmp = tempfile::tempdir().unwrap();
        let rule = Rule::builder()
            .target_data_file(tmp.path().join("x.yml"))
            .stored_text("text")
            .license_expression("x")
            .is_license(true)
            .build(&Licensing)
            .unwrap();
        rule.dump().unwrap();
        assert!(!tmp.path().join("x.yml").exists());
    }

    #[test]
    fn test_spdx_rule() {
        let mut rule = Rule::spdx(&Licensing, "mit or apache-2.0", "SPDX-License-Identifier: MIT OR Apache-2.0")
            .unwrap();
        assert_eq!(rule.identifier(), "spdx-license-identifier: mit or apache-2.0");
        assert_eq!(rule.license_expression(), Some("mit OR apache-2.0"));
        assert!(rule.is_license_tag);
        assert!(rule.has_stored_relevance);
        assert_eq!(rule.kind(), RuleKind::Spdx);

        rule.tokens(&QueryTokenizer, true).unwrap();
        assert_eq!(rule.length, 8);
        assert_eq!(rule.relevance, 100);
        assert!(!rule.small());
        assert!(!rule.thresholds().small);

        assert!(matches!(rule.dump(), Err(LicenseDbError::UnsupportedOperation("dump"))));
        assert!(matches!(
            rule.load(&Licensing),
            Err(LicenseDbError::UnsupportedOperation("load"))
        ));
    }

    #[test]
    fn test_spdx_rule_rejects_bad_expression() {
        for expression in ["", "mit OR", "(mit"] {
            assert!(matches!(
                Rule::spdx(&Licensing, expression, "x"),
                Err(LicenseDbError::InvalidExpression { .. })
            ));
        }
    }

    #[test]
    fn test_same_licensing_and_contains() {
        let a = text_rule("a");
        let b = Rule::builder()
            .stored_text("b")
            .license_expression("mit OR apache-2.0")
            .build(&Licensing)
            .unwrap();
        let none = Rule::builder()
            .stored_text("c")
            .is_negative(true)
            .notes("n")
            .build(&Licensing)
            .unwrap();

        assert_eq!(a.same_licensing(&a, &Licensing), Some(true));
        assert_eq!(a.same_licensing(&b, &Licensing), Some(false));
        assert_eq!(b.licensing_contains(&a, &Licensing), Some(true));
        assert_eq!(a.same_licensing(&none, &Licensing), None);
        assert_eq!(none.licensing_contains(&a, &Licensing), None);
        assert!(none.license_keys(true).is_empty());
    }
}

//! 语料库加载与完整性检查
//! 流程：加载许可证 → 加载规则 → 校验规则引用与标志 → 由许可证全文生成规则 → 合并交给匹配索引
//! 单个文件的问题在整个扫描结束后统一报告，任何聚合错误都会阻止语料库交付
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use rustc_hash::FxHashSet;
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::{LicResult, LicenseDbError, RuleIssues, UnresolvedReferences};
use crate::expression::Licensing;
use crate::license::{License, LICENSE_DATA_EXT};
use crate::rule::{Rule, RULE_DATA_EXT, RULE_TEXT_EXT};
use crate::utils::tokenizer::{QueryTokenizer, Tokenizer};
use crate::utils::{file_base_name, file_name};

/// 完整性检查通过后的语料库
#[derive(Debug, Clone)]
pub struct Corpus {
    pub licenses_by_key: BTreeMap<String, License>,
    /// 由许可证全文生成的规则在前，规则目录中的规则在后
    pub rules: Vec<Rule>,
}

impl Corpus {
    /// 对所有规则分词，填充长度并计算相关度
    pub fn tokenize_rules(&mut self, tokenizer: &dyn Tokenizer) -> LicResult<()> {
        for rule in &mut self.rules {
            rule.tokens(tokenizer, true)?;
        }
        Ok(())
    }

    pub fn license_rules_count(&self) -> usize {
        self.rules.iter().filter(|r| r.is_license).count()
    }
}

/// 语料库加载器
pub struct CorpusLoader {
    config: CorpusConfig,
    licensing: Licensing,
    tokenizer: Box<dyn Tokenizer>,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self::new(CorpusConfig::default())
    }
}

impl CorpusLoader {
    pub fn new(config: CorpusConfig) -> Self {
        Self {
            config,
            licensing: Licensing::new(),
            tokenizer: Box::new(QueryTokenizer),
        }
    }

    /// 替换默认分词器
    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    pub fn licensing(&self) -> &Licensing {
        &self.licensing
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// 加载许可证目录，返回 key → License
    /// 目录中任何未被许可证认领的文件都是错误（一次列出全部）
    pub fn load_licenses(&self) -> LicResult<BTreeMap<String, License>> {
        let dir = &self.config.licenses_dir;
        let all_files = list_files(dir)?;
        let mut used_files: FxHashSet<PathBuf> = FxHashSet::default();
        let mut licenses = BTreeMap::new();
        let mut deprecated = 0usize;

        for data_file in &all_files {
            if !has_extension(data_file, LICENSE_DATA_EXT) {
                continue;
            }
            let key = file_base_name(data_file);
            let license = License::new(key.as_str(), dir)?;
            used_files.insert(data_file.clone());
            if license.text_file().exists() {
                used_files.insert(license.text_file().to_path_buf());
            }
            if !self.config.with_deprecated && license.data.is_deprecated {
                trace!("Skipping deprecated license: {}", key);
                deprecated += 1;
                continue;
            }
            licenses.insert(key, license);
        }

        let orphaned: Vec<PathBuf> = all_files
            .iter()
            .filter(|f| !used_files.contains(*f))
            .cloned()
            .collect();
        if !orphaned.is_empty() {
            return Err(LicenseDbError::OrphanedLicenseFiles {
                dir: dir.clone(),
                files: orphaned,
            });
        }

        debug!(
            "Loaded {} licenses from {} ({} deprecated skipped)",
            licenses.len(),
            dir.display(),
            deprecated
        );
        Ok(licenses)
    }

    /// 加载规则目录中的全部规则
    /// 构建失败、孤儿文件、忽略大小写重名、文件名含空格 全部收集后一次性报错
    pub fn load_rules(&self) -> LicResult<Vec<Rule>> {
        let dir = &self.config.rules_dir;
        let mut issues = RuleIssues::new(dir);
        let mut rules = Vec::new();

        let mut seen_files: FxHashSet<PathBuf> = FxHashSet::default();
        let mut processed_files: FxHashSet<PathBuf> = FxHashSet::default();
        let mut lower_case_files: FxHashSet<PathBuf> = FxHashSet::default();

        for data_file in list_files(dir)? {
            if has_extension(&data_file, RULE_DATA_EXT) {
                let base_name = file_base_name(&data_file);
                if base_name.contains(' ') {
                    issues.space_in_names.insert(data_file.clone());
                }
                let text_file = dir.join(format!("{}.{}", base_name, RULE_TEXT_EXT));

                match Rule::builder()
                    .data_file(&data_file)
                    .text_file(&text_file)
                    .build(&self.licensing)
                {
                    Ok(rule) => rules.push(rule),
                    Err(e) => issues.model_errors.push(e.to_string()),
                }

                for path in [&data_file, &text_file] {
                    let lower = PathBuf::from(path.to_string_lossy().to_lowercase());
                    if !lower_case_files.insert(lower.clone()) {
                        issues.case_collisions.insert(lower);
                    }
                }

                processed_files.insert(text_file);
                processed_files.insert(data_file.clone());
            }

            // 编辑器备份文件不算孤儿
            if !file_name(&data_file).ends_with('~') {
                seen_files.insert(data_file);
            }
        }

        issues.orphaned_files = seen_files.difference(&processed_files).cloned().collect();
        issues.into_result()?;

        debug!("Loaded {} rules from {}", rules.len(), dir.display());
        Ok(rules)
    }

    /// 完整流水线：许可证 → 规则 → 完整性检查 → 许可证全文规则，返回合并后的语料库
    pub fn get_rules(&self) -> LicResult<Corpus> {
        let licenses_by_key = self.load_licenses()?;
        let rules = self.load_rules()?;
        check_rules_integrity(&rules, &licenses_by_key)?;

        let mut all_rules = build_rules_from_licenses(&licenses_by_key, &self.licensing)?;
        debug!(
            "Corpus ready: {} license rules + {} rules",
            all_rules.len(),
            rules.len()
        );
        all_rules.extend(rules);

        Ok(Corpus {
            licenses_by_key,
            rules: all_rules,
        })
    }
}

/// 递归列出目录下所有文件（按文件名排序，保证扫描顺序稳定；符号链接按目标判断）
fn list_files(dir: &Path) -> LicResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            LicenseDbError::io(path, io::Error::from(e))
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// 校验规则引用的许可证 key 都存在，且普通规则至少声明一个重要性标志
/// 两类问题分别聚合：先报未知许可证，再报缺少标志
pub fn check_rules_integrity(
    rules: &[Rule],
    licenses_by_key: &BTreeMap<String, License>,
) -> LicResult<()> {
    let mut unresolved = UnresolvedReferences::default();
    let mut without_flags: BTreeSet<PathBuf> = BTreeSet::new();

    for rule in rules {
        let location = rule
            .data_file()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(rule.identifier()));

        if !rule.is_spdx() {
            let unknown_keys: Vec<String> = rule
                .license_keys(true)
                .into_iter()
                .filter(|key| !licenses_by_key.contains_key(key))
                .collect();
            if !unknown_keys.is_empty() {
                unresolved
                    .0
                    .entry(location.clone())
                    .or_default()
                    .extend(unknown_keys);
            }
        }

        if !rule.has_importance_flags() && !(rule.is_negative || rule.is_false_positive) {
            without_flags.insert(location);
        }
    }

    if !unresolved.is_empty() {
        return Err(LicenseDbError::MissingLicenses(unresolved));
    }
    if !without_flags.is_empty() {
        return Err(LicenseDbError::MissingFlags(without_flags.into_iter().collect()));
    }
    Ok(())
}

/// 为每个有非空全文的许可证生成一条全文规则
/// 规则沿用许可证的覆盖率与相关度，相关度不是 100 时视为显式设置
pub fn build_rules_from_licenses(
    licenses: &BTreeMap<String, License>,
    licensing: &Licensing,
) -> LicResult<Vec<Rule>> {
    let mut rules = Vec::with_capacity(licenses.len());
    for (key, license) in licenses {
        let text_file = license.text_file();
        let has_text = fs::metadata(text_file)
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !has_text {
            continue;
        }

        let relevance = match license.data.relevance {
            0 => 100,
            r => r,
        };
        let rule = Rule::builder()
            .text_file(text_file)
            .license_expression(key.as_str())
            .minimum_coverage(license.data.minimum_coverage)
            .relevance(relevance)
            .has_stored_relevance(license.data.relevance != 100)
            .is_license(true)
            .is_license_text(true)
            .build(licensing)?;
        rules.push(rule);
    }
    debug!("Built {} rules from license texts", rules.len());
    Ok(rules)
}

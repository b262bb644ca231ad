//! 全局错误类型定义
//! 单条记录错误在加载时立即返回；语料库级别的错误先聚合，整批扫描结束后一次性返回
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::utils::file_url;

#[derive(Error, Debug)]
pub enum LicenseDbError {
    // ===================== 基础错误 =====================
    /// 文件读写失败（附带出错文件路径）
    #[error("I/O failed for {}: {source}", file_url(.path))]
    Io {
        path: PathBuf,
        #[source]
        source: IoError,
    },

    /// 报告序列化失败
    #[error("JSON serialization failed: {0}")]
    Json(#[from] SerdeJsonError),

    // ===================== 单条记录错误 =====================
    /// 元数据文件格式错误：YAML 无法解析、字段值非法、规则包含未知字段等
    #[error("Invalid data file: {}\n{reason}", file_url(.path))]
    MalformedRecord { path: PathBuf, reason: String },

    /// 缺少必需的证据：规则缺少许可证表达式，或否定/误报规则缺少说明
    #[error("Incomplete rule data file: {}\n{reason}", file_url(.path))]
    MissingEvidence { path: PathBuf, reason: String },

    /// 许可证表达式无法解析
    #[error("Unable to parse license expression: {expression:?} for: {location}\n{reason}")]
    InvalidExpression {
        expression: String,
        location: String,
        reason: String,
    },

    /// 规则既没有可读的文本文件，也没有内存文本
    #[error("Inconsistent rule text for: {identifier}")]
    InconsistentText { identifier: String },

    /// 非法的迁移目标目录
    #[error("Cannot relocate license: {0}")]
    InvalidRelocation(String),

    /// SPDX 合成规则不支持的操作
    #[error("Unsupported operation on a synthetic SPDX rule: {0}")]
    UnsupportedOperation(&'static str),

    // ===================== 语料库级别聚合错误 =====================
    /// 许可证目录中存在未被任何 License 认领的文件
    #[error(
        "Some License data or text files are orphaned in {:?}.\n{}",
        .dir.display(),
        .files.iter().map(|f| file_url(f)).collect::<Vec<_>>().join("\n")
    )]
    OrphanedLicenseFiles { dir: PathBuf, files: Vec<PathBuf> },

    /// 规则目录扫描问题汇总（模型错误、孤儿文件、大小写冲突、文件名含空格）
    #[error("{0}")]
    RuleCorpus(RuleIssues),

    /// 规则引用了未知的许可证 key
    #[error("Rules referencing missing licenses:\n{0}")]
    MissingLicenses(UnresolvedReferences),

    /// 普通规则未声明任何 is_license_xxx 标志
    #[error(
        "Rules without is_license_xxx flags:\n{}",
        .0.iter().map(|f| rule_file_pair(f)).collect::<Vec<_>>().join("\n")
    )]
    MissingFlags(Vec<PathBuf>),
}

/// 全局Result类型
pub type LicResult<T> = Result<T, LicenseDbError>;

impl LicenseDbError {
    /// 包装 IO 错误并附带路径
    pub fn io(path: impl Into<PathBuf>, source: IoError) -> Self {
        LicenseDbError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LicenseDbError::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_evidence(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LicenseDbError::MissingEvidence {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// 规则数据文件与其文本文件，按 file:// 形式各占一行
fn rule_file_pair(data_file: &Path) -> String {
    format!(
        "{}\n{}",
        file_url(data_file),
        file_url(&data_file.with_extension("RULE"))
    )
}

// ===================== 聚合错误载体 =====================

/// 规则 → 未解析许可证 key 集合
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnresolvedReferences(pub BTreeMap<PathBuf, BTreeSet<String>>);

impl UnresolvedReferences {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.keys()
    }
}

impl fmt::Display for UnresolvedReferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (data_file, keys) in &self.0 {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            writeln!(f, "{}", keys.join(" "))?;
            writeln!(f, "{}", rule_file_pair(data_file))?;
        }
        Ok(())
    }
}

/// 规则目录扫描过程中的问题累加器，扫描结束后整体转为一个错误
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuleIssues {
    pub rules_dir: PathBuf,
    /// 构建 Rule 失败的错误信息
    pub model_errors: Vec<String>,
    /// 未被任何规则认领的文件
    pub orphaned_files: BTreeSet<PathBuf>,
    /// 忽略大小写后重名的文件（小写路径）
    pub case_collisions: BTreeSet<PathBuf>,
    /// 文件名包含空格
    pub space_in_names: BTreeSet<PathBuf>,
}

impl RuleIssues {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.model_errors.is_empty()
            && self.orphaned_files.is_empty()
            && self.case_collisions.is_empty()
            && self.space_in_names.is_empty()
    }

    /// 有问题时转为错误，否则 Ok
    pub fn into_result(self) -> LicResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(LicenseDbError::RuleCorpus(self))
        }
    }
}

impl fmt::Display for RuleIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self.rules_dir.display();
        if !self.model_errors.is_empty() {
            writeln!(f, "Invalid rule YAML in directory: {:?}", dir.to_string())?;
            for error in &self.model_errors {
                writeln!(f, "{}", error)?;
            }
        }
        if !self.orphaned_files.is_empty() {
            writeln!(f, "Orphaned files in rule directory: {:?}", dir.to_string())?;
            for file in &self.orphaned_files {
                writeln!(f, "{}", file_url(file))?;
            }
        }
        if !self.case_collisions.is_empty() {
            writeln!(
                f,
                "Rule files with non-unique name ignoring case in rule directory: {:?}",
                dir.to_string()
            )?;
            for file in &self.case_collisions {
                writeln!(f, "{}", file_url(file))?;
            }
        }
        if !self.space_in_names.is_empty() {
            writeln!(f, "Rule files name cannot contain spaces: {:?}", dir.to_string())?;
            for file in &self.space_in_names {
                writeln!(f, "\"{}\"", file_url(file))?;
            }
        }
        Ok(())
    }
}

//! 语料库配置：许可证目录、规则目录、是否包含已废弃许可证

use std::env;
use std::path::{Path, PathBuf};

/// 数据根目录环境变量
pub const DATA_DIR_ENV: &str = "LICENSEDCODE_DATA_DIR";
/// 未设置环境变量时的数据根目录
pub const DEFAULT_DATA_DIR: &str = "data";

const LICENSES_SUBDIR: &str = "licenses";
const RULES_SUBDIR: &str = "rules";

/// 语料库配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusConfig {
    // 许可证对（<key>.yml + <key>.LICENSE）所在目录
    pub licenses_dir: PathBuf,
    // 规则对（<name>.yml + <name>.RULE）所在目录
    pub rules_dir: PathBuf,
    // 是否加载已废弃的许可证
    pub with_deprecated: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        let data_dir = env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        Self::from_data_dir(data_dir)
    }
}

impl CorpusConfig {
    /// 以 `<data_dir>/licenses` 与 `<data_dir>/rules` 构造
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            licenses_dir: data_dir.join(LICENSES_SUBDIR),
            rules_dir: data_dir.join(RULES_SUBDIR),
            with_deprecated: false,
        }
    }

    /// 自定义配置
    pub fn builder() -> CorpusConfigBuilder {
        CorpusConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone)]
pub struct CorpusConfigBuilder {
    config: CorpusConfig,
}

impl CorpusConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: CorpusConfig::default(),
        }
    }

    /// 同时重设两个目录
    pub fn data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        let with_deprecated = self.config.with_deprecated;
        self.config = CorpusConfig::from_data_dir(data_dir);
        self.config.with_deprecated = with_deprecated;
        self
    }

    pub fn licenses_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.licenses_dir = path.into();
        self
    }

    pub fn rules_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.rules_dir = path.into();
        self
    }

    pub fn with_deprecated(mut self, with_deprecated: bool) -> Self {
        self.config.with_deprecated = with_deprecated;
        self
    }

    pub fn build(self) -> CorpusConfig {
        self.config
    }
}

impl Default for CorpusConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

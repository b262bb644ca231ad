//! licensedcode - 许可证检测参考数据核心
//! 许可证与检测规则的数据模型、相关度/匹配门槛计算、语料库加载与完整性检查

// 导出全局错误类型
pub use self::error::{LicResult, LicenseDbError, RuleIssues, UnresolvedReferences};

// 导出配置模块
pub use self::config::{CorpusConfig, CorpusConfigBuilder};

// 导出表达式引擎
pub use self::expression::{ExpressionError, LicenseExpression, Licensing};

// 导出许可证模块核心接口
pub use self::license::{
    all_spdx_key_tokens, all_spdx_keys, essential_spdx_tokens, validate, CategoryGroup, License,
    LicenseCategory, LicenseData, ValidationReport,
};

// 导出规则模块核心接口
pub use self::rule::{Rule, RuleBuilder, RuleKind, RuleRecord, Thresholds};

// 导出语料库模块核心接口
pub use self::corpus::{
    build_rules_from_licenses, check_rules_integrity, Corpus, CorpusLoader, RuleStats,
};

// 导出工具模块核心接口
pub use self::utils::{QueryTokenizer, Tokenizer};

// 声明所有子模块
pub mod config;
pub mod corpus;
pub mod error;
pub mod expression;
pub mod license;
pub mod rule;
pub mod utils;

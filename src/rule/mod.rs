//! 规则模块：规则数据模型、元数据文件结构、匹配门槛与相关度策略
pub mod model;
pub mod schema;
pub mod thresholds;

// 导出核心接口
pub use self::model::{Rule, RuleBuilder, RuleKind};
pub use self::schema::{RuleRecord, RULE_DATA_EXT, RULE_FIELDS, RULE_TEXT_EXT};
pub use self::thresholds::{
    Thresholds, FULL_COVERAGE, MIN_MATCH_HIGH_LENGTH, MIN_MATCH_LENGTH, RELEVANCE_SATURATION, SMALL_RULE,
};

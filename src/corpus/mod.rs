//! 语料库：加载许可证与规则、跨记录完整性检查、统计
pub mod loader;
pub mod stats;

pub use self::loader::{build_rules_from_licenses, check_rules_integrity, Corpus, CorpusLoader};
pub use self::stats::RuleStats;
pub use crate::error::{RuleIssues, UnresolvedReferences};

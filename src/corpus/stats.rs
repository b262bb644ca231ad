//! 规则长度分布统计

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::rule::Rule;

/// 每项统计保留的条目数
const TOP_N: usize = 15;

/// 规则语料统计信息
/// 记录规则 token 长度与高区分度 token 长度的分布：
/// 1. 最常见的长度（长度, 规则数）
/// 2. 最小的长度（长度, 规则数）
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStats {
    /// 参与统计的规则数
    pub total_rules: usize,

    // ========== 全部 token ==========
    pub most_common_lengths: Vec<(usize, usize)>,
    pub smallest_lengths: Vec<(usize, usize)>,

    // ========== 高区分度 token ==========
    pub most_common_high_lengths: Vec<(usize, usize)>,
    pub smallest_high_lengths: Vec<(usize, usize)>,
}

impl RuleStats {
    /// 基于规则当前的统计量计算（未分词的规则长度为 0）
    pub fn from_rules(rules: &[Rule]) -> Self {
        let lengths = histogram(rules.iter().map(|r| r.length));
        let high_lengths = histogram(rules.iter().map(|r| r.high_length));
        Self {
            total_rules: rules.len(),
            most_common_lengths: most_common(&lengths),
            smallest_lengths: smallest(&lengths),
            most_common_high_lengths: most_common(&high_lengths),
            smallest_high_lengths: smallest(&high_lengths),
        }
    }

    /// 格式化输出统计信息（结构化日志）
    pub fn print_stats(&self) {
        log::debug!("Rule stats | Rules: {}", self.total_rules);
        log::debug!("Top {} lengths: {:?}", TOP_N, self.most_common_lengths);
        log::debug!("{} smallest lengths: {:?}", TOP_N, self.smallest_lengths);
        log::debug!("Top {} high lengths: {:?}", TOP_N, self.most_common_high_lengths);
        log::debug!("{} smallest high lengths: {:?}", TOP_N, self.smallest_high_lengths);
    }
}

fn histogram(values: impl Iterator<Item = usize>) -> FxHashMap<usize, usize> {
    let mut counts = FxHashMap::default();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// 按出现次数降序，次数相同时按长度升序
fn most_common(counts: &FxHashMap<usize, usize>) -> Vec<(usize, usize)> {
    let mut entries: Vec<(usize, usize)> = counts.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.truncate(TOP_N);
    entries
}

fn smallest(counts: &FxHashMap<usize, usize>) -> Vec<(usize, usize)> {
    let mut entries: Vec<(usize, usize)> = counts.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_unstable();
    entries.truncate(TOP_N);
    entries
}

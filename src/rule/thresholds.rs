//! 匹配门槛与相关度策略
//! 由规则的 token 统计量推导候选匹配被接受所需的最少高区分度 token 数与最少 token 总数
use serde::Serialize;

/// 普通长度规则的最小匹配 token 数
pub const MIN_MATCH_LENGTH: usize = 4;
/// 普通长度规则的最小匹配高区分度 token 数
pub const MIN_MATCH_HIGH_LENGTH: usize = 3;
/// 短规则上限（不含）
pub const SMALL_RULE: usize = 15;
/// 相关度饱和长度：达到该 token 数即为 100
pub const RELEVANCE_SATURATION: usize = 18;
/// 全覆盖
pub const FULL_COVERAGE: u8 = 100;
pub const MAX_RELEVANCE: u8 = 100;

/// 超过该长度的规则按 10% 比例设门槛
const LONG_RULE: usize = 200;

/// 规则的一组匹配门槛，计算一次后缓存
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    /// 高区分度 token 数
    pub high_len: usize,
    /// 低区分度 token 数
    pub low_len: usize,
    /// token 总数
    pub length: usize,
    /// 是否为短规则
    pub small: bool,
    /// 最少需匹配的高区分度 token 数
    pub min_high: usize,
    /// 最少需匹配的 token 数
    pub min_len: usize,
}

/// 全部 token 出现次数口径的 (min_high, min_len)
///
/// 按长度从大到小逐级判断，后面的条件无条件覆盖前面的结果；
/// 短规则会顺带改写 `minimum_coverage`（<10 → 80，<3 → 100），全覆盖检查放在最后
pub fn occurrence_bars(length: usize, high_length: usize, minimum_coverage: &mut u8) -> (usize, usize) {
    let (mut min_high, mut min_len) = if length > LONG_RULE {
        (high_length / 10, length / 10)
    } else {
        (high_length.min(MIN_MATCH_HIGH_LENGTH), MIN_MATCH_LENGTH)
    };

    if length < 30 {
        min_len = length / 2;
    }

    if length < 10 {
        min_high = high_length;
        min_len = length;
        *minimum_coverage = 80;
    }

    if length < 3 {
        min_high = high_length;
        min_len = length;
        *minimum_coverage = FULL_COVERAGE;
    }

    if *minimum_coverage == FULL_COVERAGE {
        min_high = high_length;
        min_len = length;
    }

    (min_high, min_len)
}

/// 去重 token 口径的 (min_high, min_len)
/// 长度分档仍按全部 token 数判断，门槛取值使用去重统计量
pub fn unique_bars(
    length: usize,
    high_unique: usize,
    length_unique: usize,
    minimum_coverage: u8,
) -> (usize, usize) {
    let (mut min_high, mut min_len) = if length > LONG_RULE {
        (high_unique / 10, length / 10)
    } else {
        let half = match high_unique / 2 {
            0 => high_unique,
            h => h,
        };
        (half.min(MIN_MATCH_HIGH_LENGTH), MIN_MATCH_LENGTH)
    };

    if length < 20 {
        min_high = high_unique;
        min_len = min_high;
    }

    if length < 10 {
        min_high = high_unique;
        min_len = if length_unique < 2 {
            length_unique
        } else {
            length_unique - 1
        };
    }

    if length < 5 {
        min_high = high_unique;
        min_len = length_unique;
    }

    if minimum_coverage == FULL_COVERAGE {
        min_high = high_unique;
        min_len = length_unique;
    }

    (min_high, min_len)
}

/// 按长度计算相关度：达到饱和长度为 100，否则为 floor(length * 100 / 18)
pub fn relevance_for_length(length: usize) -> u8 {
    if length >= RELEVANCE_SATURATION {
        return MAX_RELEVANCE;
    }
    let computed = length * usize::from(MAX_RELEVANCE) / RELEVANCE_SATURATION;
    computed.min(usize::from(MAX_RELEVANCE)) as u8
}

use once_cell::sync::Lazy;
use regex::Regex;

/// 查询侧分词规则：由字母数字组成的单词（不含下划线），允许中间出现一个 `+`
/// 例如 `gpl2+`、`c++` 会保留为一个 token
static QUERY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^_\W]+\+?[^_\W]*").unwrap_or_else(|e| panic!("invalid query pattern: {}", e))
});

/// 分词器接口：把任意文本转为规范化 token 序列
/// 要求确定性、可重复调用（每次调用都重新开始），有限输入产生有限输出
pub trait Tokenizer: Send + Sync {
    fn tokenize<'t>(&self, text: &'t str, lower: bool) -> Box<dyn Iterator<Item = String> + 't>;
}

/// 默认分词器，与匹配索引查询侧使用同一套规则
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryTokenizer;

impl Tokenizer for QueryTokenizer {
    fn tokenize<'t>(&self, text: &'t str, lower: bool) -> Box<dyn Iterator<Item = String> + 't> {
        Box::new(QUERY_PATTERN.find_iter(text).map(move |m| {
            if lower {
                m.as_str().to_lowercase()
            } else {
                m.as_str().to_string()
            }
        }))
    }
}

/// 便捷函数：直接收集为 Vec
pub fn tokens_of(tokenizer: &dyn Tokenizer, text: &str, lower: bool) -> Vec<String> {
    tokenizer.tokenize(text, lower).collect()
}

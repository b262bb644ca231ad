//! SPDX key 汇总，供匹配索引构建 SPDX 标识识别词表
use std::collections::BTreeMap;

use crate::license::model::License;
use crate::utils::tokenizer::Tokenizer;

/// 任何 SPDX-License-Identifier 标签都必然包含的词
const ESSENTIAL_SPDX_TOKENS: &[&str] = &["spdx", "license", "identifier", "licenseref"];

pub fn essential_spdx_tokens() -> impl Iterator<Item = &'static str> {
    ESSENTIAL_SPDX_TOKENS.iter().copied()
}

/// 所有许可证声明的 SPDX key（每个许可证规范 key 在前）
pub fn all_spdx_keys(licenses: &BTreeMap<String, License>) -> Vec<&str> {
    licenses.values().flat_map(|license| license.spdx_keys()).collect()
}

/// SPDX 相关词表：先是必备词，再依次是每个 SPDX key 的分词结果（小写）
pub fn all_spdx_key_tokens(
    licenses: &BTreeMap<String, License>,
    tokenizer: &dyn Tokenizer,
) -> Vec<String> {
    let mut tokens: Vec<String> = essential_spdx_tokens().map(str::to_string).collect();
    for spdx_key in all_spdx_keys(licenses) {
        tokens.extend(tokenizer.tokenize(spdx_key, true));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::QueryTokenizer;

    #[test]
    fn test_all_spdx_key_tokens() {
        let tmp = tempfile::tempdir().unwrap();
        let mut gpl = License::empty("gpl-2.0-plus", tmp.path());
        gpl.data.spdx_license_key = Some("GPL-2.0-or-later".into());
        gpl.data.other_spdx_license_keys = vec!["GPL-2.0+".into()];
        let mut licenses = BTreeMap::new();
        licenses.insert(gpl.key().to_string(), gpl);

        assert_eq!(all_spdx_keys(&licenses), vec!["GPL-2.0-or-later", "GPL-2.0+"]);
        assert_eq!(
            all_spdx_key_tokens(&licenses, &QueryTokenizer),
            vec![
                "spdx", "license", "identifier", "licenseref", "gpl", "2", "0", "or", "later",
                "gpl", "2", "0+"
            ]
        );
    }
}

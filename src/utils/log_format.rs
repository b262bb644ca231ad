use std::fmt::{self, Write};

// ======================== 日志文本预览 ========================
/// 空白字符折叠 + 截断的文本预览，零堆分配
/// 用于在日志中展示规则/许可证文本片段，多行文本折叠为一行
#[inline(always)]
pub fn preview_compact(s: &str, max_len: usize) -> impl fmt::Display + '_ {
    struct CompactView<'a> {
        source: &'a str,
        max_length: usize,
    }

    impl fmt::Display for CompactView<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut char_count = 0;
            let mut last_was_whitespace = false;

            for ch in self.source.trim().chars() {
                if char_count >= self.max_length {
                    f.write_str("…")?;
                    break;
                }

                if ch.is_whitespace() {
                    if !last_was_whitespace {
                        f.write_char(' ')?;
                        char_count += 1;
                        last_was_whitespace = true;
                    }
                } else {
                    f.write_char(ch)?;
                    char_count += 1;
                    last_was_whitespace = false;
                }
            }
            Ok(())
        }
    }

    CompactView {
        source: s,
        max_length: max_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_compact_folds_whitespace() {
        let text = "  Permission is hereby granted,\n\n   free of charge  ";
        assert_eq!(
            preview_compact(text, 100).to_string(),
            "Permission is hereby granted, free of charge"
        );
    }

    #[test]
    fn test_preview_compact_truncates() {
        assert_eq!(preview_compact("abcdefgh", 3).to_string(), "abc…");
        assert_eq!(preview_compact("abc", 3).to_string(), "abc");
    }
}

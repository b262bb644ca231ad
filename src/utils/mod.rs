//! 工具模块：分词适配器、日志预览、YAML 记录编解码
pub mod log_format;
pub mod tokenizer;
pub mod yaml;

use std::path::Path;

pub use self::log_format::preview_compact;
pub use self::tokenizer::{QueryTokenizer, Tokenizer};

/// 以 file:// 形式展示路径，便于在终端中直接点击打开
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// 去掉扩展名后的文件名
pub fn file_base_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// 文件名（含扩展名）
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

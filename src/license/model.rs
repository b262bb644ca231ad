use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{error, trace, warn};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::error::{LicResult, LicenseDbError};
use crate::license::category::LicenseCategory;
use crate::utils::{file_url, yaml};

/// 许可证元数据文件扩展名
pub const LICENSE_DATA_EXT: &str = "yml";
/// 许可证全文文件扩展名
pub const LICENSE_TEXT_EXT: &str = "LICENSE";

/// 许可证数据文件可识别的字段，其余字段加载时忽略，永不写回
pub const LICENSE_FIELDS: &[&str] = &[
    "key",
    "is_deprecated",
    "language",
    "short_name",
    "name",
    "category",
    "owner",
    "homepage_url",
    "notes",
    "is_exception",
    "spdx_license_key",
    "other_spdx_license_keys",
    "text_urls",
    "osi_url",
    "faq_url",
    "other_urls",
    "key_aliases",
    "minimum_coverage",
    "relevance",
    "standard_notice",
];

/// 需要强制转为整数的字段
const NUMERIC_FIELDS: &[&str] = &["minimum_coverage", "relevance"];

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_RELEVANCE: u8 = 100;

/// 许可证描述数据（持久化字段）
/// 字段顺序即写出顺序；空值、默认语言、默认相关度不写出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseData {
    /// 已废弃的许可证，notes 中应说明原因
    #[serde(skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
    /// ISO 639-1 语言代码，目前只支持英文文本
    #[serde(skip_serializing_if = "is_default_language")]
    pub language: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub homepage_url: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub notes: Option<String>,
    /// 例外条款（如 classpath-exception），而非独立许可证
    #[serde(skip_serializing_if = "is_false")]
    pub is_exception: bool,
    #[serde(skip_serializing_if = "is_blank")]
    pub spdx_license_key: Option<String>,
    /// 同样映射到本许可证的其它（含已废弃）SPDX key
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other_spdx_license_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text_urls: Vec<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub osi_url: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub faq_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other_urls: Vec<String>,
    /// 内部别名 key
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub key_aliases: Vec<String>,
    /// 0 表示不设下限
    #[serde(skip_serializing_if = "is_zero")]
    pub minimum_coverage: u8,
    #[serde(skip_serializing_if = "is_default_relevance")]
    pub relevance: u8,
    #[serde(skip_serializing_if = "is_blank")]
    pub standard_notice: Option<String>,
}

impl Default for LicenseData {
    fn default() -> Self {
        Self {
            is_deprecated: false,
            language: DEFAULT_LANGUAGE.to_string(),
            short_name: None,
            name: None,
            category: None,
            owner: None,
            homepage_url: None,
            notes: None,
            is_exception: false,
            spdx_license_key: None,
            other_spdx_license_keys: Vec::new(),
            text_urls: Vec::new(),
            osi_url: None,
            faq_url: None,
            other_urls: Vec::new(),
            key_aliases: Vec::new(),
            minimum_coverage: 0,
            relevance: DEFAULT_RELEVANCE,
            standard_notice: None,
        }
    }
}

// ======== 序列化辅助：默认值/空值不写出 ========
fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &u8) -> bool {
    *v == 0
}

fn is_default_relevance(v: &u8) -> bool {
    *v == DEFAULT_RELEVANCE
}

fn is_default_language(v: &String) -> bool {
    v.is_empty() || v == DEFAULT_LANGUAGE
}

fn is_blank(v: &Option<String>) -> bool {
    v.as_deref().unwrap_or_default().is_empty()
}

/// 写出用的记录：key 在最前
#[derive(Serialize)]
struct LicenseRecord<'a> {
    key: &'a str,
    #[serde(flatten)]
    data: &'a LicenseData,
}

/// 已知许可证
/// 由 `<key>.yml` 元数据与 `<key>.LICENSE` 全文两个文件组成，二者路径均由 key 与源目录决定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    /// 唯一 key：小写 ASCII，构造后不可变
    key: String,
    src_dir: PathBuf,
    data_file: PathBuf,
    text_file: PathBuf,
    pub data: LicenseData,
    /// 加载时遇到的未知字段名（仅记录，不写回）
    unknown_fields: Vec<String>,
}

impl License {
    /// 构造许可证；元数据文件存在时立即加载
    pub fn new(key: impl Into<String>, src_dir: impl Into<PathBuf>) -> LicResult<Self> {
        let mut license = Self::empty(key, src_dir);
        if license.data_file.exists() {
            license.load()?;
        }
        Ok(license)
    }

    /// 构造一个只有 key 与路径、其余字段为默认值的许可证，不读取任何文件
    pub fn empty(key: impl Into<String>, src_dir: impl Into<PathBuf>) -> Self {
        let key = key.into();
        let src_dir = src_dir.into();
        let data_file = src_dir.join(format!("{}.{}", key, LICENSE_DATA_EXT));
        let text_file = src_dir.join(format!("{}.{}", key, LICENSE_TEXT_EXT));
        Self {
            key,
            src_dir,
            data_file,
            text_file,
            data: LicenseData::default(),
            unknown_fields: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn text_file(&self) -> &Path {
        &self.text_file
    }

    pub fn unknown_fields(&self) -> &[String] {
        &self.unknown_fields
    }

    /// 分类解析为封闭集合中的值，缺失或未知时返回 None
    pub fn category(&self) -> Option<LicenseCategory> {
        self.data.category.as_deref().and_then(|c| c.parse().ok())
    }

    /// 许可证全文：每次访问都从文件重新读取，不做缓存；文件不存在时为空串
    pub fn text(&self) -> LicResult<String> {
        match fs::read_to_string(&self.text_file) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(LicenseDbError::io(&self.text_file, e)),
        }
    }

    /// 写入许可证全文文件
    pub fn write_text(&self, text: &str) -> LicResult<()> {
        fs::write(&self.text_file, text.as_bytes()).map_err(|e| LicenseDbError::io(&self.text_file, e))
    }

    /// SPDX key：规范 key 在前，其它 key 随后
    pub fn spdx_keys(&self) -> impl Iterator<Item = &str> {
        self.data
            .spdx_license_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .into_iter()
            .chain(self.data.other_spdx_license_keys.iter().map(String::as_str))
    }

    /// 从元数据文件加载字段（不读取全文）
    /// 未知字段忽略；数值字段强制转为整数；格式错误时附带文件路径返回
    pub fn load(&mut self) -> LicResult<()> {
        self.load_data().inspect_err(|e| {
            error!("INVALID LICENSE YAML FILE: {}\n{}", file_url(&self.data_file), e);
        })
    }

    fn load_data(&mut self) -> LicResult<()> {
        let mut mapping = yaml::read_mapping(&self.data_file)?;
        yaml::coerce_integer_fields(&mut mapping, NUMERIC_FIELDS)
            .map_err(|reason| LicenseDbError::malformed(&self.data_file, reason))?;

        if let Some(stored_key) = mapping.remove("key") {
            match stored_key {
                Value::Null => {}
                Value::String(ref k) if *k == self.key => {}
                other => {
                    return Err(LicenseDbError::malformed(
                        &self.data_file,
                        format!(
                            "Inconsistent YAML key and file names for {:?}: {:?}",
                            self.key,
                            yaml_scalar(&other)
                        ),
                    ))
                }
            }
        }

        let mut known = Mapping::new();
        let mut unknown = Vec::new();
        for (field, value) in mapping {
            let name = field.as_str().map(str::to_string).unwrap_or_default();
            if !LICENSE_FIELDS.contains(&name.as_str()) {
                unknown.push(name);
                continue;
            }
            // 空值按默认值处理
            if !value.is_null() {
                known.insert(field, value);
            }
        }
        if !unknown.is_empty() {
            warn!(
                "Ignoring unknown fields in {}: {}",
                file_url(&self.data_file),
                unknown.join(", ")
            );
        }

        let data: LicenseData = serde_yaml::from_value(Value::Mapping(known))
            .map_err(|e| LicenseDbError::malformed(&self.data_file, e.to_string()))?;

        if data.minimum_coverage > 100 {
            return Err(LicenseDbError::malformed(
                &self.data_file,
                format!("minimum_coverage must be between 0 and 100: {}", data.minimum_coverage),
            ));
        }
        if data.relevance > 100 {
            return Err(LicenseDbError::malformed(
                &self.data_file,
                format!("relevance must be between 0 and 100: {}", data.relevance),
            ));
        }

        trace!("Loaded license {} from {}", self.key, file_url(&self.data_file));
        self.data = data;
        self.unknown_fields = unknown;
        Ok(())
    }

    /// 写出元数据与全文文件
    /// 元数据省略空字段、默认语言与默认相关度；全文为空时不写全文文件
    pub fn dump(&self) -> LicResult<()> {
        let record = LicenseRecord {
            key: &self.key,
            data: &self.data,
        };
        yaml::write_record(&self.data_file, &record)?;
        let text = self.text()?;
        if !text.is_empty() {
            self.write_text(&text)?;
        }
        Ok(())
    }

    /// 复制到新目录（可选新 key），拷贝全文文件并写出元数据，返回独立的新许可证
    pub fn relocate(&self, target_dir: &Path, new_key: Option<&str>) -> LicResult<License> {
        if target_dir.as_os_str().is_empty() || same_dir(target_dir, &self.src_dir) {
            return Err(LicenseDbError::InvalidRelocation(format!(
                "cannot relocate {:?} to an empty directory or to the same directory: {:?}",
                self.key,
                target_dir.display().to_string()
            )));
        }

        let key = new_key.unwrap_or(&self.key);
        let mut relocated = License::empty(key, target_dir);
        relocated.data = self.data.clone();

        fs::create_dir_all(target_dir).map_err(|e| LicenseDbError::io(target_dir, e))?;
        if !self.text()?.is_empty() {
            fs::copy(&self.text_file, &relocated.text_file)
                .map_err(|e| LicenseDbError::io(&relocated.text_file, e))?;
        }
        relocated.dump()?;
        Ok(relocated)
    }
}

/// 两个目录都存在时按规范化路径比较，否则按字面比较
fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

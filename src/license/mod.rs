//! 许可证实体：元数据 + 全文文件对、分类封闭集合、批量校验、SPDX 词表
pub mod category;
pub mod model;
pub mod spdx;
pub mod validate;

pub use self::category::{CategoryGroup, LicenseCategory};
pub use self::model::{License, LicenseData, LICENSE_DATA_EXT, LICENSE_FIELDS, LICENSE_TEXT_EXT};
pub use self::spdx::{all_spdx_key_tokens, all_spdx_keys, essential_spdx_tokens};
pub use self::validate::{validate, Messages, ValidationReport, GLOBAL_KEY};

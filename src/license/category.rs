use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 许可证分类，封闭集合，分为 FOSS 与其它两组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LicenseCategory {
    // ===== FOSS =====
    Copyleft,
    CopyleftLimited,
    PatentLicense,
    Permissive,
    PublicDomain,
    // ===== Other =====
    Commercial,
    FreeRestricted,
    ProprietaryFree,
    UnstatedLicense,
}

/// 分类分组
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryGroup {
    Foss,
    Other,
}

impl LicenseCategory {
    pub const ALL: [LicenseCategory; 9] = [
        LicenseCategory::Copyleft,
        LicenseCategory::CopyleftLimited,
        LicenseCategory::PatentLicense,
        LicenseCategory::Permissive,
        LicenseCategory::PublicDomain,
        LicenseCategory::Commercial,
        LicenseCategory::FreeRestricted,
        LicenseCategory::ProprietaryFree,
        LicenseCategory::UnstatedLicense,
    ];

    /// 数据文件中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseCategory::Copyleft => "Copyleft",
            LicenseCategory::CopyleftLimited => "Copyleft Limited",
            LicenseCategory::PatentLicense => "Patent License",
            LicenseCategory::Permissive => "Permissive",
            LicenseCategory::PublicDomain => "Public Domain",
            LicenseCategory::Commercial => "Commercial",
            LicenseCategory::FreeRestricted => "Free Restricted",
            LicenseCategory::ProprietaryFree => "Proprietary Free",
            LicenseCategory::UnstatedLicense => "Unstated License",
        }
    }

    pub fn group(&self) -> CategoryGroup {
        match self {
            LicenseCategory::Copyleft
            | LicenseCategory::CopyleftLimited
            | LicenseCategory::PatentLicense
            | LicenseCategory::Permissive
            | LicenseCategory::PublicDomain => CategoryGroup::Foss,
            _ => CategoryGroup::Other,
        }
    }

    pub fn is_foss(&self) -> bool {
        self.group() == CategoryGroup::Foss
    }
}

impl Display for LicenseCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseCategory {
    type Err = String;

    /// 精确匹配（区分大小写），与数据文件中的写法保持一致
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LicenseCategory::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown license category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in LicenseCategory::ALL {
            assert_eq!(category.as_str().parse::<LicenseCategory>(), Ok(category));
        }
        assert!("permissive".parse::<LicenseCategory>().is_err());
        assert!("Shareware".parse::<LicenseCategory>().is_err());
    }

    #[test]
    fn test_category_groups() {
        assert!(LicenseCategory::PublicDomain.is_foss());
        assert!(!LicenseCategory::ProprietaryFree.is_foss());
        assert_eq!(LicenseCategory::Commercial.group(), CategoryGroup::Other);
    }
}

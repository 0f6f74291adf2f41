//! The fixed table of cloud-storage providers the search engine knows about.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CloudType {
    #[serde(rename = "baidu")]
    Baidu,
    #[serde(rename = "aliyun")]
    Aliyun,
    #[serde(rename = "quark")]
    Quark,
    #[serde(rename = "tianyi")]
    Tianyi,
    #[serde(rename = "uc")]
    Uc,
    #[serde(rename = "mobile")]
    Mobile,
    #[serde(rename = "115")]
    Pan115,
    #[serde(rename = "pikpak")]
    PikPak,
    #[serde(rename = "xunlei")]
    Xunlei,
    #[serde(rename = "123")]
    Pan123,
    #[serde(rename = "magnet")]
    Magnet,
    #[serde(rename = "ed2k")]
    Ed2k,
}

struct ProviderInfo {
    id: &'static str,
    name: &'static str,
    icon: &'static str,
}

// Indexed by discriminant; order is the display order.
const PROVIDERS: [ProviderInfo; 12] = [
    ProviderInfo { id: "baidu", name: "百度网盘", icon: "https://favicon.im/pan.baidu.com" },
    ProviderInfo { id: "aliyun", name: "阿里云盘", icon: "https://favicon.im/aliyundrive.com" },
    ProviderInfo { id: "quark", name: "夸克网盘", icon: "https://favicon.im/quark.cn" },
    ProviderInfo { id: "tianyi", name: "天翼云盘", icon: "https://favicon.im/cloud.189.cn" },
    ProviderInfo { id: "uc", name: "UC网盘", icon: "https://favicon.im/uc.cn" },
    ProviderInfo { id: "mobile", name: "移动云盘", icon: "https://favicon.im/caiyun.139.com" },
    ProviderInfo { id: "115", name: "115网盘", icon: "https://favicon.im/115.com" },
    ProviderInfo { id: "pikpak", name: "PikPak", icon: "https://favicon.im/mypikpak.net" },
    ProviderInfo { id: "xunlei", name: "迅雷云盘", icon: "https://favicon.im/xunlei.com" },
    ProviderInfo { id: "123", name: "123网盘", icon: "https://favicon.im/123pan.com" },
    ProviderInfo { id: "magnet", name: "磁力链接", icon: "https://favicon.im/bt.com" },
    ProviderInfo { id: "ed2k", name: "电驴链接", icon: "https://favicon.im/emule-project.net" },
];

impl CloudType {
    pub const ALL: [CloudType; 12] = [
        CloudType::Baidu,
        CloudType::Aliyun,
        CloudType::Quark,
        CloudType::Tianyi,
        CloudType::Uc,
        CloudType::Mobile,
        CloudType::Pan115,
        CloudType::PikPak,
        CloudType::Xunlei,
        CloudType::Pan123,
        CloudType::Magnet,
        CloudType::Ed2k,
    ];

    fn info(self) -> &'static ProviderInfo {
        &PROVIDERS[self as usize]
    }

    /// Identifier used on the wire, e.g. `"baidu"` or `"115"`.
    pub fn id(self) -> &'static str {
        self.info().id
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn icon(self) -> &'static str {
        self.info().icon
    }

    pub fn from_id(id: &str) -> Option<CloudType> {
        Self::ALL.iter().copied().find(|t| t.id() == id)
    }
}

/// Display name for a result-map key. Unknown keys are shown verbatim.
pub fn display_name(key: &str) -> String {
    match CloudType::from_id(key) {
        Some(t) => t.name().to_string(),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_enum_order() {
        for (i, t) in CloudType::ALL.iter().enumerate() {
            assert_eq!(*t as usize, i);
            assert_eq!(CloudType::from_id(t.id()), Some(*t));
        }
    }

    #[test]
    fn serde_uses_wire_ids() {
        let json = serde_json::to_string(&CloudType::Pan115).unwrap();
        assert_eq!(json, "\"115\"");
        let back: CloudType = serde_json::from_str("\"pikpak\"").unwrap();
        assert_eq!(back, CloudType::PikPak);
    }

    #[test]
    fn unknown_key_displays_raw() {
        assert_eq!(display_name("quark"), "夸克网盘");
        assert_eq!(display_name("weiyun"), "weiyun");
        assert!(CloudType::from_id("weiyun").is_none());
    }
}

//! Default region table: JMA forecast regions and the office codes they cover.

use crate::config::RegionConfig;

const DEFAULT_REGIONS: &[(&str, &str, &[&str])] = &[
    (
        "hokkaido",
        "北海道地方",
        &["011000", "012000", "013000", "014030", "014100", "015000", "016000", "017000"],
    ),
    (
        "tohoku",
        "東北地方",
        &["020000", "030000", "040000", "050000", "060000", "070000"],
    ),
    (
        "kanto",
        "関東甲信地方",
        &[
            "080000", "090000", "100000", "110000", "120000", "130000", "140000", "190000",
            "200000",
        ],
    ),
    ("tokai", "東海地方", &["210000", "220000", "230000", "240000"]),
    ("hokuriku", "北陸地方", &["150000", "160000", "170000", "180000"]),
    (
        "kinki",
        "近畿地方",
        &["250000", "260000", "270000", "280000", "290000", "300000"],
    ),
    (
        "chugoku",
        "中国地方（山口県を除く）",
        &["310000", "320000", "330000", "340000"],
    ),
    ("shikoku", "四国地方", &["360000", "370000", "380000", "390000"]),
    (
        "kyushu_north",
        "九州北部地方（山口県を含む）",
        &["400000", "410000", "420000", "430000", "440000", "350000"],
    ),
    ("kyushu_south", "九州南部・奄美地方", &["450000", "460100", "460040"]),
    ("okinawa", "沖縄地方", &["471000", "472000", "473000", "474000"]),
];

/// The built-in region table used when the config file does not override it.
pub fn default_regions() -> Vec<RegionConfig> {
    DEFAULT_REGIONS
        .iter()
        .map(|(code, name, areas)| RegionConfig {
            code: (*code).to_string(),
            name: (*name).to_string(),
            areas: areas.iter().map(|a| (*a).to_string()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_table_has_eleven_regions() {
        assert_eq!(default_regions().len(), 11);
    }

    #[test]
    fn region_codes_are_unique() {
        let regions = default_regions();
        let codes: HashSet<_> = regions.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes.len(), regions.len());
    }

    #[test]
    fn kanto_keeps_source_order() {
        let regions = default_regions();
        let kanto = regions.iter().find(|r| r.code == "kanto");
        let areas = kanto.map(|r| r.areas.clone()).unwrap_or_default();
        assert_eq!(areas.first().map(String::as_str), Some("080000"));
        assert_eq!(areas.get(1).map(String::as_str), Some("090000"));
        assert_eq!(areas.len(), 9);
    }
}

//! Display icon and colour for a category, looked up by its normalized name.

pub const DEFAULT_ICON: &str = "school";
pub const DEFAULT_COLOR: &str = "#FF6B35";

const CATEGORY_ICONS: &[(&str, &str)] = &[
    ("technical-skills", "construct"),
    ("technical", "construct"),
    ("computer-it", "desktop"),
    ("it-computer-science", "laptop"),
    ("computer-science", "laptop"),
    ("beauty-wellness", "sparkles"),
    ("beauty-and-wellness", "sparkles"),
    ("hospitality", "restaurant"),
    ("healthcare", "medical"),
    ("agriculture", "leaf"),
    ("automotive", "car"),
    ("fashion-design", "cut"),
    ("fashion-and-design", "cut"),
    ("electrical", "flash"),
    ("construction", "business"),
    ("art-design", "color-palette"),
    ("art-and-design", "color-palette"),
    ("photography", "camera"),
    ("music", "musical-notes"),
    ("business", "briefcase"),
    ("carpentry", "hammer"),
    ("electronics", "hardware-chip"),
    ("travel-tourism", "airplane"),
    ("travel-and-tourism", "airplane"),
    ("retail", "bag"),
    ("childcare", "happy"),
    ("fitness", "barbell"),
];

const CATEGORY_COLORS: &[(&str, &str)] = &[
    ("technical-skills", "#FF6B35"),
    ("technical", "#FF6B35"),
    ("computer-it", "#4299E1"),
    ("it-computer-science", "#3182CE"),
    ("computer-science", "#3182CE"),
    ("beauty-wellness", "#ED64A6"),
    ("beauty-and-wellness", "#ED64A6"),
    ("hospitality", "#F6AD55"),
    ("healthcare", "#48BB78"),
    ("agriculture", "#68D391"),
    ("automotive", "#F56565"),
    ("fashion-design", "#ED64A6"),
    ("fashion-and-design", "#ED64A6"),
    ("electrical", "#ECC94B"),
    ("construction", "#DD6B20"),
    ("art-design", "#9F7AEA"),
    ("art-and-design", "#9F7AEA"),
    ("photography", "#4299E1"),
    ("music", "#805AD5"),
    ("business", "#4299E1"),
    ("carpentry", "#DD6B20"),
    ("electronics", "#38B2AC"),
    ("travel-tourism", "#4299E1"),
    ("travel-and-tourism", "#4299E1"),
    ("retail", "#ED8936"),
    ("childcare", "#F687B3"),
    ("fitness", "#F56565"),
];

/// Lowercase, `&` -> `and`, whitespace runs -> `-`, then drop anything
/// outside `[a-z0-9-]`.
pub fn normalize_category_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', "and");

    let mut key = String::with_capacity(lowered.len());
    let mut in_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_space {
                key.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            key.push(ch);
        }
    }
    key
}

pub fn resolve_icon(name: &str) -> &'static str {
    lookup(CATEGORY_ICONS, &normalize_category_name(name)).unwrap_or(DEFAULT_ICON)
}

pub fn resolve_color(name: &str) -> &'static str {
    lookup(CATEGORY_COLORS, &normalize_category_name(name)).unwrap_or(DEFAULT_COLOR)
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

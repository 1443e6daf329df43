// 🏬 Store Matcher - map a receipt's merchant text onto a known store
//
// Receipt scans return free text ("TESCO EXTRA #2231", "Lidl UK"). The
// manual entry form only offers a fixed list, so scanned names are matched
// onto that list before items are confirmed. Not used by the comparator:
// comparison keeps store names exactly as recorded.

use serde::Serialize;

/// Store options offered by the entry form, in display order
pub const DEFAULT_STORES: [&str; 8] = [
    "Tesco",
    "Asda",
    "Aldi",
    "Lidl",
    "Best foods",
    "Quality",
    "Freshco",
    "Others",
];

#[derive(Debug, Clone, Serialize)]
pub struct StoreMatcher {
    options: Vec<String>,
    /// (lowercase base store, known variations)
    variations: Vec<(String, Vec<String>)>,
}

impl StoreMatcher {
    /// Create matcher with no options
    pub fn new() -> Self {
        StoreMatcher {
            options: Vec::new(),
            variations: Vec::new(),
        }
    }

    /// Create matcher with the default UK store list and variations
    pub fn with_defaults() -> Self {
        let mut matcher = StoreMatcher::new();
        for store in DEFAULT_STORES {
            matcher.add_store(store);
        }

        matcher.add_variations("tesco", &["tesco superstore", "tesco extra", "tesco express", "tesco metro"]);
        matcher.add_variations("asda", &["asda superstore", "asda supermarket"]);
        matcher.add_variations("aldi", &["aldi stores", "aldi supermarket"]);
        matcher.add_variations("lidl", &["lidl uk", "lidl supermarket"]);

        matcher
    }

    pub fn add_store(&mut self, name: &str) {
        if !self.options.iter().any(|o| o.eq_ignore_ascii_case(name)) {
            self.options.push(name.to_string());
        }
    }

    pub fn add_variations(&mut self, base: &str, variations: &[&str]) {
        self.variations.push((
            base.to_lowercase(),
            variations.iter().map(|v| v.to_lowercase()).collect(),
        ));
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Match extracted store text onto a known option
    ///
    /// Order: exact (case-insensitive) → containment either way → known
    /// variations. Returns None when nothing matches.
    pub fn match_store_name(&self, extracted: &str) -> Option<&str> {
        let normalized = extracted.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(option) = self
            .options
            .iter()
            .find(|o| o.to_lowercase() == normalized)
        {
            return Some(option.as_str());
        }

        if let Some(option) = self.options.iter().find(|o| {
            let option_lower = o.to_lowercase();
            normalized.contains(&option_lower) || option_lower.contains(&normalized)
        }) {
            return Some(option.as_str());
        }

        for (base, variations) in &self.variations {
            let hit = variations
                .iter()
                .any(|v| normalized.contains(v.as_str()) || v.contains(&normalized));
            if hit {
                if let Some(option) = self.options.iter().find(|o| o.to_lowercase() == *base) {
                    return Some(option.as_str());
                }
            }
        }

        None
    }
}

impl Default for StoreMatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

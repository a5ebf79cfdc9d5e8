//! Shadow feature keywords
//!
//! Shading branches on a handful of mutually exclusive keywords chosen from
//! configuration. Each group enables at most one keyword; the group's
//! baseline option (2×2 PCF, hard cascade blend, no shadow mask) enables none.

use serde::{Serialize, Deserialize};

use super::config::{CascadeBlendMode, ShadowMaskMode, ShadowSettings};

pub const DIRECTIONAL_FILTER_KEYWORDS: KeywordGroup = KeywordGroup {
    name: "directional_filter",
    keywords: &["_DIRECTIONAL_PCF3", "_DIRECTIONAL_PCF5", "_DIRECTIONAL_PCF7"],
};

pub const OTHER_FILTER_KEYWORDS: KeywordGroup = KeywordGroup {
    name: "other_filter",
    keywords: &["_OTHER_PCF3", "_OTHER_PCF5", "_OTHER_PCF7"],
};

pub const CASCADE_BLEND_KEYWORDS: KeywordGroup = KeywordGroup {
    name: "cascade_blend",
    keywords: &["_CASCADE_BLEND_SOFT", "_CASCADE_BLEND_DITHER"],
};

pub const SHADOW_MASK_KEYWORDS: KeywordGroup = KeywordGroup {
    name: "shadow_mask",
    keywords: &["_SHADOW_MASK_ALWAYS", "_SHADOW_MASK_DISTANCE"],
};

/// A set of mutually exclusive shader keywords
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeywordGroup {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
}

impl KeywordGroup {
    /// `(keyword, enabled)` for every keyword in the group
    pub fn states(&self, enabled: Option<usize>) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.keywords
            .iter()
            .enumerate()
            .map(move |(i, keyword)| (*keyword, enabled == Some(i)))
    }
}

/// Keyword choice for each group, as indices into the group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowKeywords {
    pub directional_filter: Option<usize>,
    pub other_filter: Option<usize>,
    pub cascade_blend: Option<usize>,
    pub shadow_mask: Option<usize>,
}

impl ShadowKeywords {
    /// Choose keywords from settings and whether any light used a shadow mask
    pub fn select(settings: &ShadowSettings, use_shadow_mask: bool) -> Self {
        let filter_index = |ordinal: u32| (ordinal as usize).checked_sub(1);

        let cascade_blend = match settings.directional.cascade_blend {
            CascadeBlendMode::Hard => None,
            CascadeBlendMode::Soft => Some(0),
            CascadeBlendMode::Dither => Some(1),
        };

        let shadow_mask = use_shadow_mask.then(|| match settings.shadow_mask_mode {
            ShadowMaskMode::Shadowmask => 0,
            ShadowMaskMode::DistanceShadowmask => 1,
        });

        Self {
            directional_filter: filter_index(settings.directional.filter.ordinal()),
            other_filter: filter_index(settings.other.filter.ordinal()),
            cascade_blend,
            shadow_mask,
        }
    }

    /// Each group paired with its selection
    pub fn groups(&self) -> [(KeywordGroup, Option<usize>); 4] {
        [
            (DIRECTIONAL_FILTER_KEYWORDS, self.directional_filter),
            (OTHER_FILTER_KEYWORDS, self.other_filter),
            (CASCADE_BLEND_KEYWORDS, self.cascade_blend),
            (SHADOW_MASK_KEYWORDS, self.shadow_mask),
        ]
    }

    /// Enabled keyword names
    pub fn enabled(&self) -> Vec<&'static str> {
        self.groups()
            .iter()
            .filter_map(|(group, index)| index.and_then(|i| group.keywords.get(i).copied()))
            .collect()
    }

    pub fn is_enabled(&self, keyword: &str) -> bool {
        self.enabled().contains(&keyword)
    }

    /// Preprocessor header for the enabled keywords
    pub fn generate_header(&self) -> String {
        let mut header = String::new();
        for keyword in self.enabled() {
            header.push_str("#define ");
            header.push_str(keyword);
            header.push('\n');
        }
        header
    }
}

//! Platform Catalogue
//!
//! Per-platform label style and defaults, plus aggregation across the
//! platforms a multi-platform configuration screen has enabled. Each
//! platform's configuration is governed by its own budget.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::allocator::{self, LimitViolation};
use super::label::LabelStyle;
use super::model::{Allocation, Budget, Configuration, Consumer, Target, TargetId, Totals};

/// Feed allocation of a freshly enabled platform
pub const DEFAULT_FEED: Allocation = Allocation::new(5, 5);
/// Allocation of the default target of a freshly enabled platform
pub const DEFAULT_TARGET: Allocation = Allocation::new(3, 2);

/// Social platform a configuration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    LinkedIn,
    Twitter,
    Facebook,
    Instagram,
    TikTok,
    Reddit,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::LinkedIn,
        Platform::Twitter,
        Platform::Facebook,
        Platform::Instagram,
        Platform::TikTok,
        Platform::Reddit,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Twitter => "Twitter/X",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
            Platform::Reddit => "Reddit",
        }
    }

    /// Format family of target labels on this platform
    pub fn label_style(&self) -> LabelStyle {
        match self {
            Platform::Reddit => LabelStyle::Community,
            _ => LabelStyle::Keyword,
        }
    }

    /// Label of the target seeded into a new configuration
    pub fn default_label(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "#sales",
            Platform::Twitter => "#tech",
            Platform::Facebook => "#business",
            Platform::Instagram => "#lifestyle",
            Platform::TikTok => "#viral",
            Platform::Reddit => "technology",
        }
    }

    /// Starting configuration: feed plus one default target.
    ///
    /// Both allocations are shrunk to fit a budget smaller than the defaults.
    pub fn default_configuration(&self, budget: Budget) -> Configuration {
        let feed = Allocation::new(
            DEFAULT_FEED.likes.min(budget.max_likes),
            DEFAULT_FEED.comments.min(budget.max_comments),
        );
        let config = Configuration::with_feed(budget, feed);

        let fitted = allocator::clamp_to_headroom(&config, None, DEFAULT_TARGET).allocation;
        let target = Target::new(TargetId::generate(), self.default_label(), fitted);
        match allocator::propose_upsert(&config, Consumer::Target(target)) {
            Ok(seeded) => seeded,
            // Fitted to the headroom, so this only happens on a degenerate budget
            Err(_) => config,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::Reddit => "reddit",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "x" => return Ok(Platform::Twitter),
            "linked_in" => return Ok(Platform::LinkedIn),
            _ => {}
        }
        Platform::ALL
            .into_iter()
            .find(|p| p.key() == lowered)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Configurations for several platforms edited on one screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiPlatformConfiguration {
    enabled: Vec<Platform>,
    settings: BTreeMap<Platform, Configuration>,
}

impl MultiPlatformConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a platform, seeding its default configuration if it has none.
    pub fn enable(&mut self, platform: Platform, budget: Budget) {
        if !self.enabled.contains(&platform) {
            self.enabled.push(platform);
        }
        self.settings
            .entry(platform)
            .or_insert_with(|| platform.default_configuration(budget));
    }

    /// Disable a platform. Its settings are kept for re-enabling.
    pub fn disable(&mut self, platform: Platform) {
        self.enabled.retain(|p| *p != platform);
    }

    pub fn is_enabled(&self, platform: Platform) -> bool {
        self.enabled.contains(&platform)
    }

    pub fn enabled(&self) -> &[Platform] {
        &self.enabled
    }

    pub fn get(&self, platform: Platform) -> Option<&Configuration> {
        self.settings.get(&platform)
    }

    /// Store the result of an allocator operation for a platform
    pub fn set(&mut self, platform: Platform, config: Configuration) {
        self.settings.insert(platform, config);
    }

    /// Totals of one platform; zero when it has no settings
    pub fn platform_totals(&self, platform: Platform) -> Totals {
        self.settings
            .get(&platform)
            .map(allocator::totals)
            .unwrap_or_default()
    }

    /// Totals summed over enabled platforms only
    pub fn combined_totals(&self) -> Totals {
        self.enabled
            .iter()
            .map(|p| self.platform_totals(*p))
            .fold(Totals::default(), |acc, t| Totals {
                likes: acc.likes.saturating_add(t.likes),
                comments: acc.comments.saturating_add(t.comments),
            })
    }

    /// Limit violations per enabled platform, omitting clean ones
    pub fn audit(&self, max_consumers: usize) -> BTreeMap<Platform, Vec<LimitViolation>> {
        self.enabled
            .iter()
            .filter_map(|p| {
                let violations = allocator::audit(self.settings.get(p)?, max_consumers);
                (!violations.is_empty()).then_some((*p, violations))
            })
            .collect()
    }
}

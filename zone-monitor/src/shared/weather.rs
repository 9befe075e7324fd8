//! Market "weather" derived from the zone distribution
//!
//! Zones are paired coldest to hottest and the pair holding the most symbols
//! sets the outlook shown in the dashboard header.

use crate::shared::types::ZoneCount;

/// Outlook for the dominant zone pair
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeatherOutlook {
    /// Z1 + Z2
    Rain,
    /// Z3 + Z4
    Clouds,
    /// Z5 + Z6
    SunClouds,
    /// Z7 + Z8
    Sun,
}

impl WeatherOutlook {
    pub const ALL: [WeatherOutlook; 4] = [
        WeatherOutlook::Rain,
        WeatherOutlook::Clouds,
        WeatherOutlook::SunClouds,
        WeatherOutlook::Sun,
    ];

    /// Group a zone label belongs to, `None` for labels outside Z1-Z8
    pub fn for_zone(zone: &str) -> Option<Self> {
        match zone {
            "Z1" | "Z2" => Some(WeatherOutlook::Rain),
            "Z3" | "Z4" => Some(WeatherOutlook::Clouds),
            "Z5" | "Z6" => Some(WeatherOutlook::SunClouds),
            "Z7" | "Z8" => Some(WeatherOutlook::Sun),
            _ => None,
        }
    }

    /// Per-group totals in [`WeatherOutlook::ALL`] order
    pub fn group_totals(zone_counts: &[ZoneCount]) -> [u64; 4] {
        let mut totals = [0u64; 4];
        for ZoneCount { zone, count } in zone_counts {
            if let Some(group) = Self::for_zone(zone) {
                totals[group as usize] = totals[group as usize].saturating_add(*count);
            }
        }
        totals
    }

    /// Dominant group of a zone distribution.
    ///
    /// Ties go to the later (hotter) group. `None` for an empty distribution.
    pub fn from_zone_counts(zone_counts: &[ZoneCount]) -> Option<Self> {
        if zone_counts.is_empty() {
            return None;
        }

        let totals = Self::group_totals(zone_counts);
        let mut best = 0;
        for (index, total) in totals.iter().enumerate().skip(1) {
            if *total >= totals[best] {
                best = index;
            }
        }
        Some(Self::ALL[best])
    }

    pub fn icon(&self) -> &'static str {
        match self {
            WeatherOutlook::Rain => "🌧",
            WeatherOutlook::Clouds => "☁",
            WeatherOutlook::SunClouds => "⛅",
            WeatherOutlook::Sun => "☀",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherOutlook::Rain => "RAIN",
            WeatherOutlook::Clouds => "CLOUDS",
            WeatherOutlook::SunClouds => "SUN/CLOUDS",
            WeatherOutlook::Sun => "SUN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> Vec<ZoneCount> {
        pairs
            .iter()
            .map(|(zone, count)| ZoneCount {
                zone: zone.to_string(),
                count: *count,
            })
            .collect()
    }

    #[test]
    fn test_rain_dominates() {
        let distribution = counts(&[("Z1", 10), ("Z2", 5), ("Z3", 1)]);
        assert_eq!(WeatherOutlook::group_totals(&distribution), [15, 1, 0, 0]);
        assert_eq!(
            WeatherOutlook::from_zone_counts(&distribution),
            Some(WeatherOutlook::Rain)
        );
    }

    #[test]
    fn test_ties_go_to_hotter_group() {
        let distribution = counts(&[("Z2", 4), ("Z6", 4)]);
        assert_eq!(
            WeatherOutlook::from_zone_counts(&distribution),
            Some(WeatherOutlook::SunClouds)
        );

        let zeros = counts(&[("Z1", 0)]);
        assert_eq!(WeatherOutlook::from_zone_counts(&zeros), Some(WeatherOutlook::Sun));
    }

    #[test]
    fn test_group_totals_saturate() {
        let distribution = counts(&[("Z1", u64::MAX / 2 + 1), ("Z2", u64::MAX / 2 + 1), ("Z7", 3)]);
        assert_eq!(WeatherOutlook::group_totals(&distribution), [u64::MAX, 0, 0, 3]);
        assert_eq!(
            WeatherOutlook::from_zone_counts(&distribution),
            Some(WeatherOutlook::Rain)
        );
    }

    #[test]
    fn test_unknown_zones_ignored() {
        let distribution = counts(&[("Z9", 100), ("z1", 100), ("Z4", 1)]);
        assert_eq!(
            WeatherOutlook::from_zone_counts(&distribution),
            Some(WeatherOutlook::Clouds)
        );
        assert_eq!(WeatherOutlook::from_zone_counts(&[]), None);
    }
}

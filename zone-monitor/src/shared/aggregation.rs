/// Aggregation utilities for trade monitor snapshots
///
/// Pure, single-pass transformations that turn a flat list of
/// [`TradeRecord`]s into the table order, highlight extrema, pressure
/// classifications and the per-zone series the telemetry charts render.
use std::cmp::Ordering;
use std::str::FromStr;

use crate::shared::error::MonitorError;
use crate::shared::types::{Snapshot, TradeRecord, ZoneCount, ZONES};
use crate::shared::weather::WeatherOutlook;

// ============================================================================
// Table order
// ============================================================================

/// Numeric rank of a zone label: every non-digit stripped, remainder parsed.
///
/// `"Z12"` -> 12, `"abc"` -> 0. Unparsable or overflowing labels rank 0.
pub fn zone_rank(zone: &str) -> u64 {
    let digits: String = zone.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Descending comparison; NaN compares equal so the next key decides.
fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Sort records into table order.
///
/// Stable, descending on zone rank, then `performance_24`, then
/// `performance_btc_24`. Full ties keep their input order.
pub fn sort_records(mut records: Vec<TradeRecord>) -> Vec<TradeRecord> {
    records.sort_by(|a, b| {
        zone_rank(&b.zone)
            .cmp(&zone_rank(&a.zone))
            .then_with(|| desc(a.performance_24, b.performance_24))
            .then_with(|| desc(a.performance_btc_24, b.performance_btc_24))
    });
    records
}

// ============================================================================
// Extrema highlighting
// ============================================================================

/// Numeric fields that get max/min highlighting in the table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricField {
    Performance24,
    PerformanceBtc24,
    AmplitudeMa200,
}

impl MetricField {
    pub fn value(&self, record: &TradeRecord) -> f64 {
        match self {
            MetricField::Performance24 => record.performance_24,
            MetricField::PerformanceBtc24 => record.performance_btc_24,
            MetricField::AmplitudeMa200 => record.amplitude_ma_200,
        }
    }
}

/// Highlight class of a single table cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Highlight {
    Max,
    Min,
    Positive,
    Negative,
    Neutral,
}

/// Max and min of one field across a snapshot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extrema {
    pub max: f64,
    pub min: f64,
}

impl Extrema {
    /// Classify a value against this snapshot's extrema.
    ///
    /// Exact equality, no epsilon. Max wins over min when every value is equal.
    pub fn classify(&self, value: f64) -> Highlight {
        if value == self.max {
            Highlight::Max
        } else if value == self.min {
            Highlight::Min
        } else if value > 0.0 {
            Highlight::Positive
        } else if value < 0.0 {
            Highlight::Negative
        } else {
            Highlight::Neutral
        }
    }
}

/// Extrema of `field` across `records`, `None` when there are no records
pub fn extrema(records: &[TradeRecord], field: MetricField) -> Option<Extrema> {
    let mut values = records.iter().map(|r| field.value(r));
    let first = values.next()?;
    let (max, min) = values.fold((first, first), |(max, min), v| (max.max(v), min.min(v)));
    Some(Extrema { max, min })
}

/// Extrema for every highlighted field of a snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldExtrema {
    pub performance_24: Option<Extrema>,
    pub performance_btc_24: Option<Extrema>,
    pub amplitude_ma_200: Option<Extrema>,
}

impl FieldExtrema {
    pub fn from_records(records: &[TradeRecord]) -> Self {
        Self {
            performance_24: extrema(records, MetricField::Performance24),
            performance_btc_24: extrema(records, MetricField::PerformanceBtc24),
            amplitude_ma_200: extrema(records, MetricField::AmplitudeMa200),
        }
    }

    pub fn get(&self, field: MetricField) -> Option<Extrema> {
        match field {
            MetricField::Performance24 => self.performance_24,
            MetricField::PerformanceBtc24 => self.performance_btc_24,
            MetricField::AmplitudeMa200 => self.amplitude_ma_200,
        }
    }

    /// Highlight class of `record`'s value for `field`
    pub fn highlight(&self, record: &TradeRecord, field: MetricField) -> Highlight {
        let value = field.value(record);
        match self.get(field) {
            Some(extrema) => extrema.classify(value),
            None => Highlight::Neutral,
        }
    }
}

// ============================================================================
// Buy/sell pressure
// ============================================================================

/// Share of base volume bought by takers, 0.0 when `volume` is zero
pub fn buy_pressure(record: &TradeRecord) -> f64 {
    if record.volume == 0.0 {
        0.0
    } else {
        record.taker_buy_base_volume / record.volume
    }
}

/// Complement of [`buy_pressure`], 0.0 when `volume` is zero
pub fn seller_pressure(record: &TradeRecord) -> f64 {
    if record.volume == 0.0 {
        0.0
    } else {
        1.0 - buy_pressure(record)
    }
}

/// Pressure band of a buy ratio
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pressure {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Pressure {
    /// Bands are evaluated in order: >0.7, >0.5, <0.3, <0.5, else neutral.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.7 {
            Pressure::StrongBuy
        } else if ratio > 0.5 {
            Pressure::Buy
        } else if ratio < 0.3 {
            Pressure::StrongSell
        } else if ratio < 0.5 {
            Pressure::Sell
        } else {
            Pressure::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pressure::StrongBuy => "STRONG BUY",
            Pressure::Buy => "BUY",
            Pressure::Neutral => "NEUTRAL",
            Pressure::Sell => "SELL",
            Pressure::StrongSell => "STRONG SELL",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Pressure::StrongBuy | Pressure::Buy => "↑",
            Pressure::Sell | Pressure::StrongSell => "↓",
            Pressure::Neutral => "",
        }
    }
}

/// Pressure band of a record; records without volume carry no signal
pub fn record_pressure(record: &TradeRecord) -> Pressure {
    if record.volume == 0.0 {
        return Pressure::Neutral;
    }
    Pressure::from_ratio(buy_pressure(record))
}

// ============================================================================
// Per-zone series
// ============================================================================

/// Position of a zone label in [`ZONES`], exact match only
pub fn zone_index(zone: &str) -> Option<usize> {
    ZONES.iter().position(|z| *z == zone)
}

/// How a per-zone series is normalised
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesKind {
    /// Zone numerator over the grand total across all eight zones
    Share,
    /// Zone numerator over a zone denominator
    Ratio,
    /// Plain zone sum
    Sum,
}

/// Metrics charted per zone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ZoneMetric {
    TradeShare,
    QuoteVolumeShare,
    BuyerPressure,
    SellerPressure,
    BtcPerformanceSum,
    PerformanceSum,
    AmplitudeSum,
    BuyQuoteVolumeShare,
}

impl ZoneMetric {
    pub const ALL: [ZoneMetric; 8] = [
        ZoneMetric::TradeShare,
        ZoneMetric::QuoteVolumeShare,
        ZoneMetric::BuyerPressure,
        ZoneMetric::SellerPressure,
        ZoneMetric::BtcPerformanceSum,
        ZoneMetric::PerformanceSum,
        ZoneMetric::AmplitudeSum,
        ZoneMetric::BuyQuoteVolumeShare,
    ];

    pub fn kind(&self) -> SeriesKind {
        match self {
            ZoneMetric::TradeShare
            | ZoneMetric::QuoteVolumeShare
            | ZoneMetric::BuyQuoteVolumeShare => SeriesKind::Share,
            ZoneMetric::BuyerPressure | ZoneMetric::SellerPressure => SeriesKind::Ratio,
            ZoneMetric::BtcPerformanceSum
            | ZoneMetric::PerformanceSum
            | ZoneMetric::AmplitudeSum => SeriesKind::Sum,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ZoneMetric::TradeShare => "Completed Trades",
            ZoneMetric::QuoteVolumeShare => "Quote Volume",
            ZoneMetric::BuyerPressure => "Buyer Pressure by Zone",
            ZoneMetric::SellerPressure => "Seller Pressure by Zone",
            ZoneMetric::BtcPerformanceSum => "BTC 24-Hour Performance",
            ZoneMetric::PerformanceSum => "Crypto 24-Hour Performance",
            ZoneMetric::AmplitudeSum => "Distance from the 200 MA",
            ZoneMetric::BuyQuoteVolumeShare => "USDT (Market Buy Orders)",
        }
    }

    /// Share and sum numerator for one zone
    fn numerator(&self, totals: &ZoneTotals) -> f64 {
        match self {
            ZoneMetric::TradeShare => totals.trades_count,
            ZoneMetric::QuoteVolumeShare => totals.quote_volume,
            ZoneMetric::BuyQuoteVolumeShare => totals.taker_buy_quote_volume,
            ZoneMetric::BtcPerformanceSum => totals.performance_btc_24,
            ZoneMetric::PerformanceSum => totals.performance_24,
            ZoneMetric::AmplitudeSum => totals.amplitude_ma_200,
            ZoneMetric::BuyerPressure | ZoneMetric::SellerPressure => totals.taker_buy_base_volume,
        }
    }
}

/// Running sums for one zone
#[derive(Clone, Copy, Debug, Default)]
struct ZoneTotals {
    trades_count: f64,
    quote_volume: f64,
    volume: f64,
    taker_buy_base_volume: f64,
    taker_buy_quote_volume: f64,
    performance_24: f64,
    performance_btc_24: f64,
    amplitude_ma_200: f64,
}

impl ZoneTotals {
    fn add(&mut self, record: &TradeRecord) {
        self.trades_count += record.trades_count;
        self.quote_volume += record.quote_volume;
        self.volume += record.volume;
        self.taker_buy_base_volume += record.taker_buy_base_volume;
        self.taker_buy_quote_volume += record.taker_buy_quote_volume;
        self.performance_24 += record.performance_24;
        self.performance_btc_24 += record.performance_btc_24;
        self.amplitude_ma_200 += record.amplitude_ma_200;
    }

    fn buyer_ratio(&self) -> f64 {
        if self.volume == 0.0 {
            0.0
        } else {
            self.taker_buy_base_volume / self.volume
        }
    }
}

/// One charted value for one zone
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZonePoint {
    pub zone: &'static str,
    pub value: f64,
}

/// A metric across all eight zones, always in `Z1..Z8` order
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneSeries {
    pub metric: ZoneMetric,
    pub points: [ZonePoint; 8],
}

impl ZoneSeries {
    fn from_values(metric: ZoneMetric, values: [f64; 8]) -> Self {
        Self {
            metric,
            points: std::array::from_fn(|i| ZonePoint {
                zone: ZONES[i],
                value: values[i],
            }),
        }
    }

    pub fn value(&self, zone: &str) -> Option<f64> {
        zone_index(zone).map(|i| self.points[i].value)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }

    /// Smallest and largest point value
    pub fn range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p.value), hi.max(p.value)))
    }
}

/// All eight per-zone series for one snapshot
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneBreakdown {
    series: [ZoneSeries; 8],
}

impl ZoneBreakdown {
    /// Derive every series in a single pass over `records`.
    ///
    /// Records whose zone is not one of [`ZONES`] contribute nothing.
    pub fn from_records(records: &[TradeRecord]) -> Self {
        let mut totals = [ZoneTotals::default(); 8];
        for record in records {
            if let Some(index) = zone_index(&record.zone) {
                totals[index].add(record);
            }
        }

        let series = ZoneMetric::ALL.map(|metric| {
            let values: [f64; 8] = match metric.kind() {
                SeriesKind::Share => {
                    let numerators = totals.map(|t| metric.numerator(&t));
                    let grand_total: f64 = numerators.iter().sum();
                    if grand_total == 0.0 {
                        [0.0; 8]
                    } else {
                        numerators.map(|n| n / grand_total)
                    }
                }
                SeriesKind::Ratio => match metric {
                    ZoneMetric::SellerPressure => totals.map(|t| 1.0 - t.buyer_ratio()),
                    _ => totals.map(|t| t.buyer_ratio()),
                },
                SeriesKind::Sum => totals.map(|t| metric.numerator(&t)),
            };
            ZoneSeries::from_values(metric, values)
        });

        Self { series }
    }

    pub fn series(&self, metric: ZoneMetric) -> &ZoneSeries {
        // ALL and the stored array share the same order
        let index = ZoneMetric::ALL
            .iter()
            .position(|m| *m == metric)
            .unwrap_or_default();
        &self.series[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneSeries> {
        self.series.iter()
    }
}

// ============================================================================
// Position distribution
// ============================================================================

/// Domain of `log_position` values
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PositionScale {
    /// 0.0-1.0, displayed multiplied by 100
    #[default]
    Fraction,
    /// 0-100
    Percent,
}

impl PositionScale {
    /// Map a raw value onto 0-100
    pub fn to_percent(&self, value: f64) -> f64 {
        match self {
            PositionScale::Fraction => value * 100.0,
            PositionScale::Percent => value,
        }
    }
}

impl FromStr for PositionScale {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fraction" => Ok(PositionScale::Fraction),
            "percent" => Ok(PositionScale::Percent),
            other => Err(MonitorError::Config(format!(
                "unknown position scale '{other}', expected 'fraction' or 'percent'"
            ))),
        }
    }
}

pub const POSITION_BINS: usize = 10;

/// One tenth of the position range
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionBin {
    pub label: String,
    pub count: usize,
}

/// Records binned by `log_position` into ten equal-width buckets
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PositionBuckets {
    pub scale: PositionScale,
    pub bins: Vec<PositionBin>,
}

impl PositionBuckets {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Bucket index of a position value, clamped to `0..=9`. NaN has no bucket.
pub fn position_bucket(value: f64, scale: PositionScale) -> Option<usize> {
    if value.is_nan() {
        return None;
    }
    let index = (scale.to_percent(value) / 10.0).floor();
    Some(index.clamp(0.0, (POSITION_BINS - 1) as f64) as usize)
}

pub fn position_buckets(records: &[TradeRecord], scale: PositionScale) -> PositionBuckets {
    let mut bins: Vec<PositionBin> = (0..POSITION_BINS)
        .map(|i| PositionBin {
            label: format!("{}% - {}%", i * 10, (i + 1) * 10),
            count: 0,
        })
        .collect();

    for record in records {
        if let Some(index) = position_bucket(record.log_position, scale) {
            bins[index].count += 1;
        }
    }

    PositionBuckets { scale, bins }
}

// ============================================================================
// Zone count axis
// ============================================================================

const COUNT_AXIS_STEP: u64 = 20;

/// Y axis of the "Crypto by Zone" chart: max rounded up to a multiple of `step`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountAxis {
    pub max: u64,
    pub step: u64,
}

/// Counts come straight from the server, so the rounded max saturates at the
/// largest multiple of the step that fits in a `u64`.
pub fn count_axis(zone_counts: &[ZoneCount]) -> CountAxis {
    let max_count = zone_counts.iter().map(|z| z.count).max().unwrap_or(0);
    let max = max_count
        .div_ceil(COUNT_AXIS_STEP)
        .checked_mul(COUNT_AXIS_STEP)
        .unwrap_or(u64::MAX - u64::MAX % COUNT_AXIS_STEP);
    CountAxis {
        max,
        step: COUNT_AXIS_STEP,
    }
}

// ============================================================================
// Assembled view
// ============================================================================

/// Everything the presentation layer derives from one snapshot
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorView {
    pub extrema: FieldExtrema,
    pub zones: ZoneBreakdown,
    pub positions: PositionBuckets,
    pub count_axis: CountAxis,
    pub weather: Option<WeatherOutlook>,
}

impl MonitorView {
    pub fn from_snapshot(snapshot: &Snapshot, scale: PositionScale) -> Self {
        Self {
            extrema: FieldExtrema::from_records(&snapshot.records),
            zones: ZoneBreakdown::from_records(&snapshot.records),
            positions: position_buckets(&snapshot.records, scale),
            count_axis: count_axis(&snapshot.zone_counts),
            weather: WeatherOutlook::from_zone_counts(&snapshot.zone_counts),
        }
    }
}

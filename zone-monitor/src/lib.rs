/// Zone Monitor - Shared Library
///
/// Everything the `zone-monitor` dashboard needs behind its terminal UI:
/// - Core data types for the `/trades/monitor` snapshot
/// - A poller that refreshes the snapshot on a fixed interval
/// - Pure aggregation of records into table order, highlights and per-zone series
/// - Ratatui widgets for the telemetry charts
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{MonitorResponse, Snapshot, TradeRecord, ZoneCount, ZONES};

pub use shared::config::MonitorConfig;
pub use shared::error::{MonitorError, Result};
pub use shared::poller::{HttpSource, Poller, PollerConfig, PollerHandle, SnapshotSource};

// Aggregation (pure, recomputed on every applied snapshot)
pub use shared::aggregation::{
    buy_pressure, count_axis, extrema, position_bucket, position_buckets, record_pressure,
    seller_pressure, sort_records, zone_index, zone_rank, CountAxis, Extrema, FieldExtrema,
    Highlight, MetricField, MonitorView, PositionBin, PositionBuckets, PositionScale, Pressure,
    SeriesKind, ZoneBreakdown, ZoneMetric, ZonePoint, ZoneSeries,
};
pub use shared::weather::WeatherOutlook;

// Refresh state shared between poller and renderer
pub use shared::state::{MonitorSnapshot, MonitorState, RefreshStatus};

pub use shared::telemetry::{Palette, ThemeMode};

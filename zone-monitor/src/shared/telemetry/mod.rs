//! Telemetry tab for the zone monitor
//!
//! Provides:
//! - Light/dark palettes shared by every view
//! - Per-zone chart widgets (counts, shares, ratios, signed sums)
//! - Position distribution chart

mod theme;
mod widget;

pub use theme::{Palette, ThemeMode};
pub use widget::{
    render_position_chart, render_telemetry, render_zone_count_chart, render_zone_series_chart,
    signed_bar,
};

//! Ratatui widgets for the TELEMETRY tab - one panel per zone chart

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use super::theme::Palette;
use crate::shared::aggregation::{
    CountAxis, MonitorView, PositionBuckets, PositionScale, SeriesKind, ZoneMetric, ZoneSeries,
};
use crate::shared::types::{Snapshot, ZoneCount};

/// Percent bars are drawn in basis points so BarChart keeps two decimals
const PERCENT_FULL_SCALE: u64 = 10_000;

/// Largest axis the count chart draws unscaled
const COUNT_BAR_RESOLUTION: u64 = 1_000_000;

fn panel(title: &str, palette: &Palette) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title_style(Style::default().fg(palette.fg).add_modifier(Modifier::BOLD))
}

/// Bar width that fits `bars` bars with a one-cell gap into `area`
fn bar_width(area: Rect, bars: u16) -> u16 {
    let inner = area.width.saturating_sub(2);
    (inner.saturating_sub(bars.saturating_sub(1)) / bars.max(1)).clamp(1, 6)
}

/// Render the whole TELEMETRY tab: 2 rows x 5 panels
pub fn render_telemetry(
    f: &mut Frame,
    area: Rect,
    snapshot: &Snapshot,
    view: &MonitorView,
    palette: &Palette,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let columns = |row: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 5); 5])
            .split(row)
    };
    let top = columns(rows[0]);
    let bottom = columns(rows[1]);

    render_zone_count_chart(f, top[0], &snapshot.zone_counts, &view.count_axis, palette);
    render_zone_series_chart(f, top[1], view.zones.series(ZoneMetric::TradeShare), palette);
    render_zone_series_chart(f, top[2], view.zones.series(ZoneMetric::BtcPerformanceSum), palette);
    render_zone_series_chart(f, top[3], view.zones.series(ZoneMetric::AmplitudeSum), palette);
    render_zone_series_chart(f, top[4], view.zones.series(ZoneMetric::QuoteVolumeShare), palette);

    render_zone_series_chart(f, bottom[0], view.zones.series(ZoneMetric::BuyerPressure), palette);
    render_zone_series_chart(f, bottom[1], view.zones.series(ZoneMetric::SellerPressure), palette);
    render_zone_series_chart(f, bottom[2], view.zones.series(ZoneMetric::PerformanceSum), palette);
    render_zone_series_chart(
        f,
        bottom[3],
        view.zones.series(ZoneMetric::BuyQuoteVolumeShare),
        palette,
    );
    render_position_chart(f, bottom[4], &view.positions, palette);
}

/// "Crypto by Zone": symbol counts as reported by the server
pub fn render_zone_count_chart(
    f: &mut Frame,
    area: Rect,
    zone_counts: &[ZoneCount],
    axis: &CountAxis,
    palette: &Palette,
) {
    let title = format!("Crypto by Zone [0..{} /{}]", axis.max, axis.step);
    let block = panel(&title, palette);

    if zone_counts.is_empty() {
        let placeholder = Line::from(Span::styled(
            "No zone distribution",
            Style::default().fg(palette.dim),
        ));
        f.render_widget(Paragraph::new(placeholder).block(block), area);
        return;
    }

    // Bar heights are computed in u64, keep them well clear of overflow
    let divisor = (axis.max / COUNT_BAR_RESOLUTION).max(1);
    let bars: Vec<Bar> = zone_counts
        .iter()
        .map(|z| {
            Bar::default()
                .value(z.count.min(axis.max) / divisor)
                .label(Line::from(z.zone.clone()))
                .text_value(z.count.to_string())
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(area, zone_counts.len() as u16))
        .bar_gap(1)
        .max((axis.max / divisor).max(1))
        .bar_style(Style::default().fg(palette.positive))
        .value_style(Style::default().fg(palette.bg).bg(palette.positive))
        .label_style(Style::default().fg(palette.dim));

    f.render_widget(chart, area);
}

/// One per-zone series: shares and ratios as 0-100% bars, sums as signed bars
pub fn render_zone_series_chart(f: &mut Frame, area: Rect, series: &ZoneSeries, palette: &Palette) {
    match series.metric.kind() {
        SeriesKind::Share | SeriesKind::Ratio => render_percent_series(f, area, series, palette),
        SeriesKind::Sum => render_signed_series(f, area, series, palette),
    }
}

fn render_percent_series(f: &mut Frame, area: Rect, series: &ZoneSeries, palette: &Palette) {
    let color = match series.metric {
        ZoneMetric::BuyerPressure => palette.buyer,
        ZoneMetric::SellerPressure => palette.seller,
        _ => palette.chart,
    };

    let bars: Vec<Bar> = series
        .points
        .iter()
        .map(|p| {
            let scaled = (p.value.clamp(0.0, 1.0) * PERCENT_FULL_SCALE as f64).round() as u64;
            Bar::default()
                .value(scaled)
                .label(Line::from(p.zone))
                .text_value(format!("{:.0}%", p.value * 100.0))
        })
        .collect();

    let chart = BarChart::default()
        .block(panel(series.metric.title(), palette))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width(area, 8))
        .bar_gap(1)
        .max(PERCENT_FULL_SCALE)
        .bar_style(Style::default().fg(color))
        .value_style(Style::default().fg(palette.bg).bg(color))
        .label_style(Style::default().fg(palette.dim));

    f.render_widget(chart, area);
}

fn render_signed_series(f: &mut Frame, area: Rect, series: &ZoneSeries, palette: &Palette) {
    let block = panel(series.metric.title(), palette);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (lo, hi) = series.range();
    let max_abs = lo.abs().max(hi.abs());
    // "Z1 " + bar + " +123.45%"
    let width = (inner.width as usize).saturating_sub(13).max(3);

    let lines: Vec<Line> = series
        .points
        .iter()
        .map(|p| {
            let color = if p.value > 0.0 {
                palette.positive
            } else if p.value < 0.0 {
                palette.negative
            } else {
                palette.dim
            };
            Line::from(vec![
                Span::styled(format!("{} ", p.zone), Style::default().fg(palette.dim)),
                Span::styled(signed_bar(p.value, max_abs, width), Style::default().fg(color)),
                Span::styled(format!(" {:+.2}%", p.value), Style::default().fg(color)),
            ])
        })
        .collect();

    f.render_widget(Paragraph::new(lines), inner);
}

/// Position distribution over ten buckets
pub fn render_position_chart(
    f: &mut Frame,
    area: Rect,
    buckets: &PositionBuckets,
    palette: &Palette,
) {
    let scale = match buckets.scale {
        PositionScale::Fraction => "0-1",
        PositionScale::Percent => "0-100",
    };
    let title = format!("Position Distribution ({})", scale);

    let bars: Vec<Bar> = buckets
        .bins
        .iter()
        .map(|b| {
            Bar::default()
                .value(b.count as u64)
                .label(Line::from(b.label.clone()))
                .text_value(b.count.to_string())
        })
        .collect();

    let max = buckets.bins.iter().map(|b| b.count as u64).max().unwrap_or(0).max(1);

    let chart = BarChart::default()
        .block(panel(&title, palette))
        .direction(Direction::Horizontal)
        .data(BarGroup::default().bars(&bars))
        .bar_width(1)
        .bar_gap(0)
        .max(max)
        .bar_style(Style::default().fg(palette.accent))
        .value_style(Style::default().fg(palette.bg).bg(palette.accent))
        .label_style(Style::default().fg(palette.dim));

    f.render_widget(chart, area);
}

/// Bar growing from a centre mark: left for negative, right for positive.
///
/// `max_abs` maps to a full half. Returns an empty string below width 3.
pub fn signed_bar(value: f64, max_abs: f64, width: usize) -> String {
    if width < 3 {
        return String::new();
    }

    let side = (width - 1) / 2;
    let filled = if max_abs > 0.0 && value.is_finite() {
        ((value.abs() / max_abs) * side as f64).round() as usize
    } else {
        0
    }
    .min(side);

    let mut bar = String::new();
    for i in 0..side {
        if value < 0.0 && i >= side - filled {
            bar.push('█');
        } else {
            bar.push('░');
        }
    }
    bar.push('│');
    for i in 0..side {
        if value > 0.0 && i < filled {
            bar.push('█');
        } else {
            bar.push('░');
        }
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::telemetry::ThemeMode;
    use crate::shared::types::{record, TradeRecord};
    use chrono::Utc;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn buffer_text(buffer: &Buffer) -> String {
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_signed_bar() {
        assert_eq!(signed_bar(4.0, 10.0, 11), "░░░░░│██░░░");
        assert_eq!(signed_bar(-10.0, 10.0, 11), "█████│░░░░░");
        assert_eq!(signed_bar(0.0, 10.0, 11), "░░░░░│░░░░░");
        assert_eq!(signed_bar(3.0, 0.0, 5), "░░│░░");
        assert_eq!(signed_bar(f64::NAN, 1.0, 5), "░░│░░");
        assert_eq!(signed_bar(1.0, 1.0, 2), "");
    }

    #[test]
    fn test_render_telemetry_smoke() {
        let records: Vec<TradeRecord> = vec![
            TradeRecord {
                volume: 10.0,
                taker_buy_base_volume: 7.0,
                trades_count: 100.0,
                quote_volume: 5000.0,
                taker_buy_quote_volume: 2500.0,
                log_position: 0.42,
                ..record("BTCUSDT", "Z3", 1.5, 0.0)
            },
            record("ETHUSDT", "Z6", -2.0, -3.5),
        ];
        let snapshot = Snapshot {
            sequence: 1,
            records,
            zone_counts: vec![
                ZoneCount { zone: "Z3".to_string(), count: 1 },
                ZoneCount { zone: "Z6".to_string(), count: 1 },
            ],
            generated_at: "t".to_string(),
            received_at: Utc::now(),
        };
        let view = MonitorView::from_snapshot(&snapshot, PositionScale::Fraction);
        let palette = ThemeMode::Dark.palette();

        let mut terminal = Terminal::new(TestBackend::new(200, 40)).unwrap();
        terminal
            .draw(|f| render_telemetry(f, f.area(), &snapshot, &view, &palette))
            .unwrap();

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Crypto by Zone"));
        assert!(text.contains("Buyer Pressure by Zone"));
        assert!(text.contains("Position Distribution"));
    }

    #[test]
    fn test_render_huge_zone_counts() {
        let snapshot = Snapshot {
            sequence: 1,
            records: vec![],
            zone_counts: vec![
                ZoneCount { zone: "Z1".to_string(), count: u64::MAX },
                ZoneCount { zone: "Z2".to_string(), count: 3 },
            ],
            generated_at: "t".to_string(),
            received_at: Utc::now(),
        };
        let view = MonitorView::from_snapshot(&snapshot, PositionScale::Fraction);
        let palette = ThemeMode::Dark.palette();

        let mut terminal = Terminal::new(TestBackend::new(200, 40)).unwrap();
        terminal
            .draw(|f| render_telemetry(f, f.area(), &snapshot, &view, &palette))
            .unwrap();
    }

    #[test]
    fn test_render_empty_snapshot_does_not_panic() {
        let snapshot = Snapshot {
            sequence: 1,
            records: vec![],
            zone_counts: vec![],
            generated_at: "t".to_string(),
            received_at: Utc::now(),
        };
        let view = MonitorView::from_snapshot(&snapshot, PositionScale::Percent);
        let palette = ThemeMode::Light.palette();

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|f| render_telemetry(f, f.area(), &snapshot, &view, &palette))
            .unwrap();
    }
}

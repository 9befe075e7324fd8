/// Core data types for trade monitor snapshots
///
/// These types match the JSON body served by the trade monitor service
/// at http://localhost:8080/trades/monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Zone labels charted by the telemetry views, coldest first
pub const ZONES: [&str; 8] = ["Z1", "Z2", "Z3", "Z4", "Z5", "Z6", "Z7", "Z8"];

/// One symbol's current snapshot as computed by the trade monitor
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeRecord {
    /// Trading symbol (e.g., "BTCUSDT"), unique within a snapshot
    pub symbol: String,
    /// Zone label of the form `Z<n>`; higher n = hotter zone
    pub zone: String,
    /// 24h performance in percent
    pub performance_24: f64,
    /// 24h performance relative to BTC in percent
    pub performance_btc_24: f64,
    /// Distance from the 200-period moving average in percent
    pub amplitude_ma_200: f64,
    /// Normalised amplitude (0-1)
    pub log_amplitude: f64,
    /// Normalised position within range, see [`PositionScale`](crate::PositionScale)
    pub log_position: f64,
    pub volume: f64,
    pub quote_volume: f64,
    pub trades_count: f64,
    /// Base volume bought by market orders
    pub taker_buy_base_volume: f64,
    /// Quote volume bought by market orders
    pub taker_buy_quote_volume: f64,

    // Display-only metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_doc: Option<String>,
}

/// Number of symbols currently sitting in a zone
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ZoneCount {
    pub zone: String,
    pub count: u64,
}

/// Response body of `GET /trades/monitor`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitorResponse {
    pub trades: Vec<TradeRecord>,
    /// Generation time as reported by the server
    pub timestamp: String,
    pub zone_distribution: Vec<ZoneCount>,
}

/// Atomic unit of dashboard state
///
/// Produced once per accepted poll and never mutated afterwards; a newer
/// poll replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Request sequence number this snapshot answered
    pub sequence: u64,
    /// Records in table order (see [`sort_records`](crate::sort_records))
    pub records: Vec<TradeRecord>,
    pub zone_counts: Vec<ZoneCount>,
    /// Server timestamp, kept verbatim
    pub generated_at: String,
    /// Local receive time
    pub received_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(
    symbol: &str,
    zone: &str,
    performance_24: f64,
    performance_btc_24: f64,
) -> TradeRecord {
    TradeRecord {
        symbol: symbol.to_string(),
        zone: zone.to_string(),
        performance_24,
        performance_btc_24,
        amplitude_ma_200: 0.0,
        log_amplitude: 0.0,
        log_position: 0.0,
        volume: 0.0,
        quote_volume: 0.0,
        trades_count: 0.0,
        taker_buy_base_volume: 0.0,
        taker_buy_quote_volume: 0.0,
        logo: None,
        name: None,
        description: None,
        date_added: None,
        website: None,
        technical_doc: None,
    }
}

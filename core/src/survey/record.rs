use crate::prelude::{HeatmapError, HeatmapResult};
use crate::survey::metric::Metric;
use crate::survey::point::{MeasurementPoint, ScanObservation};
use serde::{Deserialize, Serialize};

/// On-disk measurement record as written by the survey collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub x: f64,
    pub y: f64,
    pub result: RawResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub iwconfig: Option<RawIwconfig>,
    #[serde(default)]
    pub tcp: Option<RawTcp>,
    #[serde(default, rename = "tcp-reverse")]
    pub tcp_reverse: Option<RawTcpReverse>,
    #[serde(default)]
    pub udp: Option<RawUdp>,
    #[serde(default)]
    pub iwscan: Vec<RawScan>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIwconfig {
    #[serde(default)]
    pub stats: RawLinkStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLinkStats {
    pub level: Option<f64>,
    pub quality: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTcp {
    #[serde(rename = "sent_Mbps")]
    pub sent_mbps: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTcpReverse {
    #[serde(rename = "received_Mbps")]
    pub received_mbps: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUdp {
    #[serde(rename = "Mbps")]
    pub mbps: Option<f64>,
    pub jitter_ms: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScan {
    #[serde(rename = "ESSID")]
    pub essid: String,
    #[serde(rename = "Frequency")]
    pub frequency: f64,
    pub stats: RawScanStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScanStats {
    pub quality: f64,
}

impl RawRecord {
    fn metric_values(&self) -> [(Metric, Option<f64>); Metric::COUNT] {
        let result = &self.result;
        let stats = result.iwconfig.as_ref().map(|iw| &iw.stats);
        [
            (Metric::Rssi, stats.and_then(|s| s.level)),
            (Metric::Quality, stats.and_then(|s| s.quality)),
            (Metric::TcpUpload, result.tcp.as_ref().and_then(|t| t.sent_mbps)),
            (
                Metric::TcpDownload,
                result.tcp_reverse.as_ref().and_then(|t| t.received_mbps),
            ),
            (Metric::UdpThroughput, result.udp.as_ref().and_then(|u| u.mbps)),
            (Metric::Jitter, result.udp.as_ref().and_then(|u| u.jitter_ms)),
        ]
    }
}

impl TryFrom<RawRecord> for MeasurementPoint {
    type Error = HeatmapError;

    fn try_from(record: RawRecord) -> HeatmapResult<Self> {
        let mut point = MeasurementPoint::new(record.x, record.y);
        for (metric, value) in record.metric_values() {
            if let Some(value) = value {
                point.values.insert(metric, value);
            }
        }

        for scan in record.result.iwscan {
            if !scan.frequency.is_finite() || scan.frequency < 0.0 {
                return Err(HeatmapError::Data(format!(
                    "scan of {} has invalid frequency {}",
                    scan.essid, scan.frequency
                )));
            }
            point.scans.push(ScanObservation::new(
                scan.essid,
                scan.frequency.round() as u64,
                scan.stats.quality,
            ));
        }

        Ok(point)
    }
}

/// Parses a JSON array of raw records into measurement points.
pub fn parse_records(json: &str) -> HeatmapResult<Vec<MeasurementPoint>> {
    let records: Vec<RawRecord> = serde_json::from_str(json)
        .map_err(|err| HeatmapError::Data(format!("malformed measurement records: {}", err)))?;
    records.into_iter().map(MeasurementPoint::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"[{
        "x": 12, "y": 34,
        "result": {
            "iwconfig": {"stats": {"level": -51.0, "quality": 59.0, "noise": 0}},
            "tcp": {"sent_Mbps": 88.5},
            "tcp-reverse": {"received_Mbps": 91.25},
            "udp": {"Mbps": 40.0, "jitter_ms": 0.75},
            "iwscan": [
                {"ESSID": "office", "Frequency": 2412000000, "stats": {"quality": 61}},
                {"ESSID": "guest", "Frequency": 5180000000.0, "stats": {"quality": 33}}
            ]
        }
    }]"#;

    #[test]
    fn parse_records_maps_every_metric_leaf() {
        let points = parse_records(RECORD).unwrap();
        assert_eq!(points.len(), 1);
        let point = &points[0];
        assert_eq!(point.position.x, 12.0);
        assert_eq!(point.value(Metric::Rssi), Some(-51.0));
        assert_eq!(point.value(Metric::Quality), Some(59.0));
        assert_eq!(point.value(Metric::TcpUpload), Some(88.5));
        assert_eq!(point.value(Metric::TcpDownload), Some(91.25));
        assert_eq!(point.value(Metric::UdpThroughput), Some(40.0));
        assert_eq!(point.value(Metric::Jitter), Some(0.75));
        assert_eq!(point.scans[1].frequency_hz, 5_180_000_000);
        assert_eq!(point.scans[0].ssid, "office");
    }

    #[test]
    fn missing_sections_leave_metrics_absent() {
        let json = r#"[{"x": 1, "y": 2, "result": {"udp": {"Mbps": 12.0}}}]"#;
        let points = parse_records(json).unwrap();
        assert_eq!(points[0].value(Metric::UdpThroughput), Some(12.0));
        assert_eq!(points[0].value(Metric::Jitter), None);
        assert_eq!(points[0].value(Metric::Rssi), None);
        assert!(points[0].scans.is_empty());
    }

    #[test]
    fn malformed_json_is_a_data_error() {
        let err = parse_records("{not json").unwrap_err();
        assert!(matches!(err, HeatmapError::Data(_)));
    }
}

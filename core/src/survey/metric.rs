use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed catalog of per-point metrics that get a heat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    Rssi,
    Quality,
    TcpUpload,
    TcpDownload,
    UdpThroughput,
    Jitter,
}

impl Metric {
    pub const COUNT: usize = 6;

    /// Catalog order; rendering passes run in this order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Rssi,
        Metric::Quality,
        Metric::TcpUpload,
        Metric::TcpDownload,
        Metric::UdpThroughput,
        Metric::Jitter,
    ];

    /// Stable key used in output file names.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Rssi => "rssi",
            Metric::Quality => "quality",
            Metric::TcpUpload => "tcp_upload_Mbps",
            Metric::TcpDownload => "tcp_download_Mbps",
            Metric::UdpThroughput => "udp_Mbps",
            Metric::Jitter => "jitter",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Rssi => "RSSI (level)",
            Metric::Quality => "iwstats Quality",
            Metric::TcpUpload => "TCP Upload Mbps",
            Metric::TcpDownload => "TCP Download Mbps",
            Metric::UdpThroughput => "UDP Upload Mbps",
            Metric::Jitter => "UDP Jitter (ms)",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Plot title for a survey, e.g. `"office - RSSI (level)"`.
    pub fn plot_title(self, survey_title: &str) -> String {
        format!("{} - {}", survey_title, self.title())
    }

    /// Deterministic output name, e.g. `"rssi_office.png"`.
    pub fn output_file_name(self, survey_title: &str) -> String {
        format!("{}_{}.png", self.key(), survey_title)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

use crate::survey::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const MHZ: u64 = 1_000_000;

/// Regulatory channel number and bandwidth for a centre frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiChannel {
    pub number: u16,
    pub bandwidth_mhz: u16,
}

/// Centre frequency (MHz) to `(channel, bandwidth MHz)`.
const CHANNEL_TABLE: &[(u64, u16, u16)] = &[
    (2412, 1, 20),
    (2417, 2, 20),
    (2422, 3, 20),
    (2427, 4, 20),
    (2432, 5, 20),
    (2437, 6, 20),
    (2442, 7, 20),
    (2447, 8, 20),
    (2452, 9, 20),
    (2457, 10, 20),
    (2462, 11, 20),
    (2467, 12, 20),
    (2472, 13, 20),
    (2484, 14, 20),
    (5160, 32, 20),
    (5170, 34, 40),
    (5180, 36, 20),
    (5190, 38, 40),
    (5200, 40, 20),
    (5210, 42, 80),
    (5220, 44, 20),
    (5230, 46, 40),
    (5240, 48, 20),
    (5250, 50, 160),
    (5260, 52, 20),
    (5270, 54, 40),
    (5280, 56, 20),
    (5290, 58, 80),
    (5300, 60, 20),
    (5310, 62, 40),
    (5320, 64, 20),
    (5340, 68, 20),
    (5480, 96, 20),
    (5500, 100, 20),
    (5510, 102, 40),
    (5520, 104, 20),
    (5530, 106, 80),
    (5540, 108, 20),
    (5550, 110, 40),
    (5560, 112, 20),
    (5570, 114, 160),
    (5580, 116, 20),
    (5590, 118, 40),
    (5600, 120, 20),
    (5610, 122, 80),
    (5620, 124, 20),
    (5630, 126, 40),
    (5640, 128, 20),
    (5660, 132, 20),
    (5670, 134, 40),
    (5680, 136, 20),
    (5690, 138, 80),
    (5700, 140, 20),
    (5710, 142, 40),
    (5720, 144, 20),
    (5745, 149, 20),
    (5755, 151, 40),
    (5765, 153, 20),
    (5775, 155, 80),
    (5785, 157, 20),
    (5795, 159, 40),
    (5805, 161, 20),
    (5825, 165, 20),
];

/// Exact-match lookup; only whole-MHz centre frequencies from the table resolve.
pub fn channel_for_frequency(frequency_hz: u64) -> Option<WifiChannel> {
    if frequency_hz % MHZ != 0 {
        return None;
    }
    let mhz = frequency_hz / MHZ;
    CHANNEL_TABLE
        .binary_search_by_key(&mhz, |&(freq, _, _)| freq)
        .ok()
        .map(|idx| {
            let (_, number, bandwidth_mhz) = CHANNEL_TABLE[idx];
            WifiChannel {
                number,
                bandwidth_mhz,
            }
        })
}

/// Mean scan quality observed at one centre frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelUsage {
    pub frequency_hz: u64,
    pub mean_quality: f64,
    pub observations: usize,
    pub channel: Option<WifiChannel>,
}

impl fmt::Display for ChannelUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mhz = self.frequency_hz as f64 / MHZ as f64;
        match self.channel {
            Some(ch) => write!(
                f,
                "{} MHz (channel {}, {} MHz wide): mean quality {:.2} over {} observations",
                mhz, ch.number, ch.bandwidth_mhz, self.mean_quality, self.observations
            ),
            None => write!(
                f,
                "{} MHz (unlisted): mean quality {:.2} over {} observations",
                mhz, self.mean_quality, self.observations
            ),
        }
    }
}

/// Mean quality per centre frequency across the whole survey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelAggregate {
    usage: BTreeMap<u64, ChannelUsage>,
}

impl ChannelAggregate {
    pub fn mean_quality(&self, frequency_hz: u64) -> Option<f64> {
        self.usage.get(&frequency_hz).map(|u| u.mean_quality)
    }

    pub fn get(&self, frequency_hz: u64) -> Option<&ChannelUsage> {
        self.usage.get(&frequency_hz)
    }

    /// Entries in ascending frequency order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelUsage> {
        self.usage.values()
    }

    pub fn is_empty(&self) -> bool {
        self.usage.is_empty()
    }

    pub fn unlisted(&self) -> impl Iterator<Item = &ChannelUsage> {
        self.usage.values().filter(|u| u.channel.is_none())
    }
}

pub struct ChannelAggregator;

impl ChannelAggregator {
    /// Buckets every non-excluded scan observation by frequency and averages quality.
    pub fn aggregate(dataset: &Dataset, excluded_ssids: &BTreeSet<String>) -> ChannelAggregate {
        let mut buckets: BTreeMap<u64, (f64, usize)> = BTreeMap::new();
        for point in dataset.points() {
            for scan in &point.scans {
                if excluded_ssids.contains(&scan.ssid) {
                    continue;
                }
                let bucket = buckets.entry(scan.frequency_hz).or_insert((0.0, 0));
                bucket.0 += scan.quality;
                bucket.1 += 1;
            }
        }

        let usage = buckets
            .into_iter()
            .map(|(frequency_hz, (sum, count))| {
                let usage = ChannelUsage {
                    frequency_hz,
                    mean_quality: sum / count as f64,
                    observations: count,
                    channel: channel_for_frequency(frequency_hz),
                };
                (frequency_hz, usage)
            })
            .collect();

        ChannelAggregate { usage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{MeasurementPoint, ScanObservation};

    const CH1: u64 = 2_412_000_000;

    fn two_point_survey() -> Dataset {
        let points = vec![
            MeasurementPoint::new(10.0, 10.0).with_scan(ScanObservation::new("home", CH1, 50.0)),
            MeasurementPoint::new(20.0, 20.0)
                .with_scan(ScanObservation::new("neighbour", CH1, 70.0)),
        ];
        Dataset::new(points, 100, 100).unwrap()
    }

    fn excluded(ssids: &[&str]) -> BTreeSet<String> {
        ssids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mean_quality_spans_all_points() {
        let aggregate = ChannelAggregator::aggregate(&two_point_survey(), &BTreeSet::new());
        assert_eq!(aggregate.mean_quality(CH1), Some(60.0));
        assert_eq!(aggregate.get(CH1).unwrap().observations, 2);
    }

    #[test]
    fn excluded_ssids_are_dropped_from_the_mean() {
        let survey = two_point_survey();
        let without_home = ChannelAggregator::aggregate(&survey, &excluded(&["home"]));
        assert_eq!(without_home.mean_quality(CH1), Some(70.0));
        let without_neighbour = ChannelAggregator::aggregate(&survey, &excluded(&["neighbour"]));
        assert_eq!(without_neighbour.mean_quality(CH1), Some(50.0));
        let without_both = ChannelAggregator::aggregate(&survey, &excluded(&["home", "neighbour"]));
        assert!(without_both.is_empty());
    }

    #[test]
    fn known_frequencies_carry_channel_labels() {
        assert_eq!(
            channel_for_frequency(CH1),
            Some(WifiChannel {
                number: 1,
                bandwidth_mhz: 20
            })
        );
        assert_eq!(channel_for_frequency(5_250_000_000).unwrap().bandwidth_mhz, 160);
        assert_eq!(channel_for_frequency(5_825_000_000).unwrap().number, 165);
    }

    #[test]
    fn unknown_frequencies_are_reported_as_unlisted() {
        assert_eq!(channel_for_frequency(5_955_000_000), None);
        assert_eq!(channel_for_frequency(2_412_500_000), None);

        let points = vec![MeasurementPoint::new(1.0, 1.0)
            .with_scan(ScanObservation::new("six", 5_955_000_000, 40.0))
            .with_scan(ScanObservation::new("one", CH1, 80.0))];
        let dataset = Dataset::new(points, 10, 10).unwrap();
        let aggregate = ChannelAggregator::aggregate(&dataset, &BTreeSet::new());
        let unlisted: Vec<_> = aggregate.unlisted().collect();
        assert_eq!(unlisted.len(), 1);
        assert_eq!(unlisted[0].frequency_hz, 5_955_000_000);
        assert!(unlisted[0].to_string().contains("unlisted"));
    }

    #[test]
    fn channel_table_is_sorted_for_lookup() {
        assert!(CHANNEL_TABLE.windows(2).all(|w| w[0].0 < w[1].0));
    }
}

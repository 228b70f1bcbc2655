pub mod aggregate;
pub mod channels;
pub mod grid;
pub mod interpolate;

pub use aggregate::{DataAggregator, MetricColumn, MetricTable};
pub use channels::{channel_for_frequency, ChannelAggregate, ChannelAggregator, ChannelUsage};
pub use grid::{GridField, GridSampler, GridSpec};
pub use interpolate::RbfInterpolator;

pub mod colormap;
pub mod compose;

pub use colormap::{ColorMapper, DivergingPalette, Normalizer};
pub use compose::{PlotLayout, Renderer};

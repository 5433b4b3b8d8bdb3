pub mod colors;
pub mod figure;
pub mod interval;
pub mod layout;
pub mod legend;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod svg;
pub mod units;
pub mod views;

pub use figure::{Figure, FigureError, merge_figures, plot_one_cen, write_outputs};
pub use layout::{Layout, LayoutError, XBounds};
pub use model::{PlotSettings, Track, TrackList, TrackPosition, TrackType};
pub use parsers::tracks::{ConfigError, TrackConfig, read_tracks};

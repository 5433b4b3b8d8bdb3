pub mod data;
pub mod options;
pub mod settings;
pub mod track;

pub use data::{
    BandRecord, BedRecord, HorMode, HorRecord, IdentityDiamond, IdentityRecord, LabelRecord, Mer,
    StrandBlock, Strand, TrackData, ValueRecord,
};
pub use options::{
    BarSettings, BaseSettings, HorOrtSettings, HorSettings, LabelSettings, LabelShape,
    LegendSettings, LinePosition, LineSettings, LocalSelfIdentSettings, OptionsError,
    SelfIdentSettings, SortOrder, StrandSettings, TrackOptions,
};
pub use settings::{LegendPosition, OutputFormat, PlotSettings};
pub use track::{Track, TrackError, TrackList, TrackPosition, TrackType, fill_placeholder};

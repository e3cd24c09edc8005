//! Plugin records, query filters and display labels

pub mod filter;
pub mod label;
pub mod plugin;

pub use filter::{PluginFilter, PluginQuery, ALL_PER_PAGE, DEFAULT_PER_PAGE};
pub use label::{all_labels, derive_labels, Label, LabelKind, ALL_LABELS};
pub use plugin::{
    plugins_from_reader, plugins_from_slice, AuthorType, HostingRestriction, Manifest,
    PlatformArtifact, Plugin, ReleaseStage,
};

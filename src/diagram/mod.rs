//! Graph core of the diagram explorer: the materialized graph, the two-axis
//! visibility policy, fragment merging and the gestures that drive them.

pub mod api;
mod error;
mod explorer;
mod graph;
mod menu;
mod merge;
mod settings;
pub mod storage;
mod types;
mod visibility;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::DiagramError;
pub use explorer::Explorer;
pub use graph::ElementData;
pub use menu::{MenuAction, Point, Size};
pub use settings::DiagramSettings;
pub use types::{EdgeFields, GraphData, NodeFields};
pub use visibility::Group;

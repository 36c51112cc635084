//! Sample classified raster time series and reshape the samples into Sankey
//! node/link parameters describing land-cover transitions between periods.
//!
//! Data flow:
//!   Sampler → SampleTable → FilterState → aggregate → index → resolve → SankeyPlot

pub mod catalog;
pub mod config;
pub mod coords;
pub mod datasets;
pub mod error;
pub mod filter;
pub mod labels;
pub mod nodes;
pub mod pipeline;
pub mod plot;
pub mod raster;
pub mod sampling;
pub mod table;
pub mod theme;
pub mod transition;

pub use catalog::{check_compatible, ClassCatalog, ClassMerge};
pub use config::SankifyConfig;
pub use coords::{LatLon, Region};
pub use datasets::{Dataset, DatasetImages};
pub use error::{CompatibilityError, ConfigurationError, SamplingError, SankeeError, SankeeResult};
pub use filter::FilterState;
pub use labels::{describe, LabelType, NodeEntry};
pub use nodes::{index, IndexedEdge, NodeIndex, NodeKey};
pub use pipeline::{sankify, sankify_dataset};
pub use plot::{Diagram, Link, SankeyParameters, SankeyPlot};
pub use sampling::{PixelService, SampleRequest, Sampler, ServiceError};
pub use table::{ClassCode, MissingPolicy, SampleTable};
pub use theme::Theme;
pub use transition::{aggregate, TransitionEdge};

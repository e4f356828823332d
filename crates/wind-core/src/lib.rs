//! Core wind-overlay logic shared by the builder service.
//!
//! Everything here is pure computation plus two small collaborator traits:
//! network retrieval and GRIB decoding live in the service crate, behind
//! [`pipeline::GribFetch`] and [`pipeline::GribDecode`].

pub mod error;
pub mod extract;
pub mod field;
pub mod grid;
pub mod level;
pub mod output;
pub mod pipeline;
pub mod region;
pub mod resolve;

pub use error::{WindError, WindResult};
pub use field::{GridAxes, LonConvention, VerticalAxis, WindField};
pub use grid::{sample_grid, SamplePoint};
pub use level::{LevelKind, LevelSpec};
pub use output::{LevelMeta, LevelOutput, VectorSample};
pub use pipeline::{
    run_day, GribDecode, GribFetch, LevelPipeline, PipelineConfig, RetrievalRequest,
};
pub use region::RegionOfInterest;
pub use resolve::{resolve, ForecastCandidate, ResolvedForecast};

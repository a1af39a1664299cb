//! sarburst: burst-level geometry for Sentinel-1 TOPS SLC images
//!
//! Removes the overlapping and invalid lines between bursts (deburst), cuts single
//! bursts out of a sub-swath, and stitches extracted bursts back together, while keeping
//! the output size, origin and sensor-model metadata consistent with the kept pixels.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BurstSelection, ImagePoint, ImageRegion, ImageSize, InputImageInfo, Keywordlist,
    LineSampleRecord, SarComplex, SarError, SarImage, SarResult, SubImageOrigin, TileLayout,
};

pub use io::{SarSensorModel, StaticSensorModel};
pub use crate::core::pipeline::{execute, execute_regions, plan, ExecutionPlan, PipelineConfig};

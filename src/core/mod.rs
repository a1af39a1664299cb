//! Core burst-handling modules

pub mod coordinate_mapper;
pub mod geometry_resolver;
pub mod layout;
pub mod region;
pub mod copy_engine;
pub mod deburst;
pub mod burst_extraction;
pub mod concatenate;
pub mod metadata;
pub mod pipeline;

// Re-export main types
pub use coordinate_mapper::CoordinateMapper;
pub use geometry_resolver::{GeometryResolver, Resolution, ResolvedGeometry};
pub use layout::{CheckedInput, OutputLayout, OutputLayoutPlanner, Plan, PlanKind};
pub use region::{InputRequest, RegionTranslator};
pub use copy_engine::{InputTile, PixelCopyEngine};
pub use metadata::{MetadataSynchronizer, OutputMetadata};
pub use pipeline::{ExecutionPlan, PipelineConfig};

//! Sensor model access and keyword-list text form

pub mod sensor_model;
pub mod keywords;

pub use sensor_model::{
    BurstGeometry, BurstRecord, ConcatenateGeometry, DeburstGeometry, GroundControlPoint,
    RangeTiming, SarSensorModel, StaticSensorModel, TileGeometry,
};
pub use keywords::{format_keywords, parse_keywords};

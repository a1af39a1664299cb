use crate::core::coordinate_mapper::CoordinateMapper;
use crate::io::sensor_model::{BurstGeometry, ConcatenateGeometry, DeburstGeometry, SarSensorModel};
use crate::types::{BurstSelection, Keywordlist, LineSampleRecord, SarError, SarResult};

/// Geometry answered by the sensor model for one selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedGeometry {
    Deburst(DeburstGeometry),
    BurstExtraction(BurstGeometry),
    Concatenate(ConcatenateGeometry),
}

/// Validated geometry plus the sensor model's updated metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub geometry: ResolvedGeometry,
    pub persisted: Keywordlist,
}

/// Boundary to the external sensor model.
///
/// Requests line/sample records for a [`BurstSelection`] and validates them before they
/// reach the planner. Nothing is retried: the model answers the same way every time.
pub struct GeometryResolver {
    model: Option<Box<dyn SarSensorModel>>,
}

impl GeometryResolver {
    pub fn new(model: Box<dyn SarSensorModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Resolver for an input whose sensor model could not be loaded (or may be absent)
    pub fn from_optional(model: Option<Box<dyn SarSensorModel>>) -> Self {
        Self { model }
    }

    fn model_mut(&mut self) -> SarResult<&mut (dyn SarSensorModel + 'static)> {
        self.model.as_deref_mut().ok_or_else(|| {
            SarError::InvalidSensorModel("Input image carries no usable SAR sensor model".to_string())
        })
    }

    /// Ask the sensor model for the records of `selection`
    pub fn resolve(&mut self, selection: &BurstSelection) -> SarResult<Resolution> {
        let model = self.model_mut()?;

        let geometry = match *selection {
            BurstSelection::Deburst { only_valid_samples } => {
                let mut geometry = model.resolve_deburst(only_valid_samples).ok_or_else(|| {
                    SarError::GeometryResolution("Sensor model failed to compute deburst lines".to_string())
                })?;
                if !only_valid_samples {
                    geometry.sample_record = None;
                }
                validate_deburst(&geometry, only_valid_samples)?;
                log::info!(
                    "Resolved deburst geometry: {} line records, {} kept lines",
                    geometry.line_records.len(),
                    CoordinateMapper::kept_length(&geometry.line_records)
                );
                ResolvedGeometry::Deburst(geometry)
            }
            BurstSelection::BurstExtraction {
                burst_index,
                all_pixels,
            } => {
                let count = model.burst_count();
                if burst_index >= count {
                    return Err(SarError::GeometryResolution(format!(
                        "Burst index {} out of range, sensor model has {} bursts",
                        burst_index, count
                    )));
                }
                let geometry = model
                    .resolve_burst_extraction(burst_index, all_pixels)
                    .ok_or_else(|| {
                        SarError::GeometryResolution(format!(
                            "Sensor model failed to extract burst {}",
                            burst_index
                        ))
                    })?;
                check_record(&geometry.line_record, "burst line")?;
                check_record(&geometry.sample_record, "burst sample")?;
                log::info!(
                    "Resolved burst {}: lines {}, samples {}",
                    burst_index,
                    geometry.line_record,
                    geometry.sample_record
                );
                ResolvedGeometry::BurstExtraction(geometry)
            }
            BurstSelection::Concatenate {
                first_burst_index,
                input_has_invalid_pixels,
                ..
            } => {
                let geometry = model
                    .resolve_deburst_and_concatenate(first_burst_index, input_has_invalid_pixels)
                    .ok_or_else(|| {
                        SarError::GeometryResolution(
                            "Sensor model failed to compute concatenation geometry".to_string(),
                        )
                    })?;
                if geometry.tiles.is_empty() {
                    return Err(SarError::EmptyGeometry(
                        "Sensor model returned no tile records for concatenation".to_string(),
                    ));
                }
                for tile in &geometry.tiles {
                    check_record(&tile.line_record, "tile line")?;
                    check_record(&tile.sample_record, "tile sample")?;
                }
                log::info!(
                    "Resolved concatenation geometry: {} tiles, vertical offset {}",
                    geometry.tiles.len(),
                    geometry.vertical_offset
                );
                ResolvedGeometry::Concatenate(geometry)
            }
        };

        Ok(Resolution {
            geometry,
            persisted: model.persist_geometry(),
        })
    }

    /// Extract every burst in turn, `0..burst_count`
    pub fn resolve_all_burst_extractions(&mut self, all_pixels: bool) -> SarResult<Vec<Resolution>> {
        let count = self.model_mut()?.burst_count();
        if count == 0 {
            return Err(SarError::EmptyGeometry("Sensor model has no bursts".to_string()));
        }

        (0..count)
            .map(|burst_index| {
                self.resolve(&BurstSelection::BurstExtraction {
                    burst_index,
                    all_pixels,
                })
            })
            .collect()
    }
}

fn check_record(record: &LineSampleRecord, what: &str) -> SarResult<()> {
    LineSampleRecord::new(record.first, record.last)
        .map(|_| ())
        .map_err(|e| SarError::GeometryResolution(format!("Invalid {} record: {}", what, e)))
}

fn validate_deburst(geometry: &DeburstGeometry, only_valid_samples: bool) -> SarResult<()> {
    if geometry.line_records.is_empty() {
        return Err(SarError::EmptyGeometry(
            "Sensor model returned no kept line ranges".to_string(),
        ));
    }
    for record in &geometry.line_records {
        check_record(record, "deburst line")?;
    }
    CoordinateMapper::validate(&geometry.line_records)?;

    match geometry.sample_record {
        Some(record) => check_record(&record, "deburst sample"),
        None if only_valid_samples => Err(SarError::EmptyGeometry(
            "Valid samples requested but the sensor model returned no sample range".to_string(),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sensor_model::TileGeometry;

    /// Sensor model answering with fixed geometry
    struct FixedModel {
        deburst: Option<DeburstGeometry>,
        burst: Option<BurstGeometry>,
        concatenation: Option<ConcatenateGeometry>,
        bursts: usize,
    }

    impl SarSensorModel for FixedModel {
        fn burst_count(&self) -> usize {
            self.bursts
        }

        fn resolve_deburst(&mut self, _only_valid_samples: bool) -> Option<DeburstGeometry> {
            self.deburst.clone()
        }

        fn resolve_burst_extraction(&mut self, _burst_index: usize, _all_pixels: bool) -> Option<BurstGeometry> {
            self.burst
        }

        fn resolve_deburst_and_concatenate(
            &mut self,
            _first_burst_index: usize,
            _input_has_invalid_pixels: bool,
        ) -> Option<ConcatenateGeometry> {
            self.concatenation.clone()
        }

        fn persist_geometry(&self) -> Keywordlist {
            Keywordlist::new()
        }
    }

    fn record(first: usize, last: usize) -> LineSampleRecord {
        LineSampleRecord { first, last }
    }

    fn fixed(deburst: Option<DeburstGeometry>) -> FixedModel {
        FixedModel {
            deburst,
            burst: Some(BurstGeometry {
                line_record: record(50, 149),
                sample_record: record(5, 104),
            }),
            concatenation: Some(ConcatenateGeometry {
                tiles: vec![],
                vertical_offset: 0,
            }),
            bursts: 3,
        }
    }

    #[test]
    fn test_missing_model() {
        let mut resolver = GeometryResolver::from_optional(None);
        let result = resolver.resolve(&BurstSelection::Deburst {
            only_valid_samples: false,
        });
        assert!(matches!(result, Err(SarError::InvalidSensorModel(_))));
    }

    #[test]
    fn test_model_failure() {
        let mut resolver = GeometryResolver::new(Box::new(fixed(None)));
        let result = resolver.resolve(&BurstSelection::Deburst {
            only_valid_samples: false,
        });
        assert!(matches!(result, Err(SarError::GeometryResolution(_))));
    }

    #[test]
    fn test_empty_geometry() {
        let mut resolver = GeometryResolver::new(Box::new(fixed(Some(DeburstGeometry {
            line_records: vec![],
            sample_record: None,
        }))));
        let result = resolver.resolve(&BurstSelection::Deburst {
            only_valid_samples: false,
        });
        assert!(matches!(result, Err(SarError::EmptyGeometry(_))));

        let concatenation = resolver.resolve(&BurstSelection::Concatenate {
            first_burst_index: 0,
            input_has_invalid_pixels: true,
            layout: crate::types::TileLayout::vertical(2),
        });
        assert!(matches!(concatenation, Err(SarError::EmptyGeometry(_))));
    }

    #[test]
    fn test_valid_samples_required() {
        let mut resolver = GeometryResolver::new(Box::new(fixed(Some(DeburstGeometry {
            line_records: vec![record(10, 200)],
            sample_record: None,
        }))));
        let result = resolver.resolve(&BurstSelection::Deburst {
            only_valid_samples: true,
        });
        assert!(matches!(result, Err(SarError::EmptyGeometry(_))));
    }

    #[test]
    fn test_overlapping_records_rejected() {
        let mut resolver = GeometryResolver::new(Box::new(fixed(Some(DeburstGeometry {
            line_records: vec![record(10, 200), record(150, 300)],
            sample_record: None,
        }))));
        let result = resolver.resolve(&BurstSelection::Deburst {
            only_valid_samples: false,
        });
        assert!(matches!(result, Err(SarError::GeometryResolution(_))));
    }

    #[test]
    fn test_sample_record_dropped_without_filtering() {
        let mut resolver = GeometryResolver::new(Box::new(fixed(Some(DeburstGeometry {
            line_records: vec![record(10, 200), record(250, 480)],
            sample_record: Some(record(3, 90)),
        }))));
        let resolution = resolver
            .resolve(&BurstSelection::Deburst {
                only_valid_samples: false,
            })
            .unwrap();
        match resolution.geometry {
            ResolvedGeometry::Deburst(geometry) => assert_eq!(geometry.sample_record, None),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_burst_index_checked() {
        let mut resolver = GeometryResolver::new(Box::new(fixed(None)));
        let result = resolver.resolve(&BurstSelection::BurstExtraction {
            burst_index: 3,
            all_pixels: false,
        });
        assert!(matches!(result, Err(SarError::GeometryResolution(_))));
    }

    #[test]
    fn test_all_bursts() {
        let mut resolver = GeometryResolver::new(Box::new(fixed(None)));
        let resolutions = resolver.resolve_all_burst_extractions(false).unwrap();
        assert_eq!(resolutions.len(), 3);
        assert!(resolutions
            .iter()
            .all(|r| matches!(r.geometry, ResolvedGeometry::BurstExtraction(_))));
    }

    #[test]
    fn test_inverted_tile_rejected() {
        let mut model = fixed(None);
        model.concatenation = Some(ConcatenateGeometry {
            tiles: vec![TileGeometry {
                line_record: record(20, 10),
                sample_record: record(0, 9),
            }],
            vertical_offset: 0,
        });
        let mut resolver = GeometryResolver::new(Box::new(model));
        let result = resolver.resolve(&BurstSelection::Concatenate {
            first_burst_index: 0,
            input_has_invalid_pixels: true,
            layout: crate::types::TileLayout::vertical(1),
        });
        assert!(matches!(result, Err(SarError::GeometryResolution(_))));
    }
}

use crate::core::coordinate_mapper::CoordinateMapper;
use crate::types::{Keywordlist, LineSampleRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Kept lines (and optionally samples) for a deburst of the whole sub-swath
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeburstGeometry {
    pub line_records: Vec<LineSampleRecord>,
    /// Present only when valid samples were requested
    pub sample_record: Option<LineSampleRecord>,
}

/// Line and sample window of a single burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstGeometry {
    pub line_record: LineSampleRecord,
    pub sample_record: LineSampleRecord,
}

/// Kept window of one already-extracted burst tile, in that tile's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGeometry {
    pub line_record: LineSampleRecord,
    pub sample_record: LineSampleRecord,
}

/// Per-tile kept windows plus the vertical offset of the first tile in deburst space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatenateGeometry {
    pub tiles: Vec<TileGeometry>,
    pub vertical_offset: usize,
}

/// Capability interface of the SAR sensor model.
///
/// The model owns burst timing and ground control points. Each `resolve_*` call answers
/// one geometry question and updates the model's own geometry accordingly; `None` means
/// the model could not answer. [`SarSensorModel::persist_geometry`] returns the updated
/// geometry as keywords to be written onto the output image.
pub trait SarSensorModel {
    /// Number of bursts in the sub-swath
    fn burst_count(&self) -> usize;

    fn resolve_deburst(&mut self, only_valid_samples: bool) -> Option<DeburstGeometry>;

    fn resolve_burst_extraction(&mut self, burst_index: usize, all_pixels: bool) -> Option<BurstGeometry>;

    fn resolve_deburst_and_concatenate(
        &mut self,
        first_burst_index: usize,
        input_has_invalid_pixels: bool,
    ) -> Option<ConcatenateGeometry>;

    fn persist_geometry(&self) -> Keywordlist;
}

/// One burst as described by the product annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurstRecord {
    pub azimuth_start_time: DateTime<Utc>,
    pub azimuth_stop_time: DateTime<Utc>,
    /// Seconds between the ascending node crossing and the burst start
    pub azimuth_anx_time: f64,
    /// Valid lines and samples of the burst
    pub valid: BurstGeometry,
    /// Whole burst block, invalid filler lines and samples included
    pub full: BurstGeometry,
}

/// Ground control point tying an image position to a ground position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundControlPoint {
    pub line: f64,
    pub sample: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
enum LastResolution {
    Deburst {
        lines: Vec<LineSampleRecord>,
        samples: Option<LineSampleRecord>,
    },
    Burst {
        index: usize,
        geometry: BurstGeometry,
    },
    Concatenate {
        first_burst_index: usize,
        tile_count: usize,
        vertical_offset: usize,
        kept_lines: usize,
        kept_samples: usize,
        /// Sub-swath sample of the first kept column
        first_sample: usize,
        samples: Option<LineSampleRecord>,
    },
}

impl LastResolution {
    /// Sub-swath sample at which the resolved output starts
    fn first_sample(&self) -> usize {
        match self {
            LastResolution::Deburst { samples, .. } => samples.map(|s| s.first).unwrap_or(0),
            LastResolution::Burst { geometry, .. } => geometry.sample_record.first,
            LastResolution::Concatenate { first_sample, .. } => *first_sample,
        }
    }
}

/// Slant-range timing of the first image column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeTiming {
    /// Two-way slant-range time of sample 0, in seconds
    pub near_range_time: f64,
    /// Range sampling rate, in Hz
    pub range_sampling_rate: f64,
}

/// Sensor model holding precomputed burst geometry in memory.
///
/// Deburst and concatenation windows come from the product's processing chain; this
/// model only serves them and keeps its burst records and GCPs consistent afterwards.
#[derive(Debug, Clone, Default)]
pub struct StaticSensorModel {
    bursts: Vec<BurstRecord>,
    deburst_lines: Vec<LineSampleRecord>,
    deburst_valid_samples: Option<LineSampleRecord>,
    /// Per burst, relative to the whole burst block
    concatenation_tiles: Vec<TileGeometry>,
    gcps: Vec<GroundControlPoint>,
    range_timing: Option<RangeTiming>,
    resolved: Option<LastResolution>,
}

impl StaticSensorModel {
    pub fn new(bursts: Vec<BurstRecord>) -> Self {
        Self {
            bursts,
            ..Self::default()
        }
    }

    pub fn with_deburst(
        mut self,
        line_records: Vec<LineSampleRecord>,
        valid_samples: Option<LineSampleRecord>,
    ) -> Self {
        self.deburst_lines = line_records;
        self.deburst_valid_samples = valid_samples;
        self
    }

    pub fn with_concatenation(mut self, tiles: Vec<TileGeometry>) -> Self {
        self.concatenation_tiles = tiles;
        self
    }

    pub fn with_gcps(mut self, gcps: Vec<GroundControlPoint>) -> Self {
        self.gcps = gcps;
        self
    }

    pub fn with_range_timing(mut self, timing: RangeTiming) -> Self {
        self.range_timing = Some(timing);
        self
    }

    /// Near-range time of the first kept column after the last resolution
    fn near_range_time(&self, timing: &RangeTiming) -> f64 {
        let first_sample = self.resolved.as_ref().map(LastResolution::first_sample).unwrap_or(0);
        if first_sample == 0 || timing.range_sampling_rate <= 0.0 {
            return timing.near_range_time;
        }
        timing.near_range_time + first_sample as f64 / timing.range_sampling_rate
    }

    /// GCPs expressed in the geometry of the last resolution
    fn relocated_gcps(&self) -> Vec<GroundControlPoint> {
        let Some(resolved) = &self.resolved else {
            return self.gcps.clone();
        };

        self.gcps
            .iter()
            .filter_map(|gcp| {
                let line = (gcp.line + 0.5).floor();
                let sample = (gcp.sample + 0.5).floor();
                if line < 0.0 || sample < 0.0 {
                    return None;
                }
                let line_fraction = gcp.line - line;
                let sample_fraction = gcp.sample - sample;
                let (line, sample) = (line as usize, sample as usize);

                let (new_line, new_sample) = match resolved {
                    LastResolution::Deburst { lines, samples } => {
                        let new_line = CoordinateMapper::global_to_local(lines, line).ok()?;
                        (new_line, relocate_sample(*samples, sample)?)
                    }
                    LastResolution::Burst { geometry, .. } => {
                        if !geometry.line_record.contains(line) {
                            return None;
                        }
                        let new_sample = relocate_sample(Some(geometry.sample_record), sample)?;
                        (line - geometry.line_record.first, new_sample)
                    }
                    LastResolution::Concatenate {
                        vertical_offset,
                        kept_lines,
                        samples,
                        ..
                    } => {
                        // Deburst line space, shifted to the first concatenated burst
                        let deburst_line =
                            CoordinateMapper::global_to_local(&self.deburst_lines, line).ok()?;
                        let new_line = deburst_line.checked_sub(*vertical_offset)?;
                        if new_line >= *kept_lines {
                            return None;
                        }
                        (new_line, relocate_sample(*samples, sample)?)
                    }
                };

                Some(GroundControlPoint {
                    line: new_line as f64 + line_fraction,
                    sample: new_sample as f64 + sample_fraction,
                    ..gcp.clone()
                })
            })
            .collect()
    }
}

fn relocate_sample(samples: Option<LineSampleRecord>, sample: usize) -> Option<usize> {
    match samples {
        Some(record) if record.contains(sample) => Some(sample - record.first),
        Some(_) => None,
        None => Some(sample),
    }
}

/// Express `record` relative to a window starting at `window_first`.
///
/// A record starting before the window cannot be expressed and gives `None`.
fn shift_into_window(record: LineSampleRecord, window_first: usize) -> Option<LineSampleRecord> {
    Some(LineSampleRecord {
        first: record.first.checked_sub(window_first)?,
        last: record.last.checked_sub(window_first)?,
    })
}

impl SarSensorModel for StaticSensorModel {
    fn burst_count(&self) -> usize {
        self.bursts.len()
    }

    fn resolve_deburst(&mut self, only_valid_samples: bool) -> Option<DeburstGeometry> {
        if self.deburst_lines.is_empty() {
            return None;
        }
        let sample_record = if only_valid_samples {
            Some(self.deburst_valid_samples?)
        } else {
            None
        };

        self.resolved = Some(LastResolution::Deburst {
            lines: self.deburst_lines.clone(),
            samples: sample_record,
        });
        Some(DeburstGeometry {
            line_records: self.deburst_lines.clone(),
            sample_record,
        })
    }

    fn resolve_burst_extraction(&mut self, burst_index: usize, all_pixels: bool) -> Option<BurstGeometry> {
        let burst = self.bursts.get(burst_index)?;
        let geometry = if all_pixels { burst.full } else { burst.valid };

        self.resolved = Some(LastResolution::Burst {
            index: burst_index,
            geometry,
        });
        Some(geometry)
    }

    fn resolve_deburst_and_concatenate(
        &mut self,
        first_burst_index: usize,
        input_has_invalid_pixels: bool,
    ) -> Option<ConcatenateGeometry> {
        if first_burst_index >= self.concatenation_tiles.len()
            || self.concatenation_tiles.len() != self.bursts.len()
        {
            return None;
        }

        let vertical_offset: usize = self.concatenation_tiles[..first_burst_index]
            .iter()
            .map(|tile| tile.line_record.len())
            .sum();

        let mut tiles = Vec::with_capacity(self.concatenation_tiles.len() - first_burst_index);
        for (tile, burst) in self.concatenation_tiles[first_burst_index..]
            .iter()
            .zip(&self.bursts[first_burst_index..])
        {
            if input_has_invalid_pixels {
                tiles.push(*tile);
            } else {
                // Tiles were extracted with valid pixels only: rebase onto the valid window
                let line_origin = burst
                    .valid
                    .line_record
                    .first
                    .checked_sub(burst.full.line_record.first)?;
                let sample_origin = burst
                    .valid
                    .sample_record
                    .first
                    .checked_sub(burst.full.sample_record.first)?;
                tiles.push(TileGeometry {
                    line_record: shift_into_window(tile.line_record, line_origin)?,
                    sample_record: shift_into_window(tile.sample_record, sample_origin)?,
                });
            }
        }

        self.resolved = Some(LastResolution::Concatenate {
            first_burst_index,
            tile_count: tiles.len(),
            vertical_offset,
            kept_lines: tiles.iter().map(|tile| tile.line_record.len()).sum(),
            kept_samples: tiles.first().map(|tile| tile.sample_record.len()).unwrap_or(0),
            first_sample: self.bursts[first_burst_index].full.sample_record.first
                + self.concatenation_tiles[first_burst_index].sample_record.first,
            samples: self.deburst_valid_samples,
        });
        Some(ConcatenateGeometry {
            tiles,
            vertical_offset,
        })
    }

    fn persist_geometry(&self) -> Keywordlist {
        let mut kwl = Keywordlist::new();

        let (records, first_time, last_time) = match &self.resolved {
            None => {
                let records: Vec<(BurstGeometry, &BurstRecord)> =
                    self.bursts.iter().map(|burst| (burst.valid, burst)).collect();
                let first = self.bursts.first().map(|b| b.azimuth_start_time);
                let last = self.bursts.last().map(|b| b.azimuth_stop_time);
                (records, first, last)
            }
            Some(LastResolution::Deburst { lines, samples }) => {
                let kept = CoordinateMapper::kept_length(lines);
                let (Some(first_burst), Some(last_burst)) = (self.bursts.first(), self.bursts.last())
                else {
                    return kwl;
                };
                let sample_count = samples
                    .map(|s| s.len())
                    .unwrap_or(first_burst.full.sample_record.len());
                (
                    vec![(rebased_geometry(kept, sample_count), first_burst)],
                    Some(first_burst.azimuth_start_time),
                    Some(last_burst.azimuth_stop_time),
                )
            }
            Some(LastResolution::Burst { index, geometry }) => {
                let burst = &self.bursts[*index];
                let rebased = rebased_geometry(geometry.line_record.len(), geometry.sample_record.len());
                (
                    vec![(rebased, burst)],
                    Some(burst.azimuth_start_time),
                    Some(burst.azimuth_stop_time),
                )
            }
            Some(LastResolution::Concatenate {
                first_burst_index,
                tile_count,
                kept_lines,
                kept_samples,
                ..
            }) => {
                let first_burst = &self.bursts[*first_burst_index];
                let last_burst = &self.bursts[first_burst_index + tile_count - 1];
                (
                    vec![(rebased_geometry(*kept_lines, *kept_samples), first_burst)],
                    Some(first_burst.azimuth_start_time),
                    Some(last_burst.azimuth_stop_time),
                )
            }
        };

        kwl.insert(BURST_COUNT_KEY.to_string(), records.len().to_string());
        for (i, (geometry, burst)) in records.iter().enumerate() {
            let prefix = format!("support_data.geom.bursts.burst[{}]", i);
            kwl.insert(format!("{}.start_line", prefix), geometry.line_record.first.to_string());
            kwl.insert(format!("{}.end_line", prefix), geometry.line_record.last.to_string());
            kwl.insert(format!("{}.start_sample", prefix), geometry.sample_record.first.to_string());
            kwl.insert(format!("{}.end_sample", prefix), geometry.sample_record.last.to_string());
            kwl.insert(
                format!("{}.azimuth_start_time", prefix),
                format_time(&burst.azimuth_start_time),
            );
            kwl.insert(
                format!("{}.azimuth_stop_time", prefix),
                format_time(&burst.azimuth_stop_time),
            );
            kwl.insert(
                format!("{}.azimuth_anx_time", prefix),
                burst.azimuth_anx_time.to_string(),
            );
        }
        if let Some(time) = first_time {
            kwl.insert(FIRST_LINE_TIME_KEY.to_string(), format_time(&time));
        }
        if let Some(time) = last_time {
            kwl.insert(LAST_LINE_TIME_KEY.to_string(), format_time(&time));
        }

        if let Some(timing) = &self.range_timing {
            kwl.insert(NEAR_RANGE_TIME_KEY.to_string(), self.near_range_time(timing).to_string());
            kwl.insert(
                RANGE_SAMPLING_RATE_KEY.to_string(),
                timing.range_sampling_rate.to_string(),
            );
        }

        let gcps = self.relocated_gcps();
        kwl.insert(GCP_COUNT_KEY.to_string(), gcps.len().to_string());
        for (i, gcp) in gcps.iter().enumerate() {
            let prefix = format!("support_data.geom.gcp[{}]", i);
            kwl.insert(format!("{}.im_pt.x", prefix), gcp.sample.to_string());
            kwl.insert(format!("{}.im_pt.y", prefix), gcp.line.to_string());
            kwl.insert(format!("{}.world_pt.lon", prefix), gcp.longitude.to_string());
            kwl.insert(format!("{}.world_pt.lat", prefix), gcp.latitude.to_string());
            kwl.insert(format!("{}.world_pt.hgt", prefix), gcp.height.to_string());
        }

        kwl
    }
}

pub const BURST_COUNT_KEY: &str = "support_data.geom.bursts.number";
pub const GCP_COUNT_KEY: &str = "support_data.geom.gcp.number";
pub const FIRST_LINE_TIME_KEY: &str = "support_data.first_line_time";
pub const LAST_LINE_TIME_KEY: &str = "support_data.last_line_time";
pub const NEAR_RANGE_TIME_KEY: &str = "support_data.slant_range_to_first_pixel";
pub const RANGE_SAMPLING_RATE_KEY: &str = "support_data.range_sampling_rate";

/// Single burst starting at line and sample 0
fn rebased_geometry(lines: usize, samples: usize) -> BurstGeometry {
    BurstGeometry {
        line_record: LineSampleRecord {
            first: 0,
            last: lines.saturating_sub(1),
        },
        sample_record: LineSampleRecord {
            first: 0,
            last: samples.saturating_sub(1),
        },
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

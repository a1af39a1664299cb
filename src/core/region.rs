use crate::core::coordinate_mapper::CoordinateMapper;
use crate::core::layout::{ConcatenatePlan, Plan, PlanKind, RecordPlan};
use crate::types::{ImageRegion, SarError, SarResult};

/// Input pixels needed to fill one part of a requested output region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRequest {
    /// Index of the input image (always 0 outside concatenation)
    pub input_index: usize,
    /// Region to read, in the input image's pixel coordinates
    pub input_region: ImageRegion,
    /// Part of the requested output region this input fills
    pub output_region: ImageRegion,
}

/// Maps requested output regions to the input regions that supply them
pub struct RegionTranslator;

impl RegionTranslator {
    pub fn translate(plan: &Plan, region: &ImageRegion) -> SarResult<Vec<InputRequest>> {
        if !region.is_inside(plan.layout.size) {
            return Err(SarError::RegionOutOfBounds(format!(
                "Requested {} is outside the {} x {} output",
                region, plan.layout.size.lines, plan.layout.size.samples
            )));
        }

        let requests = match &plan.kind {
            PlanKind::Deburst(records) | PlanKind::BurstExtraction(records) => {
                vec![translate_records(records, region)?]
            }
            PlanKind::Concatenate(tiles) => translate_tiles(tiles, region),
        };

        log::debug!("Output {} needs {} input region(s)", region, requests.len());
        Ok(requests)
    }
}

fn translate_records(plan: &RecordPlan, region: &ImageRegion) -> SarResult<InputRequest> {
    let first_line = CoordinateMapper::local_to_global(&plan.line_records, region.first_line)?;
    let last_line = CoordinateMapper::local_to_global(&plan.line_records, region.last_line())?;

    let first_sample = match plan.sample_record {
        Some(samples) => samples.first + region.first_sample - plan.input_origin.first_sample,
        None => region.first_sample,
    };

    Ok(InputRequest {
        input_index: 0,
        input_region: ImageRegion::new(
            first_line - plan.input_origin.first_line,
            first_sample,
            last_line - first_line + 1,
            region.samples,
        ),
        output_region: *region,
    })
}

pub(crate) fn translate_tiles(plan: &ConcatenatePlan, region: &ImageRegion) -> Vec<InputRequest> {
    let mut requests = Vec::new();
    let mut row_start = 0;

    for (row, &height) in plan.row_heights.iter().enumerate() {
        let row_end = row_start + height;
        let first_line = region.first_line.max(row_start);
        let end_line = (region.first_line + region.lines).min(row_end);

        if first_line < end_line {
            for col in 0..plan.layout.cols {
                let col_start = col * plan.tile_width;
                let first_sample = region.first_sample.max(col_start);
                let end_sample = (region.first_sample + region.samples).min(col_start + plan.tile_width);
                if first_sample >= end_sample {
                    continue;
                }

                let index = row * plan.layout.cols + col;
                let tile = &plan.tiles[index];
                requests.push(InputRequest {
                    input_index: index,
                    input_region: ImageRegion::new(
                        tile.line_record.first + (first_line - row_start) - tile.input_origin.first_line,
                        tile.sample_record.first + (first_sample - col_start) - tile.input_origin.first_sample,
                        end_line - first_line,
                        end_sample - first_sample,
                    ),
                    output_region: ImageRegion::new(
                        first_line,
                        first_sample,
                        end_line - first_line,
                        end_sample - first_sample,
                    ),
                });
            }
        }

        row_start = row_end;
    }

    requests
}

use crate::core::copy_engine::InputTile;
use crate::core::layout::RecordPlan;
use crate::types::{ImageRegion, LineSampleRecord, SarError, SarResult};
use ndarray::{s, ArrayViewMut2, Axis};

/// Burst extraction copy.
///
/// Copies the output pixels whose scene (line, sample) lies inside the selected burst
/// record, and inside the sample record when only valid pixels are kept. Other pixels
/// are left as they are; filling the background is up to the caller.
pub struct BurstExtractCopy;

impl BurstExtractCopy {
    pub fn copy<T: Clone>(
        plan: &RecordPlan,
        region: &ImageRegion,
        input: &InputTile<'_, T>,
        mut output: ArrayViewMut2<'_, T>,
    ) -> SarResult<()> {
        let line_record = plan.line_records.first().ok_or_else(|| {
            SarError::EmptyGeometry("Burst extraction plan holds no line record".to_string())
        })?;

        let origin = plan.input_origin;
        let first_input_sample = origin.first_sample;
        let last_input_sample = origin.first_sample + plan.input_size.samples - 1;
        let last_input_line = origin.first_line + plan.input_size.lines - 1;

        // Scene sample of output column 0, and the scene samples allowed through
        let (sample_start, allowed) = match plan.sample_record {
            Some(samples) => (samples.first, samples.clip(first_input_sample, last_input_sample)),
            None => (
                first_input_sample,
                Some(LineSampleRecord {
                    first: first_input_sample,
                    last: last_input_sample,
                }),
            ),
        };
        let Some(allowed) = allowed else {
            return Ok(());
        };

        let region_first = sample_start + region.first_sample;
        let region_last = region_first + region.samples - 1;
        let Some(columns) = allowed.clip(region_first, region_last) else {
            return Ok(());
        };

        for (row, mut line) in output.axis_iter_mut(Axis(0)).enumerate() {
            let scene_line = line_record.first + region.first_line + row;
            if !line_record.contains(scene_line) || scene_line > last_input_line {
                continue;
            }

            let source = input.view(&ImageRegion::new(
                scene_line - origin.first_line,
                columns.first - first_input_sample,
                1,
                columns.len(),
            ))?;
            let start = columns.first - region_first;
            line.slice_mut(s![start..start + columns.len()])
                .assign(&source.row(0));
        }

        Ok(())
    }
}

use crate::core::copy_engine::InputTile;
use crate::core::coordinate_mapper::CoordinateMapper;
use crate::core::layout::RecordPlan;
use crate::types::{ImageRegion, SarResult};
use ndarray::{ArrayViewMut2, Axis};

/// Deburst copy: every output line is one whole kept input line
pub struct DeburstCopy;

impl DeburstCopy {
    /// Fill `output` (the pixels of `region`) from the buffered input
    pub fn copy<T: Clone>(
        plan: &RecordPlan,
        region: &ImageRegion,
        input: &InputTile<'_, T>,
        mut output: ArrayViewMut2<'_, T>,
    ) -> SarResult<()> {
        // Kept samples are contiguous, so the input column offset is the same for every line
        let first_sample = match plan.sample_record {
            Some(samples) => samples.first - plan.input_origin.first_sample + region.first_sample,
            None => region.first_sample,
        };

        for (row, mut line) in output.axis_iter_mut(Axis(0)).enumerate() {
            let global_line = CoordinateMapper::local_to_global(&plan.line_records, region.first_line + row)?;
            let source = input.view(&ImageRegion::new(
                global_line - plan.input_origin.first_line,
                first_sample,
                1,
                region.samples,
            ))?;
            line.assign(&source.row(0));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageSize, LineSampleRecord, SubImageOrigin};
    use ndarray::Array2;

    fn scene(lines: usize, samples: usize) -> Array2<u32> {
        // Pixel value encodes its scene position
        Array2::from_shape_fn((lines, samples), |(l, s)| (l * 1000 + s) as u32)
    }

    fn plan(sample_record: Option<LineSampleRecord>) -> RecordPlan {
        RecordPlan {
            line_records: vec![
                LineSampleRecord { first: 10, last: 200 },
                LineSampleRecord { first: 250, last: 480 },
            ],
            sample_record,
            input_origin: SubImageOrigin {
                first_line: 0,
                first_sample: 0,
            },
            input_size: ImageSize::new(50, 500),
        }
    }

    #[test]
    fn test_deburst_line_mapping() {
        let input = scene(500, 50);
        let plan = plan(None);
        let mut output = Array2::zeros((422, 50));

        DeburstCopy::copy(
            &plan,
            &ImageRegion::new(0, 0, 422, 50),
            &InputTile::full(input.view()),
            output.view_mut(),
        )
        .unwrap();

        assert_eq!(output[[0, 0]], 10_000);
        assert_eq!(output[[190, 7]], 200_007);
        assert_eq!(output[[191, 0]], 250_000);
        assert_eq!(output[[421, 49]], 480_049);
    }

    #[test]
    fn test_deburst_valid_samples() {
        let input = scene(500, 50);
        let plan = plan(Some(LineSampleRecord { first: 5, last: 44 }));
        let mut output = Array2::zeros((3, 10));

        DeburstCopy::copy(
            &plan,
            &ImageRegion::new(189, 2, 3, 10),
            &InputTile::full(input.view()),
            output.view_mut(),
        )
        .unwrap();

        assert_eq!(output[[0, 0]], 199_007);
        assert_eq!(output[[1, 9]], 200_016);
        assert_eq!(output[[2, 0]], 250_007);
    }

    #[test]
    fn test_unbuffered_input_is_rejected() {
        let input = scene(100, 50);
        let plan = plan(None);
        let tile = InputTile::new(ImageRegion::new(0, 0, 100, 50), input.view()).unwrap();
        let mut output = Array2::zeros((1, 50));

        assert!(DeburstCopy::copy(&plan, &ImageRegion::new(191, 0, 1, 50), &tile, output.view_mut()).is_err());
    }
}

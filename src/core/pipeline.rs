//! Plan once, then copy output strips in parallel.
//!
//! The plan phase runs single-threaded and yields an immutable [`ExecutionPlan`]. The copy
//! phase splits the output into disjoint row strips; every strip reads the same plan and
//! writes only its own pixels, so the result does not depend on strip size or order.

use crate::core::copy_engine::{InputTile, PixelCopyEngine};
use crate::core::geometry_resolver::GeometryResolver;
use crate::core::layout::{OutputLayoutPlanner, Plan};
use crate::core::metadata::{MetadataSynchronizer, OutputMetadata};
use crate::io::sensor_model::SarSensorModel;
use crate::types::{BurstSelection, ImageRegion, InputImageInfo, SarError, SarResult};
use ndarray::{Array2, ArrayView2, Axis};
use num_traits::Zero;

/// Execution settings for the copy phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Output lines per strip
    pub strip_lines: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { strip_lines: 256 }
    }
}

/// Plan plus the metadata to attach to the output
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub plan: Plan,
    pub metadata: OutputMetadata,
}

/// Run the plan phase.
///
/// Every input is checked before the sensor model is asked anything; a failure here means
/// no region work must be scheduled.
pub fn plan(
    selection: &BurstSelection,
    inputs: &[InputImageInfo],
    model: Option<Box<dyn SarSensorModel>>,
) -> SarResult<ExecutionPlan> {
    log::info!("Planning {} over {} input image(s)", selection, inputs.len());

    let first = inputs.first().ok_or_else(|| {
        SarError::Precondition("At least one input image is required".to_string())
    })?;
    let checked = OutputLayoutPlanner::check_all(inputs)?;

    let mut resolver = GeometryResolver::from_optional(model);
    let resolution = resolver.resolve(selection)?;
    let plan = OutputLayoutPlanner::plan(selection, &resolution.geometry, &checked)?;
    let metadata = MetadataSynchronizer::synchronize(
        &plan.layout,
        selection,
        &first.keywords,
        &resolution.persisted,
    )?;

    log::info!(
        "Output image: {} lines x {} samples, origin ({}, {})",
        plan.layout.size.lines,
        plan.layout.size.samples,
        plan.layout.origin.x,
        plan.layout.origin.y
    );

    Ok(ExecutionPlan { plan, metadata })
}

/// Produce the whole output image from fully loaded inputs.
///
/// Pixels no input supplies (burst extraction outside the kept window) hold `fill`.
pub fn execute<T>(
    execution: &ExecutionPlan,
    inputs: &[ArrayView2<'_, T>],
    fill: T,
    config: &PipelineConfig,
) -> SarResult<Array2<T>>
where
    T: Clone + Send + Sync,
{
    let plan = &execution.plan;
    let strip_lines = config.strip_lines.max(1);
    let width = plan.layout.size.samples;
    let tiles: Vec<InputTile<'_, T>> = inputs.iter().map(|view| InputTile::full(view.view())).collect();
    let mut output = Array2::from_elem(plan.layout.size.dim(), fill);

    log::debug!(
        "Copying {} output lines in strips of {}",
        plan.layout.size.lines,
        strip_lines
    );

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        output
            .axis_chunks_iter_mut(Axis(0), strip_lines)
            .into_par_iter()
            .enumerate()
            .try_for_each(|(strip, chunk)| {
                let region = ImageRegion::new(strip * strip_lines, 0, chunk.nrows(), width);
                PixelCopyEngine::copy_region(plan, &region, &tiles, chunk)
            })?;
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (strip, chunk) in output.axis_chunks_iter_mut(Axis(0), strip_lines).enumerate() {
            let region = ImageRegion::new(strip * strip_lines, 0, chunk.nrows(), width);
            PixelCopyEngine::copy_region(plan, &region, &tiles, chunk)?;
        }
    }

    Ok(output)
}

/// [`execute`] with a zero background
pub fn execute_zero_filled<T>(
    execution: &ExecutionPlan,
    inputs: &[ArrayView2<'_, T>],
    config: &PipelineConfig,
) -> SarResult<Array2<T>>
where
    T: Clone + Zero + Send + Sync,
{
    execute(execution, inputs, T::zero(), config)
}

/// Fill caller-chosen regions of `output`, in the order given
pub fn execute_regions<T: Clone>(
    execution: &ExecutionPlan,
    inputs: &[ArrayView2<'_, T>],
    regions: &[ImageRegion],
    output: &mut Array2<T>,
) -> SarResult<()> {
    let plan = &execution.plan;
    if output.dim() != plan.layout.size.dim() {
        return Err(SarError::RegionOutOfBounds(format!(
            "Output buffer of shape {:?} does not match the {} x {} layout",
            output.dim(),
            plan.layout.size.lines,
            plan.layout.size.samples
        )));
    }

    let tiles: Vec<InputTile<'_, T>> = inputs.iter().map(|view| InputTile::full(view.view())).collect();
    for region in regions {
        if !region.is_inside(plan.layout.size) {
            return Err(SarError::RegionOutOfBounds(format!(
                "Requested {} is outside the {} x {} output",
                region, plan.layout.size.lines, plan.layout.size.samples
            )));
        }
        let target = output.slice_mut(ndarray::s![
            region.first_line..region.first_line + region.lines,
            region.first_sample..region.first_sample + region.samples
        ]);
        PixelCopyEngine::copy_region(plan, region, &tiles, target)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sensor_model::{BurstGeometry, BurstRecord, StaticSensorModel};
    use crate::types::{ImageSize, LineSampleRecord};
    use chrono::{TimeZone, Utc};

    fn burst(first: usize, last: usize) -> BurstRecord {
        let geometry = BurstGeometry {
            line_record: LineSampleRecord { first, last },
            sample_record: LineSampleRecord { first: 0, last: 19 },
        };
        BurstRecord {
            azimuth_start_time: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            azimuth_stop_time: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 3).unwrap(),
            azimuth_anx_time: 0.0,
            valid: geometry,
            full: geometry,
        }
    }

    fn model() -> Box<dyn SarSensorModel> {
        Box::new(
            StaticSensorModel::new(vec![burst(0, 49), burst(50, 99)]).with_deburst(
                vec![
                    LineSampleRecord { first: 2, last: 45 },
                    LineSampleRecord { first: 55, last: 97 },
                ],
                Some(LineSampleRecord { first: 0, last: 19 }),
            ),
        )
    }

    #[test]
    fn test_default_config() {
        assert_eq!(PipelineConfig::default().strip_lines, 256);
    }

    #[test]
    fn test_strip_size_does_not_change_result() {
        let input = Array2::from_shape_fn((100, 20), |(l, s)| (l * 100 + s) as u32);
        let info = InputImageInfo::new(ImageSize::new(20, 100));
        let execution = plan(
            &BurstSelection::Deburst {
                only_valid_samples: false,
            },
            &[info],
            Some(model()),
        )
        .unwrap();
        assert_eq!(execution.plan.layout.size, ImageSize::new(20, 87));

        let reference = execute(&execution, &[input.view()], 0, &PipelineConfig { strip_lines: 87 }).unwrap();
        for strip_lines in [0, 1, 7, 50] {
            let output = execute(&execution, &[input.view()], 0, &PipelineConfig { strip_lines }).unwrap();
            assert_eq!(output, reference);
        }
        assert_eq!(reference[[44, 0]], 5_500);
    }

    #[test]
    fn test_no_inputs() {
        let result = plan(
            &BurstSelection::Deburst {
                only_valid_samples: false,
            },
            &[],
            Some(model()),
        );
        assert!(matches!(result, Err(SarError::Precondition(_))));
    }

    #[test]
    fn test_execute_regions_rejects_wrong_buffer() {
        let input = Array2::<u32>::zeros((100, 20));
        let info = InputImageInfo::new(ImageSize::new(20, 100));
        let execution = plan(
            &BurstSelection::Deburst {
                only_valid_samples: false,
            },
            &[info],
            Some(model()),
        )
        .unwrap();

        let mut output = Array2::zeros((10, 20));
        let result = execute_regions(&execution, &[input.view()], &[ImageRegion::new(0, 0, 1, 20)], &mut output);
        assert!(matches!(result, Err(SarError::RegionOutOfBounds(_))));
    }
}

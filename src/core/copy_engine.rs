use crate::core::burst_extraction::BurstExtractCopy;
use crate::core::concatenate::ConcatenateCopy;
use crate::core::deburst::DeburstCopy;
use crate::core::layout::{Plan, PlanKind};
use crate::types::{ImageRegion, ImageSize, SarError, SarResult};
use ndarray::{s, ArrayView2, ArrayViewMut2};

/// Buffered pixels of one input image
#[derive(Debug, Clone)]
pub struct InputTile<'a, T> {
    /// Part of the input image held by `data`, in input pixel coordinates
    pub region: ImageRegion,
    pub data: ArrayView2<'a, T>,
}

impl<'a, T> InputTile<'a, T> {
    /// Tile holding a whole input image
    pub fn full(data: ArrayView2<'a, T>) -> Self {
        let (lines, samples) = data.dim();
        Self {
            region: ImageRegion::full(ImageSize::new(samples, lines)),
            data,
        }
    }

    pub fn new(region: ImageRegion, data: ArrayView2<'a, T>) -> SarResult<Self> {
        if data.dim() != (region.lines, region.samples) {
            return Err(SarError::RegionOutOfBounds(format!(
                "Buffer of shape {:?} does not match input {}",
                data.dim(),
                region
            )));
        }
        Ok(Self { region, data })
    }

    /// View on `region` (input pixel coordinates), which must be buffered
    pub fn view(&self, region: &ImageRegion) -> SarResult<ArrayView2<'_, T>> {
        if !self.region.covers(region) {
            return Err(SarError::RegionOutOfBounds(format!(
                "Input {} is not buffered (buffer holds {})",
                region, self.region
            )));
        }
        let line = region.first_line - self.region.first_line;
        let sample = region.first_sample - self.region.first_sample;
        Ok(self
            .data
            .slice(s![line..line + region.lines, sample..sample + region.samples]))
    }
}

/// Copies pixels of the buffered inputs into one output region, following the plan
pub struct PixelCopyEngine;

impl PixelCopyEngine {
    /// `output` holds exactly the pixels of `region`
    pub fn copy_region<T: Clone>(
        plan: &Plan,
        region: &ImageRegion,
        inputs: &[InputTile<'_, T>],
        output: ArrayViewMut2<'_, T>,
    ) -> SarResult<()> {
        if output.dim() != (region.lines, region.samples) {
            return Err(SarError::RegionOutOfBounds(format!(
                "Output buffer of shape {:?} does not match {}",
                output.dim(),
                region
            )));
        }
        if !region.is_inside(plan.layout.size) {
            return Err(SarError::RegionOutOfBounds(format!(
                "Requested {} is outside the {} x {} output",
                region, plan.layout.size.lines, plan.layout.size.samples
            )));
        }
        if inputs.len() != plan.input_count() {
            return Err(SarError::RegionOutOfBounds(format!(
                "Plan expects {} input image(s), got {}",
                plan.input_count(),
                inputs.len()
            )));
        }

        match &plan.kind {
            PlanKind::Deburst(records) => DeburstCopy::copy(records, region, &inputs[0], output),
            PlanKind::BurstExtraction(records) => {
                BurstExtractCopy::copy(records, region, &inputs[0], output)
            }
            PlanKind::Concatenate(tiles) => ConcatenateCopy::copy(tiles, region, inputs, output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_input_tile_view() {
        let data = Array2::from_shape_fn((4, 5), |(l, s)| (l * 10 + s) as u32);
        let tile = InputTile::new(ImageRegion::new(100, 20, 4, 5), data.view()).unwrap();

        let view = tile.view(&ImageRegion::new(101, 22, 2, 3)).unwrap();
        assert_eq!(view[[0, 0]], 12);
        assert_eq!(view[[1, 2]], 24);

        assert!(matches!(
            tile.view(&ImageRegion::new(99, 22, 2, 3)),
            Err(SarError::RegionOutOfBounds(_))
        ));
        assert!(InputTile::new(ImageRegion::new(0, 0, 3, 5), data.view()).is_err());
    }
}

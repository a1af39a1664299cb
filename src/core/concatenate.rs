use crate::core::copy_engine::InputTile;
use crate::core::layout::ConcatenatePlan;
use crate::core::region::translate_tiles;
use crate::types::{ImageRegion, SarResult};
use ndarray::{s, ArrayViewMut2};

/// Concatenation copy: each part of the output region comes from the tile that owns it.
///
/// Tile `n` of a grid column starts at the output line equal to the kept lines of the
/// tiles above it.
pub struct ConcatenateCopy;

impl ConcatenateCopy {
    pub fn copy<T: Clone>(
        plan: &ConcatenatePlan,
        region: &ImageRegion,
        inputs: &[InputTile<'_, T>],
        mut output: ArrayViewMut2<'_, T>,
    ) -> SarResult<()> {
        for request in translate_tiles(plan, region) {
            let source = inputs[request.input_index].view(&request.input_region)?;

            let line = request.output_region.first_line - region.first_line;
            let sample = request.output_region.first_sample - region.first_sample;
            output
                .slice_mut(s![
                    line..line + request.output_region.lines,
                    sample..sample + request.output_region.samples
                ])
                .assign(&source);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::layout::TilePlan;
    use crate::types::{ImageSize, LineSampleRecord, SubImageOrigin, TileLayout};
    use ndarray::Array2;

    fn tile_image(tile: u32, lines: usize, samples: usize) -> Array2<u32> {
        Array2::from_shape_fn((lines, samples), |(l, s)| tile * 1_000_000 + (l * 1000 + s) as u32)
    }

    fn tile_plan(lines: LineSampleRecord, samples: LineSampleRecord, size: ImageSize) -> TilePlan {
        TilePlan {
            line_record: lines,
            sample_record: samples,
            input_origin: SubImageOrigin {
                first_line: 0,
                first_sample: 0,
            },
            input_size: size,
        }
    }

    fn vertical_plan() -> ConcatenatePlan {
        ConcatenatePlan {
            tiles: vec![
                tile_plan(
                    LineSampleRecord { first: 10, last: 309 },
                    LineSampleRecord { first: 5, last: 74 },
                    ImageSize::new(80, 320),
                ),
                tile_plan(
                    LineSampleRecord { first: 15, last: 264 },
                    LineSampleRecord { first: 0, last: 69 },
                    ImageSize::new(80, 280),
                ),
            ],
            layout: TileLayout::vertical(2),
            tile_width: 70,
            row_heights: vec![300, 250],
        }
    }

    #[test]
    fn test_vertical_rebasing() {
        let first = tile_image(1, 320, 80);
        let second = tile_image(2, 280, 80);
        let inputs = vec![InputTile::full(first.view()), InputTile::full(second.view())];
        let mut output = Array2::zeros((550, 70));

        ConcatenateCopy::copy(
            &vertical_plan(),
            &ImageRegion::new(0, 0, 550, 70),
            &inputs,
            output.view_mut(),
        )
        .unwrap();

        assert_eq!(output[[0, 0]], 1_010_005);
        assert_eq!(output[[299, 69]], 1_309_074);
        assert_eq!(output[[300, 0]], 2_015_000);
        assert_eq!(output[[549, 69]], 2_264_069);
    }

    #[test]
    fn test_side_by_side_tiles() {
        let mut plan = vertical_plan();
        plan.tiles[1].line_record = LineSampleRecord { first: 15, last: 314 };
        plan.tiles[1].input_size = ImageSize::new(80, 320);
        plan.layout = TileLayout { rows: 1, cols: 2 };
        plan.row_heights = vec![300];

        let first = tile_image(1, 320, 80);
        let second = tile_image(2, 320, 80);
        let inputs = vec![InputTile::full(first.view()), InputTile::full(second.view())];
        let mut output = Array2::zeros((4, 20));

        ConcatenateCopy::copy(&plan, &ImageRegion::new(100, 60, 4, 20), &inputs, output.view_mut()).unwrap();

        assert_eq!(output[[0, 0]], 1_110_065);
        assert_eq!(output[[0, 9]], 1_110_074);
        assert_eq!(output[[0, 10]], 2_115_000);
        assert_eq!(output[[3, 19]], 2_118_009);
    }
}

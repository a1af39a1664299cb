use crate::core::coordinate_mapper::CoordinateMapper;
use crate::core::geometry_resolver::ResolvedGeometry;
use crate::io::sensor_model::ConcatenateGeometry;
use crate::types::{
    BurstSelection, ImagePoint, ImageSize, InputImageInfo, LineSampleRecord, SarError, SarResult,
    SubImageOrigin, TileLayout,
};

/// Size and sub-pixel origin of the output image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputLayout {
    pub size: ImageSize,
    pub origin: ImagePoint,
}

/// Kept lines and samples of a single input image (deburst and burst extraction)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPlan {
    /// Kept line ranges clipped to the input's line extent, in scene coordinates
    pub line_records: Vec<LineSampleRecord>,
    /// Kept sample range clipped to the input's sample extent, when samples are filtered
    pub sample_record: Option<LineSampleRecord>,
    pub input_origin: SubImageOrigin,
    pub input_size: ImageSize,
}

impl RecordPlan {
    /// Number of output lines
    pub fn kept_lines(&self) -> usize {
        CoordinateMapper::kept_length(&self.line_records)
    }

    /// Number of output samples
    pub fn kept_samples(&self) -> usize {
        self.sample_record
            .map(|record| record.len())
            .unwrap_or(self.input_size.samples)
    }
}

/// Kept window of one concatenation tile, in that tile's scene coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlan {
    pub line_record: LineSampleRecord,
    pub sample_record: LineSampleRecord,
    pub input_origin: SubImageOrigin,
    pub input_size: ImageSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatenatePlan {
    /// Tiles in declared (row-major) order
    pub tiles: Vec<TilePlan>,
    pub layout: TileLayout,
    /// Shared sample-window width of every tile
    pub tile_width: usize,
    /// Kept line count of each grid row
    pub row_heights: Vec<usize>,
}

impl ConcatenatePlan {
    /// Output line at which grid row `row` starts
    pub fn row_start(&self, row: usize) -> usize {
        self.row_heights[..row].iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanKind {
    Deburst(RecordPlan),
    BurstExtraction(RecordPlan),
    Concatenate(ConcatenatePlan),
}

/// Immutable result of the plan phase, shared by every region task
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub selection: BurstSelection,
    pub kind: PlanKind,
    pub layout: OutputLayout,
}

impl Plan {
    /// Number of input images the copy phase expects
    pub fn input_count(&self) -> usize {
        match &self.kind {
            PlanKind::Deburst(_) | PlanKind::BurstExtraction(_) => 1,
            PlanKind::Concatenate(plan) => plan.tiles.len(),
        }
    }
}

/// Input image that passed the preconditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckedInput {
    pub size: ImageSize,
    pub origin: SubImageOrigin,
}

impl CheckedInput {
    /// Scene lines held by the input
    fn lines(&self) -> LineSampleRecord {
        LineSampleRecord {
            first: self.origin.first_line,
            last: self.origin.first_line + self.size.lines - 1,
        }
    }

    /// Scene samples held by the input
    fn samples(&self) -> LineSampleRecord {
        LineSampleRecord {
            first: self.origin.first_sample,
            last: self.origin.first_sample + self.size.samples - 1,
        }
    }
}

/// Computes output size and origin from resolved records and the supplied inputs
pub struct OutputLayoutPlanner;

impl OutputLayoutPlanner {
    /// Checks run once per input before the sensor model is consulted
    pub fn check_preconditions(input: &InputImageInfo) -> SarResult<CheckedInput> {
        let (_, line_spacing) = input.pixel_spacing;
        if line_spacing != 1.0 {
            return Err(SarError::Precondition(format!(
                "Input line spacing must be 1, got {}",
                line_spacing
            )));
        }
        if input.size.is_empty() {
            return Err(SarError::Precondition(format!(
                "Input image is empty ({} x {})",
                input.size.lines, input.size.samples
            )));
        }
        Ok(CheckedInput {
            size: input.size,
            origin: SubImageOrigin::from_point(input.origin)?,
        })
    }

    /// [`OutputLayoutPlanner::check_preconditions`] for every input, in order
    pub fn check_all(inputs: &[InputImageInfo]) -> SarResult<Vec<CheckedInput>> {
        inputs.iter().map(Self::check_preconditions).collect()
    }

    pub fn plan(
        selection: &BurstSelection,
        geometry: &ResolvedGeometry,
        inputs: &[CheckedInput],
    ) -> SarResult<Plan> {
        let (kind, layout) = match (selection, geometry) {
            (BurstSelection::Deburst { .. }, ResolvedGeometry::Deburst(deburst)) => {
                let input = single_input(inputs)?;
                let (plan, layout) =
                    plan_records(&deburst.line_records, deburst.sample_record, input)?;
                (PlanKind::Deburst(plan), layout)
            }
            (BurstSelection::BurstExtraction { all_pixels, .. }, ResolvedGeometry::BurstExtraction(burst)) => {
                let input = single_input(inputs)?;
                let sample_record = if *all_pixels {
                    None
                } else {
                    Some(burst.sample_record)
                };
                let (plan, layout) = plan_records(&[burst.line_record], sample_record, input)?;
                (PlanKind::BurstExtraction(plan), layout)
            }
            (BurstSelection::Concatenate { layout, .. }, ResolvedGeometry::Concatenate(concatenation)) => {
                let (plan, output) = plan_concatenation(concatenation, *layout, inputs)?;
                (PlanKind::Concatenate(plan), output)
            }
            _ => {
                return Err(SarError::GeometryResolution(format!(
                    "Resolved geometry does not match the {} selection",
                    selection
                )))
            }
        };

        log::info!(
            "Planned {}: output {} lines x {} samples, origin ({}, {})",
            selection,
            layout.size.lines,
            layout.size.samples,
            layout.origin.x,
            layout.origin.y
        );

        Ok(Plan {
            selection: selection.clone(),
            kind,
            layout,
        })
    }
}

fn single_input(inputs: &[CheckedInput]) -> SarResult<&CheckedInput> {
    match inputs {
        [input] => Ok(input),
        _ => Err(SarError::Precondition(format!(
            "Expected exactly one input image, got {}",
            inputs.len()
        ))),
    }
}

/// Clip records to the input extent and re-anchor the output origin on the first kept index
fn plan_records(
    line_records: &[LineSampleRecord],
    sample_record: Option<LineSampleRecord>,
    input: &CheckedInput,
) -> SarResult<(RecordPlan, OutputLayout)> {
    let lines = input.lines();

    let clipped_lines: Vec<LineSampleRecord> = line_records
        .iter()
        .filter_map(|record| record.clip(lines.first, lines.last))
        .collect();
    let Some(first_kept) = clipped_lines.first() else {
        return Err(SarError::EmptyGeometry(format!(
            "No kept line falls inside the input lines {}",
            lines
        )));
    };
    for record in &clipped_lines {
        log::debug!("Keeping lines {}", record);
    }
    let line_offset = CoordinateMapper::global_to_local(line_records, first_kept.first)?;

    let (clipped_samples, sample_origin) = match sample_record {
        Some(record) => {
            let samples = input.samples();
            let clipped = record.clip(samples.first, samples.last).ok_or_else(|| {
                SarError::EmptyGeometry(format!(
                    "Kept samples {} fall outside the input samples {}",
                    record, samples
                ))
            })?;
            let offset = clipped.first - record.first;
            (Some(clipped), offset as f64 + 0.5)
        }
        None => (None, input.origin.to_point().x),
    };

    let plan = RecordPlan {
        line_records: clipped_lines,
        sample_record: clipped_samples,
        input_origin: input.origin,
        input_size: input.size,
    };
    let layout = OutputLayout {
        size: ImageSize::new(plan.kept_samples(), plan.kept_lines()),
        origin: ImagePoint::new(sample_origin, line_offset as f64 + 0.5),
    };
    Ok((plan, layout))
}

fn plan_concatenation(
    geometry: &ConcatenateGeometry,
    layout: TileLayout,
    inputs: &[CheckedInput],
) -> SarResult<(ConcatenatePlan, OutputLayout)> {
    let tile_count = geometry.tiles.len();
    let capacity = layout.tile_count().ok_or_else(|| {
        SarError::LayoutMismatch(format!(
            "A {}x{} layout holds more tiles than can be counted",
            layout.rows, layout.cols
        ))
    })?;
    if capacity == 0 || capacity != tile_count {
        return Err(SarError::LayoutMismatch(format!(
            "{} tiles cannot fill a {}x{} layout",
            tile_count, layout.rows, layout.cols
        )));
    }
    if inputs.len() != tile_count {
        return Err(SarError::LayoutMismatch(format!(
            "{} tile records but {} input images",
            tile_count,
            inputs.len()
        )));
    }

    let mut tiles = Vec::with_capacity(tile_count);
    for (index, (tile, input)) in geometry.tiles.iter().zip(inputs).enumerate() {
        let (lines, samples) = (input.lines(), input.samples());
        if tile.line_record.clip(lines.first, lines.last) != Some(tile.line_record)
            || tile.sample_record.clip(samples.first, samples.last) != Some(tile.sample_record)
        {
            return Err(SarError::LayoutMismatch(format!(
                "Tile {} keeps lines {} and samples {} outside its image (lines {}, samples {})",
                index, tile.line_record, tile.sample_record, lines, samples
            )));
        }
        tiles.push(TilePlan {
            line_record: tile.line_record,
            sample_record: tile.sample_record,
            input_origin: input.origin,
            input_size: input.size,
        });
    }

    let tile_width = tiles[0].sample_record.len();
    if let Some((index, tile)) = tiles
        .iter()
        .enumerate()
        .find(|(_, tile)| tile.sample_record.len() != tile_width)
    {
        return Err(SarError::LayoutMismatch(format!(
            "Tile {} keeps {} samples, tile 0 keeps {}",
            index,
            tile.sample_record.len(),
            tile_width
        )));
    }

    let mut row_heights = Vec::with_capacity(layout.rows);
    for (row, row_tiles) in tiles.chunks(layout.cols).enumerate() {
        let height = row_tiles[0].line_record.len();
        if row_tiles.iter().any(|tile| tile.line_record.len() != height) {
            return Err(SarError::LayoutMismatch(format!(
                "Tiles of layout row {} keep different line counts",
                row
            )));
        }
        log::debug!("Layout row {} keeps {} lines", row, height);
        row_heights.push(height);
    }

    let output = OutputLayout {
        size: ImageSize::new(layout.cols * tile_width, row_heights.iter().sum()),
        origin: ImagePoint::new(0.5, geometry.vertical_offset as f64 + 0.5),
    };
    let plan = ConcatenatePlan {
        tiles,
        layout,
        tile_width,
        row_heights,
    };
    Ok((plan, output))
}

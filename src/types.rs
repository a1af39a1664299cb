use ndarray::Array2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complex-valued SAR data type (I + jQ)
pub type SarComplex = Complex<f32>;

/// 2D complex SAR data array (azimuth x range)
pub type SarImage = Array2<SarComplex>;

/// Image side-channel metadata (size, origin, sensor geometry), keyed by dotted names
pub type Keywordlist = BTreeMap<String, String>;

/// Closed interval `[first, last]` of kept lines or samples, in original scene coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSampleRecord {
    pub first: usize,
    pub last: usize,
}

impl LineSampleRecord {
    /// Build a record, rejecting inverted intervals
    pub fn new(first: usize, last: usize) -> SarResult<Self> {
        if last < first {
            return Err(SarError::GeometryResolution(format!(
                "Inverted line/sample record: first={} last={}",
                first, last
            )));
        }
        Ok(Self { first, last })
    }

    /// Number of lines (or samples) kept by this record
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }

    /// Intersection with the closed interval `[first, last]`, `None` when disjoint
    pub fn clip(&self, first: usize, last: usize) -> Option<Self> {
        let start = self.first.max(first);
        let stop = self.last.min(last);
        if start <= stop {
            Some(Self { first: start, last: stop })
        } else {
            None
        }
    }
}

impl std::fmt::Display for LineSampleRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

/// Sub-pixel image point, `x` along samples (range) and `y` along lines (azimuth)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub samples: usize,
    pub lines: usize,
}

impl ImageSize {
    pub fn new(samples: usize, lines: usize) -> Self {
        Self { samples, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0 || self.lines == 0
    }

    /// Shape in ndarray order (lines, samples)
    pub fn dim(&self) -> (usize, usize) {
        (self.lines, self.samples)
    }
}

/// Rectangular pixel region, anchored at its first line and sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRegion {
    pub first_line: usize,
    pub first_sample: usize,
    pub lines: usize,
    pub samples: usize,
}

impl ImageRegion {
    pub fn new(first_line: usize, first_sample: usize, lines: usize, samples: usize) -> Self {
        Self {
            first_line,
            first_sample,
            lines,
            samples,
        }
    }

    /// Region covering a whole image of the given size
    pub fn full(size: ImageSize) -> Self {
        Self::new(0, 0, size.lines, size.samples)
    }

    pub fn is_empty(&self) -> bool {
        self.lines == 0 || self.samples == 0
    }

    /// Last line covered; only meaningful for non-empty regions
    pub fn last_line(&self) -> usize {
        self.first_line + self.lines - 1
    }

    /// Last sample covered; only meaningful for non-empty regions
    pub fn last_sample(&self) -> usize {
        self.first_sample + self.samples - 1
    }

    /// Whether the region is non-empty and lies fully inside an image of `size`
    pub fn is_inside(&self, size: ImageSize) -> bool {
        !self.is_empty()
            && self.first_line + self.lines <= size.lines
            && self.first_sample + self.samples <= size.samples
    }

    /// Whether `other` is fully covered by this region
    pub fn covers(&self, other: &ImageRegion) -> bool {
        other.first_line >= self.first_line
            && other.first_sample >= self.first_sample
            && other.first_line + other.lines <= self.first_line + self.lines
            && other.first_sample + other.samples <= self.first_sample + self.samples
    }
}

impl std::fmt::Display for ImageRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "lines {}+{} x samples {}+{}",
            self.first_line, self.lines, self.first_sample, self.samples
        )
    }
}

/// Original-scene index of pixel (0,0) of the supplied input image.
///
/// Built from a sub-pixel origin whose fractional part is exactly 0.5 on both axes
/// (pixel-center convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubImageOrigin {
    pub first_line: usize,
    pub first_sample: usize,
}

impl SubImageOrigin {
    pub fn from_point(origin: ImagePoint) -> SarResult<Self> {
        Ok(Self {
            first_line: pixel_center_index(origin.y, "line")?,
            first_sample: pixel_center_index(origin.x, "sample")?,
        })
    }

    pub fn to_point(&self) -> ImagePoint {
        ImagePoint::new(self.first_sample as f64 + 0.5, self.first_line as f64 + 0.5)
    }
}

fn pixel_center_index(coordinate: f64, axis: &str) -> SarResult<usize> {
    if !coordinate.is_finite() || coordinate < 0.5 {
        return Err(SarError::Precondition(format!(
            "Origin {} coordinate {} is not a non-negative pixel center",
            axis, coordinate
        )));
    }
    if (coordinate.fract() - 0.5).abs() > f64::EPSILON {
        return Err(SarError::Precondition(format!(
            "Origin {} coordinate {} must have a fractional part of 0.5",
            axis, coordinate
        )));
    }
    Ok(coordinate.floor() as usize)
}

/// Description of one supplied input image (the pixels themselves travel separately)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputImageInfo {
    pub size: ImageSize,
    pub origin: ImagePoint,
    /// (sample, line) pixel spacing
    pub pixel_spacing: (f64, f64),
    pub keywords: Keywordlist,
}

impl InputImageInfo {
    /// Unit-spaced image anchored at the scene origin
    pub fn new(size: ImageSize) -> Self {
        Self {
            size,
            origin: ImagePoint::new(0.5, 0.5),
            pixel_spacing: (1.0, 1.0),
            keywords: Keywordlist::new(),
        }
    }

    pub fn with_origin(mut self, origin: ImagePoint) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_pixel_spacing(mut self, sample_spacing: f64, line_spacing: f64) -> Self {
        self.pixel_spacing = (sample_spacing, line_spacing);
        self
    }

    pub fn with_keywords(mut self, keywords: Keywordlist) -> Self {
        self.keywords = keywords;
        self
    }
}

/// Row-major grid of tiles for concatenation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayout {
    pub rows: usize,
    pub cols: usize,
}

impl TileLayout {
    /// Vertical stack of `count` tiles
    pub fn vertical(count: usize) -> Self {
        Self { rows: count, cols: 1 }
    }

    /// `None` when `rows * cols` overflows
    pub fn tile_count(&self) -> Option<usize> {
        self.rows.checked_mul(self.cols)
    }
}

/// Which bursts an execution keeps, and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstSelection {
    /// Remove burst overlaps from the whole sub-swath
    Deburst { only_valid_samples: bool },
    /// Isolate one burst; without `all_pixels` only its valid samples are kept
    BurstExtraction { burst_index: usize, all_pixels: bool },
    /// Re-assemble already-extracted burst tiles
    Concatenate {
        first_burst_index: usize,
        input_has_invalid_pixels: bool,
        layout: TileLayout,
    },
}

impl std::fmt::Display for BurstSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BurstSelection::Deburst { .. } => write!(f, "deburst"),
            BurstSelection::BurstExtraction { burst_index, .. } => {
                write!(f, "burst extraction (burst {})", burst_index)
            }
            BurstSelection::Concatenate { layout, .. } => {
                write!(f, "concatenation ({}x{} tiles)", layout.rows, layout.cols)
            }
        }
    }
}

/// Error types for burst geometry processing
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid sensor model: {0}")]
    InvalidSensorModel(String),

    #[error("Geometry resolution failed: {0}")]
    GeometryResolution(String),

    #[error("Empty geometry: {0}")]
    EmptyGeometry(String),

    #[error("Layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error("Region out of bounds: {0}")]
    RegionOutOfBounds(String),

    #[error("Coordinate out of range: {0}")]
    OutOfRange(String),

    #[error("Metadata error: {0}")]
    Metadata(String),
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;

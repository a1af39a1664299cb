use crate::core::layout::OutputLayout;
use crate::types::{BurstSelection, ImagePoint, ImageSize, Keywordlist, SarError, SarResult, SubImageOrigin};

pub const NUMBER_LINES_KEY: &str = "number_lines";
pub const NUMBER_SAMPLES_KEY: &str = "number_samples";
/// Names read by older downstream tools
pub const LEGACY_NUMBER_LINES_KEY: &str = "support_data.number_lines";
pub const LEGACY_NUMBER_SAMPLES_KEY: &str = "support_data.number_samples";
pub const INVALID_PIXELS_KEY: &str = "invalid_pixels";

const GEOMETRY_PREFIX: &str = "support_data.geom.";

/// Size, origin and keywords to write onto the output image
#[derive(Debug, Clone, PartialEq)]
pub struct OutputMetadata {
    pub size: ImageSize,
    pub origin: ImagePoint,
    pub keywords: Keywordlist,
}

/// Keeps output metadata consistent with the planned layout
pub struct MetadataSynchronizer;

impl MetadataSynchronizer {
    /// Merge the input keywords, the sensor model's persisted geometry and the layout
    pub fn synchronize(
        layout: &OutputLayout,
        selection: &BurstSelection,
        input_keywords: &Keywordlist,
        persisted: &Keywordlist,
    ) -> SarResult<OutputMetadata> {
        if layout.size.is_empty() {
            return Err(SarError::Metadata(format!(
                "Cannot describe an empty {} x {} output",
                layout.size.lines, layout.size.samples
            )));
        }
        SubImageOrigin::from_point(layout.origin)
            .map_err(|e| SarError::Metadata(format!("Invalid output origin: {}", e)))?;

        let mut keywords = input_keywords.clone();
        if !persisted.is_empty() {
            // The persisted geometry replaces the input's burst records and GCPs wholesale
            keywords.retain(|key, _| !key.starts_with(GEOMETRY_PREFIX));
            keywords.extend(persisted.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let lines = layout.size.lines.to_string();
        let samples = layout.size.samples.to_string();
        keywords.insert(NUMBER_LINES_KEY.to_string(), lines.clone());
        keywords.insert(LEGACY_NUMBER_LINES_KEY.to_string(), lines);
        keywords.insert(NUMBER_SAMPLES_KEY.to_string(), samples.clone());
        keywords.insert(LEGACY_NUMBER_SAMPLES_KEY.to_string(), samples);

        if let BurstSelection::BurstExtraction { all_pixels, .. } = selection {
            let flag = if *all_pixels { "yes" } else { "no" };
            keywords.insert(INVALID_PIXELS_KEY.to_string(), flag.to_string());
        }

        log::debug!(
            "Synchronized {} output keywords for {} x {} output",
            keywords.len(),
            layout.size.lines,
            layout.size.samples
        );

        Ok(OutputMetadata {
            size: layout.size,
            origin: layout.origin,
            keywords,
        })
    }
}

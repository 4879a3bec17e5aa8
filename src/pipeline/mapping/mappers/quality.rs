use super::base::{FieldMapper, MapperUtils};
use crate::constants::{QUALITY_ANNOTATION_KEY, QUALITY_IMPORTER, QUALITY_METRIC_KEY};
use crate::error::Result;
use crate::pipeline::enrich::EnrichmentKind;
use crate::types::{QualityRecord, SourceRecord, TargetRecord};

pub const QUALITY_ATTRIBUTION: &str = "Data Quality is provided by the City of Toronto";

/// Render `score * 100` without rounding, the way the portal displays
/// floats: whole numbers keep one decimal place ("100.0") and magnitudes
/// below 1e-4 or from 1e16 up switch to exponent form ("9.999999999999999e-06").
pub fn format_percentage(score: f64) -> String {
    let pct = score * 100.0;
    if !pct.is_finite() {
        return format!("{pct}");
    }
    let magnitude = pct.abs();
    if pct != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return exponent_form(pct);
    }
    if pct.fract() == 0.0 {
        format!("{pct:.1}")
    } else {
        format!("{pct}")
    }
}

// Rust prints "1e-5"; the portal prints "1e-05"
fn exponent_form(value: f64) -> String {
    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// Human-readable quality annotation; retired datasets report the last
/// recorded score instead of a current one
pub fn format_quality_annotation(quality: &QualityRecord, is_retired: bool) -> String {
    let pct = format_percentage(quality.score);
    if is_retired {
        format!(
            "This dataset is retired. Its Data Quality Score will not be calculated. \
             The last recorded Data Quality Score was {}% ({}) on {}.",
            pct, quality.grade, quality.recorded_at
        )
    } else {
        format!(
            "Data Quality Score: {}% ({}) as of {}",
            pct, quality.grade, quality.recorded_at
        )
    }
}

/// Annotates packages with the data-quality score attached by the quality
/// enrichment stage
pub struct QualityMapper {
    name_prefix: String,
}

impl QualityMapper {
    pub fn new(name_prefix: &str) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
        }
    }
}

impl FieldMapper for QualityMapper {
    fn key(&self) -> &str {
        QUALITY_IMPORTER
    }

    fn name(&self) -> &str {
        "Data Quality Importer"
    }

    fn enrichments(&self) -> &[EnrichmentKind] {
        &[EnrichmentKind::Quality]
    }

    fn map(&self, src: &SourceRecord, mut target: TargetRecord) -> Result<TargetRecord> {
        MapperUtils::apply_identity(&self.name_prefix, src, &mut target);

        if let Some(quality) = &src.quality {
            target.set_extra(
                QUALITY_ANNOTATION_KEY,
                format_quality_annotation(quality, src.is_retired),
            );
            target.set_extra(QUALITY_METRIC_KEY, QUALITY_ATTRIBUTION);
        }

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::super::base::test_support::{skeleton, source};
    use super::*;
    use serde_json::json;

    fn quality(score: f64) -> QualityRecord {
        QualityRecord {
            score,
            grade: "A".to_string(),
            recorded_at: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_active_annotation() {
        assert_eq!(
            format_quality_annotation(&quality(0.875), false),
            "Data Quality Score: 87.5% (A) as of 2024-01-01"
        );
    }

    #[test]
    fn test_retired_annotation() {
        assert_eq!(
            format_quality_annotation(&quality(0.875), true),
            "This dataset is retired. Its Data Quality Score will not be calculated. \
             The last recorded Data Quality Score was 87.5% (A) on 2024-01-01."
        );
    }

    #[test]
    fn test_percentage_is_not_rounded() {
        assert_eq!(format_percentage(0.07), "7.000000000000001");
        assert_eq!(format_percentage(0.1), "10.0");
        assert_eq!(format_percentage(1.0), "100.0");
        assert_eq!(format_percentage(0.0), "0.0");
    }

    #[test]
    fn test_tiny_and_huge_percentages_use_exponent_form() {
        assert_eq!(format_percentage(1.0 / 1_048_576.0), "9.5367431640625e-05");
        assert_eq!(format_percentage(1e15), "1e+17");
        assert_eq!(format_percentage(1.0 / 1024.0), "0.09765625");
    }

    #[test]
    fn test_map_sets_annotation_and_attribution() {
        let mapper = QualityMapper::new("city-toronto");
        let src = source(json!({
            "id": "1", "name": "n", "title": "T", "is_retired": true,
            "quality": {"score": 0.875, "grade": "A", "recorded_at": "2024-01-01"}
        }));

        let target = mapper.map(&src, skeleton()).unwrap();
        assert!(target
            .extra_str(QUALITY_ANNOTATION_KEY)
            .unwrap()
            .contains("last recorded"));
        assert_eq!(target.extra_str(QUALITY_METRIC_KEY), Some(QUALITY_ATTRIBUTION));
    }

    #[test]
    fn test_absent_quality_sets_nothing() {
        let mapper = QualityMapper::new("city-toronto");
        let src = source(json!({"id": "1", "name": "n", "title": "T"}));

        let target = mapper.map(&src, skeleton()).unwrap();
        assert!(!target.extras.contains_key(QUALITY_ANNOTATION_KEY));
        assert!(!target.extras.contains_key(QUALITY_METRIC_KEY));
    }

    #[test]
    fn test_declares_quality_enrichment() {
        assert_eq!(QualityMapper::new("p").enrichments(), &[EnrichmentKind::Quality]);
    }
}

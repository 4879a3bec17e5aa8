use once_cell::sync::Lazy;
use regex::Regex;

use super::base::{FieldMapper, MapperUtils};
use crate::constants::{MAX_TAG_LENGTH, TAG_IMPORTER};
use crate::error::Result;
use crate::types::{SourceRecord, Tag, TargetRecord};

static DISALLOWED_TAG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9 ._-]").expect("static tag pattern is valid"));

/// Remove every character the destination catalog does not accept in tags
pub fn sanitize_tag(name: &str) -> String {
    DISALLOWED_TAG_CHARS.replace_all(name, "").into_owned()
}

/// Sanitized tags in source order, dropping those longer than the limit.
/// Tags that sanitize to an empty string are kept.
pub fn sanitize_tags(tags: &[Tag]) -> Vec<Tag> {
    tags.iter()
        .map(|t| sanitize_tag(&t.name))
        .filter(|t| t.len() <= MAX_TAG_LENGTH)
        .map(Tag::new)
        .collect()
}

/// Rebuilds the tag list with sanitized tag names
pub struct TagMapper {
    name_prefix: String,
}

impl TagMapper {
    pub fn new(name_prefix: &str) -> Self {
        Self {
            name_prefix: name_prefix.to_string(),
        }
    }
}

impl FieldMapper for TagMapper {
    fn key(&self) -> &str {
        TAG_IMPORTER
    }

    fn name(&self) -> &str {
        "Tag Mapping Importer"
    }

    fn map(&self, src: &SourceRecord, mut target: TargetRecord) -> Result<TargetRecord> {
        MapperUtils::apply_identity(&self.name_prefix, src, &mut target);

        if let Some(tags) = src.tags.as_deref().filter(|t| !t.is_empty()) {
            target.tags = Some(sanitize_tags(tags));
        }

        Ok(target)
    }
}

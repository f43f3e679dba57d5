//! Record layouts: the declared byte shape of one packet kind.
//!
//! A [`RecordLayout`] is an explicit descriptor table, written by hand and
//! checked against the legacy struct definition.  It never depends on Rust's
//! own struct layout rules; the `total_size` is declared rather than summed
//! from field widths because trailing alignment padding belongs to no field.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::protocol::field::{FieldDescriptor, FieldRole, FieldType};

/// Errors detected while building a [`RecordLayout`].
///
/// Every structural problem is caught here, at startup, so decode never has
/// to second-guess the table it is working from.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// A layout must describe at least one byte.
    #[error("layout for kind {kind_tag} declares a total size of zero")]
    ZeroSize { kind_tag: u32 },

    /// A field extends past the end of the record.
    #[error(
        "field `{field}` at offset {offset} with width {width} exceeds total size {total_size}"
    )]
    OutOfBounds {
        field: &'static str,
        offset: usize,
        width: usize,
        total_size: usize,
    },

    /// The width is not legal for the field's type.
    #[error("field `{field}` has illegal width {width} for its type")]
    InvalidWidth { field: &'static str, width: usize },

    /// Reserved and padding regions must be raw bytes.
    #[error("placeholder `{field}` at offset {offset} must be raw bytes")]
    PlaceholderNotRaw { field: &'static str, offset: usize },

    /// Two named fields share bytes.
    #[error("fields `{first}` and `{second}` overlap")]
    Overlap {
        first: &'static str,
        second: &'static str,
    },

    /// Two named fields share a label.
    #[error("field name `{0}` is declared more than once")]
    DuplicateField(&'static str),

    /// Two placeholders start at the same offset.
    #[error("placeholders `{first}` and `{second}` both start at offset {offset}")]
    PlaceholderOffsetClash {
        first: &'static str,
        second: &'static str,
        offset: usize,
    },
}

/// The complete byte layout of one packet kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    kind_tag: u32,
    name: &'static str,
    fields: Vec<FieldDescriptor>,
    total_size: usize,
}

impl RecordLayout {
    /// Validates and builds a layout.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the size is zero, a field lies outside the
    /// record, a width is illegal for its type, a placeholder is not raw
    /// bytes, a named field is declared twice, two fields overlap where
    /// neither is a placeholder, or two placeholders start at one offset.
    pub fn new(
        kind_tag: u32,
        name: &'static str,
        fields: Vec<FieldDescriptor>,
        total_size: usize,
    ) -> Result<Self, LayoutError> {
        if total_size == 0 {
            return Err(LayoutError::ZeroSize { kind_tag });
        }

        let mut names = HashSet::new();
        // Decoded placeholder bytes are keyed by offset.
        let mut placeholder_at: HashMap<usize, &'static str> = HashMap::new();
        for field in &fields {
            if !field.ty.accepts_width(field.width) {
                return Err(LayoutError::InvalidWidth {
                    field: field.name,
                    width: field.width,
                });
            }
            if field.is_placeholder() && field.ty != FieldType::RawBytes {
                return Err(LayoutError::PlaceholderNotRaw {
                    field: field.name,
                    offset: field.offset,
                });
            }
            match field.end() {
                Some(end) if end <= total_size => {}
                _ => {
                    return Err(LayoutError::OutOfBounds {
                        field: field.name,
                        offset: field.offset,
                        width: field.width,
                        total_size,
                    })
                }
            }
            if field.role == FieldRole::Named && !names.insert(field.name) {
                return Err(LayoutError::DuplicateField(field.name));
            }
            if field.is_placeholder() {
                if let Some(first) = placeholder_at.insert(field.offset, field.name) {
                    return Err(LayoutError::PlaceholderOffsetClash {
                        first,
                        second: field.name,
                        offset: field.offset,
                    });
                }
            }
        }

        for (i, a) in fields.iter().enumerate() {
            for b in &fields[i + 1..] {
                if !a.is_placeholder() && !b.is_placeholder() && a.overlaps(b) {
                    return Err(LayoutError::Overlap {
                        first: a.name,
                        second: b.name,
                    });
                }
            }
        }

        Ok(Self {
            kind_tag,
            name,
            fields,
            total_size,
        })
    }

    /// Kind tag identifying this packet type on the wire.
    pub fn kind_tag(&self) -> u32 {
        self.kind_tag
    }

    /// Short human-readable name, e.g. `"tflight"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Exact byte length of one record of this kind.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fields that decode into typed values.
    pub fn named_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields.iter().filter(|f| !f.is_placeholder())
    }

    /// Reserved and padding regions.
    pub fn placeholders(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields.iter().filter(|f| f.is_placeholder())
    }

    /// Looks up a named field by label.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.named_fields().find(|f| f.name == name)
    }

    /// Number of bytes covered by no field at all.
    ///
    /// Zero for a fully described layout; the encoder zero-fills any gap.
    pub fn uncovered_bytes(&self) -> usize {
        let mut covered = vec![false; self.total_size];
        for field in &self.fields {
            if let Some(slots) = covered.get_mut(field.range()) {
                slots.iter_mut().for_each(|c| *c = true);
            }
        }
        covered.iter().filter(|c| !**c).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::signed("a", 0, 2),
            FieldDescriptor::padding(2, 2),
            FieldDescriptor::float("b", 4),
        ]
    }

    #[test]
    fn test_valid_layout_builds() {
        let layout = RecordLayout::new(3, "small", small_fields(), 8).unwrap();
        assert_eq!(layout.kind_tag(), 3);
        assert_eq!(layout.name(), "small");
        assert_eq!(layout.total_size(), 8);
        assert_eq!(layout.named_fields().count(), 2);
        assert_eq!(layout.placeholders().count(), 1);
        assert_eq!(layout.uncovered_bytes(), 0);
    }

    #[test]
    fn test_total_size_is_not_recomputed_from_fields() {
        // Trailing alignment bytes belong to no field.
        let layout = RecordLayout::new(3, "small", small_fields(), 12).unwrap();
        assert_eq!(layout.total_size(), 12);
        assert_eq!(layout.uncovered_bytes(), 4);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = RecordLayout::new(9, "empty", vec![], 0).unwrap_err();
        assert_eq!(err, LayoutError::ZeroSize { kind_tag: 9 });
    }

    #[test]
    fn test_field_past_end_is_rejected() {
        let err = RecordLayout::new(1, "short", small_fields(), 7).unwrap_err();
        assert!(matches!(err, LayoutError::OutOfBounds { field: "b", .. }));
    }

    #[test]
    fn test_offset_overflow_is_rejected() {
        let fields = vec![FieldDescriptor::reserved("far", usize::MAX - 1, 4)];
        let err = RecordLayout::new(1, "far", fields, 16).unwrap_err();
        assert!(matches!(err, LayoutError::OutOfBounds { field: "far", .. }));
    }

    #[test]
    fn test_overlapping_named_fields_are_rejected() {
        let fields = vec![
            FieldDescriptor::signed("a", 0, 4),
            FieldDescriptor::unsigned("b", 2, 2),
        ];
        let err = RecordLayout::new(1, "overlap", fields, 4).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Overlap {
                first: "a",
                second: "b"
            }
        );
    }

    #[test]
    fn test_placeholder_may_overlap_named_field() {
        let fields = vec![
            FieldDescriptor::signed("a", 0, 4),
            FieldDescriptor::reserved("shadow", 2, 2),
        ];
        assert!(RecordLayout::new(1, "shadow", fields, 4).is_ok());
    }

    #[test]
    fn test_placeholders_sharing_an_offset_are_rejected() {
        let fields = vec![
            FieldDescriptor::reserved("u1", 0, 4),
            FieldDescriptor::padding(0, 2),
        ];
        let err = RecordLayout::new(77, "clash", fields, 4).unwrap_err();
        assert_eq!(
            err,
            LayoutError::PlaceholderOffsetClash {
                first: "u1",
                second: "(pad)",
                offset: 0
            }
        );
    }

    #[test]
    fn test_placeholders_may_overlap_at_different_offsets() {
        let fields = vec![
            FieldDescriptor::reserved("u1", 0, 4),
            FieldDescriptor::padding(2, 2),
        ];
        assert!(RecordLayout::new(77, "nested", fields, 4).is_ok());
    }

    #[test]
    fn test_illegal_width_is_rejected() {
        let fields = vec![FieldDescriptor::signed("odd", 0, 3)];
        let err = RecordLayout::new(1, "odd", fields, 4).unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidWidth {
                field: "odd",
                width: 3
            }
        );
    }

    #[test]
    fn test_typed_placeholder_is_rejected() {
        let fields = vec![FieldDescriptor {
            name: "u9",
            offset: 0,
            width: 2,
            ty: FieldType::SignedInt,
            role: FieldRole::Reserved,
        }];
        let err = RecordLayout::new(1, "typed", fields, 2).unwrap_err();
        assert_eq!(
            err,
            LayoutError::PlaceholderNotRaw {
                field: "u9",
                offset: 0
            }
        );
    }

    #[test]
    fn test_duplicate_named_field_is_rejected() {
        let fields = vec![
            FieldDescriptor::signed("a", 0, 2),
            FieldDescriptor::signed("a", 2, 2),
        ];
        let err = RecordLayout::new(1, "dup", fields, 4).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateField("a"));
    }

    #[test]
    fn test_padding_regions_may_share_a_label() {
        let fields = vec![
            FieldDescriptor::padding(0, 1),
            FieldDescriptor::signed("a", 1, 1),
            FieldDescriptor::padding(2, 2),
        ];
        assert!(RecordLayout::new(1, "pads", fields, 4).is_ok());
    }

    #[test]
    fn test_field_lookup_ignores_placeholders() {
        let layout = RecordLayout::new(3, "small", small_fields(), 8).unwrap();
        assert_eq!(layout.field("b").map(|f| f.offset), Some(4));
        assert!(layout.field("(pad)").is_none());
        assert!(layout.field("missing").is_none());
    }
}

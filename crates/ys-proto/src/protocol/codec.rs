//! Layout-driven binary codec for fixed-size records.
//!
//! Wire format of every kind:
//! ```text
//! [field @ offset, width bytes, little-endian] ... exactly total_size bytes
//! ```
//! The engine knows nothing about individual kinds.  It walks a
//! [`RecordLayout`] and moves bytes between a buffer and a [`FieldSet`]; the
//! typed [`Record`] wrappers at the bottom of this file convert between the
//! generic and the typed form.
//!
//! # Size validation
//!
//! The buffer length is checked against `total_size` before a single field
//! is read.  Shorter buffers are always rejected.  Longer buffers are
//! rejected unless the [`DecodePolicy`] explicitly tolerates trailing bytes
//! (some transports append a footer the codec must not silently swallow).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::protocol::field::{FieldDescriptor, Value};
use crate::protocol::layout::{LayoutError, RecordLayout};
use crate::protocol::record::Record;

/// Errors that can occur while registering, decoding, encoding or routing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProtocolError {
    /// No layout is registered for this kind tag.
    #[error("unknown kind: {0}")]
    UnknownKind(u32),

    /// A layout is already registered for this kind tag.
    #[error("duplicate kind: {0} is already registered")]
    DuplicateKind(u32),

    /// The buffer is shorter than the kind's declared size.
    #[error("truncated buffer: need {needed} bytes, got {available}")]
    TruncatedBuffer { needed: usize, available: usize },

    /// The buffer is longer than the kind's declared size and the decode
    /// policy does not tolerate that many trailing bytes.
    #[error("oversized buffer: expected {expected} bytes, got {available}")]
    OversizedBuffer { expected: usize, available: usize },

    /// A record was handed to the layout of a different kind.
    #[error("kind mismatch: layout is for kind {expected}, record is kind {found}")]
    KindMismatch { expected: u32, found: u32 },

    /// A named field has no value in the field set.
    #[error("missing value for field `{0}`")]
    MissingField(String),

    /// A value's type or width disagrees with its descriptor.
    #[error("type mismatch for field `{0}`")]
    TypeMismatch(String),

    /// Stored reserved bytes are not exactly as wide as their region.
    #[error("reserved region at offset {offset} is {expected} bytes, got {found}")]
    ReservedLengthMismatch {
        offset: usize,
        expected: usize,
        found: usize,
    },

    /// A layout failed validation.
    #[error("invalid layout: {0}")]
    InvalidLayout(#[from] LayoutError),
}

// ── Decode policy ─────────────────────────────────────────────────────────────

/// What to do with bytes past the end of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrailingBytes {
    /// Any byte past `total_size` is an [`ProtocolError::OversizedBuffer`].
    #[default]
    Reject,
    /// Up to `max` extra bytes are ignored and never read.
    Allow { max: usize },
}

/// Per-deployment decode settings.
///
/// The default is strict: the buffer must be exactly `total_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodePolicy {
    pub trailing_bytes: TrailingBytes,
}

impl DecodePolicy {
    /// Exact-length decoding.
    pub const fn strict() -> Self {
        Self {
            trailing_bytes: TrailingBytes::Reject,
        }
    }

    /// Tolerates up to `max` bytes after the record (e.g. a checksum footer).
    pub const fn allow_trailing(max: usize) -> Self {
        Self {
            trailing_bytes: TrailingBytes::Allow { max },
        }
    }

    /// Checks a buffer length against a layout under this policy.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::TruncatedBuffer`] or
    /// [`ProtocolError::OversizedBuffer`].
    pub fn check_len(&self, available: usize, layout: &RecordLayout) -> Result<(), ProtocolError> {
        let expected = layout.total_size();
        if available < expected {
            return Err(ProtocolError::TruncatedBuffer {
                needed: expected,
                available,
            });
        }
        let extra = available - expected;
        let tolerated = match self.trailing_bytes {
            TrailingBytes::Reject => 0,
            TrailingBytes::Allow { max } => max,
        };
        if extra > tolerated {
            return Err(ProtocolError::OversizedBuffer {
                expected,
                available,
            });
        }
        Ok(())
    }
}

// ── Generic decoded form ──────────────────────────────────────────────────────

/// Generic decoded form of one record.
///
/// Named values are keyed by field label; placeholder bytes are keyed by
/// their offset in the record.  A `FieldSet` owns all of its data and never
/// borrows from the buffer it was decoded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSet {
    kind_tag: u32,
    values: BTreeMap<String, Value>,
    reserved: BTreeMap<usize, Vec<u8>>,
}

impl FieldSet {
    /// Creates an empty field set for `kind_tag`.
    pub fn new(kind_tag: u32) -> Self {
        Self {
            kind_tag,
            values: BTreeMap::new(),
            reserved: BTreeMap::new(),
        }
    }

    pub fn kind_tag(&self) -> u32 {
        self.kind_tag
    }

    /// Returns the value of a named field, if present.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Sets (or replaces) the value of a named field.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Returns the stored bytes of the placeholder at `offset`.
    pub fn reserved(&self, offset: usize) -> Option<&[u8]> {
        self.reserved.get(&offset).map(Vec::as_slice)
    }

    /// Stores the bytes of the placeholder at `offset`.
    pub fn set_reserved(&mut self, offset: usize, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.reserved.insert(offset, bytes.into());
        self
    }

    /// Named values in label order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Placeholder regions in offset order.
    pub fn reserved_regions(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        self.reserved.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    fn require(&self, name: &str) -> Result<&Value, ProtocolError> {
        self.get(name)
            .ok_or_else(|| ProtocolError::MissingField(name.to_string()))
    }

    /// Reads a named `i8` field.
    pub fn i8(&self, name: &str) -> Result<i8, ProtocolError> {
        match self.require(name)? {
            Value::I8(v) => Ok(*v),
            _ => Err(ProtocolError::TypeMismatch(name.to_string())),
        }
    }

    /// Reads a named `i16` field.
    pub fn i16(&self, name: &str) -> Result<i16, ProtocolError> {
        match self.require(name)? {
            Value::I16(v) => Ok(*v),
            _ => Err(ProtocolError::TypeMismatch(name.to_string())),
        }
    }

    /// Reads a named `i32` field.
    pub fn i32(&self, name: &str) -> Result<i32, ProtocolError> {
        match self.require(name)? {
            Value::I32(v) => Ok(*v),
            _ => Err(ProtocolError::TypeMismatch(name.to_string())),
        }
    }

    /// Reads a named `u8` field.
    pub fn u8(&self, name: &str) -> Result<u8, ProtocolError> {
        match self.require(name)? {
            Value::U8(v) => Ok(*v),
            _ => Err(ProtocolError::TypeMismatch(name.to_string())),
        }
    }

    /// Reads a named `u16` field.
    pub fn u16(&self, name: &str) -> Result<u16, ProtocolError> {
        match self.require(name)? {
            Value::U16(v) => Ok(*v),
            _ => Err(ProtocolError::TypeMismatch(name.to_string())),
        }
    }

    /// Reads a named `u32` field.
    pub fn u32(&self, name: &str) -> Result<u32, ProtocolError> {
        match self.require(name)? {
            Value::U32(v) => Ok(*v),
            _ => Err(ProtocolError::TypeMismatch(name.to_string())),
        }
    }

    /// Reads a named `f32` field.
    pub fn f32(&self, name: &str) -> Result<f32, ProtocolError> {
        match self.require(name)? {
            Value::F32(v) => Ok(*v),
            _ => Err(ProtocolError::TypeMismatch(name.to_string())),
        }
    }

    /// Copies the placeholder at `offset` into a fixed-size array.
    ///
    /// A region that was never stored reads as zeros, matching what the
    /// encoder would write for it.
    pub fn reserved_array<const N: usize>(&self, offset: usize) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        if let Some(bytes) = self.reserved(offset) {
            if bytes.len() != N {
                return Err(ProtocolError::ReservedLengthMismatch {
                    offset,
                    expected: N,
                    found: bytes.len(),
                });
            }
            out.copy_from_slice(bytes);
        }
        Ok(out)
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one record of `layout`'s kind from `buffer`.
///
/// Each field is an independent read at its declared offset, so the result
/// does not depend on the order fields were declared in.  Bytes outside
/// `[0, total_size)` are never read.
///
/// # Errors
///
/// Returns [`ProtocolError::TruncatedBuffer`] or
/// [`ProtocolError::OversizedBuffer`] if the length check fails; no field is
/// read in that case.
///
/// # Examples
///
/// ```rust
/// use ys_proto::protocol::codec::{decode, encode, DecodePolicy};
/// use ys_proto::protocol::field::FieldDescriptor;
/// use ys_proto::protocol::layout::RecordLayout;
///
/// let layout = RecordLayout::new(
///     42,
///     "demo",
///     vec![
///         FieldDescriptor::unsigned("count", 0, 2),
///         FieldDescriptor::reserved("u1", 2, 2),
///     ],
///     4,
/// )
/// .unwrap();
///
/// let bytes = [0x05, 0x00, 0xAA, 0xBB];
/// let set = decode(&bytes, &layout, DecodePolicy::strict()).unwrap();
/// assert_eq!(set.u16("count").unwrap(), 5);
/// assert_eq!(set.reserved(2), Some(&[0xAA, 0xBB][..]));
/// assert_eq!(encode(&set, &layout).unwrap(), bytes);
/// ```
pub fn decode(
    buffer: &[u8],
    layout: &RecordLayout,
    policy: DecodePolicy,
) -> Result<FieldSet, ProtocolError> {
    policy.check_len(buffer.len(), layout)?;
    let record = &buffer[..layout.total_size()];

    let mut set = FieldSet::new(layout.kind_tag());
    for field in layout.fields() {
        let bytes = region(record, field)?;
        if field.is_placeholder() {
            set.reserved.insert(field.offset, bytes.to_vec());
        } else {
            let value = Value::from_le_slice(field.ty, bytes)
                .ok_or_else(|| ProtocolError::TypeMismatch(field.name.to_string()))?;
            set.values.insert(field.name.to_string(), value);
        }
    }

    trace!(
        "decoded kind {} ({}), {} bytes",
        layout.kind_tag(),
        layout.name(),
        layout.total_size()
    );
    Ok(set)
}

/// Encodes `set` into exactly `layout.total_size()` bytes.
///
/// Placeholders are written first from the stored bytes, then every named
/// field.  Any byte covered by neither stays zero.
///
/// # Errors
///
/// Returns [`ProtocolError::KindMismatch`] if `set` belongs to another kind,
/// [`ProtocolError::MissingField`] or [`ProtocolError::TypeMismatch`] if a
/// named value is absent or has the wrong shape, and
/// [`ProtocolError::ReservedLengthMismatch`] if stored placeholder bytes have
/// the wrong length.
pub fn encode(set: &FieldSet, layout: &RecordLayout) -> Result<Vec<u8>, ProtocolError> {
    if set.kind_tag() != layout.kind_tag() {
        return Err(ProtocolError::KindMismatch {
            expected: layout.kind_tag(),
            found: set.kind_tag(),
        });
    }

    let mut buf = vec![0u8; layout.total_size()];

    for field in layout.placeholders() {
        let Some(stored) = set.reserved(field.offset) else {
            continue;
        };
        if stored.len() != field.width {
            return Err(ProtocolError::ReservedLengthMismatch {
                offset: field.offset,
                expected: field.width,
                found: stored.len(),
            });
        }
        region_mut(&mut buf, field)?.copy_from_slice(stored);
    }

    for field in layout.named_fields() {
        let value = set.require(field.name)?;
        if !value.fits(field) || !value.write_le(region_mut(&mut buf, field)?) {
            return Err(ProtocolError::TypeMismatch(field.name.to_string()));
        }
    }

    trace!(
        "encoded kind {} ({}), {} bytes",
        layout.kind_tag(),
        layout.name(),
        buf.len()
    );
    Ok(buf)
}

/// Decodes `buffer` and converts the result into a typed [`Record`].
///
/// # Errors
///
/// Everything [`decode`] returns, plus conversion errors if `layout`'s tag
/// belongs to a typed kind but the layout does not match that kind.
pub fn decode_record(
    buffer: &[u8],
    layout: &RecordLayout,
    policy: DecodePolicy,
) -> Result<Record, ProtocolError> {
    Record::from_field_set(decode(buffer, layout, policy)?)
}

/// Encodes a typed [`Record`] against `layout`.
///
/// # Errors
///
/// Everything [`encode`] returns.
pub fn encode_record(record: &Record, layout: &RecordLayout) -> Result<Vec<u8>, ProtocolError> {
    encode(&record.to_field_set(), layout)
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn region<'a>(buf: &'a [u8], field: &FieldDescriptor) -> Result<&'a [u8], ProtocolError> {
    let available = buf.len();
    buf.get(field.range())
        .ok_or(ProtocolError::TruncatedBuffer {
            needed: field.offset.saturating_add(field.width),
            available,
        })
}

fn region_mut<'a>(
    buf: &'a mut [u8],
    field: &FieldDescriptor,
) -> Result<&'a mut [u8], ProtocolError> {
    let available = buf.len();
    buf.get_mut(field.range())
        .ok_or(ProtocolError::TruncatedBuffer {
            needed: field.offset.saturating_add(field.width),
            available,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

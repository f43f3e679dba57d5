//! Kind dispatch: from `(kind tag, payload)` to a typed [`Record`] and back.
//!
//! Frame body as handed over by the framing layer:
//! ```text
//! [kind_tag:4 LE][payload: total_size bytes of that kind]
//! ```
//! The dispatcher is the one place where a registry miss turns into a
//! protocol-level error visible to callers, so it is also where rejected
//! packets are logged.  Errors are propagated unchanged; whether to drop the
//! packet or disconnect the peer is the caller's decision.

use tracing::{trace, warn};

use crate::protocol::codec::{decode_record, encode_record, DecodePolicy, ProtocolError};
use crate::protocol::record::Record;
use crate::protocol::registry::KindRegistry;

/// Size of the kind tag that opens a frame body.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Splits a frame body into its kind tag and payload.
///
/// # Errors
///
/// Returns [`ProtocolError::TruncatedBuffer`] if fewer than
/// [`FRAME_HEADER_SIZE`] bytes are available.
pub fn split_frame(frame: &[u8]) -> Result<(u32, &[u8]), ProtocolError> {
    match frame {
        [a, b, c, d, payload @ ..] => Ok((u32::from_le_bytes([*a, *b, *c, *d]), payload)),
        _ => Err(ProtocolError::TruncatedBuffer {
            needed: FRAME_HEADER_SIZE,
            available: frame.len(),
        }),
    }
}

/// Routes buffers to the codec through an injected [`KindRegistry`].
///
/// The dispatcher holds no state of its own beyond the registry reference
/// and the decode policy, so one instance can be shared across threads.
///
/// # Examples
///
/// ```rust
/// use ys_proto::{DecodePolicy, Dispatcher, FlightState, KindRegistry, Record};
///
/// let registry = KindRegistry::standard().unwrap();
/// let dispatcher = Dispatcher::new(&registry, DecodePolicy::strict());
///
/// let record = Record::Flight(FlightState { id: 7, ..FlightState::default() });
/// let frame = dispatcher.frame(&record).unwrap();
/// assert_eq!(frame.len(), 4 + 72);
/// assert_eq!(dispatcher.route_frame(&frame).unwrap(), record);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'r> {
    registry: &'r KindRegistry,
    policy: DecodePolicy,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r KindRegistry, policy: DecodePolicy) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &'r KindRegistry {
        self.registry
    }

    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Decodes `payload` as a record of kind `kind_tag`.
    ///
    /// An unknown kind is reported before the payload is looked at.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownKind`], or whatever the codec reports
    /// for the payload (`TruncatedBuffer`, `OversizedBuffer`, ...).
    pub fn route(&self, kind_tag: u32, payload: &[u8]) -> Result<Record, ProtocolError> {
        let layout = self.registry.lookup(kind_tag).map_err(|e| {
            warn!("dropping packet of unknown kind {kind_tag} ({} bytes)", payload.len());
            e
        })?;
        let record = decode_record(payload, layout, self.policy).map_err(|e| {
            warn!("rejecting kind {kind_tag} ({}): {e}", layout.name());
            e
        })?;
        trace!("routed kind {kind_tag} ({})", layout.name());
        Ok(record)
    }

    /// Splits a frame body and routes its payload.
    ///
    /// # Errors
    ///
    /// Everything [`split_frame`] and [`Dispatcher::route`] return.
    pub fn route_frame(&self, frame: &[u8]) -> Result<Record, ProtocolError> {
        let (kind_tag, payload) = split_frame(frame).map_err(|e| {
            warn!("rejecting frame: {e}");
            e
        })?;
        self.route(kind_tag, payload)
    }

    /// Encodes `record` into exactly its kind's `total_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownKind`] if the record's kind is not
    /// registered, or whatever the codec reports.
    pub fn emit(&self, record: &Record) -> Result<Vec<u8>, ProtocolError> {
        let layout = self.registry.lookup(record.kind_tag())?;
        encode_record(record, layout)
    }

    /// Encodes `record` and prefixes it with its kind tag.
    ///
    /// # Errors
    ///
    /// Everything [`Dispatcher::emit`] returns.
    pub fn frame(&self, record: &Record) -> Result<Vec<u8>, ProtocolError> {
        let payload = self.emit(record)?;
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
        buf.extend_from_slice(&record.kind_tag().to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }
}

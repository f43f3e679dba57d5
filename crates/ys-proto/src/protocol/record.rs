//! Typed records: one enum variant per known packet kind.

use serde::{Deserialize, Serialize};

use crate::kinds::flight::{self, FlightState};
use crate::protocol::codec::{FieldSet, ProtocolError};
use crate::protocol::layout::{LayoutError, RecordLayout};

/// A packet kind with a typed in-memory representation.
///
/// Adding a kind means writing its descriptor table and the two conversions;
/// the codec engine itself does not change.
pub trait KindRecord: Sized {
    /// Kind tag on the wire.
    const KIND: u32;

    /// The declared byte layout of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the descriptor table is inconsistent.
    fn layout() -> Result<RecordLayout, LayoutError>;

    /// Builds the typed record from a decoded field set.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingField`] or
    /// [`ProtocolError::TypeMismatch`] if the set does not have this kind's
    /// shape.
    fn from_field_set(set: &FieldSet) -> Result<Self, ProtocolError>;

    /// Flattens the typed record back into a field set.
    fn to_field_set(&self) -> FieldSet;
}

/// A decoded packet of any registered kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    /// Kind 11, "tflight": per-tick flight telemetry.
    Flight(FlightState),
    /// A kind registered by layout alone, without a typed variant.
    Untyped(FieldSet),
}

impl Record {
    /// Kind tag of the wrapped record.
    pub fn kind_tag(&self) -> u32 {
        match self {
            Record::Flight(_) => FlightState::KIND,
            Record::Untyped(set) => set.kind_tag(),
        }
    }

    /// Converts a decoded field set into the matching typed variant.
    ///
    /// Tags without a typed variant come back as [`Record::Untyped`].
    ///
    /// # Errors
    ///
    /// Returns the conversion error of the typed kind if the set's tag has a
    /// typed variant but its fields do not match.
    pub fn from_field_set(set: FieldSet) -> Result<Self, ProtocolError> {
        match set.kind_tag() {
            flight::KIND => FlightState::from_field_set(&set).map(Record::Flight),
            _ => Ok(Record::Untyped(set)),
        }
    }

    /// Flattens the record into its generic form.
    pub fn to_field_set(&self) -> FieldSet {
        match self {
            Record::Flight(m) => m.to_field_set(),
            Record::Untyped(set) => set.clone(),
        }
    }
}

impl From<FlightState> for Record {
    fn from(value: FlightState) -> Self {
        Record::Flight(value)
    }
}

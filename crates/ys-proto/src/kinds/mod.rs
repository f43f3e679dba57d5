//! Declarative layouts of the packet kinds compiled into the library.
//!
//! Each kind lives in its own module and contributes a descriptor table plus
//! a [`KindRecord`](crate::protocol::record::KindRecord) implementation.

pub mod flight;

use crate::protocol::layout::{LayoutError, RecordLayout};
use crate::protocol::record::KindRecord;

/// Builds the layout of every compiled-in kind.
///
/// # Errors
///
/// Returns the first [`LayoutError`] found in any table.
pub fn standard_layouts() -> Result<Vec<RecordLayout>, LayoutError> {
    Ok(vec![flight::FlightState::layout()?])
}

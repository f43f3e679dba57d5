//! Protocol module containing the layout model, the codec engine and kind dispatch.

pub mod codec;
pub mod dispatch;
pub mod field;
pub mod layout;
pub mod record;
pub mod registry;

pub use codec::{decode, encode, DecodePolicy, FieldSet, ProtocolError, TrailingBytes};
pub use dispatch::{split_frame, Dispatcher, FRAME_HEADER_SIZE};
pub use field::{FieldDescriptor, FieldRole, FieldType, Value};
pub use layout::{LayoutError, RecordLayout};
pub use record::{KindRecord, Record};
pub use registry::KindRegistry;

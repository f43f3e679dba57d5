//! # ys-proto
//!
//! Packet codec core of the flight simulator network protocol.  Translates
//! between the fixed-size little-endian records exchanged by multiplayer
//! participants and strongly-typed Rust values, reproducing the legacy binary
//! layout byte-for-byte.
//!
//! The crate performs no I/O: transports hand it `(kind tag, payload)` pairs
//! and get byte vectors back.
//!
//! # Architecture overview (for beginners)
//!
//! Every network message is a *record* whose bytes were originally a C struct
//! copied out of memory.  Records are identified by an integer *kind tag*
//! (kind 11 is flight telemetry).  This crate is organised in layers:
//!
//! - **`protocol::field` / `protocol::layout`** – a declarative description of
//!   where every field lives: offset, width, type, and whether the bytes are
//!   meaningful or a reserved placeholder.
//!
//! - **`protocol::registry`** – the table that maps kind tags to layouts.  It
//!   is filled once at startup and then only read.
//!
//! - **`protocol::codec`** – the engine.  Given a layout it turns bytes into a
//!   generic `FieldSet` and back.  It validates buffer length before reading
//!   anything and copies reserved bytes verbatim, so decode followed by encode
//!   reproduces the original packet exactly.
//!
//! - **`protocol::record` / `kinds`** – the typed view: one `Record` variant
//!   per known kind, built from the generic form.
//!
//! - **`protocol::dispatch`** – glues the pieces together for callers: look
//!   the kind up, decode, hand back a `Record`.
//!
//! - **`config`** – deployment settings such as trailing-byte tolerance.

pub mod config;
pub mod kinds;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `ys_proto::Dispatcher` instead of `ys_proto::protocol::dispatch::Dispatcher`.
pub use config::{CodecConfig, ConfigError};
pub use kinds::flight::FlightState;
pub use protocol::codec::{
    decode, decode_record, encode, encode_record, DecodePolicy, FieldSet, ProtocolError,
};
pub use protocol::dispatch::Dispatcher;
pub use protocol::layout::{LayoutError, RecordLayout};
pub use protocol::record::{KindRecord, Record};
pub use protocol::registry::KindRegistry;

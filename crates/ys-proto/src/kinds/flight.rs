//! Kind 11, "tflight": per-tick flight telemetry of one aircraft.
//!
//! The layout reproduces the legacy client's in-memory struct: little-endian,
//! natural alignment, structure size padded to a multiple of 4.
//!
//! ```text
//! offset  width  field
//!  0      4      stopWatch
//!  4      4      ID
//!  8      2      i1            5 => damage count fits in a byte, 3 otherwise
//! 10      2      (pad)
//! 12      4x3    x, z, y       f32, in that order
//! 24      2x6    heading, AOA, bank, xSpeed, ySpeed, zSpeed
//! 36      8      u2            reserved
//! 44      2      fuel
//! 46      6      u3            reserved
//! 52      1x4    spoilerBrake, flapsGear, afterburnerSmokeTrailsGunfire, u4
//! 56      2      gunAmmo
//! 58      1x6    rockets, u5, AAM, AGM, bombs, lives
//! 64      2      u6            reserved
//! 66      1x2    elevator, aileron
//! 68      2      u7            reserved
//! 70      1      trim
//! 71      1      (pad)
//! ```
//! Total: 72 bytes.

use serde::{Deserialize, Serialize};

use crate::protocol::codec::{FieldSet, ProtocolError};
use crate::protocol::field::{FieldDescriptor, Value};
use crate::protocol::layout::{LayoutError, RecordLayout};
use crate::protocol::record::KindRecord;

/// Kind tag of flight telemetry records.
pub const KIND: u32 = 11;

/// Size of one flight telemetry record in bytes.
pub const SIZE: usize = 72;

// Placeholder offsets, shared by the table and the conversions below.
const PAD_I1: usize = 10;
const U2: usize = 36;
const U3: usize = 46;
const U4: usize = 55;
const U5: usize = 59;
const U6: usize = 64;
const U7: usize = 68;
const PAD_TAIL: usize = 71;

/// Descriptor table for kind 11, in legacy declaration order.
pub const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::signed("stopWatch", 0, 4),
    FieldDescriptor::signed("ID", 4, 4),
    FieldDescriptor::signed("i1", 8, 2),
    FieldDescriptor::padding(PAD_I1, 2),
    FieldDescriptor::float("x", 12),
    FieldDescriptor::float("z", 16),
    FieldDescriptor::float("y", 20),
    FieldDescriptor::signed("heading", 24, 2),
    FieldDescriptor::signed("AOA", 26, 2),
    FieldDescriptor::signed("bank", 28, 2),
    FieldDescriptor::signed("xSpeed", 30, 2),
    FieldDescriptor::signed("ySpeed", 32, 2),
    FieldDescriptor::signed("zSpeed", 34, 2),
    FieldDescriptor::reserved("u2", U2, 8),
    FieldDescriptor::signed("fuel", 44, 2),
    FieldDescriptor::reserved("u3", U3, 6),
    FieldDescriptor::unsigned("spoilerBrake", 52, 1),
    FieldDescriptor::unsigned("flapsGear", 53, 1),
    FieldDescriptor::unsigned("afterburnerSmokeTrailsGunfire", 54, 1),
    FieldDescriptor::reserved("u4", U4, 1),
    FieldDescriptor::signed("gunAmmo", 56, 2),
    FieldDescriptor::unsigned("rockets", 58, 1),
    FieldDescriptor::reserved("u5", U5, 1),
    FieldDescriptor::unsigned("AAM", 60, 1),
    FieldDescriptor::unsigned("AGM", 61, 1),
    FieldDescriptor::unsigned("bombs", 62, 1),
    FieldDescriptor::unsigned("lives", 63, 1),
    FieldDescriptor::reserved("u6", U6, 2),
    FieldDescriptor::signed("elevator", 66, 1),
    FieldDescriptor::signed("aileron", 67, 1),
    FieldDescriptor::reserved("u7", U7, 2),
    FieldDescriptor::signed("trim", 70, 1),
    FieldDescriptor::padding(PAD_TAIL, 1),
];

/// Flight telemetry of one aircraft at one simulation tick.
///
/// Field values are carried as-is; the codec does not interpret them.
/// Every reserved and padding region is kept as a byte array so that
/// re-encoding reproduces the received packet exactly.
///
/// Equality compares the position floats by bit pattern, so a record
/// carrying a NaN coordinate still equals its own decoded copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightState {
    /// Elapsed-time counter.
    pub stop_watch: i32,
    /// Entity identifier of the aircraft.
    pub id: i32,
    /// Variant tag: 5 when the damage count is a single byte, 3 otherwise.
    pub i1: i16,
    pub pad_after_i1: [u8; 2],
    pub x: f32,
    pub z: f32,
    pub y: f32,
    pub heading: i16,
    pub aoa: i16,
    pub bank: i16,
    pub x_speed: i16,
    pub y_speed: i16,
    pub z_speed: i16,
    pub u2: [u8; 8],
    pub fuel: i16,
    pub u3: [u8; 6],
    /// Bit-packed spoiler and brake state.
    pub spoiler_brake: u8,
    /// Bit-packed flaps and landing gear state.
    pub flaps_gear: u8,
    /// Bit-packed afterburner, smoke, trails and gunfire flags.
    pub afterburner_smoke_trails_gunfire: u8,
    pub u4: [u8; 1],
    pub gun_ammo: i16,
    pub rockets: u8,
    pub u5: [u8; 1],
    /// Air-to-air missiles.
    pub aam: u8,
    /// Air-to-ground missiles.
    pub agm: u8,
    pub bombs: u8,
    pub lives: u8,
    pub u6: [u8; 2],
    /// Elevator control-surface position.
    pub elevator: i8,
    /// Aileron control-surface position.
    pub aileron: i8,
    pub u7: [u8; 2],
    pub trim: i8,
    pub pad_tail: [u8; 1],
}

impl PartialEq for FlightState {
    fn eq(&self, other: &Self) -> bool {
        self.stop_watch == other.stop_watch
            && self.id == other.id
            && self.i1 == other.i1
            && self.pad_after_i1 == other.pad_after_i1
            && self.x.to_bits() == other.x.to_bits()
            && self.z.to_bits() == other.z.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.heading == other.heading
            && self.aoa == other.aoa
            && self.bank == other.bank
            && self.x_speed == other.x_speed
            && self.y_speed == other.y_speed
            && self.z_speed == other.z_speed
            && self.u2 == other.u2
            && self.fuel == other.fuel
            && self.u3 == other.u3
            && self.spoiler_brake == other.spoiler_brake
            && self.flaps_gear == other.flaps_gear
            && self.afterburner_smoke_trails_gunfire == other.afterburner_smoke_trails_gunfire
            && self.u4 == other.u4
            && self.gun_ammo == other.gun_ammo
            && self.rockets == other.rockets
            && self.u5 == other.u5
            && self.aam == other.aam
            && self.agm == other.agm
            && self.bombs == other.bombs
            && self.lives == other.lives
            && self.u6 == other.u6
            && self.elevator == other.elevator
            && self.aileron == other.aileron
            && self.u7 == other.u7
            && self.trim == other.trim
            && self.pad_tail == other.pad_tail
    }
}

impl KindRecord for FlightState {
    const KIND: u32 = KIND;

    fn layout() -> Result<RecordLayout, LayoutError> {
        RecordLayout::new(KIND, "tflight", FIELDS.to_vec(), SIZE)
    }

    fn from_field_set(set: &FieldSet) -> Result<Self, ProtocolError> {
        Ok(Self {
            stop_watch: set.i32("stopWatch")?,
            id: set.i32("ID")?,
            i1: set.i16("i1")?,
            pad_after_i1: set.reserved_array(PAD_I1)?,
            x: set.f32("x")?,
            z: set.f32("z")?,
            y: set.f32("y")?,
            heading: set.i16("heading")?,
            aoa: set.i16("AOA")?,
            bank: set.i16("bank")?,
            x_speed: set.i16("xSpeed")?,
            y_speed: set.i16("ySpeed")?,
            z_speed: set.i16("zSpeed")?,
            u2: set.reserved_array(U2)?,
            fuel: set.i16("fuel")?,
            u3: set.reserved_array(U3)?,
            spoiler_brake: set.u8("spoilerBrake")?,
            flaps_gear: set.u8("flapsGear")?,
            afterburner_smoke_trails_gunfire: set.u8("afterburnerSmokeTrailsGunfire")?,
            u4: set.reserved_array(U4)?,
            gun_ammo: set.i16("gunAmmo")?,
            rockets: set.u8("rockets")?,
            u5: set.reserved_array(U5)?,
            aam: set.u8("AAM")?,
            agm: set.u8("AGM")?,
            bombs: set.u8("bombs")?,
            lives: set.u8("lives")?,
            u6: set.reserved_array(U6)?,
            elevator: set.i8("elevator")?,
            aileron: set.i8("aileron")?,
            u7: set.reserved_array(U7)?,
            trim: set.i8("trim")?,
            pad_tail: set.reserved_array(PAD_TAIL)?,
        })
    }

    fn to_field_set(&self) -> FieldSet {
        let mut set = FieldSet::new(KIND);
        set.set("stopWatch", Value::I32(self.stop_watch))
            .set("ID", Value::I32(self.id))
            .set("i1", Value::I16(self.i1))
            .set("x", Value::F32(self.x))
            .set("z", Value::F32(self.z))
            .set("y", Value::F32(self.y))
            .set("heading", Value::I16(self.heading))
            .set("AOA", Value::I16(self.aoa))
            .set("bank", Value::I16(self.bank))
            .set("xSpeed", Value::I16(self.x_speed))
            .set("ySpeed", Value::I16(self.y_speed))
            .set("zSpeed", Value::I16(self.z_speed))
            .set("fuel", Value::I16(self.fuel))
            .set("spoilerBrake", Value::U8(self.spoiler_brake))
            .set("flapsGear", Value::U8(self.flaps_gear))
            .set(
                "afterburnerSmokeTrailsGunfire",
                Value::U8(self.afterburner_smoke_trails_gunfire),
            )
            .set("gunAmmo", Value::I16(self.gun_ammo))
            .set("rockets", Value::U8(self.rockets))
            .set("AAM", Value::U8(self.aam))
            .set("AGM", Value::U8(self.agm))
            .set("bombs", Value::U8(self.bombs))
            .set("lives", Value::U8(self.lives))
            .set("elevator", Value::I8(self.elevator))
            .set("aileron", Value::I8(self.aileron))
            .set("trim", Value::I8(self.trim));
        set.set_reserved(PAD_I1, self.pad_after_i1)
            .set_reserved(U2, self.u2)
            .set_reserved(U3, self.u3)
            .set_reserved(U4, self.u4)
            .set_reserved(U5, self.u5)
            .set_reserved(U6, self.u6)
            .set_reserved(U7, self.u7)
            .set_reserved(PAD_TAIL, self.pad_tail);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::{decode, encode, DecodePolicy};

    #[test]
    fn test_layout_is_valid_and_72_bytes() {
        let layout = FlightState::layout().unwrap();
        assert_eq!(layout.kind_tag(), 11);
        assert_eq!(layout.name(), "tflight");
        assert_eq!(layout.total_size(), 72);
    }

    #[test]
    fn test_layout_covers_every_byte() {
        let layout = FlightState::layout().unwrap();
        assert_eq!(layout.uncovered_bytes(), 0);
    }

    #[test]
    fn test_layout_has_25_named_fields_and_8_placeholders() {
        let layout = FlightState::layout().unwrap();
        assert_eq!(layout.named_fields().count(), 25);
        assert_eq!(layout.placeholders().count(), 8);
    }

    #[test]
    fn test_position_fields_are_in_x_z_y_order() {
        let layout = FlightState::layout().unwrap();
        let offset = |name| layout.field(name).map(|f| f.offset);
        assert_eq!(offset("x"), Some(12));
        assert_eq!(offset("z"), Some(16));
        assert_eq!(offset("y"), Some(20));
    }

    #[test]
    fn test_weapon_and_control_offsets() {
        let layout = FlightState::layout().unwrap();
        let offset = |name| layout.field(name).map(|f| f.offset);
        assert_eq!(offset("fuel"), Some(44));
        assert_eq!(offset("gunAmmo"), Some(56));
        assert_eq!(offset("lives"), Some(63));
        assert_eq!(offset("elevator"), Some(66));
        assert_eq!(offset("aileron"), Some(67));
        assert_eq!(offset("trim"), Some(70));
    }

    #[test]
    fn test_typed_fields_land_at_declared_offsets() {
        let state = FlightState {
            stop_watch: 100,
            id: 7,
            i1: 5,
            x: 120.5,
            fuel: -2,
            gun_ammo: 0x0102,
            lives: 9,
            trim: -1,
            u2: [1, 2, 3, 4, 5, 6, 7, 8],
            pad_tail: [0xEE],
            ..FlightState::default()
        };
        let layout = FlightState::layout().unwrap();
        let bytes = encode(&state.to_field_set(), &layout).unwrap();
        assert_eq!(bytes.len(), SIZE);
        assert_eq!(bytes[0..4], 100i32.to_le_bytes());
        assert_eq!(bytes[4..8], 7i32.to_le_bytes());
        assert_eq!(bytes[8..10], [5, 0]);
        assert_eq!(bytes[12..16], 120.5f32.to_le_bytes());
        assert_eq!(bytes[36..44], [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bytes[44..46], [0xFE, 0xFF]);
        assert_eq!(bytes[56..58], [0x02, 0x01]);
        assert_eq!(bytes[63], 9);
        assert_eq!(bytes[70], 0xFF);
        assert_eq!(bytes[71], 0xEE);
    }

    #[test]
    fn test_equality_compares_positions_bitwise() {
        let nan = FlightState {
            x: f32::NAN,
            ..FlightState::default()
        };
        assert_eq!(nan, nan.clone());
        let negative_zero = FlightState {
            y: -0.0,
            ..FlightState::default()
        };
        assert_ne!(negative_zero, FlightState::default());
        let other_fuel = FlightState {
            fuel: 1,
            ..FlightState::default()
        };
        assert_ne!(other_fuel, FlightState::default());
    }

    #[test]
    fn test_decode_then_convert_round_trip() {
        let bytes: Vec<u8> = (0..SIZE as u8).collect();
        let layout = FlightState::layout().unwrap();
        let set = decode(&bytes, &layout, DecodePolicy::strict()).unwrap();
        let state = FlightState::from_field_set(&set).unwrap();
        assert_eq!(state.pad_after_i1, [10, 11]);
        assert_eq!(state.u3, [46, 47, 48, 49, 50, 51]);
        assert_eq!(state.u5, [59]);
        assert_eq!(state.to_field_set(), set);
        assert_eq!(encode(&state.to_field_set(), &layout).unwrap(), bytes);
    }
}

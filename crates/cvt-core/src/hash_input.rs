//! # Hash-Input Encoding
//!
//! A canonical encoding for hashing, distinct from the circuit flattening.
//! Small values (booleans, 32-bit integers) are recorded together with
//! their bit length so they can be packed several to a field element.

use cvt_field::{Field, Fp};

/// Maximum number of bits packed into one field element.
///
/// The Goldilocks modulus exceeds `2^63`, so any 63-bit integer is
/// represented without reduction.
pub const PACKED_FIELD_CAPACITY: u32 = 63;

/// Hash input: unpacked fields followed by bit-length-tagged packable values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HashInput {
    /// Full field elements, hashed as-is.
    pub fields: Vec<Field>,
    /// `(value, bit_length)` pairs eligible for packing.
    pub packed: Vec<(Field, u32)>,
}

impl HashInput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<Field>) -> Self {
        HashInput {
            fields,
            packed: Vec::new(),
        }
    }

    pub fn from_packed(packed: Vec<(Field, u32)>) -> Self {
        HashInput {
            fields: Vec::new(),
            packed,
        }
    }

    /// Concatenate, keeping fields and packed parts separate.
    pub fn append(mut self, other: HashInput) -> Self {
        self.fields.extend(other.fields);
        self.packed.extend(other.packed);
        self
    }

    /// Greedily pack `packed` into as few elements as fit under
    /// [`PACKED_FIELD_CAPACITY`] and append them after `fields`.
    ///
    /// Within one packed element earlier values occupy the high bits.
    pub fn pack_to_fields(&self) -> Vec<Field> {
        let mut out = self.fields.clone();
        let mut current = Field::ZERO;
        let mut bits = 0u32;
        for &(value, size) in &self.packed {
            if bits > 0 && bits + size > PACKED_FIELD_CAPACITY {
                out.push(current);
                current = Field::ZERO;
                bits = 0;
            }
            current = current * Field::Constant(Fp::two_pow(size)) + value;
            bits += size;
        }
        if bits > 0 {
            out.push(current);
        }
        out
    }
}

// Sensor-to-body axis remapping
//
// out[k] = raw[permutation[k]] * (invert[k] ? -1 : 1)
//
// The permutation is not checked: repeating an axis duplicates it and drops
// another, which is occasionally useful while calibrating a new mount.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisMap {
    pub permutation: [Axis; 3],
    pub invert: [bool; 3],
}

impl AxisMap {
    pub fn new(permutation: [Axis; 3], invert: [bool; 3]) -> Self {
        Self { permutation, invert }
    }

    /// Sensor frame used as-is
    pub fn identity() -> Self {
        Self::new([Axis::X, Axis::Y, Axis::Z], [false; 3])
    }

    /// Mapping for the sensor as mounted in the Body.
    /// Resting flat the sensor reads ~+1 g on its Y axis, which must land on body Z.
    pub fn mounted() -> Self {
        Self::new([Axis::Z, Axis::X, Axis::Y], [false; 3])
    }

    pub fn apply(&self, raw: [f32; 3]) -> [f32; 3] {
        std::array::from_fn(|k| {
            let value = raw[self.permutation[k] as usize];
            if self.invert[k] { -value } else { value }
        })
    }
}

impl Default for AxisMap {
    fn default() -> Self {
        Self::identity()
    }
}

// src/accel.rs

use nalgebra::Vector2;

/// The two acceleration samples needed by velocity Verlet, kept as a
/// two-slot ring buffer. `rotate` flips which slot is newest; the previous
/// newest sample then reads back as `oldest` until `store` overwrites the
/// freed slot.
#[derive(Debug, Clone, Copy)]
pub struct AccelPair {
    slots: [Vector2<f64>; 2],
    newest: usize,
}

impl AccelPair {
    pub fn new() -> Self {
        AccelPair {
            slots: [Vector2::zeros(); 2],
            newest: 0,
        }
    }

    /// Start a new force evaluation: the current sample becomes the old one.
    pub fn rotate(&mut self) {
        self.newest ^= 1;
    }

    pub fn store(&mut self, a: Vector2<f64>) {
        self.slots[self.newest] = a;
    }

    pub fn newest(&self) -> Vector2<f64> {
        self.slots[self.newest]
    }

    pub fn oldest(&self) -> Vector2<f64> {
        self.slots[self.newest ^ 1]
    }
}

impl Default for AccelPair {
    fn default() -> Self {
        Self::new()
    }
}

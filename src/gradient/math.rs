// gradient/math.rs - Vector and affine transform helpers
//
// The transform is kept as a flat row-major 3x4 array: a 3x3 rotation/scale
// block plus a translation column. Building one costs three trig pairs, so
// callers skip it entirely when the transform parameters are identity.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

// ── Vec3 type ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const ONE: Vec3 = Vec3::new(1.0, 1.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Feed the exact bit patterns into a hasher (f32 has no `Hash`).
    pub fn hash_bits<H: Hasher>(&self, hasher: &mut H) {
        self.x.to_bits().hash(hasher);
        self.y.to_bits().hash(hasher);
        self.z.to_bits().hash(hasher);
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ── Rotation matrix helpers ─────────────────────────────────────────

type Mat3 = [f32; 9];

fn rotation_x(rad: f32) -> Mat3 {
    let (s, c) = rad.sin_cos();
    [1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c]
}

fn rotation_y(rad: f32) -> Mat3 {
    let (s, c) = rad.sin_cos();
    [c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c]
}

fn rotation_z(rad: f32) -> Mat3 {
    let (s, c) = rad.sin_cos();
    [c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0]
}

fn mat3_multiply(a: &Mat3, b: &Mat3) -> Mat3 {
    [
        a[0] * b[0] + a[1] * b[3] + a[2] * b[6],
        a[0] * b[1] + a[1] * b[4] + a[2] * b[7],
        a[0] * b[2] + a[1] * b[5] + a[2] * b[8],
        a[3] * b[0] + a[4] * b[3] + a[5] * b[6],
        a[3] * b[1] + a[4] * b[4] + a[5] * b[7],
        a[3] * b[2] + a[4] * b[5] + a[5] * b[8],
        a[6] * b[0] + a[7] * b[3] + a[8] * b[6],
        a[6] * b[1] + a[7] * b[4] + a[8] * b[7],
        a[6] * b[2] + a[7] * b[5] + a[8] * b[8],
    ]
}

// ── Transform3x4 ────────────────────────────────────────────────────

/// Row-major affine transform: `p' = M · p + t`.
///
/// Built in a fixed order: [`from_euler_degrees`](Self::from_euler_degrees)
/// sets `M = Rx · Ry · Rz`, [`multiply_by_scale`](Self::multiply_by_scale)
/// turns it into `M · S`, and [`set_translation`](Self::set_translation)
/// fills `t`. A point is therefore scaled, then rotated, then translated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3x4 {
    m: [f32; 12],
}

impl Transform3x4 {
    pub const IDENTITY: Transform3x4 = Transform3x4 {
        m: [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    };

    /// Rotation from Euler angles in degrees, applied as `Rx · Ry · Rz`.
    pub fn from_euler_degrees(degrees: Vec3) -> Self {
        let r = mat3_multiply(
            &mat3_multiply(
                &rotation_x(degrees.x.to_radians()),
                &rotation_y(degrees.y.to_radians()),
            ),
            &rotation_z(degrees.z.to_radians()),
        );
        Transform3x4 {
            m: [
                r[0], r[1], r[2], 0.0, r[3], r[4], r[5], 0.0, r[6], r[7], r[8], 0.0,
            ],
        }
    }

    /// Post-multiply the 3x3 block by a diagonal scale (scales its columns).
    pub fn multiply_by_scale(&mut self, scale: Vec3) {
        for row in 0..3 {
            let base = row * 4;
            self.m[base] *= scale.x;
            self.m[base + 1] *= scale.y;
            self.m[base + 2] *= scale.z;
        }
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.m[3] = translation.x;
        self.m[7] = translation.y;
        self.m[11] = translation.z;
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.m[3], self.m[7], self.m[11])
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0] * p.x + m[1] * p.y + m[2] * p.z + m[3],
            m[4] * p.x + m[5] * p.y + m[6] * p.z + m[7],
            m[8] * p.x + m[9] * p.y + m[10] * p.z + m[11],
        )
    }
}

impl Default for Transform3x4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ── Tests ───────────────────────────────────────────────────────────

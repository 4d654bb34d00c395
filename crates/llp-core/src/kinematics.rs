//! Relativistic kinematics primitives: 3-vectors, 4-momenta, boosts and
//! rotations.
//!
//! Every operation is a pure value transformation returning a new instance.
//! The forward kinematics of this domain are extreme (energies of hundreds of
//! GeV at milliradian angles), so invariant masses are recovered through the
//! cancellation-stable product `(E - |p|)(E + |p|)` instead of `E^2 - p^2`.

use serde::{Deserialize, Serialize};

/// Relative tolerance below which a negative mass-squared is treated as
/// floating round-off and clamped to zero.
const MASS_SQ_TOL: f64 = 1e-9;

/// Plain Cartesian 3-vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreeVector {
    /// x component.
    pub x: f64,
    /// y component.
    pub y: f64,
    /// z component.
    pub z: f64,
}

impl ThreeVector {
    /// Creates a vector from Cartesian components.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Dot product.
    pub fn dot(&self, other: &ThreeVector) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    pub fn cross(&self, other: &ThreeVector) -> ThreeVector {
        ThreeVector::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Squared Euclidean norm.
    pub fn norm_sq(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.norm_sq().sqrt()
    }

    /// Component-wise scaling.
    pub fn scaled(&self, factor: f64) -> ThreeVector {
        ThreeVector::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Unit vector along `self`, or `None` for a (near-)zero vector.
    pub fn unit(&self) -> Option<ThreeVector> {
        let norm = self.norm();
        if norm <= f64::EPSILON {
            None
        } else {
            Some(self.scaled(1.0 / norm))
        }
    }

    /// Vector sum.
    pub fn plus(&self, other: &ThreeVector) -> ThreeVector {
        ThreeVector::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

/// Relativistic four-momentum `(px, py, pz, E)` in GeV.
///
/// Immutable value type; boosts and rotations return new instances. For an
/// on-shell particle `E^2 - p^2 - m^2 ~ 0` within floating tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FourMomentum {
    /// x momentum component.
    pub px: f64,
    /// y momentum component.
    pub py: f64,
    /// z (beam axis) momentum component.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl FourMomentum {
    /// Creates a four-momentum from Cartesian components and energy.
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// A particle of mass `m` at rest.
    pub fn at_rest(m: f64) -> Self {
        Self::new(0.0, 0.0, 0.0, m)
    }

    /// Spatial part of the momentum.
    pub fn spatial(&self) -> ThreeVector {
        ThreeVector::new(self.px, self.py, self.pz)
    }

    /// Total momentum `|p|`.
    pub fn p(&self) -> f64 {
        self.spatial().norm()
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        (self.px * self.px + self.py * self.py).sqrt()
    }

    /// Polar angle with respect to the beam axis, `atan(pt/pz)`.
    pub fn theta(&self) -> f64 {
        (self.pt() / self.pz).atan()
    }

    /// Invariant mass squared, computed stably as `(E - |p|)(E + |p|)`.
    pub fn mass_sq(&self) -> f64 {
        let p = self.p();
        (self.e - p) * (self.e + p)
    }

    /// Invariant mass.
    ///
    /// Small negative mass-squared values from round-off at phase-space
    /// boundaries are clamped to zero; values negative beyond tolerance are
    /// unphysical and yield `NaN` so the caller can flag and continue.
    pub fn mass(&self) -> f64 {
        let m2 = self.mass_sq();
        if m2 >= 0.0 {
            m2.sqrt()
        } else if m2 > -MASS_SQ_TOL * self.e * self.e - f64::EPSILON {
            0.0
        } else {
            f64::NAN
        }
    }

    /// Velocity `p/E` of the particle, the boost taking its rest frame into
    /// the current frame.
    pub fn boost_velocity(&self) -> ThreeVector {
        self.spatial().scaled(1.0 / self.e)
    }

    /// Applies a Lorentz boost with velocity `beta` (`|beta| < 1`).
    ///
    /// Boosting a particle at rest by `beta` yields a particle moving with
    /// velocity `beta`; composing with the opposite boost is the identity up
    /// to round-off.
    pub fn boosted(&self, beta: &ThreeVector) -> FourMomentum {
        let b2 = beta.norm_sq();
        if b2 == 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let spatial = self.spatial();
        let bp = beta.dot(&spatial);
        let coef = (gamma - 1.0) * bp / b2 + gamma * self.e;
        let boosted = spatial.plus(&beta.scaled(coef));
        FourMomentum::new(boosted.x, boosted.y, boosted.z, gamma * (self.e + bp))
    }

    /// Rotates the spatial momentum about `axis` by `angle` (Rodrigues
    /// formula); the energy is unchanged. A zero axis leaves the momentum
    /// untouched.
    pub fn rotated(&self, axis: &ThreeVector, angle: f64) -> FourMomentum {
        let Some(k) = axis.unit() else {
            return *self;
        };
        let v = self.spatial();
        let (sin, cos) = angle.sin_cos();
        let rotated = v
            .scaled(cos)
            .plus(&k.cross(&v).scaled(sin))
            .plus(&k.scaled(k.dot(&v) * (1.0 - cos)));
        FourMomentum::new(rotated.x, rotated.y, rotated.z, self.e)
    }

    /// Four-momentum sum, for conservation checks.
    pub fn plus(&self, other: &FourMomentum) -> FourMomentum {
        FourMomentum::new(
            self.px + other.px,
            self.py + other.py,
            self.pz + other.pz,
            self.e + other.e,
        )
    }
}

#![deny(missing_docs)]
#![doc = "Core types for the forward LLP sensitivity engine: structured \
errors, deterministic RNG handles, relativistic kinematics primitives, \
weighted samples and particle data."]

pub mod errors;
pub mod kinematics;
pub mod particles;
pub mod rng;
pub mod sample;

pub use errors::{ErrorInfo, SimError};
pub use kinematics::{FourMomentum, ThreeVector};
pub use particles::ParticleId;
pub use rng::{derive_substream_seed, RngHandle};
pub use sample::{total_weight, WeightedSample};

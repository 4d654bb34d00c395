#![deny(missing_docs)]
#![doc = "Model layer for the forward LLP sensitivity engine: production \
channels as a tagged sum type, the coupling rescaling law and the model \
aggregate holding lifetime / branching / cross-section collaborators."]

pub mod channel;
pub mod model;
pub mod rescale;

pub use channel::{
    BranchingFn, ConditionFn, DifferentialRateFn, DirectChannel, MixingChannel, MixingFn,
    ProductionChannel, ThreeBodyChannel, ThreeBodyPoint, TwoBodyChannel,
};
pub use model::{BranchingRatio, CrossSection, Lifetime, Model};
pub use rescale::{AmplitudeFn, CouplingScaling};

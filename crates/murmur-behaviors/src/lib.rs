//! Standard behaviors for Murmur simulations.
//!
//! Agent behaviors steer, integrate, and bound vector state; environment
//! behaviors evolve grid fields. Every behavior is constructed from a
//! [`BehaviorSpec`](murmur_behavior::BehaviorSpec) through
//! [`BehaviorRegistry::standard`], which maps class tags to constructors.
//!
//! # Composing a pipeline
//!
//! Force behaviors accumulate (`Add`) into an acceleration that a `reset`
//! zeroes at the start of each tick; the integrator replaces velocity and
//! position; finalizers (`Adjust`) such as `boundary_wrap` and `clamp` run
//! last:
//!
//! ```text
//! reset              ""                     -> acceleration
//! cohesion           position@flock         -> acceleration
//! alignment          position@flock velocity -> acceleration
//! evasion            position@flock         -> acceleration
//! euler_integration  acceleration           -> velocity position
//! boundary_wrap      ""                     -> position
//! ```
//!
//! An environment with a scalar grid `u` diffuses, decays, and receives
//! deposits from the agents it sees:
//!
//! ```text
//! diffusion          u              -> u
//! decay              u              -> u
//! field_deposit      u@flock:scent  -> u
//! clamp              ""             -> u
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod clamp;
pub mod copy;
pub mod damping;
pub mod decay;
pub mod deposit;
pub mod diffusion;
pub mod field_sampling;
pub mod flocking;
pub mod integration;
pub mod neighborhood;
pub mod orbit;
pub mod randomize;
mod rate;
pub mod reaction;
pub mod registry;
pub mod reset;

pub use boundary::{BoundaryRepulsion, BoundaryWrap};
pub use clamp::Clamp;
pub use copy::{IdentityCopy, Scale};
pub use damping::Damping;
pub use decay::Decay;
pub use deposit::FieldDeposit;
pub use diffusion::Diffusion;
pub use field_sampling::{FieldGradient, FieldSample};
pub use flocking::{Alignment, Cohesion, Evasion};
pub use integration::EulerIntegration;
pub use orbit::Orbit;
pub use randomize::Randomize;
pub use reaction::{GiererMeinhardt, GrayScott};
pub use registry::{Attach, BehaviorRegistry, Constructor};
pub use reset::Reset;

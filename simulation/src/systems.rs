//! Pet systems - each one a pure step of the tick pipeline

pub mod aging;
pub mod death;
pub mod decay;
pub mod growth;

pub use aging::age;
pub use death::{DeathState, DeathTransition};
pub use decay::decay;
pub use growth::{maybe_grow, Growth};

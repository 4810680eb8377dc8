//! Configuration-source implementations shipped with the core

mod override_source;

pub use override_source::OverrideConfigSource;

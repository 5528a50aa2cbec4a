//! Read models over the herd records: lineage and statistics.

pub mod age;
pub mod error;
pub mod lineage;
pub mod projection;
pub mod stats;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{HerdError, HerdResult};
pub use lineage::{resolve_lineage, Lineage};
pub use projection::{AnimalBasic, AnimalDetail};
pub use store::{HerdStore, SeaOrmHerdStore};

pub mod campaign;
pub mod profile;

pub use campaign::*;
pub use profile::*;

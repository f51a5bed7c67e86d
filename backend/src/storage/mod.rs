pub mod memory;
pub mod traits;

pub use memory::InMemoryValueStore;
pub use traits::ValueStore;

pub mod enums;
pub mod snapshot;

pub use enums::*;
pub use snapshot::*;

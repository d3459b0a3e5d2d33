//! Convenient re-exports for common usage.
//!
//! ```
//! use replica_kit::prelude::*;
//! ```

pub use crate::DeltaCrdt;
pub use crate::GCounter;
pub use crate::GSet;
pub use crate::LWWRegister;
pub use crate::List;
pub use crate::MergeError;
pub use crate::ORMap;
pub use crate::ORSet;
pub use crate::PNCounter;
pub use crate::Replicable;

//! Implements the base structures for substepping such as control options and type definitions

mod constants;
mod control;
mod definitions;
mod enums;
pub use crate::base::constants::*;
pub use crate::base::control::*;
pub use crate::base::definitions::*;
pub use crate::base::enums::*;

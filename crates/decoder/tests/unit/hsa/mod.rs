//! HSA kernel descriptor tests.


/// Recognition of descriptor and legacy kernel symbols.
pub mod symbol_start;

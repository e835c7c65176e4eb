//! Set validity and set search.
//!
//! The dealer only sees the `Rules` trait; `ClassicRules` implements the
//! real game and `FixedRules` scripts verdicts for tests.

pub mod classic;
pub mod engine;
pub mod fixed;

pub use classic::ClassicRules;
pub use engine::Rules;
pub use fixed::FixedRules;

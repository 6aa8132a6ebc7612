//! Setting handlers for different configuration patterns.

pub mod boolean;
pub mod string;

pub use boolean::*;
pub use string::*;

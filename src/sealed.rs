//! Sealing support for traits that downstream crates must not implement.

pub trait Sealed {}

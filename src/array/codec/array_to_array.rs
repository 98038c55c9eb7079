//! Array to array codecs.

#[cfg(feature = "transpose")]
pub mod transpose;

pub mod assert;
pub mod rounding;

#[cfg(any(test, feature = "testing"))]
pub mod test;

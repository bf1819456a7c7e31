pub mod config;
pub mod layout;
pub mod power;
pub mod report;
pub mod rules;

#[cfg(test)]
pub(crate) mod test_lanes;

pub mod proposer;
pub mod validation;

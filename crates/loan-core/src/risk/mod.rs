pub mod assessment;
pub mod policy;
pub mod profile;

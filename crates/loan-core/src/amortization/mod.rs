pub mod affordability;
pub mod cache;
pub mod interest;
pub mod rates;
pub mod schedule;

pub mod filter;
pub mod ms5611;

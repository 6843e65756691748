pub mod athlete;
pub mod filter;

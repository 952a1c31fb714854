pub mod gates;
pub mod hook;

pub mod registry;
pub mod xml;

pub mod admissibility;
pub mod components;

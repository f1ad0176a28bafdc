pub mod offer;
pub mod recommendation;
pub mod usage;

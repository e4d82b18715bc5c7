pub mod intake;
pub mod model;

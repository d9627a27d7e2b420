pub mod rotate;
pub mod status;
pub mod update;

pub mod cohort;
pub mod energy;
pub mod split;
pub mod structures;
pub mod verify;

pub mod professionals;
pub mod schedule;
pub mod slots;

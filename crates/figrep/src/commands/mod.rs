pub mod check;
pub mod export;
pub mod fields;
pub mod schedule;
pub mod send;

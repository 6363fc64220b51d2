pub mod day;
pub mod training;
pub mod week;

pub mod meeting;
pub mod slot;
pub mod time_range;

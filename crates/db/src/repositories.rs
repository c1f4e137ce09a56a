pub mod meeting;
pub mod slot;

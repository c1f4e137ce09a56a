pub mod health_test;
pub mod meeting_test;
pub mod middleware_test;

pub mod models;
pub mod repositories;

pub use models::Course;
pub use repositories::{CourseRepository, SqlCourseRepository};

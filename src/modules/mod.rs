pub mod announcements;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod enrollments;
pub mod exams;
pub mod grades;
pub mod subjects;
pub mod users;

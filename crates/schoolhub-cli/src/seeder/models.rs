//! Configuration and row shapes for database seeding.

use schoolhub_auth::UserRole;
use uuid::Uuid;

/// Seed data for creating a user.
pub struct UserSeed {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Seed data for creating a class.
pub struct ClassSeed {
    pub name: String,
    pub section: String,
    pub academic_year: i32,
    pub teacher_id: Uuid,
    pub capacity: i32,
    pub room: String,
}

/// Complete configuration for database seeding.
#[derive(Clone)]
pub struct SeedConfig {
    pub classes: usize,
    pub teachers: usize,
    pub students: usize,
    pub subjects_per_class: usize,
    pub academic_year: i32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            classes: 4,
            teachers: 6,
            students: 80,
            subjects_per_class: 3,
            academic_year: 2024,
        }
    }
}

impl SeedConfig {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            ..Default::default()
        }
    }

    pub fn with_teachers(mut self, teachers: usize) -> Self {
        self.teachers = teachers;
        self
    }

    pub fn with_students(mut self, students: usize) -> Self {
        self.students = students;
        self
    }

    pub fn with_subjects(mut self, subjects_per_class: usize) -> Self {
        self.subjects_per_class = subjects_per_class;
        self
    }

    pub fn with_academic_year(mut self, academic_year: i32) -> Self {
        self.academic_year = academic_year;
        self
    }
}

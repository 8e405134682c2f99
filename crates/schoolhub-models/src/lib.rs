//! # SchoolHub Models
//!
//! Domain models and DTOs for the SchoolHub API, together with the pure
//! integrity rules that services run before touching the database.
//!
//! # Modules
//!
//! - [`users`]: Users, statuses, profile DTOs, and populated summaries
//! - [`auth`]: Login/register/refresh/reset request and response bodies
//! - [`classes`]: Classes, membership DTOs, and capacity rules
//! - [`subjects`]: Subjects assigned to a class
//! - [`enrollments`]: Yearly enrollments and the subject-subset rule
//! - [`attendance`]: Daily attendance marks and per-student summaries
//! - [`exams`]: Exams tied to a class and one of its subjects
//! - [`grades`]: Grades with letter derivation and mark bounds
//! - [`announcements`]: Audience targeting and publication lifecycle
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_models::grades::letter_grade;
//! use schoolhub_models::classes::ensure_capacity;
//!
//! assert_eq!(letter_grade(95.0, 100.0), "A+");
//! ensure_capacity(29, 30)?;
//! ```

pub mod announcements;
pub mod attendance;
pub mod auth;
pub mod classes;
pub mod enrollments;
pub mod exams;
pub mod grades;
pub mod subjects;
pub mod users;

pub use announcements::{
    Announcement, AnnouncementAudience, AnnouncementFilterParams, AnnouncementPriority,
    AnnouncementStatus, CreateAnnouncementDto, PaginatedAnnouncementsResponse,
    UpdateAnnouncementDto,
};
pub use attendance::{
    Attendance, AttendanceDetails, AttendanceFilterParams, AttendanceStatus, AttendanceSummary,
    AttendanceSummaryParams, BulkAttendanceDto, MarkAttendanceDto, PaginatedAttendanceResponse,
    UpdateAttendanceDto,
};
pub use auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest,
};
pub use classes::{
    Class, ClassDetails, ClassFilterParams, ClassStudentDto, ClassSummary, CreateClassDto,
    PaginatedClassesResponse, UpdateClassDto,
};
pub use enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentDetails, EnrollmentFilterParams,
    EnrollmentStatus, EnrollmentSubjectDto, PaginatedEnrollmentsResponse, UpdateEnrollmentDto,
};
pub use exams::{
    CreateExamDto, Exam, ExamDetails, ExamFilterParams, ExamStatus, ExamSummary, ExamType,
    PaginatedExamsResponse, UpdateExamDto,
};
pub use grades::{
    CreateGradeDto, Grade, GradeDetails, GradeFilterParams, PaginatedGradesResponse,
    StudentGradeReport, UpdateGradeDto,
};
pub use subjects::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, SubjectDetails, SubjectFilterParams,
    SubjectSummary, UpdateSubjectDto,
};
pub use users::{
    ChangePasswordDto, CreateUserDto, PaginatedUsersResponse, UpdateProfileDto, UpdateUserDto,
    User, UserFilterParams, UserStatus, UserSummary,
};

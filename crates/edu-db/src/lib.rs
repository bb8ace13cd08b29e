//! # edu-db
//!
//! Database layer for the institution backend.
//!
//! This crate provides PostgreSQL database access using SQLx, including:
//!
//! - Connection pool management
//! - Repository pattern for CRUD operations
//! - Entity mappings for students, lecturers, classes, courses and grades
//! - SQL-backed attachment metadata repositories for the lifecycle manager
//!
//! ## Example
//!
//! ```ignore
//! use edu_db::{Database, DatabaseConfig};
//! use edu_db::students::StudentRepository;
//! use edu_db::repository::Repository;
//!
//! let config = DatabaseConfig::with_url("postgres://localhost/edu_records");
//! let db = Database::connect(&config).await?;
//!
//! let repo = StudentRepository::new(db.pool().clone());
//! let student = repo.find_by_id(1).await?;
//! ```

pub mod pool;
pub mod repository;
pub mod payload;
pub mod students;
pub mod lecturers;
pub mod class_groups;
pub mod programs;
pub mod levels;
pub mod prices;
pub mod courses;
pub mod grades;
pub mod course_files;
pub mod report_files;

// Re-exports
pub use pool::{Database, DatabaseConfig};
pub use repository::{Pagination, Repository, RepositoryError, RepositoryResult};
pub use students::{CreateStudentDto, StudentRepository, StudentRow, UpdateStudentDto};
pub use lecturers::{CreateLecturerDto, LecturerRepository, LecturerRow, UpdateLecturerDto};
pub use class_groups::{ClassGroupRepository, ClassGroupRow, CreateClassGroupDto, UpdateClassGroupDto};
pub use programs::{CreateProgramDto, ProgramRepository, ProgramRow, UpdateProgramDto};
pub use levels::{CreateLevelDto, LevelRepository, LevelRow, UpdateLevelDto};
pub use prices::{CreatePriceDto, PriceRepository, PriceRow, UpdatePriceDto};
pub use courses::{CourseRepository, CourseRow, CreateCourseDto, UpdateCourseDto};
pub use grades::{CreateGradeDto, GradeRepository, GradeRow, UpdateGradeDto};
pub use course_files::CourseFileRepository;
pub use report_files::ReportFileRepository;

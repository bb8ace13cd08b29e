//! API request handlers

pub mod catalog;
pub mod class_groups;
pub mod courses;
pub mod grades;
pub mod lecturers;
pub mod report_files;
pub mod students;

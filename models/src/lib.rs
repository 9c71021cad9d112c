// models/src/lib.rs
pub mod assignment;
pub mod errors;
pub mod page;
pub mod student;
pub mod user;

pub use assignment::{Assignee, Assignment, Milestone, TaskStatus};
pub use errors::{DomainError, DomainResult};
pub use page::Page;
pub use student::{NewStudent, Student, StudentUpdate};
pub use user::{DutyStatus, NewUser, Role, RoleProfile, User, UserUpdate, UserView};

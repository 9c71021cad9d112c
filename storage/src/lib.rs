// storage/src/lib.rs
//
// sled-backed persistence. One `Db`, one named tree per entity, plus
// secondary-index trees for the uniqueness constraints (user email and
// username, the student+date assignment slot). Documents are stored as
// serde_json values keyed by their uuid id.

pub mod assignment_store;
pub mod student_store;
pub mod user_store;

use std::path::Path;
use std::sync::Arc;

use models::{DomainError, DomainResult};

pub use assignment_store::{AssignmentFilter, AssignmentStore};
pub use student_store::{StudentFilter, StudentStore};
pub use user_store::UserStore;

pub struct Storage {
    db: sled::Db,
    pub students: StudentStore,
    pub users: UserStore,
    pub assignments: AssignmentStore,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> DomainResult<Arc<Self>> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// In-memory database for tests.
    pub fn temporary() -> DomainResult<Arc<Self>> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> DomainResult<Arc<Self>> {
        let students = StudentStore::new(&db)?;
        let users = UserStore::new(&db)?;
        let assignments = AssignmentStore::new(&db)?;
        Ok(Arc::new(Storage {
            db,
            students,
            users,
            assignments,
        }))
    }

    /// Next value of the store-wide monotonic sequence, used for
    /// generated student numbers.
    pub fn next_sequence(&self) -> DomainResult<u64> {
        Ok(self.db.generate_id()?)
    }

    /// Deletes a user and detaches (nulls out) the assignee on every
    /// assignment that still references them. Assignments themselves are
    /// kept.
    pub fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        self.users.delete(user_id)?;
        let detached = self.assignments.detach_user(user_id)?;
        if detached > 0 {
            tracing::info!(user_id, detached, "detached assignments for deleted user");
        }
        Ok(())
    }

    /// Creates a student, generating a collision-free student number from
    /// the monotonic sequence when none was supplied.
    pub fn create_student(&self, new: models::NewStudent) -> DomainResult<models::Student> {
        let number = if new.student_no.trim().is_empty() {
            loop {
                let candidate = format!("S{:06}", self.next_sequence()?);
                if !self.students.number_exists(&candidate)? {
                    break candidate;
                }
            }
        } else {
            new.student_no.trim().to_string()
        };
        self.students.create(new, number)
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> DomainResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| DomainError::Internal(format!("corrupt stored document: {}", e)))
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> DomainResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

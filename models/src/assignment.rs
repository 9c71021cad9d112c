// models/src/assignment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exactly one pickup target. Modeling this as a variant instead of two
/// nullable ids makes the both-set and neither-set shapes unrepresentable
/// at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum Assignee {
    Driver(String),
    Subdriver(String),
}

impl Assignee {
    pub fn user_id(&self) -> &str {
        match self {
            Assignee::Driver(id) | Assignee::Subdriver(id) => id,
        }
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, Assignee::Driver(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
}

/// One completion flag and its paired timestamp. The timestamp exists
/// exactly while the status is Completed; toggling back to Pending clears
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Milestone {
    pub fn pending() -> Self {
        Milestone {
            status: TaskStatus::Pending,
            completed_at: None,
        }
    }

    /// Moves to the given status, stamping or clearing the timestamp on a
    /// real transition. Setting the same status twice is a no-op.
    pub fn set(&mut self, status: TaskStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        self.completed_at = match status {
            TaskStatus::Completed => Some(Utc::now()),
            TaskStatus::Pending => None,
        };
    }
}

impl Default for Milestone {
    fn default() -> Self {
        Milestone::pending()
    }
}

/// Link record pairing one student with one driver-or-subdriver for one
/// date. `assignee` is `None` only after the referenced user was deleted
/// (detach, not cascade); assignments are always created with a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub student_id: String,
    pub assignee: Option<Assignee>,
    pub date: String,
    pub notes: Option<String>,
    pub pickup: Milestone,
    pub delivery: Milestone,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(student_id: String, assignee: Assignee, date: String, notes: Option<String>) -> Self {
        let now = Utc::now();
        Assignment {
            id: Uuid::new_v4().to_string(),
            student_id,
            assignee: Some(assignee),
            date,
            notes,
            pickup: Milestone::pending(),
            delivery: Milestone::pending(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the given user is the assignment's current target.
    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.assignee
            .as_ref()
            .map(|a| a.user_id() == user_id)
            .unwrap_or(false)
    }
}

// storage/src/assignment_store.rs

use models::{
    Assignee, Assignment, DomainError, DomainResult, Page, Role, Student, TaskStatus,
};

use crate::student_store::StudentStore;
use crate::user_store::UserStore;
use crate::{decode, encode};

/// Separator for the student+date slot key. Unit separator, cannot occur
/// in a uuid and is vanishingly unlikely in a date string.
const SLOT_SEP: u8 = 0x1f;

/// Assignments tree plus the slot index enforcing "at most one active
/// assignment per student per date". The slot entry is claimed with
/// compare_and_swap, so two concurrent assigns for the same student+date
/// cannot both succeed.
#[derive(Clone)]
pub struct AssignmentStore {
    tree: sled::Tree,
    slot_index: sled::Tree,
    students: StudentStore,
    users: UserStore,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub driver_id: Option<String>,
    pub subdriver_id: Option<String>,
    pub date: Option<String>,
    /// When set, only assignments currently targeting this user are
    /// returned. Used to scope driver/subdriver listings to their own.
    pub assignee_user_id: Option<String>,
    pub page: usize,
    pub per_page: usize,
}

fn slot_key(student_id: &str, date: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(student_id.len() + 1 + date.len());
    key.extend_from_slice(student_id.as_bytes());
    key.push(SLOT_SEP);
    key.extend_from_slice(date.as_bytes());
    key
}

impl AssignmentStore {
    pub fn new(db: &sled::Db) -> DomainResult<Self> {
        Ok(AssignmentStore {
            tree: db.open_tree("assignments")?,
            slot_index: db.open_tree("assignments_slot_idx")?,
            students: StudentStore::new(db)?,
            users: UserStore::new(db)?,
        })
    }

    /// Creates one assignment per student, all targeting the same driver
    /// or subdriver on the same date. All-or-nothing: if any student
    /// already holds an active assignment for that date, nothing is kept
    /// and the caller gets a `Conflict`.
    pub fn assign(
        &self,
        student_ids: &[String],
        assignee: Assignee,
        date: &str,
        notes: Option<String>,
    ) -> DomainResult<Vec<Assignment>> {
        if student_ids.is_empty() {
            return Err(DomainError::invalid_field(
                "student_ids",
                "at least one student is required",
            ));
        }
        if date.trim().is_empty() {
            return Err(DomainError::invalid_field("date", "date is required"));
        }

        let target = self.users.get(assignee.user_id())?;
        let expected = if assignee.is_driver() {
            Role::Driver
        } else {
            Role::Subdriver
        };
        if target.role() != expected {
            return Err(DomainError::invalid_field(
                "assignee",
                format!("user {} is not a {}", target.id, expected),
            ));
        }

        for id in student_ids {
            self.students.get(id)?;
        }

        let mut created: Vec<Assignment> = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            let assignment = Assignment::new(
                student_id.clone(),
                assignee.clone(),
                date.to_string(),
                notes.clone(),
            );
            let claim = self.slot_index.compare_and_swap(
                slot_key(student_id, date),
                None as Option<&[u8]>,
                Some(assignment.id.as_bytes()),
            )?;
            if claim.is_err() {
                // Lost the slot; undo everything from this batch.
                for won in &created {
                    self.tree.remove(won.id.as_bytes())?;
                    self.release_slot(&won.student_id, &won.date, &won.id)?;
                }
                return Err(DomainError::Conflict(format!(
                    "student {} already has an assignment for {}",
                    student_id, date
                )));
            }
            self.tree
                .insert(assignment.id.as_bytes(), encode(&assignment)?)?;
            created.push(assignment);
        }
        tracing::debug!(count = created.len(), date, "created assignments");
        Ok(created)
    }

    fn release_slot(&self, student_id: &str, date: &str, owner_id: &str) -> DomainResult<()> {
        let key = slot_key(student_id, date);
        if let Some(owner) = self.slot_index.get(&key)? {
            if owner.as_ref() == owner_id.as_bytes() {
                self.slot_index.remove(&key)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> DomainResult<Assignment> {
        match self.tree.get(id.as_bytes())? {
            Some(bytes) => decode(&bytes),
            None => Err(DomainError::NotFound(format!(
                "assignment {} not found",
                id
            ))),
        }
    }

    pub fn all(&self) -> DomainResult<Vec<Assignment>> {
        let mut assignments = Vec::new();
        for item in self.tree.iter() {
            let (_, bytes) = item?;
            assignments.push(decode::<Assignment>(&bytes)?);
        }
        assignments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(assignments)
    }

    pub fn list(&self, filter: &AssignmentFilter) -> DomainResult<Page<Assignment>> {
        let matched: Vec<Assignment> = self
            .all()?
            .into_iter()
            .filter(|a| match &filter.date {
                Some(date) => a.date == *date,
                None => true,
            })
            .filter(|a| match &filter.driver_id {
                Some(id) => a.assignee == Some(Assignee::Driver(id.clone())),
                None => true,
            })
            .filter(|a| match &filter.subdriver_id {
                Some(id) => a.assignee == Some(Assignee::Subdriver(id.clone())),
                None => true,
            })
            .filter(|a| match &filter.assignee_user_id {
                Some(user_id) => a.belongs_to(user_id),
                None => true,
            })
            .collect();
        Ok(Page::slice(matched, filter.page, filter.per_page))
    }

    pub fn update_pickup(&self, id: &str, status: TaskStatus) -> DomainResult<Assignment> {
        self.update_milestone(id, status, true)
    }

    pub fn update_delivery(&self, id: &str, status: TaskStatus) -> DomainResult<Assignment> {
        self.update_milestone(id, status, false)
    }

    fn update_milestone(&self, id: &str, status: TaskStatus, pickup: bool) -> DomainResult<Assignment> {
        let mut assignment = self.get(id)?;
        if pickup {
            assignment.pickup.set(status);
        } else {
            assignment.delivery.set(status);
        }
        assignment.updated_at = chrono::Utc::now();
        self.tree
            .insert(assignment.id.as_bytes(), encode(&assignment)?)?;
        Ok(assignment)
    }

    /// Removes the assignment and frees the student+date slot, returning
    /// the student to the unassigned pool.
    pub fn cancel(&self, id: &str) -> DomainResult<()> {
        let assignment = self.get(id)?;
        self.tree.remove(id.as_bytes())?;
        self.release_slot(&assignment.student_id, &assignment.date, &assignment.id)?;
        tracing::debug!(id, "cancelled assignment");
        Ok(())
    }

    /// Nulls out the assignee on every assignment targeting the given
    /// user. Returns how many were detached.
    pub fn detach_user(&self, user_id: &str) -> DomainResult<usize> {
        let mut detached = 0;
        for mut assignment in self.all()? {
            if assignment.belongs_to(user_id) {
                assignment.assignee = None;
                assignment.updated_at = chrono::Utc::now();
                self.tree
                    .insert(assignment.id.as_bytes(), encode(&assignment)?)?;
                detached += 1;
            }
        }
        Ok(detached)
    }

    /// Students scheduled for the given date with no active assignment.
    pub fn unassigned_students(&self, date: &str) -> DomainResult<Vec<Student>> {
        let mut pool = Vec::new();
        for student in self.students.all()? {
            if student.date != date {
                continue;
            }
            if !self.slot_index.contains_key(slot_key(&student.id, date))? {
                pool.push(student);
            }
        }
        Ok(pool)
    }
}

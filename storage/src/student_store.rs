// storage/src/student_store.rs

use models::{DomainError, DomainResult, NewStudent, Page, Student, StudentUpdate};

use crate::{decode, encode};

/// Students tree plus a student-number index used to keep generated
/// numbers collision-free.
#[derive(Clone)]
pub struct StudentStore {
    tree: sled::Tree,
    number_index: sled::Tree,
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    /// Exact match on the stored date string.
    pub date: Option<String>,
    /// Case-insensitive substring across names, student number and school.
    pub search: Option<String>,
    pub page: usize,
    pub per_page: usize,
}

impl StudentStore {
    pub fn new(db: &sled::Db) -> DomainResult<Self> {
        Ok(StudentStore {
            tree: db.open_tree("students")?,
            number_index: db.open_tree("students_no_idx")?,
        })
    }

    pub fn number_exists(&self, student_no: &str) -> DomainResult<bool> {
        Ok(self.number_index.contains_key(student_no.as_bytes())?)
    }

    /// Persists a validated record. Callers go through
    /// `Storage::create_student`, which supplies the student number.
    pub fn create(&self, new: NewStudent, student_no: String) -> DomainResult<Student> {
        new.validate()?;
        let student = Student::from_new(new, student_no);
        self.tree.insert(student.id.as_bytes(), encode(&student)?)?;
        self.number_index
            .insert(student.student_no.as_bytes(), student.id.as_bytes())?;
        tracing::debug!(id = %student.id, student_no = %student.student_no, "created student");
        Ok(student)
    }

    pub fn get(&self, id: &str) -> DomainResult<Student> {
        match self.tree.get(id.as_bytes())? {
            Some(bytes) => decode(&bytes),
            None => Err(DomainError::NotFound(format!("student {} not found", id))),
        }
    }

    pub fn all(&self) -> DomainResult<Vec<Student>> {
        let mut students = Vec::new();
        for item in self.tree.iter() {
            let (_, bytes) = item?;
            students.push(decode::<Student>(&bytes)?);
        }
        students.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.student_no.cmp(&b.student_no))
        });
        Ok(students)
    }

    pub fn list(&self, filter: &StudentFilter) -> DomainResult<Page<Student>> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let matched: Vec<Student> = self
            .all()?
            .into_iter()
            .filter(|s| match &filter.date {
                Some(date) => s.date == *date,
                None => true,
            })
            .filter(|s| match &needle {
                Some(needle) => {
                    s.given_name.to_lowercase().contains(needle)
                        || s.family_name.to_lowercase().contains(needle)
                        || s.student_no.to_lowercase().contains(needle)
                        || s.school.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();
        Ok(Page::slice(matched, filter.page, filter.per_page))
    }

    pub fn update(&self, id: &str, patch: StudentUpdate) -> DomainResult<Student> {
        let mut student = self.get(id)?;
        let old_number = student.student_no.clone();
        patch.apply(&mut student)?;
        self.tree.insert(student.id.as_bytes(), encode(&student)?)?;
        if student.student_no != old_number {
            self.number_index.remove(old_number.as_bytes())?;
            self.number_index
                .insert(student.student_no.as_bytes(), student.id.as_bytes())?;
        }
        Ok(student)
    }

    pub fn delete(&self, id: &str) -> DomainResult<()> {
        let student = self.get(id)?;
        self.tree.remove(id.as_bytes())?;
        // Only drop the index entry if it still points at this record; a
        // manually supplied duplicate number may have overwritten it.
        if let Some(owner) = self.number_index.get(student.student_no.as_bytes())? {
            if owner.as_ref() == id.as_bytes() {
                self.number_index.remove(student.student_no.as_bytes())?;
            }
        }
        tracing::debug!(id, "deleted student");
        Ok(())
    }
}

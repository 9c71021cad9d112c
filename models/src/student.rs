// models/src/student.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

/// A student intake record. Everything that originates in a spreadsheet
/// cell is kept as a trimmed string; in particular `date` is a
/// locale-formatted string used as an opaque match key, never parsed or
/// compared arithmetically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub student_no: String,
    pub trip_id: String,
    pub flight_number: String,
    pub arrival_time: String,
    pub pickup_time: String,
    pub date: String,
    pub given_name: String,
    pub family_name: String,
    pub arrival_type: String,
    pub sex: String,
    pub host_given_name: String,
    pub host_family_name: String,
    pub host_phone: String,
    pub host_address: String,
    pub host_city: String,
    pub school: String,
    pub client: String,
    pub staff_assigned: String,
    pub study_permit: String,
    pub special_instructions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Incoming student data, from manual entry or a mapped spreadsheet row.
/// `student_no` may be left blank; the store generates one on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewStudent {
    pub student_no: String,
    pub trip_id: String,
    pub flight_number: String,
    pub arrival_time: String,
    pub pickup_time: String,
    pub date: String,
    pub given_name: String,
    pub family_name: String,
    pub arrival_type: String,
    pub sex: String,
    pub host_given_name: String,
    pub host_family_name: String,
    pub host_phone: String,
    pub host_address: String,
    pub host_city: String,
    pub school: String,
    pub client: String,
    pub staff_assigned: String,
    pub study_permit: String,
    pub special_instructions: String,
}

impl NewStudent {
    /// A record is only viable if it names the student somehow.
    pub fn validate(&self) -> DomainResult<()> {
        if self.given_name.trim().is_empty() && self.family_name.trim().is_empty() {
            return Err(DomainError::validation(
                "at least one of given name or family name is required",
                vec!["given_name".to_string(), "family_name".to_string()],
            ));
        }
        Ok(())
    }

    pub fn has_name(&self) -> bool {
        !self.given_name.trim().is_empty() || !self.family_name.trim().is_empty()
    }
}

impl Student {
    /// Builds a stored record from validated input. `student_no` must be
    /// non-empty by this point (generated by the store when blank).
    pub fn from_new(new: NewStudent, student_no: String) -> Self {
        let now = Utc::now();
        Student {
            id: Uuid::new_v4().to_string(),
            student_no,
            trip_id: new.trip_id,
            flight_number: new.flight_number,
            arrival_time: new.arrival_time,
            pickup_time: new.pickup_time,
            date: new.date,
            given_name: new.given_name,
            family_name: new.family_name,
            arrival_type: new.arrival_type,
            sex: new.sex,
            host_given_name: new.host_given_name,
            host_family_name: new.host_family_name,
            host_phone: new.host_phone,
            host_address: new.host_address,
            host_city: new.host_city,
            school: new.school,
            client: new.client,
            staff_assigned: new.staff_assigned,
            study_permit: new.study_permit,
            special_instructions: new.special_instructions,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        let mut name = self.given_name.trim().to_string();
        if !self.family_name.trim().is_empty() {
            if !name.is_empty() {
                name.push(' ');
            }
            name.push_str(self.family_name.trim());
        }
        name
    }
}

/// Partial update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudentUpdate {
    pub student_no: Option<String>,
    pub trip_id: Option<String>,
    pub flight_number: Option<String>,
    pub arrival_time: Option<String>,
    pub pickup_time: Option<String>,
    pub date: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub arrival_type: Option<String>,
    pub sex: Option<String>,
    pub host_given_name: Option<String>,
    pub host_family_name: Option<String>,
    pub host_phone: Option<String>,
    pub host_address: Option<String>,
    pub host_city: Option<String>,
    pub school: Option<String>,
    pub client: Option<String>,
    pub staff_assigned: Option<String>,
    pub study_permit: Option<String>,
    pub special_instructions: Option<String>,
}

impl StudentUpdate {
    /// Applies the patch in place, bumping `updated_at`. Fails if the
    /// patch would leave the student nameless.
    pub fn apply(self, student: &mut Student) -> DomainResult<()> {
        macro_rules! patch {
            ($field:ident) => {
                if let Some(v) = self.$field {
                    student.$field = v;
                }
            };
        }
        patch!(student_no);
        patch!(trip_id);
        patch!(flight_number);
        patch!(arrival_time);
        patch!(pickup_time);
        patch!(date);
        patch!(given_name);
        patch!(family_name);
        patch!(arrival_type);
        patch!(sex);
        patch!(host_given_name);
        patch!(host_family_name);
        patch!(host_phone);
        patch!(host_address);
        patch!(host_city);
        patch!(school);
        patch!(client);
        patch!(staff_assigned);
        patch!(study_permit);
        patch!(special_instructions);

        if student.given_name.trim().is_empty() && student.family_name.trim().is_empty() {
            return Err(DomainError::validation(
                "update would leave the student without a name",
                vec!["given_name".to_string(), "family_name".to_string()],
            ));
        }
        student.updated_at = Utc::now();
        Ok(())
    }
}

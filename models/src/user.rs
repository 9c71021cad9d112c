// models/src/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Driver,
    Subdriver,
    School,
    Greeter,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let token = match self {
            Role::Admin => "Admin",
            Role::Driver => "Driver",
            Role::Subdriver => "Subdriver",
            Role::School => "School",
            Role::Greeter => "Greeter",
        };
        write!(f, "{}", token)
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" | "admin" => Ok(Role::Admin),
            "Driver" | "driver" => Ok(Role::Driver),
            "Subdriver" | "subdriver" => Ok(Role::Subdriver),
            "School" | "school" => Ok(Role::School),
            "Greeter" | "greeter" => Ok(Role::Greeter),
            _ => Err(DomainError::invalid_field(
                "role",
                format!("{:?} is not a valid role", s),
            )),
        }
    }
}

/// Operational status of a driver or subdriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DutyStatus {
    Available,
    #[serde(rename = "On Duty")]
    OnDuty,
}

impl Default for DutyStatus {
    fn default() -> Self {
        DutyStatus::Available
    }
}

/// Role-specific attributes as a tagged variant, so a School user cannot
/// carry a vehicle number and a Driver cannot lack one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum RoleProfile {
    Admin,
    Driver {
        driver_id: String,
        vehicle_number: String,
        status: DutyStatus,
    },
    Subdriver {
        subdriver_id: String,
        vehicle_number: String,
        status: DutyStatus,
    },
    School {
        school_id: String,
    },
    Greeter {
        greeter_id: String,
    },
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Admin => Role::Admin,
            RoleProfile::Driver { .. } => Role::Driver,
            RoleProfile::Subdriver { .. } => Role::Subdriver,
            RoleProfile::School { .. } => Role::School,
            RoleProfile::Greeter { .. } => Role::Greeter,
        }
    }
}

/// Stored user record. Carries the bcrypt hash, never the plaintext;
/// API responses go through [`UserView`], which drops the hash entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub gender: String,
    #[serde(flatten)]
    pub profile: RoleProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
    }

    pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
        bcrypt::verify(password, hash)
    }

    /// Validates the registration input and builds the stored record,
    /// hashing the password.
    pub fn from_new(new: NewUser) -> DomainResult<Self> {
        let profile = new.build_profile()?;
        let now = Utc::now();
        let password_hash = Self::hash_password(&new.password)?;
        Ok(User {
            id: Uuid::new_v4().to_string(),
            username: new.username,
            email: new.email,
            password_hash,
            gender: new.gender,
            profile,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

/// Registration input. Role-specific fields are optional here and checked
/// against the requested role in [`NewUser::build_profile`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub gender: String,
    pub role: Role,
    #[serde(default)]
    pub driver_id: Option<String>,
    #[serde(default)]
    pub subdriver_id: Option<String>,
    #[serde(default)]
    pub vehicle_number: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub greeter_id: Option<String>,
}

impl NewUser {
    fn require(value: &Option<String>, field: &str, missing: &mut Vec<String>) -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => {
                missing.push(field.to_string());
                String::new()
            }
        }
    }

    /// Checks shared and role-specific required fields, returning the
    /// tagged profile on success.
    pub fn build_profile(&self) -> DomainResult<RoleProfile> {
        let mut missing = Vec::new();
        if self.username.trim().is_empty() {
            missing.push("username".to_string());
        }
        if self.email.trim().is_empty() {
            missing.push("email".to_string());
        }
        if self.password.trim().is_empty() {
            missing.push("password".to_string());
        }

        let profile = match self.role {
            Role::Admin => RoleProfile::Admin,
            Role::Driver => RoleProfile::Driver {
                driver_id: Self::require(&self.driver_id, "driver_id", &mut missing),
                vehicle_number: Self::require(&self.vehicle_number, "vehicle_number", &mut missing),
                status: DutyStatus::Available,
            },
            Role::Subdriver => RoleProfile::Subdriver {
                subdriver_id: Self::require(&self.subdriver_id, "subdriver_id", &mut missing),
                vehicle_number: Self::require(&self.vehicle_number, "vehicle_number", &mut missing),
                status: DutyStatus::Available,
            },
            Role::School => RoleProfile::School {
                school_id: Self::require(&self.school_id, "school_id", &mut missing),
            },
            Role::Greeter => RoleProfile::Greeter {
                greeter_id: Self::require(&self.greeter_id, "greeter_id", &mut missing),
            },
        };

        if missing.is_empty() {
            Ok(profile)
        } else {
            Err(DomainError::validation(
                format!("missing required fields: {}", missing.join(", ")),
                missing,
            ))
        }
    }
}

/// Public projection of a user. No password material, hashed or otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub gender: String,
    #[serde(flatten)]
    pub profile: RoleProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            gender: user.gender.clone(),
            profile: user.profile.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Partial update. The role itself is immutable; a patch naming a
/// different role is rejected, as is a role-specific field that does not
/// belong to the stored role.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub gender: Option<String>,
    pub role: Option<Role>,
    pub driver_id: Option<String>,
    pub subdriver_id: Option<String>,
    pub vehicle_number: Option<String>,
    pub status: Option<DutyStatus>,
    pub school_id: Option<String>,
    pub greeter_id: Option<String>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) -> DomainResult<()> {
        if let Some(role) = self.role {
            if role != user.role() {
                return Err(DomainError::invalid_field(
                    "role",
                    "role cannot be changed after creation",
                ));
            }
        }
        if let Some(v) = self.username {
            user.username = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.password {
            if v.trim().is_empty() {
                return Err(DomainError::invalid_field("password", "password cannot be blank"));
            }
            user.password_hash = User::hash_password(&v)?;
        }
        if let Some(v) = self.gender {
            user.gender = v;
        }

        match &mut user.profile {
            RoleProfile::Driver {
                driver_id,
                vehicle_number,
                status,
            } => {
                if let Some(v) = self.driver_id {
                    *driver_id = v;
                }
                if let Some(v) = self.vehicle_number {
                    *vehicle_number = v;
                }
                if let Some(v) = self.status {
                    *status = v;
                }
                reject_foreign(&[("school_id", &self.school_id), ("greeter_id", &self.greeter_id)])?;
            }
            RoleProfile::Subdriver {
                subdriver_id,
                vehicle_number,
                status,
            } => {
                if let Some(v) = self.subdriver_id {
                    *subdriver_id = v;
                }
                if let Some(v) = self.vehicle_number {
                    *vehicle_number = v;
                }
                if let Some(v) = self.status {
                    *status = v;
                }
                reject_foreign(&[("school_id", &self.school_id), ("greeter_id", &self.greeter_id)])?;
            }
            RoleProfile::School { school_id } => {
                if let Some(v) = self.school_id {
                    *school_id = v;
                }
                reject_foreign(&[
                    ("driver_id", &self.driver_id),
                    ("subdriver_id", &self.subdriver_id),
                    ("vehicle_number", &self.vehicle_number),
                    ("greeter_id", &self.greeter_id),
                ])?;
            }
            RoleProfile::Greeter { greeter_id } => {
                if let Some(v) = self.greeter_id {
                    *greeter_id = v;
                }
                reject_foreign(&[
                    ("driver_id", &self.driver_id),
                    ("subdriver_id", &self.subdriver_id),
                    ("vehicle_number", &self.vehicle_number),
                    ("school_id", &self.school_id),
                ])?;
            }
            RoleProfile::Admin => {
                reject_foreign(&[
                    ("driver_id", &self.driver_id),
                    ("subdriver_id", &self.subdriver_id),
                    ("vehicle_number", &self.vehicle_number),
                    ("school_id", &self.school_id),
                    ("greeter_id", &self.greeter_id),
                ])?;
            }
        }

        user.updated_at = Utc::now();
        Ok(())
    }
}

fn reject_foreign(fields: &[(&str, &Option<String>)]) -> DomainResult<()> {
    let offending: Vec<String> = fields
        .iter()
        .filter(|(_, v)| v.is_some())
        .map(|(name, _)| name.to_string())
        .collect();
    if offending.is_empty() {
        Ok(())
    } else {
        Err(DomainError::validation(
            format!(
                "fields not applicable to this role: {}",
                offending.join(", ")
            ),
            offending,
        ))
    }
}

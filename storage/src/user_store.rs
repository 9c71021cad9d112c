// storage/src/user_store.rs

use models::{DomainError, DomainResult, NewUser, Role, User, UserUpdate};

use crate::{decode, encode};

/// Users tree plus the two uniqueness indexes. Email comparisons are
/// case-insensitive; the index key is the lowercased address.
#[derive(Clone)]
pub struct UserStore {
    tree: sled::Tree,
    email_index: sled::Tree,
    username_index: sled::Tree,
}

impl UserStore {
    pub fn new(db: &sled::Db) -> DomainResult<Self> {
        Ok(UserStore {
            tree: db.open_tree("users")?,
            email_index: db.open_tree("users_email_idx")?,
            username_index: db.open_tree("users_username_idx")?,
        })
    }

    fn email_key(email: &str) -> Vec<u8> {
        email.trim().to_lowercase().into_bytes()
    }

    fn check_unique(&self, email: &str, username: &str, own_id: Option<&str>) -> DomainResult<()> {
        let taken = |index: &sled::Tree, key: &[u8]| -> DomainResult<bool> {
            match index.get(key)? {
                Some(owner) => Ok(own_id.map(str::as_bytes) != Some(owner.as_ref())),
                None => Ok(false),
            }
        };
        if taken(&self.email_index, &Self::email_key(email))? {
            return Err(DomainError::Conflict(format!(
                "email {} is already registered",
                email
            )));
        }
        if taken(&self.username_index, username.as_bytes())? {
            return Err(DomainError::Conflict(format!(
                "username {} is already taken",
                username
            )));
        }
        Ok(())
    }

    fn write_indexed(&self, user: &User) -> DomainResult<()> {
        self.tree.insert(user.id.as_bytes(), encode(user)?)?;
        self.email_index
            .insert(Self::email_key(&user.email), user.id.as_bytes())?;
        self.username_index
            .insert(user.username.as_bytes(), user.id.as_bytes())?;
        Ok(())
    }

    pub fn create(&self, new: NewUser) -> DomainResult<User> {
        self.check_unique(&new.email, &new.username, None)?;
        let user = User::from_new(new)?;
        self.write_indexed(&user)?;
        tracing::debug!(id = %user.id, role = %user.role(), "created user");
        Ok(user)
    }

    pub fn get(&self, id: &str) -> DomainResult<User> {
        match self.tree.get(id.as_bytes())? {
            Some(bytes) => decode(&bytes),
            None => Err(DomainError::NotFound(format!("user {} not found", id))),
        }
    }

    pub fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        match self.email_index.get(Self::email_key(email))? {
            Some(id) => match self.tree.get(&id)? {
                Some(bytes) => Ok(Some(decode(&bytes)?)),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    pub fn all(&self) -> DomainResult<Vec<User>> {
        let mut users = Vec::new();
        for item in self.tree.iter() {
            let (_, bytes) = item?;
            users.push(decode::<User>(&bytes)?);
        }
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    pub fn list_by_role(&self, role: Role) -> DomainResult<Vec<User>> {
        Ok(self.all()?.into_iter().filter(|u| u.role() == role).collect())
    }

    /// Drivers and subdrivers together, the assignment-target pool.
    pub fn operational(&self) -> DomainResult<Vec<User>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|u| matches!(u.role(), Role::Driver | Role::Subdriver))
            .collect())
    }

    pub fn update(&self, id: &str, patch: UserUpdate) -> DomainResult<User> {
        let mut user = self.get(id)?;
        let old_email_key = Self::email_key(&user.email);
        let old_username = user.username.clone();
        patch.apply(&mut user)?;
        self.check_unique(&user.email, &user.username, Some(id))?;

        if Self::email_key(&user.email) != old_email_key {
            self.email_index.remove(old_email_key)?;
        }
        if user.username != old_username {
            self.username_index.remove(old_username.as_bytes())?;
        }
        self.write_indexed(&user)?;
        Ok(user)
    }

    /// Removes the record and its index entries. Assignment detach is
    /// coordinated by `Storage::delete_user`.
    pub fn delete(&self, id: &str) -> DomainResult<()> {
        let user = self.get(id)?;
        self.tree.remove(id.as_bytes())?;
        self.email_index.remove(Self::email_key(&user.email))?;
        self.username_index.remove(user.username.as_bytes())?;
        tracing::debug!(id, "deleted user");
        Ok(())
    }
}

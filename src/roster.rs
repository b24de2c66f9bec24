use std::collections::HashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Away,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub color: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl User {
    pub fn new(id: String, username: String) -> Self {
        User {
            id,
            username,
            color: random_color(),
            status: Status::Active,
            profile_picture: None,
        }
    }
}

/// `#rrggbb`, lowercase.
pub fn random_color() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..=0x00FF_FFFF);
    format!("#{value:06x}")
}

/// Named participants keyed by connection id, listed in join order.
#[derive(Debug, Default)]
pub struct Roster {
    users: HashMap<String, User>,
    order: Vec<String>,
}

impl Roster {
    /// Inserts or replaces the entry for `user.id`. A replaced entry moves to the end.
    pub fn insert(&mut self, user: User) {
        if self.users.contains_key(&user.id) {
            self.order.retain(|id| id != &user.id);
        }
        self.order.push(user.id.clone());
        self.users.insert(user.id.clone(), user);
    }

    pub fn remove(&mut self, id: &str) -> Option<User> {
        let user = self.users.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(user)
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.get_mut(id)
    }

    pub fn username(&self, id: &str) -> Option<&str> {
        self.users.get(id).map(|user| user.username.as_str())
    }

    pub fn list(&self) -> Vec<User> {
        self.order
            .iter()
            .filter_map(|id| self.users.get(id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

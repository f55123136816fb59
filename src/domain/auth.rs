use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
}

impl User {
    /// The payer display name handed to the payment gateway: the profile
    /// name when set, the email otherwise, "게스트" as a last resort.
    pub fn customer_name(&self) -> String {
        if let Some(name) = &self.display_name
            && !name.trim().is_empty()
        {
            return name.clone();
        }
        if !self.email.trim().is_empty() {
            return self.email.clone();
        }
        "게스트".to_string()
    }
}

/// An authenticated session issued by the hosted auth backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

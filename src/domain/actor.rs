use serde::{Deserialize, Serialize};

// ============================================================================
// Actor Context
// ============================================================================
//
// Supplied by the identity provider on every call. Nothing in the domain
// reads a global session.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[serde(alias = "user")]
    Customer,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub banned: bool,
}

impl ActorContext {
    pub fn customer(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Customer,
            banned: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
            banned: false,
        }
    }

    pub fn banned(mut self) -> Self {
        self.banned = true;
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True if this actor is the customer who owns a record.
    pub fn owns(&self, owner_id: &str) -> bool {
        self.role == Role::Customer && self.user_id == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_provider_role_names() {
        let actor: ActorContext =
            serde_json::from_str(r#"{"user_id":"u1","role":"user"}"#).unwrap();
        assert_eq!(actor, ActorContext::customer("u1"));

        let admin: ActorContext =
            serde_json::from_str(r#"{"user_id":"a1","role":"admin","banned":false}"#).unwrap();
        assert!(admin.is_admin());
    }

    #[test]
    fn test_ownership_is_customer_only() {
        assert!(ActorContext::customer("u1").owns("u1"));
        assert!(!ActorContext::customer("u2").owns("u1"));
        assert!(!ActorContext::admin("u1").owns("u1"));
    }
}

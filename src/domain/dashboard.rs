// Dashboard domain model
use super::component::{Component, ComponentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Private,
    /// Carries a sha256 hex digest of the password, never the plaintext.
    PasswordProtected { verifier: String },
}

impl Visibility {
    pub fn password_protected(plaintext: &str) -> Self {
        Visibility::PasswordProtected {
            verifier: sha256_hex(plaintext.as_bytes()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum AccessDecision {
    Allowed,
    Denied { reason: String },
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Identity. Immutable after creation and globally unique.
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visibility: Visibility,
    /// Exclusively owned: deleting the dashboard deletes all components.
    #[serde(default)]
    pub components: Vec<Component>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dashboard {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, visibility: Visibility) -> Self {
        let now = Utc::now();
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
            thumbnail: None,
            tags: Vec::new(),
            visibility,
            components: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Slugs are lowercase alphanumeric with single hyphen separators.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Yes/no access decision for viewing a dashboard.
pub fn check_visibility(dashboard: &Dashboard, credentials: Option<&str>) -> AccessDecision {
    match &dashboard.visibility {
        Visibility::Public => AccessDecision::Allowed,
        Visibility::Private => AccessDecision::Denied {
            reason: "dashboard is private".to_string(),
        },
        Visibility::PasswordProtected { verifier } => match credentials {
            None => AccessDecision::Denied {
                reason: "password required".to_string(),
            },
            Some(candidate) if sha256_hex(candidate.as_bytes()) == *verifier => {
                AccessDecision::Allowed
            }
            Some(_) => AccessDecision::Denied {
                reason: "bad password".to_string(),
            },
        },
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("sales-overview"));
        assert!(is_valid_slug("q3"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Sales"));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("two--hyphens"));
        assert!(!is_valid_slug("with space"));
    }

    #[test]
    fn test_check_visibility_public_and_private() {
        let public = Dashboard::new("a", "A", Visibility::Public);
        assert!(check_visibility(&public, None).is_allowed());

        let private = Dashboard::new("b", "B", Visibility::Private);
        assert!(!check_visibility(&private, Some("anything")).is_allowed());
    }

    #[test]
    fn test_check_visibility_password() {
        let dashboard = Dashboard::new("c", "C", Visibility::password_protected("hunter2"));
        assert!(check_visibility(&dashboard, Some("hunter2")).is_allowed());
        assert_eq!(
            check_visibility(&dashboard, Some("wrong")),
            AccessDecision::Denied {
                reason: "bad password".to_string()
            }
        );
        assert_eq!(
            check_visibility(&dashboard, None),
            AccessDecision::Denied {
                reason: "password required".to_string()
            }
        );
    }

    #[test]
    fn test_verifier_is_not_plaintext() {
        let visibility = Visibility::password_protected("hunter2");
        match visibility {
            Visibility::PasswordProtected { verifier } => {
                assert_ne!(verifier, "hunter2");
                assert_eq!(verifier.len(), 64);
            }
            _ => unreachable!(),
        }
    }
}

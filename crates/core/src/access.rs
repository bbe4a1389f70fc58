use secrecy::{ExposeSecret, SecretString};

/// The two password-gated screens of the served interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    StockEntry,
    ViewData,
}

impl Screen {
    pub fn title(self) -> &'static str {
        match self {
            Self::StockEntry => "stock entry",
            Self::ViewData => "view data",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Denied,
}

impl AccessDecision {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Gate check for a screen. Screen logic only sees the decision, so the
/// policy can be swapped without touching handlers.
pub trait AccessPolicy: Send + Sync {
    fn authorize(&self, screen: Screen, presented: &str) -> AccessDecision;
}

/// The deployed policy: both screens share one password.
pub struct SharedPasswordPolicy {
    password: SecretString,
}

impl SharedPasswordPolicy {
    pub fn new(password: SecretString) -> Self {
        Self { password }
    }
}

impl AccessPolicy for SharedPasswordPolicy {
    fn authorize(&self, _screen: Screen, presented: &str) -> AccessDecision {
        let expected = self.password.expose_secret().as_bytes();
        let presented = presented.as_bytes();

        if expected.len() != presented.len() {
            return AccessDecision::Denied;
        }

        // Compare without short-circuiting on content.
        let mismatch = expected.iter().zip(presented).fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if mismatch == 0 {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied
        }
    }
}

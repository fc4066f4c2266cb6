use async_trait::async_trait;

use super::Identity;

/// Produces a display name for identities that carry none
#[async_trait]
pub trait DisplayNameGenerator: Send + Sync {
    async fn generate(&self) -> String;
}

/// Pet name-based display name generator
pub struct PetNameDisplayNameGenerator;

impl PetNameDisplayNameGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PetNameDisplayNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisplayNameGenerator for PetNameDisplayNameGenerator {
    async fn generate(&self) -> String {
        petname::Petnames::default().generate_one(2, "-")
    }
}

/// Provider display name, else the e-mail local part, else a generated handle
pub async fn display_name_for(identity: &Identity, generator: &dyn DisplayNameGenerator) -> String {
    let provided = identity
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(name) = provided {
        return name.to_string();
    }

    let local_part = identity
        .email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .map(str::trim)
        .filter(|part| !part.is_empty());
    if let Some(part) = local_part {
        return part.to_string();
    }

    generator.generate().await
}

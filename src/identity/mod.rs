pub mod generators;
pub mod handlers;
pub mod models;
pub mod token;

pub use generators::{display_name_for, DisplayNameGenerator, PetNameDisplayNameGenerator};
pub use handlers::{get_sync_status, post_identity};
pub use models::{Identity, IdentityClaims, IdentityRequest};
pub use token::{IdentityError, IdentityTokenConfig};

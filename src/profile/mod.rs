// Public API - what other modules can use
pub use handlers::{get_insights, get_profile, get_tier_progress, record_game_result, update_display_name, update_stats};
pub use models::{Achievement, UserProfile, GUEST_DISPLAY_NAME, GUEST_ID};
pub use normalize::{normalize_profile, normalize_stats};
pub use types::{DisplayNameRequest, GameResultResponse};

// Internal modules
mod handlers;
pub mod models;
pub mod normalize;
pub mod types;

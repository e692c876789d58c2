//! Hero section model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Homepage carousel banner, admin-managed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeroSection {
    /// Unique identifier
    pub id: i64,
    /// Overlay text
    pub text: String,
    /// Banner image URL
    pub image_url: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

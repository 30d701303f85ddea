// ============================================================================
// FamEdu Core - Family Entity
// File: crates/famedu-core/src/domain/family.rs
// Description: Grouping of parents and their children
// ============================================================================

use chrono::{DateTime, Utc};
use famedu_shared::constants::DEFAULT_TIMEZONE;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Family entity. Members reference it through `User::family_id`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Family {
    pub id: Uuid,

    #[validate(length(min = 2, max = 100, message = "Family name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 64, message = "Timezone must be between 1 and 64 characters"))]
    pub timezone: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Family {
    pub fn new(name: String, timezone: Option<String>) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let family = Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            timezone: timezone
                .map(|tz| tz.trim().to_string())
                .filter(|tz| !tz.is_empty())
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            created_at: now,
            updated_at: now,
        };

        family.validate()?;
        Ok(family)
    }
}

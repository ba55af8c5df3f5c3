use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::constants::{
    ANY_PREFERENCE, DEFAULT_AGE_RANGE_MAX, DEFAULT_AGE_RANGE_MIN, DEFAULT_MAX_DISTANCE_MILES,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub id: Uuid,
    pub url: String,
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreferences {
    #[sqlx(rename = "pref_age_min")]
    pub age_min: i32,
    #[sqlx(rename = "pref_age_max")]
    pub age_max: i32,
    /// Miles
    #[sqlx(rename = "pref_max_distance")]
    pub max_distance: f64,
    #[sqlx(rename = "pref_seeking_gender")]
    pub seeking_gender: String,
    #[sqlx(rename = "pref_relationship_type")]
    pub relationship_type: String,
}

impl Default for FilterPreferences {
    fn default() -> Self {
        Self {
            age_min: DEFAULT_AGE_RANGE_MIN,
            age_max: DEFAULT_AGE_RANGE_MAX,
            max_distance: DEFAULT_MAX_DISTANCE_MILES,
            seeking_gender: ANY_PREFERENCE.to_string(),
            relationship_type: ANY_PREFERENCE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Location {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub bio: String,
    pub relationship_type: String,
    pub photos: Json<Vec<Photo>>,
    pub selfie: String,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_expires: Option<DateTime<Utc>>,
    #[sqlx(flatten)]
    pub filter_preferences: FilterPreferences,
    #[sqlx(flatten)]
    pub location: Location,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Selfie when present, otherwise the first gallery photo.
    pub fn display_photo(&self) -> String {
        if !self.selfie.is_empty() {
            return self.selfie.clone();
        }
        self.photos
            .first()
            .map(|photo| photo.url.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub verification_token: String,
}

/// Partial profile edit; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub bio: Option<String>,
    pub relationship_type: Option<String>,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub max_distance: Option<f64>,
    pub seeking_gender: Option<String>,
    pub seeking_relationship_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub bio: String,
    pub photos: Vec<Photo>,
    pub distance_miles: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub id: Uuid,
    pub name: String,
    pub photo: String,
}

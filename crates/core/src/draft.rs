//! Plant registration draft, input validation, and the creation request body.
//!
//! A [`PlantDraft`] is filled in step by step (photo, name, nickname,
//! watering interval) and only turned into a [`CreatePlantRequest`] once
//! every field passes validation.

use serde::Serialize;

use crate::error::CoreError;
use crate::image_prep::PreparedImage;

// ---------------------------------------------------------------------------
// Field names (as they appear on the wire)
// ---------------------------------------------------------------------------

pub const FIELD_NAME: &str = "name";
pub const FIELD_NICKNAME: &str = "nickname";
pub const FIELD_WATER_INTERVAL: &str = "waterInterval";
pub const FIELD_IMAGE_URI: &str = "imageUri";
pub const FIELD_USER_UUID: &str = "userUuid";

// ---------------------------------------------------------------------------
// PlantDraft
// ---------------------------------------------------------------------------

/// Client-held state for one registration flow. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct PlantDraft {
    /// Reference to the captured image, sent as `imageUri`.
    pub image_uri: String,
    /// Upload-ready JPEG, present once preparation succeeded.
    pub compressed_image: Option<PreparedImage>,
    /// Recognized or user-typed plant name.
    pub name: String,
    pub nickname: String,
    pub water_interval_days: i64,
    /// Account id supplied by the session store.
    pub user_id: String,
}

impl PlantDraft {
    /// Start a draft for a freshly captured image.
    pub fn new(image_uri: impl Into<String>) -> Self {
        Self {
            image_uri: image_uri.into(),
            ..Default::default()
        }
    }

    /// Check every precondition of the create-record call.
    ///
    /// Order: name, image reference, nickname, watering interval, user id.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_plant_name(&self.name)?;
        if self.image_uri.trim().is_empty() {
            return Err(CoreError::MissingField(FIELD_IMAGE_URI));
        }
        validate_nickname(&self.nickname)?;
        validate_water_interval(self.water_interval_days)?;
        validate_user_id(&self.user_id)?;
        Ok(())
    }

    /// Validate the draft and build the creation body from it.
    pub fn to_create_request(&self) -> Result<CreatePlantRequest, CoreError> {
        self.validate()?;
        Ok(CreatePlantRequest {
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            water_interval: self.water_interval_days,
            image_uri: self.image_uri.clone(),
            user_uuid: self.user_id.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// CreatePlantRequest
// ---------------------------------------------------------------------------

/// JSON body of the create-record call. Field order is part of the wire
/// format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlantRequest {
    pub name: String,
    pub nickname: String,
    pub water_interval: i64,
    pub image_uri: String,
    pub user_uuid: String,
}

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

/// A plant name is required before the flow moves on to the nickname step.
pub fn validate_plant_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::MissingField(FIELD_NAME));
    }
    Ok(())
}

pub fn validate_nickname(nickname: &str) -> Result<(), CoreError> {
    if nickname.trim().is_empty() {
        return Err(CoreError::MissingField(FIELD_NICKNAME));
    }
    Ok(())
}

pub fn validate_water_interval(days: i64) -> Result<(), CoreError> {
    if days <= 0 {
        return Err(CoreError::Validation(format!(
            "Watering interval must be a positive number of days, got {days}"
        )));
    }
    Ok(())
}

/// The user id comes from the session store; an empty one means the user
/// has to sign in again.
pub fn validate_user_id(user_id: &str) -> Result<(), CoreError> {
    if user_id.trim().is_empty() {
        return Err(CoreError::MissingField(FIELD_USER_UUID));
    }
    Ok(())
}

/// Parse the watering interval exactly as typed by the user.
///
/// Empty input, non-numeric input, and non-positive numbers each produce
/// a distinct message.
pub fn parse_water_interval(input: &str) -> Result<i64, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::MissingField(FIELD_WATER_INTERVAL));
    }

    let days: i64 = trimmed.parse().map_err(|_| {
        CoreError::Validation(format!(
            "Watering interval must be a whole number of days, got '{trimmed}'"
        ))
    })?;

    validate_water_interval(days)?;
    Ok(days)
}

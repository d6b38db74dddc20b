use crate::database::models::{ReminderSettings, UserProfile};
use crate::error::{AppError, AppResult};
use crate::utils::time::{DateKey, parse_time_string};
use chrono::{NaiveDate, NaiveTime};

/// Longest work description, in characters. Keeps a full week inside
/// Discord's embed limits.
pub const MAX_DESCRIPTION_LEN: usize = 200;
pub const MAX_PROFILE_FIELD_LEN: usize = 200;

pub fn validate_hours(hours: f64) -> AppResult<f64> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(AppError::validation(
            "Please enter a positive number of hours",
        ));
    }
    if hours > 24.0 {
        return Err(AppError::validation(
            "A single day cannot have more than 24 hours",
        ));
    }
    Ok(hours)
}

pub fn validate_rate(rate: f64) -> AppResult<f64> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(AppError::validation(
            "Hourly rate must be a positive number",
        ));
    }
    Ok(rate)
}

pub fn validate_date(raw: &str) -> AppResult<NaiveDate> {
    raw.parse::<DateKey>()
        .map(|key| key.date())
        .map_err(|e| AppError::validation(e.to_string()))
}

/// Trims the description and rejects it when it is too long.
pub fn validate_description(raw: &str) -> AppResult<String> {
    let description = raw.trim();
    let length = description.chars().count();
    if length > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation(format!(
            "Description is too long ({} characters, max {})",
            length, MAX_DESCRIPTION_LEN
        )));
    }
    Ok(description.to_string())
}

pub fn validate_time_format(time_str: &str) -> AppResult<NaiveTime> {
    parse_time_string(time_str).map_err(|e| AppError::validation(e.to_string()))
}

/// Trims every text field and rejects the profile if any is blank.
pub fn validate_profile(profile: UserProfile) -> AppResult<UserProfile> {
    let profile = UserProfile {
        full_name: profile.full_name.trim().to_string(),
        email: profile.email.trim().to_string(),
        address: profile.address.trim().to_string(),
        phone: profile.phone.trim().to_string(),
        abn: profile.abn.trim().to_string(),
        hourly_rate: profile.hourly_rate,
    };

    let missing: Vec<&str> = [
        ("full name", &profile.full_name),
        ("email", &profile.email),
        ("address", &profile.address),
        ("phone", &profile.phone),
        ("ABN", &profile.abn),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(label, _)| label)
    .collect();

    if !missing.is_empty() {
        return Err(AppError::validation(format!(
            "Please fill in all required fields (missing: {})",
            missing.join(", ")
        )));
    }

    let too_long: Vec<&str> = [
        ("full name", &profile.full_name),
        ("email", &profile.email),
        ("address", &profile.address),
        ("phone", &profile.phone),
        ("ABN", &profile.abn),
    ]
    .into_iter()
    .filter(|(_, value)| value.chars().count() > MAX_PROFILE_FIELD_LEN)
    .map(|(label, _)| label)
    .collect();

    if !too_long.is_empty() {
        return Err(AppError::validation(format!(
            "Profile fields are limited to {} characters (too long: {})",
            MAX_PROFILE_FIELD_LEN,
            too_long.join(", ")
        )));
    }

    validate_rate(profile.hourly_rate)?;
    Ok(profile)
}

pub fn is_profile_complete(profile: &UserProfile) -> bool {
    validate_profile(profile.clone()).is_ok()
}

pub fn validate_reminder_settings(settings: &ReminderSettings) -> AppResult<NaiveTime> {
    validate_time_format(&settings.time)
}

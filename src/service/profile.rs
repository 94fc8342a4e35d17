//! Onboarding and profile edits applied to a loaded [`Profile`].

use serde_json::{Map, Value};

use crate::{
    core::{
        error::ServiceError,
        utils::{clean_text, to_bool},
    },
    model::profile::{Profile, AGE_GROUPS, GENDERS, REGIONS, STYLE_KEYWORDS_MAX_LEN},
};

fn text_field<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// Trimmed choice value, `None` when blank. Unknown values are rejected.
fn choice_field(
    body: &Map<String, Value>,
    key: &str,
    allowed: &[&str],
) -> Result<Option<String>, ServiceError> {
    let Some(value) = clean_text(text_field(body, key)) else {
        return Ok(None);
    };
    if !allowed.contains(&value.as_str()) {
        return Err(ServiceError::Validation(format!(
            "Invalid {}. Allowed: {}",
            key,
            allowed.join(", ")
        )));
    }
    Ok(Some(value))
}

fn style_keywords(body: &Map<String, Value>) -> Result<String, ServiceError> {
    let value = clean_text(text_field(body, "style_keywords")).unwrap_or_default();
    if value.chars().count() > STYLE_KEYWORDS_MAX_LEN {
        return Err(ServiceError::Validation(format!(
            "style_keywords must be at most {} characters.",
            STYLE_KEYWORDS_MAX_LEN
        )));
    }
    Ok(value)
}

/// Onboarding submit: blank choices keep what is stored, keywords and consent
/// are always overwritten and the profile is marked onboarded.
pub fn apply_onboarding(profile: &mut Profile, body: &Map<String, Value>) -> Result<(), ServiceError> {
    let age_group = choice_field(body, "age_group", AGE_GROUPS)?;
    let gender = choice_field(body, "gender", GENDERS)?;
    let region = choice_field(body, "region", REGIONS)?;
    let style_keywords = style_keywords(body)?;

    if age_group.is_some() {
        profile.age_group = age_group;
    }
    if gender.is_some() {
        profile.gender = gender;
    }
    if region.is_some() {
        profile.region = region;
    }
    profile.style_keywords = style_keywords;
    profile.consent_use_demographics = to_bool(body.get("consent_use_demographics"));
    profile.onboarded = true;
    Ok(())
}

/// Profile editor save: every field is overwritten, blank clears it.
/// `onboarded` only changes when the key is sent.
pub fn apply_profile_save(profile: &mut Profile, body: &Map<String, Value>) -> Result<(), ServiceError> {
    let age_group = choice_field(body, "age_group", AGE_GROUPS)?;
    let gender = choice_field(body, "gender", GENDERS)?;
    let region = choice_field(body, "region", REGIONS)?;
    let style_keywords = style_keywords(body)?;

    profile.age_group = age_group;
    profile.gender = gender;
    profile.region = region;
    profile.style_keywords = style_keywords;
    profile.consent_use_demographics = to_bool(body.get("consent_use_demographics"));
    if body.contains_key("onboarded") {
        profile.onboarded = to_bool(body.get("onboarded"));
    }
    Ok(())
}

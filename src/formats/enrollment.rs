//! Decoding of the enrollment list and of the user profile

use serde::Deserialize;

use crate::error::{PortalError, Result};
use crate::resource::Resource;
use crate::{Profile, Subject};

#[derive(Deserialize)]
struct RawSubject {
    #[serde(rename = "idAssig")]
    id: String,
    #[serde(rename = "nom")]
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawProfile {
    username: String,
    #[serde(rename = "nom")]
    first_name: Option<String>,
    #[serde(rename = "cognoms")]
    last_names: Option<String>,
    email: Option<String>,
}

/// Decode the list of enrolled subjects, keeping the order of the document
pub fn parse_subjects(raw: &[u8]) -> Result<Vec<Subject>> {
    let subjects: Vec<RawSubject> = serde_json::from_slice(raw)
        .map_err(|err| PortalError::malformed(Resource::Subjects, err))?;

    Ok(subjects.into_iter()
        .map(|s| match s.name {
            Some(name) if name.is_empty() == false => Subject::new(s.id, name),
            _ => Subject::from_id(s.id),
        })
        .collect())
}

/// Decode the user profile. The document is an array, whose first element describes the signed-in user
pub fn parse_profile(raw: &[u8]) -> Result<Profile> {
    let profiles: Vec<RawProfile> = serde_json::from_slice(raw)
        .map_err(|err| PortalError::malformed(Resource::Profile, err))?;

    let first = profiles.into_iter()
        .next()
        .ok_or_else(|| PortalError::malformed(Resource::Profile, "empty profile list"))?;

    Ok(Profile {
        username: first.username,
        first_name: first.first_name,
        last_names: first.last_names,
        email: first.email,
    })
}

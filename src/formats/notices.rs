//! Decoding of the JSON notice document, an object that maps subject identifiers to arrays of notices

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{PortalError, Result};
use crate::resource::Resource;
use crate::{Attachment, Notice, PubDate};

/// Identifiers are numbers in current API versions, but strings are accepted as well
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Deserialize)]
struct RawAttachment {
    id: RawId,
    #[serde(rename = "fileName")]
    file_name: String,
}

#[derive(Deserialize)]
struct RawNotice {
    id: RawId,
    title: String,
    #[serde(rename = "pubDate")]
    pub_date: String,
    description: String,
    attachments: Vec<RawAttachment>,
}

/// Decode the notices document. Any malformed notice makes the whole document invalid
pub fn parse(raw_json: &str) -> Result<HashMap<String, Vec<Notice>>> {
    parse_bytes(raw_json.as_bytes())
}

pub fn parse_bytes(raw: &[u8]) -> Result<HashMap<String, Vec<Notice>>> {
    let by_subject: HashMap<String, Vec<RawNotice>> = serde_json::from_slice(raw)
        .map_err(|err| PortalError::malformed(Resource::Notices, err))?;

    let mut result = HashMap::with_capacity(by_subject.len());
    for (subject_id, raw_notices) in by_subject {
        let mut notices = Vec::with_capacity(raw_notices.len());
        for raw_notice in raw_notices {
            notices.push(into_notice(&subject_id, raw_notice)?);
        }
        result.insert(subject_id, notices);
    }
    Ok(result)
}

fn into_notice(subject_id: &str, raw: RawNotice) -> Result<Notice> {
    let id = raw.id.into_string();
    let raw_date = raw.pub_date;
    let pub_date = PubDate::from_notice_field(&raw_date)
        .ok_or_else(|| PortalError::malformed(Resource::Notices, format!("notice {} has an invalid date {:?}", id, raw_date)))?;

    let attachments = raw.attachments.into_iter()
        .map(|a| Attachment::new(a.id.into_string(), a.file_name))
        .collect();

    Ok(Notice::new(id, subject_id.to_string(), raw.title, pub_date, raw.description, attachments))
}

//! Groups notices by enrolled subject, ready for a collapsible list

use std::collections::HashMap;

use crate::{ColorScheme, Notice, Subject};

/// The notices of one subject
#[derive(Clone, Debug, PartialEq)]
pub struct SubjectNotices {
    pub subject: Subject,
    pub notices: Vec<Notice>,
}

/// Join notices against the enrollment list.
///
/// The result follows the enrollment order. Subjects that have no entry in `parsed_by_subject` are left out,
/// and so are notices of subjects the user is not enrolled in.
pub fn aggregate(enrolled_subjects: &[Subject], parsed_by_subject: &HashMap<String, Vec<Notice>>) -> Vec<SubjectNotices> {
    enrolled_subjects.iter()
        .filter_map(|subject| {
            parsed_by_subject.get(subject.id()).map(|notices| SubjectNotices {
                subject: subject.clone(),
                notices: notices.clone(),
            })
        })
        .collect()
}

/// Everything the notices screen displays
#[derive(Clone, Debug, Default)]
pub struct NoticeBoard {
    groups: Vec<SubjectNotices>,
    colors: ColorScheme,
}

impl NoticeBoard {
    pub fn new(enrolled_subjects: &[Subject], parsed_by_subject: &HashMap<String, Vec<Notice>>) -> Self {
        Self {
            groups: aggregate(enrolled_subjects, parsed_by_subject),
            colors: ColorScheme::new(enrolled_subjects),
        }
    }

    pub fn groups(&self) -> &[SubjectNotices] { &self.groups }
    pub fn colors(&self) -> &ColorScheme { &self.colors }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn notice_count(&self) -> usize {
        self.groups.iter().map(|g| g.notices.len()).sum()
    }

    pub fn notices_of(&self, subject_id: &str) -> Option<&[Notice]> {
        self.groups.iter()
            .find(|g| g.subject.id() == subject_id)
            .map(|g| g.notices.as_slice())
    }
}

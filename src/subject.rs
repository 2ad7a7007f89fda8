//! Enrolled subjects, the signed-in user, and how subjects are told apart

use std::collections::HashMap;

use csscolorparser::Color;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A course the user is enrolled in
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    id: String,
    name: String,
}

impl Subject {
    pub fn new<S: ToString, T: ToString>(id: S, name: T) -> Self {
        Self { id: id.to_string(), name: name.to_string() }
    }

    /// A subject whose display name is its identifier (e.g. `"IDI"`)
    pub fn from_id<S: ToString>(id: S) -> Self {
        let id = id.to_string();
        Self { name: id.clone(), id }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { &self.name }
}

/// The signed-in user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub first_name: Option<String>,
    pub last_names: Option<String>,
    pub email: Option<String>,
}

impl Profile {
    /// What a welcome banner should show
    pub fn display_name(&self) -> &str {
        &self.username
    }
}

static PALETTE: Lazy<Vec<Color>> = Lazy::new(|| {
    [
        "#DFE9C6", "#FFF3BA", "#FFD2A7", "#BDDCE9", "#DDBFE4",
        "#F4828C", "#BD8B5A", "#EEABCA", "#C2BB63", "#297DB5",
    ].iter()
        .filter_map(|hex| csscolorparser::parse(hex).ok())
        .collect()
});

/// Gives every enrolled subject its own colour, so that it is recognizable across views
///
/// Colours are picked from a fixed palette in enrollment order, and are reused once the palette is exhausted.
#[derive(Clone, Debug, Default)]
pub struct ColorScheme {
    colors: HashMap<String, Color>,
}

impl ColorScheme {
    pub fn new(subjects: &[Subject]) -> Self {
        let colors = subjects.iter()
            .zip(PALETTE.iter().cycle())
            .map(|(subject, color)| (subject.id().to_string(), color.clone()))
            .collect();
        Self { colors }
    }

    pub fn color_of(&self, subject_id: &str) -> Option<&Color> {
        self.colors.get(subject_id)
    }

    pub fn palette_len() -> usize {
        PALETTE.len()
    }
}

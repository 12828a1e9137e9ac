// Presets - Named operation lists shipped with the editor

use crate::domain::errors::ValidationError;
use crate::domain::model::*;

/// A named, ready-made operation list
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    operations: Vec<Operation>,
}

impl Preset {
    /// Operations of this preset as a validated list
    pub fn operations(&self) -> Result<OperationList, ValidationError> {
        OperationList::from_operations(self.operations.clone())
    }
}

/// All built-in presets
pub fn builtin() -> Vec<Preset> {
    vec![
        Preset {
            name: "cinematic",
            description: "Punchier contrast with a slight lift",
            operations: vec![Operation::filters(
                FilterSet::new()
                    .with(FilterKind::Contrast, 120)
                    .with(FilterKind::Brightness, 110),
            )],
        },
        Preset {
            name: "vintage",
            description: "Sepia tone with softened contrast",
            operations: vec![Operation::filters(
                FilterSet::new()
                    .with(FilterKind::Sepia, 80)
                    .with(FilterKind::Contrast, 90),
            )],
        },
        Preset {
            name: "social-media",
            description: "Square 1080x1080 with a touch of brightness",
            operations: vec![
                Operation::resize(1080, 1080),
                Operation::filters(FilterSet::new().with(FilterKind::Brightness, 105)),
            ],
        },
        Preset {
            name: "youtube",
            description: "Full HD 1920x1080 with a touch of contrast",
            operations: vec![
                Operation::resize(1920, 1080),
                Operation::filters(FilterSet::new().with(FilterKind::Contrast, 110)),
            ],
        },
    ]
}

/// Look up a built-in preset by name, case-insensitively
pub fn find(name: &str) -> Option<Preset> {
    let wanted = name.trim().to_lowercase();
    builtin().into_iter().find(|p| p.name == wanted)
}

// Domain layer - Operation model, validation rules and payload normalization

pub mod errors;
pub mod legacy;
pub mod model;
pub mod presets;
pub mod rules;

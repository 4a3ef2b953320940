use serde::{Deserialize, Serialize};

use quill_core::{AuthorId, Entity, ValidationFailure};

/// Longest name the `authors.name` column holds.
pub const MAX_NAME_LEN: usize = 30;

/// A byline. Real journalists and house pseudonyms alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    id: AuthorId,
    name: String,
    is_real_person: bool,
}

impl Entity for Author {
    const NAME: &'static str = "Author";
    type Id = AuthorId;

    fn id(&self) -> &AuthorId {
        &self.id
    }
}

impl Author {
    pub fn create(id: AuthorId, name: &str, is_real_person: bool) -> Result<Self, ValidationFailure> {
        Ok(Self {
            id,
            name: validate_name(name)?,
            is_real_person,
        })
    }

    /// Rebuild from storage. No validation.
    pub fn restore(id: AuthorId, name: String, is_real_person: bool) -> Self {
        Self {
            id,
            name,
            is_real_person,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_real_person(&self) -> bool {
        self.is_real_person
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), ValidationFailure> {
        self.name = validate_name(name)?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, ValidationFailure> {
    let name = name.trim();
    let mut problems = Vec::new();
    if name.is_empty() {
        problems.push("no name".to_string());
    }
    if name.chars().count() > MAX_NAME_LEN {
        problems.push(format!("name is longer than {MAX_NAME_LEN} characters"));
    }
    if problems.is_empty() {
        Ok(name.to_string())
    } else {
        Err(ValidationFailure::new(problems))
    }
}

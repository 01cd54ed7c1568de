//! Field validation for create/update request bodies.
//!
//! Bodies arrive as raw JSON so that every rejected field is reported at once;
//! the resulting messages are joined with `"; "` by [`AppError::Validation`].

use super::spell::{Element, Rarity, SpellDraft, SpellPatch};
use crate::error::AppError;
use serde_json::{Map, Value};

const ELEMENT_CHOICES: &str = "Arcane, Fire, Frost, Storm, Nature";
const RARITY_CHOICES: &str = "Common, Uncommon, Rare, Mythic";

struct FieldReader<'a> {
    body: &'a Map<String, Value>,
    errors: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn new(body: &'a Value) -> Result<Self, AppError> {
        match body {
            Value::Object(body) => Ok(Self {
                body,
                errors: Vec::new(),
            }),
            _ => Err(AppError::invalid("request body must be a JSON object")),
        }
    }

    /// Present and not `null`.
    fn field(&self, key: &str) -> Option<&'a Value> {
        self.body.get(key).filter(|value| !value.is_null())
    }

    fn name(&mut self, required: bool) -> Option<String> {
        match self.field("name") {
            None => {
                if required {
                    self.errors.push("name is required".to_string());
                }
                None
            }
            Some(Value::String(raw)) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    self.errors.push("name must not be empty".to_string());
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Some(_) => {
                self.errors.push("name must be a string".to_string());
                None
            }
        }
    }

    fn element(&mut self) -> Option<Element> {
        let value = self.field("element")?;
        let parsed = value.as_str().and_then(Element::from_name);
        if parsed.is_none() {
            self.errors
                .push(format!("element must be one of {}", ELEMENT_CHOICES));
        }
        parsed
    }

    fn rarity(&mut self) -> Option<Rarity> {
        let value = self.field("rarity")?;
        let parsed = value.as_str().and_then(Rarity::from_name);
        if parsed.is_none() {
            self.errors
                .push(format!("rarity must be one of {}", RARITY_CHOICES));
        }
        parsed
    }

    fn count(&mut self, key: &str) -> Option<u32> {
        let value = self.field(key)?;
        let parsed = parse_count(value);
        if parsed.is_none() {
            self.errors
                .push(format!("{} must be a non-negative integer", key));
        }
        parsed
    }

    fn description(&mut self) -> Option<String> {
        match self.field("description")? {
            Value::String(text) => Some(text.clone()),
            _ => {
                self.errors.push("description must be a string".to_string());
                None
            }
        }
    }

    fn ingredients(&mut self) -> Option<Vec<String>> {
        let value = self.field("ingredients")?;
        let parsed = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::trim))
                .collect::<Option<Vec<&str>>>()
        });
        match parsed {
            Some(items) => Some(
                items
                    .into_iter()
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            None => {
                self.errors
                    .push("ingredients must be an array of strings".to_string());
                None
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Accept JSON integers, integral floats, and numeric strings (form input).
fn parse_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => {
            if let Some(n) = number.as_u64() {
                return u32::try_from(n).ok();
            }
            let n = number.as_f64()?;
            if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
                Some(n as u32)
            } else {
                None
            }
        }
        Value::String(raw) => raw.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Validate a create body and apply defaults for omitted optional fields.
///
/// # Errors
/// Returns [`AppError::Validation`] listing every rejected field.
pub fn validate_create(body: &Value) -> Result<SpellDraft, AppError> {
    let mut reader = FieldReader::new(body)?;
    let name = reader.name(true);
    let element = reader.element();
    let rarity = reader.rarity();
    let mana_cost = reader.count("manaCost");
    let cooldown_sec = reader.count("cooldownSec");
    let description = reader.description();
    let ingredients = reader.ingredients();

    let draft = SpellDraft {
        name: name.unwrap_or_default(),
        element: element.unwrap_or_default(),
        rarity: rarity.unwrap_or_default(),
        mana_cost: mana_cost.unwrap_or(0),
        cooldown_sec: cooldown_sec.unwrap_or(0),
        description: description.unwrap_or_default(),
        ingredients: ingredients.unwrap_or_default(),
    };
    reader.finish(draft)
}

/// Validate an update body; only fields that are present are checked.
///
/// # Errors
/// Returns [`AppError::Validation`] listing every rejected field.
pub fn validate_update(body: &Value) -> Result<SpellPatch, AppError> {
    let mut reader = FieldReader::new(body)?;
    let patch = SpellPatch {
        name: reader.name(false),
        element: reader.element(),
        rarity: reader.rarity(),
        mana_cost: reader.count("manaCost"),
        cooldown_sec: reader.count("cooldownSec"),
        description: reader.description(),
        ingredients: reader.ingredients(),
    };
    reader.finish(patch)
}

/// Validate a typed draft the same way the server validates a create body.
///
/// Clients use this before sending so an empty name never leaves the process.
///
/// # Errors
/// Returns [`AppError::Validation`] when the name is blank.
pub fn validate_draft(draft: &SpellDraft) -> Result<(), AppError> {
    if draft.name.trim().is_empty() {
        return Err(AppError::invalid("name is required"));
    }
    Ok(())
}

/// Reject a typed patch whose name is present but blank.
///
/// # Errors
/// Returns [`AppError::Validation`] when `patch.name` is `Some` and blank.
pub fn validate_patch(patch: &SpellPatch) -> Result<(), AppError> {
    match patch.name.as_deref() {
        Some(name) if name.trim().is_empty() => Err(AppError::invalid("name must not be empty")),
        _ => Ok(()),
    }
}

//! Static validation for campground form input.
//!
//! The original app validated a dynamic request body against a Joi schema and
//! joined the violation messages with commas into a 400. Here the form is a typed
//! struct whose fields are all optional, so a missing field is reported by this
//! module rather than by the extractor, with the same comma-joined surface.

use serde::Deserialize;
use thiserror::Error;

use crate::campground::CampgroundInput;

/// Raw form body for campground create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampgroundForm {
    pub title: Option<String>,
    pub location: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

/// One message per violated field, each naming the field.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{}", .messages.join(","))]
pub struct ValidationErrors {
    pub messages: Vec<String>,
}

pub fn validate(form: CampgroundForm) -> Result<CampgroundInput, ValidationErrors> {
    let mut messages = Vec::new();

    let title = required_text("title", form.title, &mut messages);
    let location = required_text("location", form.location, &mut messages);
    let image = required_text("image", form.image, &mut messages);
    let description = required_text("description", form.description, &mut messages);

    let price = match form.price.as_deref().map(str::trim) {
        None | Some("") => {
            messages.push(String::from("price is required"));
            0.0
        }
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) if value >= 0.0 => value,
            Ok(_) => {
                messages.push(String::from("price must be zero or greater"));
                0.0
            }
            Err(_) => {
                messages.push(String::from("price must be a number"));
                0.0
            }
        },
    };

    if messages.is_empty() {
        Ok(CampgroundInput {
            title,
            location,
            price,
            image,
            description,
        })
    } else {
        Err(ValidationErrors { messages })
    }
}

fn required_text(field: &str, value: Option<String>, messages: &mut Vec<String>) -> String {
    match value.map(|v| String::from(v.trim())) {
        Some(v) if !v.is_empty() => v,
        _ => {
            messages.push(format!("{field} is required"));
            String::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::{validate, CampgroundForm};

    fn full_form() -> CampgroundForm {
        CampgroundForm {
            title: Some(String::from("  River Bend ")),
            location: Some(String::from("Bend, OR")),
            price: Some(String::from("25")),
            image: Some(String::from("https://example.com/a.jpg")),
            description: Some(String::from("quiet site")),
        }
    }

    #[test]
    fn valid_form_passes_and_trims_text() {
        let input = validate(full_form()).unwrap();
        assert_eq!(input.title, "River Bend");
        assert_eq!(input.price, 25.0);
    }

    #[test]
    fn missing_title_names_the_field() {
        let form = CampgroundForm {
            title: None,
            ..full_form()
        };
        let errors = validate(form).unwrap_err();
        assert!(errors.to_string().contains("title"));
    }

    #[test]
    fn blank_field_counts_as_missing() {
        let form = CampgroundForm {
            location: Some(String::from("   ")),
            ..full_form()
        };
        let errors = validate(form).unwrap_err();
        assert!(errors.to_string().contains("location is required"));
    }

    #[test]
    fn all_violations_are_joined_by_commas() {
        let errors = validate(CampgroundForm::default()).unwrap_err();
        let message = errors.to_string();
        for field in ["title", "location", "price", "image", "description"] {
            assert!(message.contains(field), "missing {field} in: {message}");
        }
        assert_eq!(message.matches(',').count(), 4);
    }

    #[test]
    fn negative_price_is_rejected() {
        let form = CampgroundForm {
            price: Some(String::from("-3")),
            ..full_form()
        };
        let errors = validate(form).unwrap_err();
        assert!(errors.to_string().contains("price must be zero or greater"));
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let form = CampgroundForm {
            price: Some(String::from("cheap")),
            ..full_form()
        };
        let errors = validate(form).unwrap_err();
        assert!(errors.to_string().contains("price must be a number"));
    }
}

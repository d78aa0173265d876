use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::listing::Listing;
use crate::utils::phone::{digits_only, format_local, is_local_number};
use crate::utils::validation::is_email;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Phone,
    Email,
}

/// What to ask the viewer before handing off to the dialer or mail client,
/// and the URI to hand off if they say yes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPrompt {
    pub kind: ContactKind,
    pub title: String,
    pub question: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub uri: String,
}

#[derive(Debug, Clone)]
pub struct ContactService {
    country_code: String,
}

impl ContactService {
    pub fn new(country_code: impl Into<String>) -> Self {
        let country_code = country_code.into();
        Self {
            country_code: country_code.trim_start_matches('+').to_string(),
        }
    }

    pub fn prompt(&self, kind: ContactKind, value: &str) -> Result<ContactPrompt> {
        let value = value.trim();
        let (title, question, uri) = match kind {
            ContactKind::Phone => {
                let digits = digits_only(value);
                if !is_local_number(&digits) {
                    return Err(Error::BadRequest(
                        "phone number must have 9 digits".to_string(),
                    ));
                }
                (
                    "Zəng Təsdiqi",
                    format!(
                        "Siz +{} ({}) nömrəsinə zəng etmək istəyirsiniz?",
                        self.country_code,
                        format_local(&digits)
                    ),
                    format!("tel:+{}{}", self.country_code, digits),
                )
            }
            ContactKind::Email => {
                if !is_email(value) {
                    return Err(Error::BadRequest("invalid email address".to_string()));
                }
                (
                    "E-mail Təsdiqi",
                    format!("Siz {} ünvanına e-mail göndərmək istəyirsiniz?", value),
                    format!("mailto:{}", value),
                )
            }
        };

        Ok(ContactPrompt {
            kind,
            title: title.to_string(),
            question,
            confirm_label: "Bəli".to_string(),
            cancel_label: "Xeyr".to_string(),
            uri,
        })
    }

    /// Prompt for reaching the author of `listing`; fails when the author
    /// declined to share that channel.
    pub fn for_listing(&self, listing: &Listing, kind: ContactKind) -> Result<ContactPrompt> {
        match kind {
            ContactKind::Phone if listing.phone_contactable() => {
                self.prompt(kind, &listing.contact_number)
            }
            ContactKind::Email if listing.email_contactable() => self.prompt(kind, &listing.email),
            _ => Err(Error::BadRequest(
                "the author did not share this contact".to_string(),
            )),
        }
    }
}

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::listing::{
    parse_wire, AgeRange, EmployerDetails, Gender, JobSeekerDetails, ListingDetails, ListingKind,
    NewListing, RequiredExperience, SeekerExperience, WorkMode, ANY, NO_EMAIL, NO_SKILLS,
    PERSONAL_LISTING, PHONE_DECLINED,
};
use crate::utils::phone::{digits_only, is_local_pattern};
use crate::utils::validation::{error, is_email};

pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 99;
const MAX_FIELD_CHARS: usize = 1000;

/// Per-field "I don't want to / I don't have" checkboxes on the posting form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptOuts {
    pub phone: bool,
    pub email: bool,
    pub skills: bool,
    pub company: bool,
    /// Unset follows the form default: opted out unless a region was typed.
    pub region: Option<bool>,
    /// Unset follows the form default: opted out unless skills were typed.
    pub required_skills: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormField {
    ContactNumber,
    Email,
    FullName,
    Skills,
    JobTitle,
    Region,
    Company,
    RequiredSkills,
}

impl FormField {
    pub fn name(&self) -> &'static str {
        match self {
            FormField::ContactNumber => "contact_number",
            FormField::Email => "email",
            FormField::FullName => "full_name",
            FormField::Skills => "skills",
            FormField::JobTitle => "job_title",
            FormField::Region => "region",
            FormField::Company => "company",
            FormField::RequiredSkills => "required_skills",
        }
    }
}

const JOB_SEEKER_FIELDS: &[FormField] = &[
    FormField::ContactNumber,
    FormField::Email,
    FormField::Skills,
    FormField::JobTitle,
    FormField::Region,
    FormField::FullName,
];

const EMPLOYER_FIELDS: &[FormField] = &[
    FormField::Company,
    FormField::Email,
    FormField::ContactNumber,
    FormField::Region,
    FormField::RequiredSkills,
    FormField::FullName,
];

/// Render state of one text input, derived from its raw value and opt-out flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    pub value: String,
    pub enabled: bool,
    pub required: bool,
}

impl FieldState {
    fn input(raw: Option<&str>) -> Self {
        Self {
            value: raw.unwrap_or_default().trim().to_string(),
            enabled: true,
            required: true,
        }
    }

    fn opted_out(sentinel: &str) -> Self {
        Self {
            value: sentinel.to_string(),
            enabled: false,
            required: false,
        }
    }

    fn resolve(raw: Option<&str>, opted_out: bool, sentinel: &str) -> Self {
        if opted_out {
            Self::opted_out(sentinel)
        } else {
            Self::input(raw)
        }
    }

    pub fn is_missing(&self) -> bool {
        self.required && self.value.is_empty()
    }
}

/// The posting form for either listing variant. Fields that do not belong to
/// the chosen `type` are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingForm {
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub contact_number: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub hide_my_name: bool,

    pub skills: Option<String>,
    pub work_form: Option<String>,
    pub job_title: Option<String>,
    pub gender: Option<String>,
    pub age: Option<i64>,
    pub experience: Option<String>,
    pub region: Option<String>,

    pub company: Option<String>,
    pub worker_form: Option<String>,
    pub age_range: Option<String>,
    pub required_skills: Option<String>,

    #[serde(default)]
    pub opt_outs: OptOuts,
}

impl ListingForm {
    pub fn blank(kind: ListingKind) -> Self {
        Self {
            kind,
            contact_number: None,
            email: None,
            full_name: None,
            hide_my_name: false,
            skills: None,
            work_form: None,
            job_title: None,
            gender: None,
            age: None,
            experience: None,
            region: None,
            company: None,
            worker_form: None,
            age_range: None,
            required_skills: None,
            opt_outs: OptOuts::default(),
        }
    }

    pub fn fields(&self) -> &'static [FormField] {
        match self.kind {
            ListingKind::JobSeeker => JOB_SEEKER_FIELDS,
            ListingKind::Employer => EMPLOYER_FIELDS,
        }
    }

    pub fn field(&self, field: FormField) -> FieldState {
        let opt = &self.opt_outs;
        match field {
            FormField::ContactNumber => {
                FieldState::resolve(self.contact_number.as_deref(), opt.phone, PHONE_DECLINED)
            }
            FormField::Email => FieldState::resolve(self.email.as_deref(), opt.email, NO_EMAIL),
            FormField::FullName => FieldState::input(self.full_name.as_deref()),
            FormField::Skills => FieldState::resolve(self.skills.as_deref(), opt.skills, NO_SKILLS),
            FormField::JobTitle => FieldState::input(self.job_title.as_deref()),
            FormField::Region => {
                let opted_out = defaulted_opt_out(opt.region, self.region.as_deref());
                FieldState::resolve(self.region.as_deref(), opted_out, ANY)
            }
            FormField::Company => {
                FieldState::resolve(self.company.as_deref(), opt.company, PERSONAL_LISTING)
            }
            FormField::RequiredSkills => {
                let opted_out =
                    defaulted_opt_out(opt.required_skills, self.required_skills.as_deref());
                FieldState::resolve(self.required_skills.as_deref(), opted_out, ANY)
            }
        }
    }

    pub fn field_states(&self) -> BTreeMap<&'static str, FieldState> {
        self.fields()
            .iter()
            .map(|field| (field.name(), self.field(*field)))
            .collect()
    }

    /// Validates the form and builds the record to store for `owner`.
    /// Values are trimmed and a typed phone number keeps only its digits.
    pub fn to_new_listing(&self, owner: Uuid) -> Result<NewListing, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let contact_number = self.checked_text(FormField::ContactNumber, &mut errors);
        let contact_number = if self.opt_outs.phone {
            contact_number
        } else {
            digits_only(&contact_number)
        };
        let email = self.checked_text(FormField::Email, &mut errors);
        let full_name = self.checked_text(FormField::FullName, &mut errors);

        let details = match self.kind {
            ListingKind::JobSeeker => self.job_seeker_details(&mut errors),
            ListingKind::Employer => self.employer_details(&mut errors),
        };

        match details {
            Some(details) if errors.errors().is_empty() => Ok(NewListing {
                user_id: owner,
                contact_number,
                email,
                hide_my_name: self.hide_my_name,
                full_name: Some(full_name).filter(|name| !name.is_empty()),
                details,
            }),
            _ => Err(errors),
        }
    }

    fn job_seeker_details(&self, errors: &mut ValidationErrors) -> Option<ListingDetails> {
        let skills = self.checked_text(FormField::Skills, errors);
        let job_title = self.checked_text(FormField::JobTitle, errors);
        let region = self.checked_text(FormField::Region, errors);
        let work_form = choice(self.work_form.as_deref(), Some(WorkMode::Online), "work_form", errors);
        let gender = choice::<Gender>(self.gender.as_deref(), None, "gender", errors);
        let gender = match gender {
            Some(Gender::Any) => {
                errors.add(
                    "gender",
                    error("invalid_choice", "job seekers must state male or female"),
                );
                None
            }
            other => other,
        };
        let age = self.checked_age(errors);
        let experience =
            choice::<SeekerExperience>(self.experience.as_deref(), None, "experience", errors);

        Some(ListingDetails::JobSeeker(JobSeekerDetails {
            skills,
            work_form: work_form?,
            job_title,
            gender: gender?,
            age: age?,
            experience: experience?,
            region,
        }))
    }

    fn employer_details(&self, errors: &mut ValidationErrors) -> Option<ListingDetails> {
        let company = self.checked_text(FormField::Company, errors);
        let required_skills = self.checked_text(FormField::RequiredSkills, errors);
        let region = self.checked_text(FormField::Region, errors);
        let worker_form = choice(
            self.worker_form.as_deref(),
            Some(WorkMode::Physical),
            "worker_form",
            errors,
        );
        let gender = choice(self.gender.as_deref(), Some(Gender::Any), "gender", errors);
        let age_range = choice::<AgeRange>(self.age_range.as_deref(), None, "age_range", errors);
        let experience =
            choice::<RequiredExperience>(self.experience.as_deref(), None, "experience", errors);

        Some(ListingDetails::Employer(EmployerDetails {
            company,
            worker_form: worker_form?,
            age_range: age_range?,
            experience: experience?,
            required_skills,
            gender: gender?,
            region,
        }))
    }

    fn checked_text(&self, field: FormField, errors: &mut ValidationErrors) -> String {
        let state = self.field(field);
        if state.is_missing() {
            errors.add(field.name(), error("required", "this field is required"));
            return state.value;
        }
        if state.value.chars().count() > MAX_FIELD_CHARS {
            errors.add(field.name(), error("length", "value is too long"));
        }
        if state.enabled {
            match field {
                FormField::ContactNumber if !is_local_pattern(&state.value) => {
                    errors.add(
                        field.name(),
                        error("phone_format", "phone must look like XX-XXX-XX-XX"),
                    );
                }
                FormField::Email if !is_email(&state.value) => {
                    errors.add(field.name(), error("email", "invalid email address"));
                }
                _ => {}
            }
        }
        state.value
    }

    fn checked_age(&self, errors: &mut ValidationErrors) -> Option<u8> {
        match self.age {
            None => {
                errors.add("age", error("required", "this field is required"));
                None
            }
            Some(age) if !(MIN_AGE..=MAX_AGE).contains(&age) => {
                errors.add(
                    "age",
                    error("range", format!("age must be between {} and {}", MIN_AGE, MAX_AGE)),
                );
                None
            }
            Some(age) => u8::try_from(age).ok(),
        }
    }
}

impl Validate for ListingForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.to_new_listing(Uuid::nil()).map(|_| ())
    }
}

fn defaulted_opt_out(flag: Option<bool>, raw: Option<&str>) -> bool {
    flag.unwrap_or_else(|| raw.map(str::trim).unwrap_or_default().is_empty())
}

fn choice<T: DeserializeOwned>(
    raw: Option<&str>,
    default: Option<T>,
    field: &'static str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => {
            if default.is_none() {
                errors.add(field, error("required", "this field is required"));
            }
            default
        }
        Some(value) => {
            let parsed = parse_wire(value);
            if parsed.is_none() {
                errors.add(
                    field,
                    error("invalid_choice", format!("'{}' is not an accepted value", value)),
                );
            }
            parsed
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormStateResponse {
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub fields: BTreeMap<String, FieldState>,
}

impl From<&ListingForm> for FormStateResponse {
    fn from(form: &ListingForm) -> Self {
        Self {
            kind: form.kind,
            fields: form
                .field_states()
                .into_iter()
                .map(|(name, state)| (name.to_string(), state))
                .collect(),
        }
    }
}

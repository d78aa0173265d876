use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::phone::is_local_number;

pub const PHONE_DECLINED: &str = "Paylaşmaq istəmirəm";
pub const NO_EMAIL: &str = "E-poçt yoxdur";
pub const NO_SKILLS: &str = "Bacarığım yoxdur";
pub const ANY: &str = "Fərqi yoxdur";
pub const PERSONAL_LISTING: &str = "Şəxsi Elan";

/// Parses a single wire value (English or the Azerbaijani literal the web
/// page used to store) into one of the listing enums.
pub fn parse_wire<T: DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_string())).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    JobSeeker,
    Employer,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::JobSeeker => "job_seeker",
            ListingKind::Employer => "employer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkMode {
    #[serde(alias = "Online")]
    Online,
    #[serde(alias = "fiziki", alias = "Fiziki")]
    Physical,
}

impl WorkMode {
    /// Card label; job seekers look for work ("İş"), employers for a worker ("İşçi").
    pub fn label(&self, kind: ListingKind) -> &'static str {
        match (self, kind) {
            (WorkMode::Online, ListingKind::JobSeeker) => "Online İş",
            (WorkMode::Physical, ListingKind::JobSeeker) => "Fiziki İş",
            (WorkMode::Online, ListingKind::Employer) => "Online İşçi",
            (WorkMode::Physical, ListingKind::Employer) => "Fiziki İşçi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[serde(alias = "Kişi")]
    Male,
    #[serde(alias = "Qadın")]
    Female,
    #[serde(alias = "Fərqi yoxdur")]
    Any,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Kişi",
            Gender::Female => "Qadın",
            Gender::Any => ANY,
        }
    }
}

/// Experience a job seeker reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeekerExperience {
    #[serde(rename = "none", alias = "Yoxdur")]
    None,
    #[serde(rename = "1_year", alias = "1 il")]
    OneYear,
    #[serde(rename = "2_years", alias = "2 il")]
    TwoYears,
    #[serde(rename = "3_years", alias = "3 il")]
    ThreeYears,
    #[serde(rename = "4_years", alias = "4 il")]
    FourYears,
    #[serde(rename = "5_plus_years", alias = "5+ il")]
    FivePlusYears,
}

impl SeekerExperience {
    pub fn label(&self) -> &'static str {
        match self {
            SeekerExperience::None => "Yoxdur",
            SeekerExperience::OneYear => "1 il",
            SeekerExperience::TwoYears => "2 il",
            SeekerExperience::ThreeYears => "3 il",
            SeekerExperience::FourYears => "4 il",
            SeekerExperience::FivePlusYears => "5+ il",
        }
    }
}

/// Experience an employer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredExperience {
    #[serde(rename = "none", alias = "Təcrübəsiz")]
    None,
    #[serde(rename = "1_year", alias = "1 il")]
    OneYear,
    #[serde(rename = "2_years", alias = "2 il")]
    TwoYears,
    #[serde(rename = "3_years", alias = "3 il")]
    ThreeYears,
    #[serde(rename = "4_plus_years", alias = "4+ il")]
    FourPlusYears,
}

impl RequiredExperience {
    pub fn label(&self) -> &'static str {
        match self {
            RequiredExperience::None => "Təcrübəsiz",
            RequiredExperience::OneYear => "1 il",
            RequiredExperience::TwoYears => "2 il",
            RequiredExperience::ThreeYears => "3 il",
            RequiredExperience::FourPlusYears => "4+ il",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "18-26")]
    From18To26,
    #[serde(rename = "26-35")]
    From26To35,
    #[serde(rename = "35+")]
    Over35,
}

impl AgeRange {
    pub fn label(&self) -> &'static str {
        match self {
            AgeRange::From18To26 => "18-26",
            AgeRange::From26To35 => "26-35",
            AgeRange::Over35 => "35+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSeekerDetails {
    pub skills: String,
    pub work_form: WorkMode,
    pub job_title: String,
    pub gender: Gender,
    pub age: u8,
    pub experience: SeekerExperience,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployerDetails {
    pub company: String,
    pub worker_form: WorkMode,
    pub age_range: AgeRange,
    pub experience: RequiredExperience,
    pub required_skills: String,
    pub gender: Gender,
    pub region: String,
}

/// Variant-specific half of a listing. Exactly one group exists per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListingDetails {
    JobSeeker(JobSeekerDetails),
    Employer(EmployerDetails),
}

impl ListingDetails {
    pub fn kind(&self) -> ListingKind {
        match self {
            ListingDetails::JobSeeker(_) => ListingKind::JobSeeker,
            ListingDetails::Employer(_) => ListingKind::Employer,
        }
    }

    pub fn region(&self) -> &str {
        match self {
            ListingDetails::JobSeeker(d) => &d.region,
            ListingDetails::Employer(d) => &d.region,
        }
    }

    /// The region worth showing; none when left blank or "any".
    pub fn region_display(&self) -> Option<&str> {
        Some(self.region().trim()).filter(|region| !region.is_empty() && *region != ANY)
    }
}

impl JobSeekerDetails {
    pub fn skills_display(&self) -> &str {
        if self.skills == NO_SKILLS {
            "Bacarıq yoxdur"
        } else {
            &self.skills
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub contact_number: String,
    pub email: String,
    pub approved: bool,
    pub hide_my_name: bool,
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub details: ListingDetails,
}

impl Listing {
    pub fn kind(&self) -> ListingKind {
        self.details.kind()
    }

    /// The name a viewer may see: present, non-blank and not hidden.
    pub fn display_name(&self) -> Option<&str> {
        if self.hide_my_name {
            return None;
        }
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn phone_contactable(&self) -> bool {
        is_local_number(&self.contact_number)
    }

    pub fn email_contactable(&self) -> bool {
        !self.email.is_empty() && self.email != NO_EMAIL
    }

    pub fn headline(&self) -> String {
        match &self.details {
            ListingDetails::JobSeeker(d) => {
                let title = if d.job_title.is_empty() {
                    "Vəzifə Qeyd Olunmayıb"
                } else {
                    d.job_title.as_str()
                };
                format!("İş Axtaran: {}", title)
            }
            ListingDetails::Employer(d) => {
                let company = if d.company.is_empty() {
                    PERSONAL_LISTING
                } else {
                    d.company.as_str()
                };
                format!("İşçi Axtarılır: {}", company)
            }
        }
    }
}

/// A listing as submitted by the editor, before the store assigns an id and
/// a creation timestamp. New listings always start unapproved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub user_id: Uuid,
    pub contact_number: String,
    pub email: String,
    pub hide_my_name: bool,
    pub full_name: Option<String>,
    pub details: ListingDetails,
}

impl NewListing {
    pub fn into_listing(self, id: Uuid, created_at: DateTime<Utc>) -> Listing {
        Listing {
            id,
            user_id: self.user_id,
            created_at: Some(created_at),
            contact_number: self.contact_number,
            email: self.email,
            approved: false,
            hide_my_name: self.hide_my_name,
            full_name: self.full_name,
            details: self.details,
        }
    }
}

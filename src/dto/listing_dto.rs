use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::listing::{Listing, ListingDetails};
use crate::notice::Notice;
use crate::services::feed_service::{FeedFilter, FeedView};
use crate::utils::phone::format_local;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "type", default)]
    pub kind: FeedFilter,
}

/// A listing as a viewer sees it. The author's name only appears when it
/// is present and not hidden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub approved: bool,
    pub headline: String,
    pub display_name: Option<String>,
    pub name_hidden: bool,
    pub contact_number: String,
    pub contact_number_display: String,
    pub phone_contactable: bool,
    pub email: String,
    pub email_contactable: bool,
    pub region_display: Option<String>,
    pub badges: ListingBadges,
    #[serde(flatten)]
    pub details: ListingDetails,
}

/// Card badges, already worded in Azerbaijani.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingBadges {
    pub work_form: String,
    pub gender: String,
    pub experience: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age_range: Option<String>,
    pub skills: String,
}

impl From<&ListingDetails> for ListingBadges {
    fn from(details: &ListingDetails) -> Self {
        let kind = details.kind();
        match details {
            ListingDetails::JobSeeker(d) => Self {
                work_form: d.work_form.label(kind).to_string(),
                gender: d.gender.label().to_string(),
                experience: format!("{} Təcrübə", d.experience.label()),
                age: Some(format!("{} yaş", d.age)),
                age_range: None,
                skills: d.skills_display().to_string(),
            },
            ListingDetails::Employer(d) => Self {
                work_form: d.worker_form.label(kind).to_string(),
                gender: d.gender.label().to_string(),
                experience: format!("{} Təcrübə", d.experience.label()),
                age: None,
                age_range: Some(format!("{} yaş aralığı", d.age_range.label())),
                skills: Some(d.required_skills.trim())
                    .filter(|skills| !skills.is_empty())
                    .unwrap_or("Qeyd edilməyib")
                    .to_string(),
            },
        }
    }
}

impl From<&Listing> for ListingResponse {
    fn from(listing: &Listing) -> Self {
        let contact_number_display = if listing.phone_contactable() {
            format_local(&listing.contact_number)
        } else {
            listing.contact_number.clone()
        };
        Self {
            id: listing.id,
            user_id: listing.user_id,
            created_at: listing.created_at,
            approved: listing.approved,
            headline: listing.headline(),
            display_name: listing.display_name().map(str::to_string),
            name_hidden: listing.hide_my_name,
            contact_number: listing.contact_number.clone(),
            contact_number_display,
            phone_contactable: listing.phone_contactable(),
            email: listing.email.clone(),
            email_contactable: listing.email_contactable(),
            region_display: listing.details.region_display().map(str::to_string),
            badges: ListingBadges::from(&listing.details),
            details: listing.details.clone(),
        }
    }
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self::from(&listing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedResponse {
    pub filter: FeedFilter,
    pub version: u64,
    pub items: Vec<ListingResponse>,
    pub empty_message: Option<String>,
}

impl From<FeedView> for FeedResponse {
    fn from(view: FeedView) -> Self {
        let empty_message = view
            .listings
            .is_empty()
            .then(|| view.filter.empty_message());
        Self {
            filter: view.filter,
            version: view.version,
            items: view.listings.iter().map(ListingResponse::from).collect(),
            empty_message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListingResponse {
    pub id: Uuid,
    pub approved: bool,
    pub notice: Notice,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteListingResponse {
    pub id: Uuid,
    pub notice: Notice,
}

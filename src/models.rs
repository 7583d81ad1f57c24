// Wire types for the remote travel API
// The API owns these shapes; we only mirror what the frontend reads and writes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{datetime::DurationParts, i18n::Language, pricing::PriceFields, preferences::Currency};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub activity_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOption {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub price: PriceFields,
    #[serde(default)]
    pub duration: Option<DurationParts>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub max_travelers: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(flatten)]
    pub price: PriceFields,
    #[serde(default)]
    pub duration: Option<DurationParts>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub booking_options: Vec<BookingOption>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub items: Vec<ActivitySummary>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPoint {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDetails {
    #[serde(flatten)]
    pub summary: ActivitySummary,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meeting_points: Vec<MeetingPoint>,
    #[serde(default)]
    pub guide_languages: Vec<String>,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSlot {
    // local wall-clock "HH:MM"
    pub start_time: String,
    pub available: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Travelers {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl Travelers {
    pub fn total(&self) -> u32 {
        self.adults + self.children + self.infants
    }
}

// What the checkout page posts to create a line item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDraft {
    pub activity_id: String,
    pub booking_option_id: String,
    #[serde(default)]
    pub guide_language: Option<String>,
    #[serde(default)]
    pub meeting_point: Option<MeetingPoint>,
    #[serde(default)]
    pub special_request: Option<String>,
    // RFC 3339, UTC
    pub booking_datetime: String,
    pub travelers: Travelers,
}

// The full line-item payload. Updates always send every field back.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub activity_id: String,
    #[serde(default)]
    pub activity_title: String,
    pub booking_option_id: String,
    #[serde(default)]
    pub guide_language: Option<String>,
    #[serde(default)]
    pub meeting_point: Option<MeetingPoint>,
    #[serde(default)]
    pub special_request: Option<String>,
    // RFC 3339, UTC
    pub booking_datetime: String,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub travelers: Travelers,
    #[serde(default)]
    pub unit_price: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacePrediction {
    pub place_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<PlaceDetails> for MeetingPoint {
    fn from(place: PlaceDetails) -> Self {
        Self {
            id: Some(place.place_id),
            name: place.name,
            address: place.address,
            latitude: Some(place.latitude),
            longitude: Some(place.longitude),
        }
    }
}

// Activity search filters, shared by the Search page and the URL query string
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilters {
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
    pub travelers: Travelers,
    pub page: u32,
    pub page_size: u32,
    pub language: Language,
    pub currency: Currency,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            destination: None,
            date: None,
            travelers: Travelers {
                adults: 1,
                children: 0,
                infants: 0,
            },
            page: 1,
            page_size: 12,
            language: Language::En,
            currency: Currency::Usd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_summary_from_wire() {
        let raw = r#"{
            "id": "act-1",
            "title": "Desert Safari",
            "coverImage": null,
            "images": ["a.jpg", "b.jpg"],
            "normalPrice": 120.0,
            "priceAfterDiscount": 99.0,
            "currency": "AED",
            "duration": {"hours": 6},
            "bookingOptions": [
                {"id": "opt-1", "name": "Shared", "pricePerPerson": 80.0}
            ]
        }"#;

        let summary: ActivitySummary = serde_json::from_str(raw).unwrap();
        assert_eq!(summary.price.normal_price, Some(120.0));
        assert_eq!(summary.price.price_after_discount, Some(99.0));
        assert_eq!(summary.duration.unwrap().hours, 6);
        assert_eq!(summary.booking_options[0].price.price_per_person, Some(80.0));
        assert!(!summary.featured);
    }

    #[test]
    fn test_order_item_serializes_camel_case() {
        let item = OrderItem {
            id: "oi-1".to_string(),
            activity_id: "act-1".to_string(),
            booking_option_id: "opt-1".to_string(),
            booking_datetime: "2025-06-10T05:30:00Z".to_string(),
            travelers: Travelers {
                adults: 2,
                children: 1,
                infants: 0,
            },
            ..Default::default()
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["bookingDatetime"], "2025-06-10T05:30:00Z");
        assert_eq!(value["travelers"]["adults"], 2);
        assert!(value.get("guideLanguage").is_some());
        assert_eq!(item.travelers.total(), 3);
    }

    #[test]
    fn test_place_details_into_meeting_point() {
        let point: MeetingPoint = PlaceDetails {
            place_id: "p-1".to_string(),
            name: "Marina Gate".to_string(),
            address: Some("Dubai Marina".to_string()),
            latitude: 25.08,
            longitude: 55.14,
        }
        .into();
        assert_eq!(point.id.as_deref(), Some("p-1"));
        assert_eq!(point.latitude, Some(25.08));
    }
}

// Cart line items and checkout
// Each editable field of a line item is saved on its own by re-sending the whole order item.
// A field that is already saving refuses a second submission; other fields are not blocked.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{NaiveDate, NaiveTime};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    api_client::{ApiError, TravelApi},
    datetime::{
        display_local, ensure_not_in_past, format_booking_datetime, local_to_utc,
        offset_from_minutes, parse_booking_datetime, parse_time,
    },
    events::{CartEvent, CartEvents},
    models::{MeetingPoint, OrderItem, OrderItemDraft, PlacePrediction, ScheduleSlot, Travelers},
    pricing::{round_cents, Price},
    validation::{check_email, check_range, require, ValidationError},
};

pub const MAX_SPECIAL_REQUEST_LEN: usize = 500;
pub const MIN_PLACE_QUERY_LEN: usize = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0:?} is already being saved")]
    SaveInProgress(EditField),

    #[error("Order item not found: {0}")]
    ItemNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditField {
    GuideLanguage,
    MeetingPoint,
    SpecialRequest,
    DateTime,
    Travelers,
    Schedules,
    Delete,
}

pub fn validate_travelers(travelers: &Travelers) -> Result<(), ValidationError> {
    check_range("adults", travelers.adults.into(), 1, 20)?;
    check_range("children", travelers.children.into(), 0, 10)?;
    check_range("infants", travelers.infants.into(), 0, 10)?;
    Ok(())
}

// Clears the field's flag when the flow ends, including when the future is dropped
struct SavingGuard<'a> {
    flags: &'a Mutex<HashSet<EditField>>,
    field: EditField,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.flags.lock().remove(&self.field);
    }
}

pub struct CartItemEditor {
    api: Arc<dyn TravelApi>,
    events: CartEvents,
    item: RwLock<OrderItem>,
    saving: Mutex<HashSet<EditField>>,
}

impl CartItemEditor {
    pub fn new(api: Arc<dyn TravelApi>, events: CartEvents, item: OrderItem) -> Self {
        Self {
            api,
            events,
            item: RwLock::new(item),
            saving: Mutex::new(HashSet::new()),
        }
    }

    pub fn id(&self) -> String {
        self.item.read().id.clone()
    }

    // What the line currently displays: the last value the API accepted
    pub fn item(&self) -> OrderItem {
        self.item.read().clone()
    }

    pub fn is_saving(&self, field: EditField) -> bool {
        self.saving.lock().contains(&field)
    }

    fn begin(&self, field: EditField) -> Result<SavingGuard<'_>, CartError> {
        let mut flags = self.saving.lock();
        if !flags.insert(field) {
            return Err(CartError::SaveInProgress(field));
        }
        Ok(SavingGuard {
            flags: &self.saving,
            field,
        })
    }

    async fn save(
        &self,
        field: EditField,
        edit: impl FnOnce(&mut OrderItem),
    ) -> Result<OrderItem, CartError> {
        let _guard = self.begin(field)?;

        let mut payload = self.item();
        edit(&mut payload);

        match self.api.update_order_item(&payload).await {
            Ok(saved) => {
                *self.item.write() = saved.clone();
                debug!(order_item_id = %saved.id, ?field, "order item saved");
                self.events.publish(CartEvent::Updated {
                    order_item_id: saved.id.clone(),
                });
                Ok(saved)
            }
            Err(e) => {
                error!(order_item_id = %payload.id, ?field, error = %e, "order item update failed");
                Err(e.into())
            }
        }
    }

    pub async fn set_guide_language(&self, language: &str) -> Result<OrderItem, CartError> {
        require("guideLanguage", language)?;
        let language = language.trim().to_string();
        self.save(EditField::GuideLanguage, move |item| {
            item.guide_language = Some(language)
        })
        .await
    }

    pub async fn set_meeting_point(&self, point: MeetingPoint) -> Result<OrderItem, CartError> {
        require("meetingPoint", &point.name)?;
        self.save(EditField::MeetingPoint, move |item| {
            item.meeting_point = Some(point)
        })
        .await
    }

    // Place suggestions for the meeting point input
    pub async fn suggest_meeting_points(&self, input: &str) -> Vec<PlacePrediction> {
        let input = input.trim();
        if input.chars().count() < MIN_PLACE_QUERY_LEN {
            return Vec::new();
        }
        self.api.place_autocomplete(input).await.unwrap_or_else(|e| {
            warn!(%input, error = %e, "place autocomplete failed");
            Vec::new()
        })
    }

    pub async fn set_meeting_point_from_place(
        &self,
        place_id: &str,
    ) -> Result<OrderItem, CartError> {
        let place = self.api.place_details(place_id).await.map_err(|e| {
            error!(%place_id, error = %e, "loading place failed");
            e
        })?;
        self.set_meeting_point(place.into()).await
    }

    // Blank text clears the request
    pub async fn set_special_request(&self, text: &str) -> Result<OrderItem, CartError> {
        let text = text.trim();
        check_range(
            "specialRequest",
            text.chars().count() as i64,
            0,
            MAX_SPECIAL_REQUEST_LEN as i64,
        )?;
        let request = (!text.is_empty()).then(|| text.to_string());
        self.save(EditField::SpecialRequest, move |item| {
            item.special_request = request
        })
        .await
    }

    // `date` and `time` are wall-clock values at the activity's location
    pub async fn set_date_time(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        today: NaiveDate,
    ) -> Result<OrderItem, CartError> {
        ensure_not_in_past(date, today)?;
        let offset = offset_from_minutes(self.item.read().utc_offset_minutes)?;
        let booking_datetime = format_booking_datetime(local_to_utc(date, time, offset));
        self.save(EditField::DateTime, move |item| {
            item.booking_datetime = booking_datetime
        })
        .await
    }

    pub async fn set_travelers(&self, travelers: Travelers) -> Result<OrderItem, CartError> {
        validate_travelers(&travelers)?;
        self.save(EditField::Travelers, move |item| item.travelers = travelers)
            .await
    }

    // Local (date, time) strings for the editor inputs
    pub fn local_date_time(&self) -> Result<(String, String), CartError> {
        let item = self.item.read();
        let offset = offset_from_minutes(item.utc_offset_minutes)?;
        let instant = parse_booking_datetime(&item.booking_datetime)?;
        Ok(display_local(instant, offset))
    }

    // Bookable start times on a local date, sold-out slots removed
    pub async fn available_times(&self, date: NaiveDate) -> Result<Vec<NaiveTime>, CartError> {
        let _guard = self.begin(EditField::Schedules)?;
        let (activity_id, option_id) = {
            let item = self.item.read();
            (item.activity_id.clone(), item.booking_option_id.clone())
        };

        let slots: Vec<ScheduleSlot> = self
            .api
            .schedules_for_date(&activity_id, &option_id, date)
            .await
            .map_err(|e| {
                error!(%activity_id, %date, error = %e, "loading schedules failed");
                e
            })?;

        let mut times: Vec<NaiveTime> = slots
            .iter()
            .filter(|slot| slot.available > 0)
            .filter_map(|slot| match parse_time(&slot.start_time) {
                Ok(time) => Some(time),
                Err(e) => {
                    warn!(start_time = %slot.start_time, error = %e, "skipping unreadable slot");
                    None
                }
            })
            .collect();
        times.sort();
        times.dedup();
        Ok(times)
    }

    pub async fn delete(&self) -> Result<(), CartError> {
        let _guard = self.begin(EditField::Delete)?;
        let id = self.id();
        match self.api.remove_order_item(&id).await {
            Ok(()) => {
                info!(order_item_id = %id, "order item removed");
                self.events.publish(CartEvent::Removed { order_item_id: id });
                Ok(())
            }
            Err(e) => {
                error!(order_item_id = %id, error = %e, "order item removal failed");
                Err(e.into())
            }
        }
    }
}

pub struct Cart {
    api: Arc<dyn TravelApi>,
    events: CartEvents,
    items: RwLock<Vec<Arc<CartItemEditor>>>,
}

impl Cart {
    pub fn new(api: Arc<dyn TravelApi>, events: CartEvents) -> Self {
        Self {
            api,
            events,
            items: RwLock::new(Vec::new()),
        }
    }

    pub fn events(&self) -> &CartEvents {
        &self.events
    }

    pub fn items(&self) -> Vec<Arc<CartItemEditor>> {
        self.items.read().clone()
    }

    pub fn item_count(&self) -> usize {
        self.items.read().len()
    }

    pub fn editor(&self, order_item_id: &str) -> Option<Arc<CartItemEditor>> {
        self.items
            .read()
            .iter()
            .find(|editor| editor.id() == order_item_id)
            .cloned()
    }

    fn wrap(&self, item: OrderItem) -> Arc<CartItemEditor> {
        Arc::new(CartItemEditor::new(
            self.api.clone(),
            self.events.clone(),
            item,
        ))
    }

    // On failure the previously loaded lines stay in place
    pub async fn refresh(&self) -> Result<usize, CartError> {
        let fetched = self.api.order_items().await.map_err(|e| {
            error!(error = %e, "loading cart failed");
            e
        })?;

        let editors: Vec<_> = fetched.into_iter().map(|item| self.wrap(item)).collect();
        let count = editors.len();
        *self.items.write() = editors;
        self.events.publish(CartEvent::Refreshed { item_count: count });
        Ok(count)
    }

    pub async fn add(
        &self,
        draft: OrderItemDraft,
        today: NaiveDate,
    ) -> Result<Arc<CartItemEditor>, CartError> {
        require("activityId", &draft.activity_id)?;
        require("bookingOptionId", &draft.booking_option_id)?;
        validate_travelers(&draft.travelers)?;
        let booking = parse_booking_datetime(&draft.booking_datetime)?;
        ensure_not_in_past(booking.date_naive(), today)?;

        let created = self.api.create_order_item(&draft).await.map_err(|e| {
            error!(activity_id = %draft.activity_id, error = %e, "adding to cart failed");
            e
        })?;

        let editor = self.wrap(created);
        self.items.write().push(editor.clone());
        self.events.publish(CartEvent::Added {
            order_item_id: editor.id(),
        });
        Ok(editor)
    }

    pub async fn remove(&self, order_item_id: &str) -> Result<(), CartError> {
        let editor = self
            .editor(order_item_id)
            .ok_or_else(|| CartError::ItemNotFound(order_item_id.to_string()))?;
        editor.delete().await?;
        self.items.write().retain(|e| e.id() != order_item_id);
        Ok(())
    }

    // One total per currency, in currency-code order
    pub fn totals(&self) -> Vec<Price> {
        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        for editor in self.items.read().iter() {
            let item = editor.item.read();
            *sums.entry(item.currency.clone()).or_default() += item.total_price;
        }
        sums.into_iter()
            .map(|(currency, amount)| Price::new(round_cents(amount), currency))
            .collect()
    }
}

// Header cart counter kept in sync through cart events
#[derive(Debug, Default)]
pub struct CartBadge {
    count: AtomicUsize,
}

impl CartBadge {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    // Re-counts from the API after any add/update/remove; stops when the event bus is gone
    pub fn spawn(
        api: Arc<dyn TravelApi>,
        events: &CartEvents,
    ) -> (Arc<CartBadge>, JoinHandle<()>) {
        let badge = Arc::new(CartBadge::default());
        let mut rx = events.subscribe();
        let task_badge = badge.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(CartEvent::Refreshed { item_count }) => {
                        task_badge.count.store(item_count, Ordering::SeqCst);
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => match api.order_items().await {
                        Ok(items) => task_badge.count.store(items.len(), Ordering::SeqCst),
                        Err(e) => warn!(error = %e, "cart badge refresh failed"),
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        });

        (badge, handle)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
}

impl CheckoutForm {
    // Collects every field error so the form can flag them all at once
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let checks = [
            require("firstName", &self.first_name),
            require("lastName", &self.last_name),
            require("email", &self.email).and_then(|_| check_email("email", &self.email)),
            require("phone", &self.phone).and_then(|_| check_phone(&self.phone)),
            require("country", &self.country),
        ];
        for check in checks {
            if let Err(e) = check {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// Optional leading '+', then 7 to 15 digits with spaces or dashes allowed between them
fn check_phone(phone: &str) -> Result<(), ValidationError> {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let only_allowed = body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();

    if !only_allowed || !(7..=15).contains(&digits) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            value: phone.to_string(),
        });
    }
    Ok(())
}

// Itinerary timeline editor
// A linear sequence of waypoints between a fixed start and a fixed end. Activity items may
// carry one level of sub-activities. All mutation goes through `ItineraryStore::dispatch`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItineraryError {
    #[error("Unknown itinerary item: {0}")]
    UnknownItem(String),

    #[error("Start and end are fixed and cannot be added: {0}")]
    FixedAnchor(String),

    #[error("Item {0} is not an activity and cannot hold sub-activities")]
    NotAnActivity(String),

    #[error("Segment wizard incomplete: {0}")]
    WizardIncomplete(String),

    #[error("Invalid itinerary: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItineraryKind {
    Start,
    End,
    Activity,
    Route,
    SubActivity,
}

impl ItineraryKind {
    pub fn is_anchor(self) -> bool {
        matches!(self, ItineraryKind::Start | ItineraryKind::End)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItineraryKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<ItineraryItem>,
}

impl ItineraryItem {
    pub fn new(id: impl Into<String>, kind: ItineraryKind, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            subtitle: None,
            description: None,
            duration: None,
            icon: None,
            color: None,
            sub_items: Vec::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_sub_items(mut self, sub_items: Vec<ItineraryItem>) -> Self {
        self.sub_items = sub_items;
        self
    }
}

static LAST_ID: AtomicU64 = AtomicU64::new(0);

// Millisecond timestamp, bumped past the last issued id so two calls in the same ms differ
pub fn generate_item_id() -> String {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(current) => last = current,
        }
    }
}

fn swap_up(items: &mut [ItineraryItem], id: &str) -> Option<bool> {
    let index = items.iter().position(|item| item.id == id)?;
    if index == 0 {
        return Some(false);
    }
    items.swap(index, index - 1);
    Some(true)
}

fn swap_down(items: &mut [ItineraryItem], id: &str) -> Option<bool> {
    let index = items.iter().position(|item| item.id == id)?;
    if index + 1 >= items.len() {
        return Some(false);
    }
    items.swap(index, index + 1);
    Some(true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryData {
    pub title: String,
    pub start: ItineraryItem,
    pub end: ItineraryItem,
    pub items: Vec<ItineraryItem>,
}

impl ItineraryData {
    pub fn new(title: impl Into<String>, start_title: &str, end_title: &str) -> Self {
        Self {
            title: title.into(),
            start: ItineraryItem::new("start", ItineraryKind::Start, start_title)
                .with_icon("start"),
            end: ItineraryItem::new("end", ItineraryKind::End, end_title).with_icon("end"),
            items: Vec::new(),
        }
    }

    // What the wizard shows before the supplier has entered anything
    pub fn example() -> Self {
        let mut data = Self::new("Old Town Walking Tour", "Central Station", "Central Station");
        data.start.subtitle = Some("Meet your guide at the main entrance".to_string());
        data.end.subtitle = Some("Drop-off where the tour began".to_string());
        data.items = vec![
            ItineraryItem::new("example-1", ItineraryKind::Activity, "Cathedral visit")
                .with_duration("1h")
                .with_icon("activity")
                .with_description("Guided visit of the nave\nEntry ticket included")
                .with_sub_items(vec![
                    ItineraryItem::new("example-1a", ItineraryKind::SubActivity, "Bell tower climb")
                        .with_duration("20m"),
                    ItineraryItem::new("example-1b", ItineraryKind::SubActivity, "Crypt"),
                ]),
            ItineraryItem::new("example-2", ItineraryKind::Route, "Walk to the market")
                .with_duration("15m")
                .with_icon("transfer"),
            ItineraryItem::new("example-3", ItineraryKind::Activity, "Lunch at the market")
                .with_duration("1h 30m")
                .with_icon("activity"),
        ];
        data
    }

    pub fn is_anchor(&self, id: &str) -> bool {
        self.start.id == id || self.end.id == id
    }

    pub fn item(&self, id: &str) -> Option<&ItineraryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut ItineraryItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    fn activity_mut(&mut self, parent_id: &str) -> Result<&mut ItineraryItem, ItineraryError> {
        let parent = self
            .item_mut(parent_id)
            .ok_or_else(|| ItineraryError::UnknownItem(parent_id.to_string()))?;
        if parent.kind != ItineraryKind::Activity {
            return Err(ItineraryError::NotAnActivity(parent_id.to_string()));
        }
        Ok(parent)
    }

    fn position_of(&self, id: &str) -> Result<Option<usize>, ItineraryError> {
        if self.is_anchor(id) {
            return Ok(None);
        }
        self.items
            .iter()
            .position(|item| item.id == id)
            .map(Some)
            .ok_or_else(|| ItineraryError::UnknownItem(id.to_string()))
    }

    pub fn can_move_up(&self, id: &str) -> bool {
        matches!(self.position_of(id), Ok(Some(index)) if index > 0)
    }

    pub fn can_move_down(&self, id: &str) -> bool {
        matches!(self.position_of(id), Ok(Some(index)) if index + 1 < self.items.len())
    }

    // Returns whether anything changed. Anchors and boundary positions are no-ops.
    pub fn move_item_up(&mut self, id: &str) -> Result<bool, ItineraryError> {
        if self.is_anchor(id) {
            return Ok(false);
        }
        swap_up(&mut self.items, id).ok_or_else(|| ItineraryError::UnknownItem(id.to_string()))
    }

    pub fn move_item_down(&mut self, id: &str) -> Result<bool, ItineraryError> {
        if self.is_anchor(id) {
            return Ok(false);
        }
        swap_down(&mut self.items, id).ok_or_else(|| ItineraryError::UnknownItem(id.to_string()))
    }

    pub fn remove_item(&mut self, id: &str) -> Result<bool, ItineraryError> {
        if self.is_anchor(id) {
            return Ok(false);
        }
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Err(ItineraryError::UnknownItem(id.to_string()));
        }
        Ok(true)
    }

    // Appends just before `end`
    pub fn add_item(&mut self, item: ItineraryItem) -> Result<(), ItineraryError> {
        match item.kind {
            ItineraryKind::Start | ItineraryKind::End => {
                return Err(ItineraryError::FixedAnchor(item.id))
            }
            ItineraryKind::SubActivity => {
                return Err(ItineraryError::Invalid(format!(
                    "sub-activity {} must be added under an activity",
                    item.id
                )))
            }
            ItineraryKind::Activity | ItineraryKind::Route => {}
        }
        if self.is_anchor(&item.id) || self.item(&item.id).is_some() {
            return Err(ItineraryError::Invalid(format!("duplicate id {}", item.id)));
        }
        if item.kind == ItineraryKind::Route && !item.sub_items.is_empty() {
            return Err(ItineraryError::NotAnActivity(item.id));
        }
        self.items.push(item);
        Ok(())
    }

    // Replaces the editable fields of an existing item; id, kind and sub-items are preserved
    pub fn update_item(&mut self, update: ItineraryItem) -> Result<(), ItineraryError> {
        let target = if self.start.id == update.id {
            &mut self.start
        } else if self.end.id == update.id {
            &mut self.end
        } else {
            self.item_mut(&update.id)
                .ok_or_else(|| ItineraryError::UnknownItem(update.id.clone()))?
        };

        target.title = update.title;
        target.subtitle = update.subtitle;
        target.description = update.description;
        target.duration = update.duration;
        target.icon = update.icon;
        target.color = update.color;
        Ok(())
    }

    pub fn move_sub_item_up(
        &mut self,
        parent_id: &str,
        sub_id: &str,
    ) -> Result<bool, ItineraryError> {
        let parent = self.activity_mut(parent_id)?;
        swap_up(&mut parent.sub_items, sub_id)
            .ok_or_else(|| ItineraryError::UnknownItem(sub_id.to_string()))
    }

    pub fn move_sub_item_down(
        &mut self,
        parent_id: &str,
        sub_id: &str,
    ) -> Result<bool, ItineraryError> {
        let parent = self.activity_mut(parent_id)?;
        swap_down(&mut parent.sub_items, sub_id)
            .ok_or_else(|| ItineraryError::UnknownItem(sub_id.to_string()))
    }

    pub fn remove_sub_item(
        &mut self,
        parent_id: &str,
        sub_id: &str,
    ) -> Result<bool, ItineraryError> {
        let parent = self.activity_mut(parent_id)?;
        let before = parent.sub_items.len();
        parent.sub_items.retain(|sub| sub.id != sub_id);
        if parent.sub_items.len() == before {
            return Err(ItineraryError::UnknownItem(sub_id.to_string()));
        }
        Ok(true)
    }

    // Sub-items are flattened to one level and always typed as sub-activities
    pub fn add_sub_item(
        &mut self,
        parent_id: &str,
        mut sub: ItineraryItem,
    ) -> Result<(), ItineraryError> {
        let parent = self.activity_mut(parent_id)?;
        if parent.sub_items.iter().any(|existing| existing.id == sub.id) {
            return Err(ItineraryError::Invalid(format!("duplicate id {}", sub.id)));
        }
        sub.kind = ItineraryKind::SubActivity;
        sub.sub_items.clear();
        parent.sub_items.push(sub);
        Ok(())
    }

    // Structural check for data coming back from the API
    pub fn validate(&self) -> Result<(), ItineraryError> {
        if self.start.kind != ItineraryKind::Start {
            return Err(ItineraryError::Invalid("start item must be of type start".to_string()));
        }
        if self.end.kind != ItineraryKind::End {
            return Err(ItineraryError::Invalid("end item must be of type end".to_string()));
        }
        if self.start.id == self.end.id {
            return Err(ItineraryError::Invalid("start and end share an id".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for item in &self.items {
            if item.kind.is_anchor() || self.is_anchor(&item.id) {
                return Err(ItineraryError::Invalid(format!(
                    "{} duplicates a fixed anchor",
                    item.id
                )));
            }
            if item.kind == ItineraryKind::SubActivity {
                return Err(ItineraryError::Invalid(format!(
                    "sub-activity {} at top level",
                    item.id
                )));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(ItineraryError::Invalid(format!("duplicate id {}", item.id)));
            }
            if !item.sub_items.is_empty() && item.kind != ItineraryKind::Activity {
                return Err(ItineraryError::NotAnActivity(item.id.clone()));
            }
            if item.sub_items.iter().any(|sub| !sub.sub_items.is_empty()) {
                return Err(ItineraryError::Invalid(format!(
                    "sub-activities of {} are nested more than one level",
                    item.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItineraryAction {
    MoveUp(String),
    MoveDown(String),
    Remove(String),
    Add(ItineraryItem),
    Update(ItineraryItem),
    MoveSubUp { parent: String, sub: String },
    MoveSubDown { parent: String, sub: String },
    RemoveSub { parent: String, sub: String },
    AddSub { parent: String, item: ItineraryItem },
    SetTitle(String),
    Replace(ItineraryData),
}

impl ItineraryAction {
    fn apply(self, data: &mut ItineraryData) -> Result<bool, ItineraryError> {
        match self {
            ItineraryAction::MoveUp(id) => data.move_item_up(&id),
            ItineraryAction::MoveDown(id) => data.move_item_down(&id),
            ItineraryAction::Remove(id) => data.remove_item(&id),
            ItineraryAction::Add(item) => data.add_item(item).map(|_| true),
            ItineraryAction::Update(item) => data.update_item(item).map(|_| true),
            ItineraryAction::MoveSubUp { parent, sub } => data.move_sub_item_up(&parent, &sub),
            ItineraryAction::MoveSubDown { parent, sub } => data.move_sub_item_down(&parent, &sub),
            ItineraryAction::RemoveSub { parent, sub } => data.remove_sub_item(&parent, &sub),
            ItineraryAction::AddSub { parent, item } => {
                data.add_sub_item(&parent, item).map(|_| true)
            }
            ItineraryAction::SetTitle(title) => {
                let changed = data.title != title;
                data.title = title;
                Ok(changed)
            }
            ItineraryAction::Replace(next) => {
                next.validate()?;
                let changed = *data != next;
                *data = next;
                Ok(changed)
            }
        }
    }
}

// Sole owner of the itinerary for an authoring session. Views read snapshots or subscribe.
#[derive(Debug)]
pub struct ItineraryStore {
    state: watch::Sender<ItineraryData>,
}

impl Default for ItineraryStore {
    fn default() -> Self {
        Self::new(ItineraryData::example())
    }
}

impl ItineraryStore {
    pub fn new(data: ItineraryData) -> Self {
        let (state, _) = watch::channel(data);
        Self { state }
    }

    pub fn snapshot(&self) -> ItineraryData {
        self.state.borrow().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&ItineraryData) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<ItineraryData> {
        self.state.subscribe()
    }

    // Applies one action atomically. Subscribers are only notified when the data changed;
    // a failed action leaves the data untouched.
    pub fn dispatch(&self, action: ItineraryAction) -> Result<bool, ItineraryError> {
        debug!(?action, "itinerary action");
        let mut outcome = Ok(false);
        self.state.send_if_modified(|data| {
            let mut working = data.clone();
            outcome = action.apply(&mut working);
            match outcome {
                Ok(true) => {
                    *data = working;
                    true
                }
                _ => false,
            }
        });
        outcome
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Activity,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStage {
    SelectType,
    ChooseLabel,
    Ready,
}

pub const ACTIVITY_LABELS: &[&str] = &[
    "Sightseeing",
    "Guided tour",
    "Museum visit",
    "Photo stop",
    "Lunch",
    "Dinner",
    "Free time",
    "Shopping",
    "Hiking",
    "Boat ride",
    "Swimming",
    "Wine tasting",
    "Cooking class",
    "Show",
    "Visit",
];

pub const TRANSFER_TITLE: &str = "Transfer";

// Two-step "add segment" flow: pick the segment type, then (for activities) a label
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentWizard {
    stage: WizardStage,
    kind: Option<SegmentKind>,
    label: Option<String>,
}

impl Default for SegmentWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentWizard {
    pub fn new() -> Self {
        Self {
            stage: WizardStage::SelectType,
            kind: None,
            label: None,
        }
    }

    pub fn stage(&self) -> WizardStage {
        self.stage
    }

    pub fn select_type(&mut self, kind: SegmentKind) {
        self.kind = Some(kind);
        self.label = None;
        self.stage = match kind {
            SegmentKind::Activity => WizardStage::ChooseLabel,
            SegmentKind::Transfer => WizardStage::Ready,
        };
    }

    pub fn search_labels(&self, query: &str) -> Vec<&'static str> {
        let needle = query.trim().to_lowercase();
        ACTIVITY_LABELS
            .iter()
            .copied()
            .filter(|label| needle.is_empty() || label.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn choose_label(&mut self, label: &str) -> Result<(), ItineraryError> {
        if self.kind != Some(SegmentKind::Activity) {
            return Err(ItineraryError::WizardIncomplete(
                "select the activity type first".to_string(),
            ));
        }
        let label = label.trim();
        if label.is_empty() {
            return Err(ItineraryError::WizardIncomplete("label is empty".to_string()));
        }
        self.label = Some(label.to_string());
        self.stage = WizardStage::Ready;
        Ok(())
    }

    pub fn back(&mut self) {
        self.stage = match (self.stage, self.kind) {
            (WizardStage::Ready, Some(SegmentKind::Activity)) => {
                self.label = None;
                WizardStage::ChooseLabel
            }
            _ => {
                self.kind = None;
                self.label = None;
                WizardStage::SelectType
            }
        };
    }

    pub fn commit(&self) -> Result<ItineraryItem, ItineraryError> {
        match (self.kind, self.label.as_deref()) {
            (None, _) => Err(ItineraryError::WizardIncomplete(
                "segment type not selected".to_string(),
            )),
            (Some(SegmentKind::Activity), None) => Err(ItineraryError::WizardIncomplete(
                "activity label not chosen".to_string(),
            )),
            (Some(SegmentKind::Activity), Some(label)) => Ok(ItineraryItem::new(
                generate_item_id(),
                ItineraryKind::Activity,
                label,
            )
            .with_icon("activity")),
            (Some(SegmentKind::Transfer), _) => Ok(ItineraryItem::new(
                generate_item_id(),
                ItineraryKind::Route,
                TRANSFER_TITLE,
            )
            .with_icon("transfer")),
        }
    }
}

// Pixel metrics for the timeline. Heights grow with the line breaks in the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub base_height: f32,
    pub line_height: f32,
    pub sub_item_height: f32,
    pub node_gap: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            base_height: 72.0,
            line_height: 20.0,
            sub_item_height: 48.0,
            node_gap: 24.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub top: f32,
    pub height: f32,
}

impl NodeLayout {
    pub fn centre(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

// Vertical line joining two consecutive node centres
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub from: String,
    pub to: String,
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineLayout {
    pub nodes: Vec<NodeLayout>,
    pub connectors: Vec<Connector>,
    pub total_height: f32,
}

fn line_breaks(text: Option<&str>) -> usize {
    text.map_or(0, |t| t.matches('\n').count())
}

impl LayoutMetrics {
    fn extra_lines(&self, item: &ItineraryItem) -> f32 {
        let breaks =
            line_breaks(item.subtitle.as_deref()) + line_breaks(item.description.as_deref());
        breaks as f32 * self.line_height
    }

    pub fn item_height(&self, item: &ItineraryItem) -> f32 {
        let subs: f32 = item
            .sub_items
            .iter()
            .map(|sub| self.sub_item_height + self.extra_lines(sub))
            .sum();
        self.base_height + self.extra_lines(item) + subs
    }

    pub fn layout(&self, data: &ItineraryData) -> TimelineLayout {
        let sequence = std::iter::once(&data.start)
            .chain(data.items.iter())
            .chain(std::iter::once(&data.end));

        let mut nodes = Vec::with_capacity(data.items.len() + 2);
        let mut top = 0.0;
        for item in sequence {
            let height = self.item_height(item);
            nodes.push(NodeLayout {
                id: item.id.clone(),
                top,
                height,
            });
            top += height + self.node_gap;
        }

        let connectors = nodes
            .windows(2)
            .map(|pair| Connector {
                from: pair[0].id.clone(),
                to: pair[1].id.clone(),
                top: pair[0].centre(),
                height: pair[1].centre() - pair[0].centre(),
            })
            .collect();

        let total_height = nodes.last().map_or(0.0, |n| n.top + n.height);
        TimelineLayout {
            nodes,
            connectors,
            total_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> ItineraryItem {
        ItineraryItem::new(id, ItineraryKind::Activity, id.to_uppercase())
    }

    fn data_ab() -> ItineraryData {
        let mut data = ItineraryData::new("Trip", "S", "E");
        data.start.id = "S".to_string();
        data.end.id = "E".to_string();
        data.items = vec![item("a"), item("b")];
        data
    }

    fn ids(data: &ItineraryData) -> Vec<&str> {
        data.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_move_down_then_noop_at_end() {
        let mut data = data_ab();
        assert_eq!(data.move_item_down("a"), Ok(true));
        assert_eq!(ids(&data), vec!["b", "a"]);

        assert_eq!(data.move_item_down("a"), Ok(false));
        assert_eq!(ids(&data), vec!["b", "a"]);
    }

    #[test]
    fn test_move_up_noop_at_start() {
        let mut data = data_ab();
        assert!(!data.can_move_up("a"));
        assert_eq!(data.move_item_up("a"), Ok(false));
        assert!(data.can_move_up("b"));
        assert_eq!(data.move_item_up("b"), Ok(true));
        assert_eq!(ids(&data), vec!["b", "a"]);
    }

    #[test]
    fn test_anchors_never_move_or_disappear() {
        let mut data = data_ab();
        let before = data.clone();
        for id in ["S", "E"] {
            assert_eq!(data.move_item_up(id), Ok(false));
            assert_eq!(data.move_item_down(id), Ok(false));
            assert_eq!(data.remove_item(id), Ok(false));
            assert!(!data.can_move_up(id));
            assert!(!data.can_move_down(id));
        }
        assert_eq!(data, before);
    }

    #[test]
    fn test_random_moves_keep_anchors_fixed() {
        let mut data = data_ab();
        data.items.push(item("c"));
        data.items.push(item("d"));

        let ops = ["a", "d", "b", "c", "a", "a", "d", "S", "E", "c"];
        for (i, id) in ops.iter().enumerate() {
            if i % 2 == 0 {
                data.move_item_up(id).unwrap();
            } else {
                data.move_item_down(id).unwrap();
            }
            assert_eq!(data.start.id, "S");
            assert_eq!(data.end.id, "E");
            assert_eq!(data.items.len(), 4);
            assert!(data.items.iter().all(|i| !i.kind.is_anchor()));
        }
    }

    #[test]
    fn test_remove_item() {
        let mut data = data_ab();
        assert_eq!(data.remove_item("b"), Ok(true));
        assert_eq!(ids(&data), vec!["a"]);
        assert_eq!(
            data.remove_item("zzz"),
            Err(ItineraryError::UnknownItem("zzz".to_string()))
        );
    }

    #[test]
    fn test_add_item_appends_before_end() {
        let mut data = data_ab();
        data.add_item(item("c")).unwrap();
        assert_eq!(ids(&data), vec!["a", "b", "c"]);
        assert_eq!(data.items.len(), 3);

        let layout = LayoutMetrics::default().layout(&data);
        let order: Vec<&str> = layout.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["S", "a", "b", "c", "E"]);
    }

    #[test]
    fn test_add_item_rejects_anchor_and_duplicate() {
        let mut data = data_ab();
        let extra_start = ItineraryItem::new("s2", ItineraryKind::Start, "Another start");
        assert_eq!(
            data.add_item(extra_start),
            Err(ItineraryError::FixedAnchor("s2".to_string()))
        );
        assert!(data.add_item(item("a")).is_err());
        assert_eq!(data.items.len(), 2);
    }

    #[test]
    fn test_sub_item_ops_only_touch_parent() {
        let mut data = data_ab();
        data.add_sub_item("a", item("a1")).unwrap();
        data.add_sub_item("a", item("a2")).unwrap();
        data.add_sub_item("b", item("b1")).unwrap();
        let b_before = data.item("b").unwrap().sub_items.clone();

        assert_eq!(data.move_sub_item_down("a", "a1"), Ok(true));
        assert_eq!(data.move_sub_item_down("a", "a1"), Ok(false));
        assert_eq!(data.remove_sub_item("a", "a2"), Ok(true));

        let a = data.item("a").unwrap();
        assert_eq!(a.sub_items.len(), 1);
        assert_eq!(a.sub_items[0].id, "a1");
        assert_eq!(a.sub_items[0].kind, ItineraryKind::SubActivity);
        assert_eq!(data.item("b").unwrap().sub_items, b_before);
    }

    #[test]
    fn test_sub_items_require_activity_parent() {
        let mut data = data_ab();
        data.add_item(ItineraryItem::new("r", ItineraryKind::Route, "Bus")).unwrap();
        assert_eq!(
            data.add_sub_item("r", item("r1")),
            Err(ItineraryError::NotAnActivity("r".to_string()))
        );
        assert_eq!(
            data.remove_sub_item("a", "missing"),
            Err(ItineraryError::UnknownItem("missing".to_string()))
        );
    }

    #[test]
    fn test_update_item_keeps_identity() {
        let mut data = data_ab();
        data.add_sub_item("a", item("a1")).unwrap();
        let mut update = ItineraryItem::new("a", ItineraryKind::Route, "Renamed");
        update.subtitle = Some("now with subtitle".to_string());
        data.update_item(update).unwrap();

        let a = data.item("a").unwrap();
        assert_eq!(a.title, "Renamed");
        assert_eq!(a.kind, ItineraryKind::Activity);
        assert_eq!(a.sub_items.len(), 1);

        let start = ItineraryItem::new("S", ItineraryKind::Start, "Hotel lobby");
        data.update_item(start).unwrap();
        assert_eq!(data.start.title, "Hotel lobby");
    }

    #[test]
    fn test_example_data_is_valid() {
        let data = ItineraryData::example();
        assert!(data.validate().is_ok());
        assert_eq!(data.items.len(), 3);
    }

    #[test]
    fn test_validate_rejects_nested_sub_items() {
        let mut data = data_ab();
        data.items[0].sub_items = vec![item("x").with_sub_items(vec![item("y")])];
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_serde_shape() {
        let data = ItineraryData::example();
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["start"]["type"], "start");
        assert_eq!(value["items"][0]["subItems"][0]["type"], "sub-activity");
        assert!(value["items"][1].get("subItems").is_none());

        let back: ItineraryData = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: std::collections::HashSet<String> = (0..500).map(|_| generate_item_id()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[tokio::test]
    async fn test_store_notifies_only_on_change() {
        let store = ItineraryStore::new(data_ab());
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        assert_eq!(store.dispatch(ItineraryAction::MoveUp("a".to_string())), Ok(false));
        assert!(!rx.has_changed().unwrap());

        assert_eq!(store.dispatch(ItineraryAction::MoveDown("a".to_string())), Ok(true));
        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(ids(&seen), vec!["b", "a"]);
    }

    #[test]
    fn test_store_failed_action_leaves_state() {
        let store = ItineraryStore::new(data_ab());
        let before = store.snapshot();
        let result = store.dispatch(ItineraryAction::AddSub {
            parent: "missing".to_string(),
            item: item("z"),
        });
        assert!(result.is_err());
        assert_eq!(store.snapshot(), before);

        let mut broken = data_ab();
        broken.items.push(ItineraryItem::new("S", ItineraryKind::Activity, "dup"));
        assert!(store.dispatch(ItineraryAction::Replace(broken)).is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_wizard_activity_flow() {
        let mut wizard = SegmentWizard::new();
        assert!(wizard.commit().is_err());

        wizard.select_type(SegmentKind::Activity);
        assert_eq!(wizard.stage(), WizardStage::ChooseLabel);
        assert!(wizard.commit().is_err());

        let matches = wizard.search_labels("tour");
        assert_eq!(matches, vec!["Guided tour"]);
        wizard.choose_label(matches[0]).unwrap();
        assert_eq!(wizard.stage(), WizardStage::Ready);

        let new_item = wizard.commit().unwrap();
        assert_eq!(new_item.kind, ItineraryKind::Activity);
        assert_eq!(new_item.title, "Guided tour");

        let store = ItineraryStore::new(data_ab());
        store.dispatch(ItineraryAction::Add(new_item.clone())).unwrap();
        let data = store.snapshot();
        assert_eq!(data.items.len(), 3);
        assert_eq!(data.items.last().unwrap().id, new_item.id);
    }

    #[test]
    fn test_wizard_transfer_and_back() {
        let mut wizard = SegmentWizard::new();
        wizard.select_type(SegmentKind::Transfer);
        assert_eq!(wizard.stage(), WizardStage::Ready);
        assert!(wizard.choose_label("Lunch").is_err());
        assert_eq!(wizard.commit().unwrap().kind, ItineraryKind::Route);

        wizard.back();
        assert_eq!(wizard.stage(), WizardStage::SelectType);

        wizard.select_type(SegmentKind::Activity);
        wizard.choose_label("Lunch").unwrap();
        wizard.back();
        assert_eq!(wizard.stage(), WizardStage::ChooseLabel);
        assert_eq!(wizard.search_labels("").len(), ACTIVITY_LABELS.len());
    }

    #[test]
    fn test_layout_heights_and_connectors() {
        let metrics = LayoutMetrics::default();
        let mut data = data_ab();
        data.items[0].subtitle = Some("line one\nline two".to_string());
        data.items[0].description = Some("a\nb\nc".to_string());
        data.items[1].sub_items = vec![item("b1")];

        assert_eq!(metrics.item_height(&data.items[0]), 72.0 + 3.0 * 20.0);
        assert_eq!(metrics.item_height(&data.items[1]), 72.0 + 48.0);

        let layout = metrics.layout(&data);
        assert_eq!(layout.nodes.len(), 4);
        assert_eq!(layout.connectors.len(), 3);

        // S: 0..72, a: 96..228
        assert_eq!(layout.nodes[1].top, 96.0);
        let first = &layout.connectors[0];
        assert_eq!(first.from, "S");
        assert_eq!(first.top, 36.0);
        assert_eq!(first.height, 162.0 - 36.0);

        let last = layout.nodes.last().unwrap();
        assert_eq!(layout.total_height, last.top + last.height);
    }
}

// Main library file for the travel portal client core

// Shared plumbing
pub mod config;
pub mod datetime;
pub mod i18n;
pub mod pricing;
pub mod validation;

// Remote API and its wire types
pub mod api_client;
pub mod models;

// Page-level features
pub mod app;
pub mod cart;
pub mod catalog;
pub mod events;
pub mod extranet;
pub mod itinerary;
pub mod preferences;
pub mod routing;

// Re-export key types for convenience
pub use api_client::{ApiError, HttpTravelApi, TravelApi};
pub use app::{AppContext, AppError};
pub use cart::{Cart, CartBadge, CartError, CartItemEditor, CheckoutForm, EditField};
pub use catalog::{ActivityCard, ActivityCatalog, HomePage, SearchResults};
pub use config::{ClientConfig, ConfigError};
pub use events::{CartEvent, CartEvents};
pub use extranet::{ExtranetError, ExtranetWizard, WizardStep};
pub use i18n::{translate, Language};
pub use itinerary::{
    ItineraryAction, ItineraryData, ItineraryError, ItineraryItem, ItineraryKind, ItineraryStore,
    LayoutMetrics, SegmentWizard,
};
pub use preferences::{AuthContext, Currency, Preferences};
pub use pricing::{Price, PriceFields, PricePriority};
pub use routing::{Location, Route, RouteError, RouteQuery};
pub use validation::ValidationError;

// Application context
// Wires configuration, the HTTP API, persisted preferences, the signed-in session and the
// cart event bus together. Pages borrow services from here.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api_client::{ApiError, HttpTravelApi, TravelApi},
    cart::Cart,
    catalog::ActivityCatalog,
    config::{ClientConfig, ConfigError},
    events::CartEvents,
    extranet::ExtranetWizard,
    preferences::{
        AuthContext, AuthSession, PreferenceError, PreferenceStore, Preferences, CURRENCY_KEY,
        LANGUAGE_KEY,
    },
    routing::{Location, Route, RouteError},
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Preference(#[from] PreferenceError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("{0} is only available to suppliers")]
    Forbidden(Route),
}

pub struct AppContext {
    config: ClientConfig,
    api: Arc<HttpTravelApi>,
    preferences: Preferences,
    auth: AuthContext,
    events: CartEvents,
}

impl AppContext {
    // Configured defaults apply only when nothing was stored yet
    pub fn new(config: ClientConfig, store: Arc<dyn PreferenceStore>) -> Result<Self, AppError> {
        config.validate()?;
        let api = Arc::new(HttpTravelApi::new(&config)?);

        let fresh_language = store.get(LANGUAGE_KEY).is_none();
        let fresh_currency = store.get(CURRENCY_KEY).is_none();
        let preferences = Preferences::load(store.clone());
        if fresh_language {
            preferences.set_language(config.default_language)?;
        }
        if fresh_currency {
            preferences.set_currency(config.default_currency)?;
        }
        let auth = AuthContext::load(store);

        let app = Self {
            config,
            api,
            preferences,
            auth,
            events: CartEvents::new(),
        };
        app.sync_api();
        info!(
            base_url = %app.config.base_url,
            language = %app.preferences.language(),
            currency = %app.preferences.currency(),
            "app context ready"
        );
        Ok(app)
    }

    fn sync_api(&self) {
        self.api
            .set_locale(self.preferences.language(), self.preferences.currency());
        self.api.set_session_token(self.auth.token());
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpTravelApi {
        &self.api
    }

    pub fn api(&self) -> Arc<dyn TravelApi> {
        self.api.clone()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn events(&self) -> &CartEvents {
        &self.events
    }

    // Resolves a link, applying any `lang`/`currency` it carries. Extranet pages need a
    // supplier session.
    pub fn navigate(&self, href: &str) -> Result<Location, AppError> {
        let location = Location::parse(href)?;
        self.preferences
            .apply_query(location.query.lang.as_deref(), location.query.currency.as_deref())?;
        self.sync_api();

        if location.route.requires_supplier() && !self.auth.is_supplier() {
            warn!(route = %location.route, "supplier route refused");
            return Err(AppError::Forbidden(location.route));
        }
        Ok(location)
    }

    pub fn sign_in(&self, session: AuthSession) -> Result<(), AppError> {
        self.auth.sign_in(session)?;
        self.sync_api();
        Ok(())
    }

    pub fn sign_out(&self) -> Result<(), AppError> {
        self.auth.sign_out()?;
        self.sync_api();
        Ok(())
    }

    pub fn catalog(&self) -> ActivityCatalog {
        ActivityCatalog::new(self.api())
    }

    pub fn cart(&self) -> Cart {
        Cart::new(self.api(), self.events.clone())
    }

    // Query step wins over the path step
    pub fn wizard(&self, location: &Location) -> Option<ExtranetWizard> {
        let Route::Extranet { step } = &location.route else {
            return None;
        };
        let step = location.query.current_step.unwrap_or(*step);
        Some(ExtranetWizard::new(
            self.api(),
            location.query.activity_id.clone(),
            step,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extranet::WizardStep,
        i18n::Language,
        preferences::{Currency, MemoryStore, UserProfile, UserRole},
    };

    fn app_with(store: Arc<dyn PreferenceStore>) -> AppContext {
        let config = ClientConfig {
            base_url: "https://api.example.com/v1".to_string(),
            default_currency: Currency::Aed,
            ..Default::default()
        };
        AppContext::new(config, store).unwrap()
    }

    fn supplier() -> AuthSession {
        AuthSession {
            token: "tok-supplier".to_string(),
            user: UserProfile {
                id: "u-1".to_string(),
                name: "Dana".to_string(),
                email: "dana@example.com".to_string(),
                role: UserRole::Supplier,
            },
        }
    }

    #[test]
    fn test_config_defaults_seed_fresh_store() {
        let store = Arc::new(MemoryStore::new());
        let app = app_with(store.clone());
        assert_eq!(app.preferences().currency(), Currency::Aed);
        assert_eq!(store.get(CURRENCY_KEY).as_deref(), Some("AED"));

        store.set(CURRENCY_KEY, "GBP").unwrap();
        let app = app_with(store);
        assert_eq!(app.preferences().currency(), Currency::Gbp);
    }

    #[test]
    fn test_navigate_applies_locale_to_api() {
        let app = app_with(Arc::new(MemoryStore::new()));
        let location = app.navigate("/search?lang=ar&currency=EUR&destination=Cairo").unwrap();
        assert_eq!(location.route, Route::Search);
        assert_eq!(app.preferences().language(), Language::Ar);
        assert_eq!(
            app.http().endpoint(&["destinations"]).as_str(),
            "https://api.example.com/v1/destinations?lang=ar&currency=EUR"
        );

        // unsupported values are ignored
        app.navigate("/?lang=xx").unwrap();
        assert_eq!(app.preferences().language(), Language::Ar);
    }

    #[tokio::test]
    async fn test_search_link_without_locale_keeps_preferences() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            ..Default::default()
        };
        let app = AppContext::new(config, Arc::new(MemoryStore::new())).unwrap();
        app.navigate("/?lang=ar&currency=AED").unwrap();

        let location = app.navigate("/search?destination=Cairo").unwrap();
        assert_eq!(app.preferences().language(), Language::Ar);
        assert!(app
            .http()
            .search_url(&location.query.filters)
            .as_str()
            .contains("lang=ar&currency=AED"));

        let today = chrono::Utc::now().date_naive();
        let results = app.catalog().search(&location.query.filters, today).await.unwrap();
        assert!(results.cards.is_empty());

        assert_eq!(app.preferences().currency(), Currency::Aed);
        assert_eq!(
            app.http().endpoint(&["order-items"]).as_str(),
            "http://127.0.0.1:9/api/order-items?lang=ar&currency=AED"
        );
    }

    #[test]
    fn test_extranet_requires_supplier() {
        let app = app_with(Arc::new(MemoryStore::new()));
        let href = "/extranet/activity/basic-info?activityId=act-3&currentStep=3";
        assert!(matches!(app.navigate(href), Err(AppError::Forbidden(_))));

        app.sign_in(supplier()).unwrap();
        let location = app.navigate(href).unwrap();
        let wizard = app.wizard(&location).unwrap();
        assert_eq!(wizard.step(), WizardStep::Itinerary);
        assert_eq!(wizard.activity_id(), Some("act-3"));

        app.sign_out().unwrap();
        assert!(app.navigate(href).is_err());
        assert!(app.wizard(&Location::parse("/cart").unwrap()).is_none());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            AppContext::new(config, Arc::new(MemoryStore::new())),
            Err(AppError::Config(_))
        ));
    }
}

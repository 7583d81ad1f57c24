// Client-side route table
// Paths map onto `Route`; the query string is the only state carried across navigations.

use std::fmt;

use thiserror::Error;
use url::form_urlencoded;

use crate::{
    extranet::{WizardStep, CURRENT_STEP_PARAM},
    models::SearchFilters,
    validation::ValidationError,
};

pub const ACTIVITY_ID_PARAM: &str = "activityId";
pub const LANG_PARAM: &str = "lang";
pub const CURRENCY_PARAM: &str = "currency";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("No route matches {0}")]
    UnknownPath(String),

    #[error("Invalid path segment: {0}")]
    InvalidSegment(String),

    #[error(transparent)]
    Query(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Search,
    Activity { id: String },
    Cart,
    Checkout,
    PaymentCompleted,
    Extranet { step: WizardStep },
}

// Unreserved URL characters only, so ids appear in paths without encoding
fn check_segment(segment: &str) -> Result<(), RouteError> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
    if !valid {
        return Err(RouteError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

impl Route {
    pub fn activity(id: impl Into<String>) -> Result<Self, RouteError> {
        let id = id.into();
        check_segment(&id)?;
        Ok(Route::Activity { id })
    }

    // Query string and fragment are ignored; trailing slashes are tolerated
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let bare = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = bare.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["search"] => Ok(Route::Search),
            ["activity", id] => Route::activity(*id),
            ["cart"] => Ok(Route::Cart),
            ["checkout"] => Ok(Route::Checkout),
            ["payment-completed"] => Ok(Route::PaymentCompleted),
            ["extranet", "activity", step] => step
                .parse::<WizardStep>()
                .map(|step| Route::Extranet { step })
                .map_err(|_| RouteError::UnknownPath(bare.to_string())),
            _ => Err(RouteError::UnknownPath(bare.to_string())),
        }
    }

    pub fn to_path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Search => "/search".to_string(),
            Route::Activity { id } => format!("/activity/{id}"),
            Route::Cart => "/cart".to_string(),
            Route::Checkout => "/checkout".to_string(),
            Route::PaymentCompleted => "/payment-completed".to_string(),
            Route::Extranet { step } => format!("/extranet/activity/{}", step.slug()),
        }
    }

    pub fn requires_supplier(&self) -> bool {
        matches!(self, Route::Extranet { .. })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RouteQuery {
    pub activity_id: Option<String>,
    // Kept raw; invalid values are dropped when applied to preferences
    pub lang: Option<String>,
    pub currency: Option<String>,
    pub current_step: Option<WizardStep>,
    pub filters: SearchFilters,
}

impl RouteQuery {
    pub fn parse(query: &str) -> Result<Self, RouteError> {
        let query = query.trim_start_matches('?');
        let mut parsed = RouteQuery {
            filters: SearchFilters::from_query_string(query)?,
            current_step: WizardStep::from_query(query),
            ..Default::default()
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match &*key {
                ACTIVITY_ID_PARAM => parsed.activity_id = Some(value.to_string()),
                LANG_PARAM => parsed.lang = Some(value.to_string()),
                CURRENCY_PARAM => parsed.currency = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(parsed)
    }
}

// A full in-app link
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub route: Route,
    pub query: RouteQuery,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self, RouteError> {
        let (path, query) = href.split_once('?').unwrap_or((href, ""));
        let query = query.split('#').next().unwrap_or_default();
        Ok(Self {
            route: Route::parse(path)?,
            query: RouteQuery::parse(query)?,
        })
    }

    // Search links carry the filters; extranet links carry the activity and step
    pub fn href(&self) -> String {
        let query = match &self.route {
            Route::Search => self.query.filters.to_query_string(),
            Route::Extranet { step } => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                if let Some(activity_id) = &self.query.activity_id {
                    serializer.append_pair(ACTIVITY_ID_PARAM, activity_id);
                }
                serializer.append_pair(CURRENT_STEP_PARAM, &step.number().to_string());
                self.locale_pairs(&mut serializer);
                serializer.finish()
            }
            _ => {
                let mut serializer = form_urlencoded::Serializer::new(String::new());
                self.locale_pairs(&mut serializer);
                serializer.finish()
            }
        };

        if query.is_empty() {
            self.route.to_path()
        } else {
            format!("{}?{}", self.route.to_path(), query)
        }
    }

    fn locale_pairs(&self, serializer: &mut form_urlencoded::Serializer<'_, String>) {
        if let Some(lang) = &self.query.lang {
            serializer.append_pair(LANG_PARAM, lang);
        }
        if let Some(currency) = &self.query.currency {
            serializer.append_pair(CURRENCY_PARAM, currency);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{i18n::Language, preferences::Currency};

    #[test]
    fn test_paths_round_trip() {
        let routes = vec![
            Route::Home,
            Route::Search,
            Route::activity("act-42").unwrap(),
            Route::Cart,
            Route::Checkout,
            Route::PaymentCompleted,
            Route::Extranet {
                step: WizardStep::Itinerary,
            },
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.to_path()), Ok(route.clone()), "{route}");
        }
    }

    #[test]
    fn test_parse_tolerates_noise() {
        assert_eq!(Route::parse(""), Ok(Route::Home));
        assert_eq!(Route::parse("/cart/"), Ok(Route::Cart));
        assert_eq!(Route::parse("/search?destination=Dubai#top"), Ok(Route::Search));
        assert_eq!(
            Route::parse("/extranet/activity/3"),
            Ok(Route::Extranet {
                step: WizardStep::Itinerary
            })
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(
            Route::parse("/activity"),
            Err(RouteError::UnknownPath("/activity".to_string()))
        );
        assert!(Route::parse("/extranet/activity/launch").is_err());
        assert!(Route::parse("/admin").is_err());
        assert_eq!(
            Route::activity("a b"),
            Err(RouteError::InvalidSegment("a b".to_string()))
        );
        assert!(Route::Extranet {
            step: WizardStep::Photos
        }
        .requires_supplier());
    }

    #[test]
    fn test_query_parsing() {
        let query = RouteQuery::parse(
            "?activityId=act-7&lang=ar&currency=EUR&currentStep=2&adults=3",
        )
        .unwrap();
        assert_eq!(query.activity_id.as_deref(), Some("act-7"));
        assert_eq!(query.lang.as_deref(), Some("ar"));
        assert_eq!(query.currency.as_deref(), Some("EUR"));
        assert_eq!(query.current_step, Some(WizardStep::Description));
        assert_eq!(query.filters.travelers.adults, 3);
        assert_eq!(query.filters.language, Language::Ar);
        assert_eq!(query.filters.currency, Currency::Eur);

        assert!(matches!(
            RouteQuery::parse("adults=many"),
            Err(RouteError::Query(_))
        ));
    }

    #[test]
    fn test_location_href() {
        let search = Location::parse("/search?destination=Abu%20Dhabi&adults=2").unwrap();
        assert_eq!(search.route, Route::Search);
        let again = Location::parse(&search.href()).unwrap();
        assert_eq!(again.query.filters, search.query.filters);

        let wizard =
            Location::parse("/extranet/activity/pricing?activityId=act-7&lang=ar").unwrap();
        assert_eq!(
            wizard.href(),
            "/extranet/activity/pricing?activityId=act-7&currentStep=4&lang=ar"
        );

        assert_eq!(Location::parse("/cart").unwrap().href(), "/cart");
    }
}

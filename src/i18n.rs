// UI string table
// Each key maps to exactly one English and one Arabic string.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Ar];

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    pub fn direction(self) -> TextDirection {
        match self {
            Language::En => TextDirection::Ltr,
            Language::Ar => TextDirection::Rtl,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

// (key, en, ar)
const TRANSLATIONS: &[(&str, &str, &str)] = &[
    ("nav.home", "Home", "الرئيسية"),
    ("nav.search", "Search", "بحث"),
    ("nav.cart", "Cart", "السلة"),
    ("search.placeholder", "Where are you going?", "إلى أين تذهب؟"),
    ("search.no_results", "No activities found", "لم يتم العثور على أنشطة"),
    ("search.adults", "Adults", "البالغون"),
    ("search.children", "Children", "الأطفال"),
    ("search.infants", "Infants", "الرضع"),
    ("activity.from", "From", "ابتداءً من"),
    ("activity.per_person", "per person", "للشخص"),
    ("activity.duration", "Duration", "المدة"),
    ("activity.off", "off", "خصم"),
    ("cart.empty", "Your cart is empty", "سلتك فارغة"),
    ("cart.total", "Total", "المجموع"),
    ("cart.guide_language", "Guide language", "لغة المرشد"),
    ("cart.meeting_point", "Meeting point", "نقطة الالتقاء"),
    ("cart.special_request", "Special request", "طلب خاص"),
    ("cart.travelers", "Travelers", "المسافرون"),
    ("cart.save", "Save", "حفظ"),
    ("cart.saving", "Saving...", "جارٍ الحفظ..."),
    ("cart.remove", "Remove", "إزالة"),
    (
        "cart.remove_failed",
        "Could not remove this item. Please try again.",
        "تعذر إزالة هذا العنصر. حاول مرة أخرى.",
    ),
    ("cart.update_failed", "Could not save your changes.", "تعذر حفظ التغييرات."),
    ("checkout.first_name", "First name", "الاسم الأول"),
    ("checkout.last_name", "Last name", "اسم العائلة"),
    ("checkout.email", "Email", "البريد الإلكتروني"),
    ("checkout.phone", "Phone", "الهاتف"),
    ("checkout.pay", "Pay now", "ادفع الآن"),
    ("payment.completed", "Payment completed", "تم الدفع"),
    ("itinerary.start", "Start", "البداية"),
    ("itinerary.end", "End", "النهاية"),
    ("itinerary.add_segment", "Add segment", "إضافة مقطع"),
    ("itinerary.activity", "Activity", "نشاط"),
    ("itinerary.transfer", "Transfer", "انتقال"),
    ("itinerary.move_up", "Move up", "تحريك للأعلى"),
    ("itinerary.move_down", "Move down", "تحريك للأسفل"),
    ("wizard.basic_info", "Basic info", "المعلومات الأساسية"),
    ("wizard.description", "Description", "الوصف"),
    ("wizard.itinerary", "Itinerary", "خط سير الرحلة"),
    ("wizard.pricing", "Pricing", "التسعير"),
    ("wizard.availability", "Availability", "التوفر"),
    ("wizard.photos", "Photos", "الصور"),
    ("wizard.review", "Review", "المراجعة"),
    ("wizard.next", "Next", "التالي"),
    ("wizard.back", "Back", "رجوع"),
    ("wizard.save_failed", "Could not save this step.", "تعذر حفظ هذه الخطوة."),
];

pub fn lookup(key: &str, language: Language) -> Option<&'static str> {
    TRANSLATIONS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, en, ar)| match language {
            Language::En => *en,
            Language::Ar => *ar,
        })
}

// Falls back to the key itself so a missing entry is visible but not fatal
pub fn translate(key: &str, language: Language) -> String {
    match lookup(key, language) {
        Some(text) => text.to_string(),
        None => {
            warn!(key, language = %language, "missing translation");
            key.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_translate_both_locales() {
        assert_eq!(translate("nav.cart", Language::En), "Cart");
        assert_eq!(translate("nav.cart", Language::Ar), "السلة");
    }

    #[test]
    fn test_missing_key_falls_back_to_key() {
        assert_eq!(translate("does.not.exist", Language::Ar), "does.not.exist");
        assert_eq!(lookup("does.not.exist", Language::En), None);
    }

    #[test]
    fn test_keys_are_unique_and_complete() {
        let mut seen = HashSet::new();
        for (key, en, ar) in TRANSLATIONS {
            assert!(seen.insert(*key), "duplicate key {key}");
            assert!(!en.is_empty() && !ar.is_empty(), "empty string for {key}");
        }
    }

    #[test]
    fn test_language_parse_and_direction() {
        assert_eq!("AR".parse::<Language>(), Ok(Language::Ar));
        assert!("fr".parse::<Language>().is_err());
        assert_eq!(Language::Ar.direction(), TextDirection::Rtl);
        assert_eq!(Language::En.to_string(), "en");
    }
}

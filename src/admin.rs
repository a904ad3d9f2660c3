//! Admin registry: how each entity kind is listed, filtered and edited
//! by staff, plus the date filter used on copy listings.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Related records edited on the parent's page
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Inline {
    pub model: &'static str,
    /// Field on the inline model pointing at the parent
    pub foreign_key: &'static str,
    /// Blank rows offered for new records
    pub extra: u8,
}

/// Named group of form fields; the unnamed group comes first
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Fieldset {
    pub name: Option<&'static str>,
    pub fields: &'static [&'static str],
}

/// Registration of one entity kind
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModelAdmin {
    pub model: &'static str,
    /// Route segment under `/admin`
    pub path: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    /// Form layout; each row holds the fields rendered side by side
    pub fields: &'static [&'static [&'static str]],
    pub fieldsets: &'static [Fieldset],
    pub inlines: &'static [Inline],
}

impl ModelAdmin {
    /// Registration with only the defaults: list by display name, edit every field
    const fn basic(model: &'static str, path: &'static str) -> Self {
        Self {
            model,
            path,
            list_display: &["name"],
            list_filter: &[],
            fields: &[],
            fieldsets: &[],
            inlines: &[],
        }
    }
}

pub const GENRE_ADMIN: ModelAdmin = ModelAdmin::basic("Genre", "genres");

pub const LANGUAGE_ADMIN: ModelAdmin = ModelAdmin::basic("Language", "languages");

pub const AUTHOR_ADMIN: ModelAdmin = ModelAdmin {
    model: "Author",
    path: "authors",
    list_display: &["last_name", "first_name", "date_of_birth", "date_of_death"],
    list_filter: &[],
    fields: &[
        &["first_name"],
        &["last_name"],
        &["date_of_birth", "date_of_death"],
    ],
    fieldsets: &[],
    inlines: &[Inline {
        model: "Book",
        foreign_key: "author",
        extra: 0,
    }],
};

pub const BOOK_ADMIN: ModelAdmin = ModelAdmin {
    model: "Book",
    path: "books",
    list_display: &["title", "author", "display_genre"],
    list_filter: &[],
    fields: &[],
    fieldsets: &[],
    inlines: &[Inline {
        model: "BookInstance",
        foreign_key: "book",
        extra: 0,
    }],
};

pub const BOOK_INSTANCE_ADMIN: ModelAdmin = ModelAdmin {
    model: "BookInstance",
    path: "bookinstances",
    list_display: &["book", "status", "due_back", "id"],
    list_filter: &["status", "due_back"],
    fields: &[],
    fieldsets: &[
        Fieldset {
            name: None,
            fields: &["book", "imprint", "id"],
        },
        Fieldset {
            name: Some("Availability"),
            fields: &["status", "due_back", "borrower"],
        },
    ],
    inlines: &[],
};

/// Every registered entity kind, in menu order
pub const REGISTRY: [ModelAdmin; 5] = [
    AUTHOR_ADMIN,
    BOOK_ADMIN,
    BOOK_INSTANCE_ADMIN,
    GENRE_ADMIN,
    LANGUAGE_ADMIN,
];

/// Filter choices for the `due_back` column of the copy listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DueBackFilter {
    Today,
    #[serde(rename = "past_7_days")]
    Past7Days,
    ThisMonth,
    ThisYear,
    NoDate,
    HasDate,
}

/// Date constraint derived from a `DueBackFilter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DueBackBounds {
    /// Inclusive
    pub from: Option<NaiveDate>,
    /// Exclusive
    pub before: Option<NaiveDate>,
    pub has_date: Option<bool>,
}

impl DueBackFilter {
    pub fn bounds(&self, today: NaiveDate) -> DueBackBounds {
        let tomorrow = today + Duration::days(1);
        match self {
            DueBackFilter::Today => DueBackBounds {
                from: Some(today),
                before: Some(tomorrow),
                ..Default::default()
            },
            DueBackFilter::Past7Days => DueBackBounds {
                from: Some(today - Duration::days(7)),
                before: Some(tomorrow),
                ..Default::default()
            },
            DueBackFilter::ThisMonth => {
                let first = today.with_day(1);
                let next = first.and_then(|d| {
                    if d.month() == 12 {
                        NaiveDate::from_ymd_opt(d.year() + 1, 1, 1)
                    } else {
                        NaiveDate::from_ymd_opt(d.year(), d.month() + 1, 1)
                    }
                });
                DueBackBounds {
                    from: first,
                    before: next,
                    ..Default::default()
                }
            }
            DueBackFilter::ThisYear => DueBackBounds {
                from: NaiveDate::from_ymd_opt(today.year(), 1, 1),
                before: NaiveDate::from_ymd_opt(today.year() + 1, 1, 1),
                ..Default::default()
            },
            DueBackFilter::NoDate => DueBackBounds {
                has_date: Some(false),
                ..Default::default()
            },
            DueBackFilter::HasDate => DueBackBounds {
                has_date: Some(true),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_registry_columns() {
        assert_eq!(BOOK_ADMIN.list_display, &["title", "author", "display_genre"]);
        assert_eq!(BOOK_INSTANCE_ADMIN.list_filter, &["status", "due_back"]);
        assert_eq!(BOOK_INSTANCE_ADMIN.fieldsets[0].name, None);
        assert_eq!(BOOK_INSTANCE_ADMIN.fieldsets[1].name, Some("Availability"));
        assert_eq!(AUTHOR_ADMIN.inlines[0].model, "Book");
        assert_eq!(GENRE_ADMIN.list_display, &["name"]);
    }

    #[test]
    fn test_registry_serializes_fieldsets() {
        let json = serde_json::to_value(BOOK_INSTANCE_ADMIN).unwrap();
        assert_eq!(json["fieldsets"][0]["name"], serde_json::Value::Null);
        assert_eq!(
            json["fieldsets"][1]["fields"],
            serde_json::json!(["status", "due_back", "borrower"])
        );
        assert_eq!(
            serde_json::to_value(AUTHOR_ADMIN).unwrap()["fields"][2],
            serde_json::json!(["date_of_birth", "date_of_death"])
        );
    }

    #[test]
    fn test_due_back_bounds() {
        let today = date(2024, 12, 15);

        assert_eq!(
            DueBackFilter::Today.bounds(today),
            DueBackBounds {
                from: Some(today),
                before: Some(date(2024, 12, 16)),
                has_date: None,
            }
        );
        assert_eq!(DueBackFilter::Past7Days.bounds(today).from, Some(date(2024, 12, 8)));

        let month = DueBackFilter::ThisMonth.bounds(today);
        assert_eq!(month.from, Some(date(2024, 12, 1)));
        assert_eq!(month.before, Some(date(2025, 1, 1)));

        let year = DueBackFilter::ThisYear.bounds(today);
        assert_eq!(year.from, Some(date(2024, 1, 1)));
        assert_eq!(year.before, Some(date(2025, 1, 1)));

        assert_eq!(DueBackFilter::NoDate.bounds(today).has_date, Some(false));
        assert_eq!(DueBackFilter::HasDate.bounds(today).from, None);
    }

    #[test]
    fn test_due_back_filter_names() {
        let filter: DueBackFilter = serde_json::from_str("\"past_7_days\"").unwrap();
        assert_eq!(filter, DueBackFilter::Past7Days);
    }
}

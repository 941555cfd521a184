use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_NEWS_LINK: &str = "#";
pub const DEFAULT_GALLERY_TITLE: &str = "Sin título";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub date: DateTime<Utc>,
    pub image: Option<String>,
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    pub fn new(
        title: String,
        description: String,
        link: Option<String>,
        image: Option<String>,
        created_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            link: link.unwrap_or_else(|| DEFAULT_NEWS_LINK.to_string()),
            date: Utc::now(),
            image,
            created_by,
            updated_at: None,
        }
    }

    /// Applies a partial update. Fields left as `None` keep their value.
    pub fn apply(&mut self, changes: NewsChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(link) = changes.link {
            self.link = link;
        }
        if let Some(image) = changes.image {
            self.image = Some(image);
        }
        self.updated_at = Some(Utc::now());
    }
}

#[derive(Debug, Default, Clone)]
pub struct NewsChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GalleryCategory {
    Eventos,
    Academico,
    Deportes,
    Cultural,
    Graduacion,
    Talleres,
    Instalaciones,
    #[default]
    Otros,
}

impl GalleryCategory {
    /// Maps a submitted category name, falling back to `otros` for anything
    /// outside the known set.
    pub fn from_submitted(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("eventos") => Self::Eventos,
            Some("academico") => Self::Academico,
            Some("deportes") => Self::Deportes,
            Some("cultural") => Self::Cultural,
            Some("graduacion") => Self::Graduacion,
            Some("talleres") => Self::Talleres,
            Some("instalaciones") => Self::Instalaciones,
            _ => Self::Otros,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub category: GalleryCategory,
    pub image: String,
    pub date: DateTime<Utc>,
    pub uploaded_by: String,
}

impl GalleryItem {
    pub fn new(
        title: Option<String>,
        description: Option<String>,
        category: GalleryCategory,
        image: String,
        uploaded_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.unwrap_or_else(|| DEFAULT_GALLERY_TITLE.to_string()),
            description: description.unwrap_or_default(),
            category,
            image,
            date: Utc::now(),
            uploaded_by,
        }
    }
}

/// Newest first. Ties keep no particular order.
pub fn sort_newest_first<T>(items: &mut [T], date: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by(|a, b| date(b).cmp(&date(a)));
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn news_item_serializes_camel_case_with_null_image() {
        let item = NewsItem::new("X".into(), "Y".into(), None, None, "admin".into());
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["createdBy"], "admin");
        assert_eq!(json["link"], "#");
        assert!(json["image"].is_null());
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn apply_keeps_unset_fields() {
        let mut item = NewsItem::new(
            "Title".into(),
            "Body".into(),
            Some("https://example.org".into()),
            Some("/uploads/news/a.png".into()),
            "admin".into(),
        );

        item.apply(NewsChanges {
            title: Some("New title".into()),
            ..Default::default()
        });

        assert_eq!(item.title, "New title");
        assert_eq!(item.description, "Body");
        assert_eq!(item.link, "https://example.org");
        assert_eq!(item.image.as_deref(), Some("/uploads/news/a.png"));
        assert!(item.updated_at.is_some());
    }

    #[test]
    fn unknown_category_falls_back_to_otros() {
        assert_eq!(
            GalleryCategory::from_submitted(Some("deportes")),
            GalleryCategory::Deportes
        );
        assert_eq!(
            GalleryCategory::from_submitted(Some("sports")),
            GalleryCategory::Otros
        );
        assert_eq!(GalleryCategory::from_submitted(None), GalleryCategory::Otros);
    }

    #[test]
    fn gallery_item_defaults() {
        let item = GalleryItem::new(
            None,
            None,
            GalleryCategory::default(),
            "/uploads/gallery/a.jpg".into(),
            "admin".into(),
        );
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["title"], DEFAULT_GALLERY_TITLE);
        assert_eq!(json["description"], "");
        assert_eq!(json["category"], "otros");
        assert_eq!(json["uploadedBy"], "admin");
    }

    #[test]
    fn sort_newest_first_orders_by_date_descending() {
        let now = Utc::now();
        let mut items = vec![
            (1, now - Duration::days(2)),
            (2, now),
            (3, now - Duration::days(1)),
        ];

        sort_newest_first(&mut items, |(_, date)| *date);

        let order: Vec<i32> = items.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}

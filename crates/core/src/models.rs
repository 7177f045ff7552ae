//! Scraped record types.
//!
//! Every field is optional: a field whose selector found nothing is `None` (or an empty
//! list), never an empty string. Records serialize to JSON with absent fields omitted.

use serde::Serialize;

/// A record the field mapping model can populate by field name.
pub trait ScrapedRecord: Default + PartialEq {
    /// Record kind, used in log and error messages.
    const KIND: &'static str;

    /// Assigns a scalar field. Returns `false` if the record has no field called `name`.
    fn set_field(&mut self, name: &str, value: String) -> bool;

    /// True when no field was populated.
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapedTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ScrapedRecord for ScrapedTag {
    const KIND: &'static str = "tag";

    fn set_field(&mut self, name: &str, value: String) -> bool {
        match name {
            "name" => self.name = Some(value),
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapedStudio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ScrapedRecord for ScrapedStudio {
    const KIND: &'static str = "studio";

    fn set_field(&mut self, name: &str, value: String) -> bool {
        match name {
            "name" => self.name = Some(value),
            "url" => self.url = Some(value),
            "image" => self.image = Some(value),
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapedPerformer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hair_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake_tits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tattoos: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piercings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ScrapedTag>,
}

impl ScrapedRecord for ScrapedPerformer {
    const KIND: &'static str = "performer";

    fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "name" => &mut self.name,
            "disambiguation" => &mut self.disambiguation,
            "gender" => &mut self.gender,
            "url" => &mut self.url,
            "twitter" => &mut self.twitter,
            "instagram" => &mut self.instagram,
            "birthdate" => &mut self.birthdate,
            "death_date" => &mut self.death_date,
            "ethnicity" => &mut self.ethnicity,
            "country" => &mut self.country,
            "eye_color" => &mut self.eye_color,
            "hair_color" => &mut self.hair_color,
            "height" => &mut self.height,
            "weight" => &mut self.weight,
            "measurements" => &mut self.measurements,
            "fake_tits" => &mut self.fake_tits,
            "career_length" => &mut self.career_length,
            "tattoos" => &mut self.tattoos,
            "piercings" => &mut self.piercings,
            "aliases" => &mut self.aliases,
            "image" => &mut self.image,
            "details" => &mut self.details,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapedMovie {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aliases: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<ScrapedStudio>,
}

impl ScrapedRecord for ScrapedMovie {
    const KIND: &'static str = "movie";

    fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "name" => &mut self.name,
            "aliases" => &mut self.aliases,
            "duration" => &mut self.duration,
            "date" => &mut self.date,
            "rating" => &mut self.rating,
            "director" => &mut self.director,
            "synopsis" => &mut self.synopsis,
            "url" => &mut self.url,
            "front_image" => &mut self.front_image,
            "back_image" => &mut self.back_image,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapedScene {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<ScrapedStudio>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ScrapedTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub performers: Vec<ScrapedPerformer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub movies: Vec<ScrapedMovie>,
}

impl ScrapedRecord for ScrapedScene {
    const KIND: &'static str = "scene";

    fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "code" => &mut self.code,
            "details" => &mut self.details,
            "director" => &mut self.director,
            "url" => &mut self.url,
            "date" => &mut self.date,
            "image" => &mut self.image,
            "duration" => &mut self.duration,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrapedGallery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studio: Option<ScrapedStudio>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ScrapedTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub performers: Vec<ScrapedPerformer>,
}

impl ScrapedRecord for ScrapedGallery {
    const KIND: &'static str = "gallery";

    fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "title" => &mut self.title,
            "details" => &mut self.details,
            "photographer" => &mut self.photographer,
            "url" => &mut self.url,
            "date" => &mut self.date,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

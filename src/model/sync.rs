// flowsync/src/model/sync.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Id + display name pair used for bases, tables, views, sites and collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirtableLocation {
    pub base: NamedRef,
    pub table: NamedRef,
    #[serde(default)]
    pub view: Option<NamedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebflowLocation {
    pub site: NamedRef,
    pub collection: NamedRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    pub delete_orphans: bool,
    pub verbose_logs: bool,
    pub publish_to_subdomain: bool,
}

/// Names of the entries in the top-level `tokens` table this sync uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncTokens {
    pub airtable: Option<String>,
    pub webflow: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpecialFieldTag {
    Name,
    Slug,
    State,
    ItemId,
    LastPublished,
    Errors,
}

impl SpecialFieldTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialFieldTag::Name => "name",
            SpecialFieldTag::Slug => "slug",
            SpecialFieldTag::State => "state",
            SpecialFieldTag::ItemId => "itemId",
            SpecialFieldTag::LastPublished => "lastPublished",
            SpecialFieldTag::Errors => "errors",
        }
    }
}

/// Webflow CMS field types (v2 API names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WebflowFieldType {
    PlainText,
    RichText,
    Image,
    MultiImage,
    VideoLink,
    Link,
    Email,
    Phone,
    Number,
    DateTime,
    Switch,
    Color,
    Option,
    File,
    Reference,
    MultiReference,
    User,
    Unknown(String),
}

impl From<String> for WebflowFieldType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PlainText" => WebflowFieldType::PlainText,
            "RichText" => WebflowFieldType::RichText,
            "Image" => WebflowFieldType::Image,
            "MultiImage" => WebflowFieldType::MultiImage,
            "VideoLink" | "Video" => WebflowFieldType::VideoLink,
            "Link" => WebflowFieldType::Link,
            "Email" => WebflowFieldType::Email,
            "Phone" => WebflowFieldType::Phone,
            "Number" => WebflowFieldType::Number,
            "DateTime" => WebflowFieldType::DateTime,
            "Switch" => WebflowFieldType::Switch,
            "Color" => WebflowFieldType::Color,
            "Option" => WebflowFieldType::Option,
            "File" => WebflowFieldType::File,
            "Reference" | "ItemRef" => WebflowFieldType::Reference,
            "MultiReference" | "ItemRefSet" => WebflowFieldType::MultiReference,
            "User" => WebflowFieldType::User,
            _ => WebflowFieldType::Unknown(value),
        }
    }
}

impl From<WebflowFieldType> for String {
    fn from(value: WebflowFieldType) -> Self {
        match value {
            WebflowFieldType::PlainText => "PlainText".to_string(),
            WebflowFieldType::RichText => "RichText".to_string(),
            WebflowFieldType::Image => "Image".to_string(),
            WebflowFieldType::MultiImage => "MultiImage".to_string(),
            WebflowFieldType::VideoLink => "VideoLink".to_string(),
            WebflowFieldType::Link => "Link".to_string(),
            WebflowFieldType::Email => "Email".to_string(),
            WebflowFieldType::Phone => "Phone".to_string(),
            WebflowFieldType::Number => "Number".to_string(),
            WebflowFieldType::DateTime => "DateTime".to_string(),
            WebflowFieldType::Switch => "Switch".to_string(),
            WebflowFieldType::Color => "Color".to_string(),
            WebflowFieldType::Option => "Option".to_string(),
            WebflowFieldType::File => "File".to_string(),
            WebflowFieldType::Reference => "Reference".to_string(),
            WebflowFieldType::MultiReference => "MultiReference".to_string(),
            WebflowFieldType::User => "User".to_string(),
            WebflowFieldType::Unknown(other) => other,
        }
    }
}

impl WebflowFieldType {
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            WebflowFieldType::Reference | WebflowFieldType::MultiReference
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Webflow field validations. Only the keys relevant to the field's type are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldValidations {
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    pub single_line: Option<bool>,
    pub precision: Option<u32>,
    pub allow_negative: Option<bool>,
    pub format: Option<String>,
    pub options: Option<Vec<OptionChoice>>,
    pub collection_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirtableField {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub options: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebflowField {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: WebflowFieldType,
    #[serde(default)]
    pub validations: Option<FieldValidations>,
}

/// Where a reference field finds the Webflow item id of a linked Airtable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceConfig {
    pub linked_table_id: String,
    pub linked_item_id_field_id: String,
    #[serde(default)]
    pub linked_item_id_field_name: Option<String>,
}

/// One Airtable → Webflow field mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncField {
    pub airtable: AirtableField,
    #[serde(default)]
    pub webflow: Option<WebflowField>,
    #[serde(default)]
    pub special_field: Option<SpecialFieldTag>,
    #[serde(default)]
    pub reference_config: Option<ReferenceConfig>,
}

/// A sync definition as stored in `config.json`, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tokens: SyncTokens,
    #[serde(default)]
    pub config: SyncSettings,
    pub airtable: AirtableLocation,
    pub webflow: WebflowLocation,
    pub fields: Vec<SyncField>,
}

/// The six special fields of a sync, resolved once when the sync is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialFields {
    pub name: SyncField,
    pub slug: SyncField,
    pub state: SyncField,
    pub item_id: SyncField,
    pub last_published: SyncField,
    pub errors: SyncField,
}

impl SpecialFields {
    fn resolve(sync_name: &str, fields: &[SyncField]) -> Result<Self, AppError> {
        let find = |tag: SpecialFieldTag| -> Result<SyncField, AppError> {
            let mut tagged = fields.iter().filter(|f| f.special_field == Some(tag));
            let first = tagged.next().ok_or_else(|| {
                AppError::Config(format!(
                    "Sync \"{}\" is missing the required special field \"{}\"",
                    sync_name,
                    tag.as_str()
                ))
            })?;
            if tagged.next().is_some() {
                return Err(AppError::Config(format!(
                    "Sync \"{}\" has more than one \"{}\" special field",
                    sync_name,
                    tag.as_str()
                )));
            }
            Ok(first.clone())
        };

        let special = SpecialFields {
            name: find(SpecialFieldTag::Name)?,
            slug: find(SpecialFieldTag::Slug)?,
            state: find(SpecialFieldTag::State)?,
            item_id: find(SpecialFieldTag::ItemId)?,
            last_published: find(SpecialFieldTag::LastPublished)?,
            errors: find(SpecialFieldTag::Errors)?,
        };

        for (tag, field) in [
            (SpecialFieldTag::Name, &special.name),
            (SpecialFieldTag::Slug, &special.slug),
        ] {
            if field.webflow.is_none() {
                return Err(AppError::Config(format!(
                    "Special field \"{}\" of sync \"{}\" must be mapped to a Webflow field",
                    tag.as_str(),
                    sync_name
                )));
            }
        }
        Ok(special)
    }
}

/// A validated sync: every special field is present exactly once and every
/// reference field knows how to resolve its linked records.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub id: String,
    pub name: String,
    pub tokens: SyncTokens,
    pub settings: SyncSettings,
    pub airtable: AirtableLocation,
    pub webflow: WebflowLocation,
    pub fields: Vec<SyncField>,
    pub special: SpecialFields,
}

impl TryFrom<SyncDefinition> for SyncConfig {
    type Error = AppError;

    fn try_from(def: SyncDefinition) -> Result<Self, Self::Error> {
        let special = SpecialFields::resolve(&def.name, &def.fields)?;

        for field in &def.fields {
            let Some(webflow) = &field.webflow else {
                continue;
            };
            if webflow.field_type.is_reference() && field.reference_config.is_none() {
                return Err(AppError::Config(format!(
                    "Reference field \"{}\" of sync \"{}\" has no reference configuration",
                    field.airtable.name, def.name
                )));
            }
        }

        Ok(SyncConfig {
            id: def.id,
            name: def.name,
            tokens: def.tokens,
            settings: def.config,
            airtable: def.airtable,
            webflow: def.webflow,
            fields: def.fields,
            special,
        })
    }
}

impl SyncConfig {
    /// Fields that write to a Webflow field.
    pub fn mapped_fields(&self) -> impl Iterator<Item = (&SyncField, &WebflowField)> {
        self.fields
            .iter()
            .filter_map(|f| f.webflow.as_ref().map(|w| (f, w)))
    }
}

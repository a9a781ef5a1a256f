// flowsync/src/sync/parse/mod.rs
mod fields;
mod reference;
mod slug;

pub use slug::derive_slug;

use serde_json::{Map, Value};

use crate::errors::{AppError, Result};
use crate::model::{
    FieldValidations, ParsedRecord, RecordWithErrors, SourceRecord, SpecialFieldTag, SyncConfig, SyncField,
    WebflowField, WebflowFieldType,
};
use crate::sync::api::SourceApi;
use crate::utils::{is_empty_value, non_empty_text};

static NO_VALIDATIONS: FieldValidations = FieldValidations {
    max_length: None,
    min_length: None,
    single_line: None,
    precision: None,
    allow_negative: None,
    format: None,
    options: None,
    collection_id: None,
};

/// Converts a record into Webflow `fieldData`.
///
/// Every mapped field is attempted so that all problems are reported at
/// once; the record fails if any field did. Empty source values are written
/// as explicit nulls so clearing a cell in Airtable clears it in Webflow,
/// except for attachment fields, which must have a source.
pub async fn parse_record(
    record: &SourceRecord,
    sync: &SyncConfig,
    source: &dyn SourceApi,
    item_id: Option<String>,
) -> std::result::Result<ParsedRecord, RecordWithErrors> {
    let mut field_data = Map::new();
    let mut errors = Vec::new();

    for (field, webflow) in sync.mapped_fields() {
        if field.special_field == Some(SpecialFieldTag::Slug) {
            continue;
        }
        match parse_field(record, sync, field, webflow, source).await {
            Ok(value) => {
                field_data.insert(webflow.slug.clone(), value);
            }
            Err(e) => errors.push(format!("[{}]: {}", field.airtable.name, e)),
        }
    }

    // The slug may fall back on the parsed name, so it goes last.
    let slug_field = &sync.special.slug;
    if let Some(webflow) = &slug_field.webflow {
        let name_key = sync
            .special
            .name
            .webflow
            .as_ref()
            .map(|w| w.slug.as_str())
            .unwrap_or("name");
        match parse_slug(record.field(&slug_field.airtable.id), field_data.get(name_key)) {
            Ok(slug) => {
                field_data.insert(webflow.slug.clone(), Value::String(slug));
            }
            Err(e) => errors.push(format!("[{}]: {}", slug_field.airtable.name, e)),
        }
    }

    if errors.is_empty() {
        Ok(ParsedRecord {
            record: record.clone(),
            field_data,
            item_id,
        })
    } else {
        Err(RecordWithErrors {
            record: record.clone(),
            errors,
        })
    }
}

fn parse_slug(explicit: Option<&Value>, parsed_name: Option<&Value>) -> Result<String> {
    let base = non_empty_text(explicit)
        .or_else(|| non_empty_text(parsed_name))
        .ok_or_else(|| AppError::field("Slug could not be derived: both the slug and name are empty"))?;
    let slug = derive_slug(&base);
    if slug.is_empty() {
        return Err(AppError::field(format!("Slug could not be derived from \"{}\"", base)));
    }
    Ok(slug)
}

async fn parse_field(
    record: &SourceRecord,
    sync: &SyncConfig,
    field: &SyncField,
    webflow: &WebflowField,
    source: &dyn SourceApi,
) -> Result<Value> {
    let raw = record.field(&field.airtable.id).unwrap_or(&Value::Null);

    if is_empty_value(raw) {
        if field.special_field == Some(SpecialFieldTag::Name) {
            return Err(AppError::field("Name is required"));
        }
        return match webflow.field_type {
            WebflowFieldType::Switch => Ok(Value::Bool(false)),
            WebflowFieldType::Image | WebflowFieldType::File | WebflowFieldType::MultiImage => {
                Err(AppError::field("No attachment with a URL was found"))
            }
            _ => Ok(Value::Null),
        };
    }

    let validations = webflow.validations.as_ref().unwrap_or(&NO_VALIDATIONS);
    match &webflow.field_type {
        WebflowFieldType::PlainText | WebflowFieldType::RichText => fields::parse_text(raw, validations),
        WebflowFieldType::Number => fields::parse_number(raw, validations),
        WebflowFieldType::Switch => Ok(fields::parse_switch(raw)),
        WebflowFieldType::Option => fields::parse_option(raw, validations),
        WebflowFieldType::Image | WebflowFieldType::File => fields::parse_attachment(raw),
        WebflowFieldType::MultiImage => fields::parse_attachments(raw),
        WebflowFieldType::DateTime => fields::parse_datetime(raw),
        WebflowFieldType::Email => fields::parse_email(raw),
        WebflowFieldType::Color => fields::parse_color(raw),
        WebflowFieldType::Link | WebflowFieldType::VideoLink | WebflowFieldType::Phone => {
            fields::parse_text(raw, validations)
        }
        kind @ (WebflowFieldType::Reference | WebflowFieldType::MultiReference) => {
            let config = field.reference_config.as_ref().ok_or_else(|| {
                AppError::Config(format!("Reference field \"{}\" has no reference configuration", field.airtable.name))
            })?;
            let multi = *kind == WebflowFieldType::MultiReference;
            reference::resolve_references(raw, config, &sync.airtable.base.id, source, multi).await
        }
        WebflowFieldType::User => Err(AppError::field("Unsupported Webflow field type \"User\"")),
        WebflowFieldType::Unknown(name) => Err(AppError::field(format!("Unsupported Webflow field type \"{}\"", name))),
    }
}

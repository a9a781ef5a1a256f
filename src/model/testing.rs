//! Shared fixtures for unit tests across the crate.

use serde_json::{Map, Value, json};

use super::sync::{AirtableField, AirtableLocation, NamedRef, SyncSettings, SyncTokens, WebflowLocation};
use super::{
    DestinationItem, FieldValidations, SourceRecord, SpecialFieldTag, SyncConfig, SyncDefinition, SyncField,
    WebflowField, WebflowFieldType,
};

pub fn field(
    id: &str,
    name: &str,
    webflow: Option<(&str, WebflowFieldType)>,
    special: Option<SpecialFieldTag>,
) -> SyncField {
    SyncField {
        airtable: AirtableField {
            id: id.to_string(),
            name: name.to_string(),
            field_type: "singleLineText".to_string(),
            options: None,
        },
        webflow: webflow.map(|(slug, field_type)| WebflowField {
            id: format!("wf-{}", slug),
            slug: slug.to_string(),
            display_name: Some(name.to_string()),
            field_type,
            validations: None,
        }),
        special_field: special,
        reference_config: None,
    }
}

pub fn sample_definition() -> SyncDefinition {
    let mut summary = field(
        "fldSummary",
        "Summary",
        Some(("summary", WebflowFieldType::PlainText)),
        None,
    );
    if let Some(webflow) = summary.webflow.as_mut() {
        webflow.validations = Some(FieldValidations {
            max_length: Some(200),
            ..FieldValidations::default()
        });
    }

    SyncDefinition {
        id: "sync-1".to_string(),
        name: "Blog posts".to_string(),
        tokens: SyncTokens::default(),
        config: SyncSettings {
            delete_orphans: true,
            verbose_logs: false,
            publish_to_subdomain: false,
        },
        airtable: AirtableLocation {
            base: NamedRef { id: "appBase".into(), name: "Content".into() },
            table: NamedRef { id: "tblPosts".into(), name: "Posts".into() },
            view: None,
        },
        webflow: WebflowLocation {
            site: NamedRef { id: "site-1".into(), name: "Site".into() },
            collection: NamedRef { id: "col-1".into(), name: "Posts".into() },
        },
        fields: vec![
            field(
                "fldName",
                "Name",
                Some(("name", WebflowFieldType::PlainText)),
                Some(SpecialFieldTag::Name),
            ),
            field(
                "fldSlug",
                "Slug",
                Some(("slug", WebflowFieldType::PlainText)),
                Some(SpecialFieldTag::Slug),
            ),
            field("fldState", "State", None, Some(SpecialFieldTag::State)),
            field("fldItemId", "Item ID", None, Some(SpecialFieldTag::ItemId)),
            field(
                "fldLastPublished",
                "Last Published",
                None,
                Some(SpecialFieldTag::LastPublished),
            ),
            field("fldErrors", "Errors", None, Some(SpecialFieldTag::Errors)),
            summary,
            field(
                "fldPrice",
                "Price",
                Some(("price", WebflowFieldType::Number)),
                None,
            ),
        ],
    }
}

pub fn sample_sync() -> SyncConfig {
    SyncConfig::try_from(sample_definition()).expect("sample definition is valid")
}

pub fn record(id: &str, state: Option<&str>, item_id: Option<&str>) -> SourceRecord {
    let mut fields = Map::new();
    fields.insert("fldName".into(), json!(format!("Record {}", id)));
    if let Some(state) = state {
        fields.insert("fldState".into(), json!(state));
    }
    if let Some(item_id) = item_id {
        fields.insert("fldItemId".into(), json!(item_id));
    }
    SourceRecord {
        id: id.to_string(),
        created_time: Some("2024-01-01T00:00:00.000Z".to_string()),
        fields,
    }
}

pub fn item(id: &str, name: &str, slug: &str) -> DestinationItem {
    let mut field_data = Map::new();
    field_data.insert("name".into(), Value::String(name.to_string()));
    field_data.insert("slug".into(), Value::String(slug.to_string()));
    DestinationItem {
        id: id.to_string(),
        is_archived: false,
        is_draft: false,
        last_published: None,
        last_updated: None,
        created_on: None,
        field_data,
    }
}

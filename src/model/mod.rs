// flowsync/src/model/mod.rs
mod record;
mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use record::{
    ActionKind, DestinationItem, MatchedItem, ParsedRecord, RecordAction, RecordWithErrors,
    SourceRecord,
};
pub use sync::{
    FieldValidations, ReferenceConfig, SpecialFieldTag, SyncConfig, SyncDefinition, SyncField,
    WebflowField, WebflowFieldType,
};

#[cfg(test)]
pub use sync::OptionChoice;

//! Domain entities and invariants of the front-desk records client.

#![forbid(unsafe_code)]

mod entity;
mod field_value;
mod form;
mod form_draft;
mod list;
mod payload;
mod record;
mod reference;
mod schemas;

pub use entity::{BodyEncoding, EntityEndpoints, EntityKind, SortParamStyle};
pub use field_value::{FieldValue, FileHandle, WIRE_DATE_FORMAT, format_wire_date, parse_date};
pub use form::{
    BranchDefinition, DerivedRule, DiscriminantDefinition, FieldDefinition, FieldKind, FormSchema,
};
pub use form_draft::{ActiveBranch, FormDraft, FormMode};
pub use list::{DEFAULT_SORT_FIELD, ListQuery, ListResult, SortDirection, SortSpec};
pub use payload::{PayloadValue, SubmissionPayload};
pub use record::{Record, RecordShape, parse_list_envelope, parse_record_envelope};
pub use reference::{ReferenceCatalog, ReferenceOption, parse_reference_options};
pub use schemas::{BedLocationType, PatientCaseType};

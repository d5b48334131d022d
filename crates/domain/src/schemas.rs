use std::fmt::{Display, Formatter};
use std::str::FromStr;

use frontdesk_core::AppError;
use serde_json::{Map, Value};

use crate::{
    BranchDefinition, DerivedRule, DiscriminantDefinition, EntityKind, FieldDefinition,
    FieldKind, FieldValue, FormSchema,
};

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Patient case type selecting the OPD, IPD or emergency section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientCaseType {
    /// Out-patient visit.
    Opd,
    /// In-patient admission.
    Ipd,
    /// Emergency intake.
    Emergency,
}

impl PatientCaseType {
    /// Returns every case type in display order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Opd, Self::Ipd, Self::Emergency]
    }

    /// Returns the transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opd => "opd",
            Self::Ipd => "ipd",
            Self::Emergency => "emergency",
        }
    }

    /// Returns the section label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Opd => "OPD Details",
            Self::Ipd => "IPD Details",
            Self::Emergency => "Emergency Details",
        }
    }
}

impl Display for PatientCaseType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PatientCaseType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "opd" => Ok(Self::Opd),
            "ipd" => Ok(Self::Ipd),
            "emergency" => Ok(Self::Emergency),
            _ => Err(AppError::Validation(format!(
                "unknown patient case type '{value}'"
            ))),
        }
    }
}

/// Whether a bed sits in a room or in a ward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BedLocationType {
    /// Bed inside a room.
    Room,
    /// Bed inside a ward.
    Ward,
}

impl BedLocationType {
    /// Returns both location types.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Room, Self::Ward]
    }

    /// Returns the transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Room => "ROOM",
            Self::Ward => "WARD",
        }
    }

    /// Returns the field holding the location reference.
    #[must_use]
    pub fn reference_field(&self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Ward => "ward",
        }
    }
}

impl Display for BedLocationType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for BedLocationType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ROOM" => Ok(Self::Room),
            "WARD" => Ok(Self::Ward),
            _ => Err(AppError::Validation(format!(
                "unknown bed location type '{value}'"
            ))),
        }
    }
}

impl FormSchema {
    /// Returns the form layout used to create and edit records of `entity`.
    #[must_use]
    pub fn for_entity(entity: EntityKind) -> Self {
        match entity {
            EntityKind::Doctor => doctor_schema(),
            EntityKind::Patient => patient_schema(),
            EntityKind::Recipient => recipient_schema(),
            EntityKind::Floor => FormSchema::new(
                entity,
                vec![
                    text("name", "Floor Name").required(),
                    text("code", "Floor Code").required(),
                    number("floorNumber", "Floor Number").required(),
                    active_flag(),
                    text("notes", "Notes"),
                ],
            ),
            EntityKind::Ward => FormSchema::new(
                entity,
                vec![
                    reference("floor", "Floor").required(),
                    text("name", "Ward Name").required(),
                    text("code", "Ward Code").required(),
                    text("wardType", "Ward Type").required(),
                    active_flag().required(),
                    text("notes", "Notes"),
                ],
            ),
            EntityKind::Room => FormSchema::new(
                entity,
                vec![
                    reference("floor", "Floor").required(),
                    text("roomNumber", "Room Number").required(),
                    text("roomType", "Room Type").required(),
                    number("capacity", "Capacity").required(),
                    active_flag().required(),
                    text("notes", "Notes"),
                ],
            ),
            EntityKind::Bed => bed_schema(),
            EntityKind::LabTest => FormSchema::new(
                entity,
                vec![
                    text("name", "Test Name").required(),
                    text("code", "Test Code").required(),
                    text("category", "Category").required(),
                    text("unit", "Unit"),
                    text("normalRange", "Normal Range"),
                    text("sampleType", "Sample Type"),
                    text("turnaroundTime", "Turnaround Time"),
                    active_flag(),
                ],
            ),
            EntityKind::ChargeMaster => FormSchema::new(
                entity,
                vec![
                    text("name", "Charge Name").required(),
                    text("code", "Charge Code").required(),
                    text("caseCategory", "Case Category"),
                    text("chargeType", "Charge Type").required(),
                    number("amount", "Amount").required(),
                    flag("gstApplicable", "GST Applicable", false),
                    number("gstRate", "GST Rate").required(),
                    text("gstType", "GST Type"),
                    text("hsnCode", "HSN Code"),
                    flag("taxInclusive", "Tax Inclusive", false),
                    active_flag(),
                ],
            ),
            EntityKind::Appointment => FormSchema::new(
                entity,
                vec![
                    reference("patient", "Patient").required(),
                    reference("doctor", "Doctor").required(),
                    FieldDefinition::new("appointmentDate", "Appointment Date", FieldKind::Date)
                        .required(),
                    text("timeSlot", "Time Slot"),
                    text("reason", "Reason"),
                    FieldDefinition::new(
                        "status",
                        "Status",
                        FieldKind::choice(&["scheduled", "completed", "cancelled"]),
                    )
                    .with_default(FieldValue::Text("scheduled".to_owned())),
                    text("notes", "Notes"),
                ],
            ),
            EntityKind::Service => FormSchema::new(
                entity,
                vec![
                    text("name", "Service Name").required(),
                    text("code", "Service Code"),
                    text("department", "Department"),
                    number("price", "Price").required(),
                    text("description", "Description"),
                    active_flag(),
                ],
            ),
        }
    }
}

fn doctor_schema() -> FormSchema {
    let availability = WEEKDAYS
        .iter()
        .map(|day| ((*day).to_owned(), Value::Bool(false)))
        .collect::<Map<_, _>>();

    FormSchema::new(
        EntityKind::Doctor,
        vec![
            text("name", "Doctor Name").required(),
            text("email", "Email").required(),
            text("phone", "Phone").required(),
            text("specialization", "Specialization").required(),
            text("department", "Department").required(),
            number("experience", "Experience (years)").required(),
            number("fees", "Consultation Fees").required(),
            FieldDefinition::new("education", "Education", FieldKind::List)
                .with_default(FieldValue::List(Vec::new())),
            FieldDefinition::new("availability", "Availability", FieldKind::Object)
                .with_default(FieldValue::Object(availability)),
            FieldDefinition::new("image", "Photo", FieldKind::File),
        ],
    )
}

fn patient_schema() -> FormSchema {
    let case_types = PatientCaseType::all()
        .iter()
        .map(PatientCaseType::as_str)
        .collect::<Vec<_>>();

    let branches = PatientCaseType::all()
        .iter()
        .map(|case_type| {
            let fields = match case_type {
                PatientCaseType::Opd => vec![
                    reference("opd.doctor", "Doctor").required(),
                    text("opd.visitReason", "Visit Reason"),
                    number("opd.visitCount", "Visit Count"),
                    date("opd.lastVisit", "Last Visit"),
                ],
                PatientCaseType::Ipd => vec![
                    reference("ipd.doctor", "Doctor").required(),
                    text("ipd.ward", "Ward").required(),
                    text("ipd.roomNumber", "Room Number"),
                    text("ipd.bedNumber", "Bed Number"),
                    date("ipd.admissionDate", "Admission Date"),
                    date("ipd.dischargeDate", "Discharge Date"),
                    text("ipd.dischargeSummary", "Discharge Summary"),
                ],
                PatientCaseType::Emergency => vec![
                    FieldDefinition::new(
                        "emergency.level",
                        "Emergency Level",
                        FieldKind::choice(&["low", "medium", "high"]),
                    ),
                    text("emergency.broughtBy", "Brought By"),
                    text("emergency.conditionNotes", "Condition Notes"),
                ],
            };
            BranchDefinition::new(case_type.as_str(), case_type.label(), fields)
        })
        .collect();

    FormSchema::new(
        EntityKind::Patient,
        vec![
            text("firstName", "First Name").required(),
            text("lastName", "Last Name"),
            FieldDefinition::new(
                "gender",
                "Gender",
                FieldKind::choice(&["male", "female", "other"]),
            )
            .required(),
            date("dob", "Date of Birth").required(),
            number("age", "Age").required(),
            text("bloodGroup", "Blood Group"),
            text("phone", "Phone").required(),
            text("altPhone", "Alt Phone"),
            text("email", "Email"),
            text("address.line1", "Address Line 1").required(),
            text("address.line2", "Address Line 2"),
            text("address.city", "City").required(),
            text("address.state", "State").required(),
            text("address.zip", "ZIP").required(),
            text("address.country", "Country").required(),
            number("vitals.height", "Height (cm)"),
            number("vitals.weight", "Weight (kg)"),
            number("vitals.temperature", "Temperature"),
            text("vitals.bloodPressure", "Blood Pressure"),
            number("vitals.pulse", "Pulse"),
            number("vitals.spo2", "SpO2 (%)"),
            FieldDefinition::new("caseType", "Case Type", FieldKind::choice(&case_types))
                .required(),
        ],
    )
    .with_discriminant(DiscriminantDefinition::new("caseType", branches))
    .with_derived(DerivedRule::AgeFromDate {
        source: "dob".to_owned(),
        target: "age".to_owned(),
    })
}

fn recipient_schema() -> FormSchema {
    FormSchema::new(
        EntityKind::Recipient,
        vec![
            text("name", "Name").required(),
            text("email", "Email").required(),
            text("phone", "Phone").required(),
            FieldDefinition::new("gender", "Gender", FieldKind::choice(&["male", "female"]))
                .required(),
            number("age", "Age").required(),
            FieldDefinition::new("status", "Status", FieldKind::choice(&["active", "inactive"]))
                .required()
                .with_default(FieldValue::Text("active".to_owned())),
            number("salary", "Salary").required(),
            FieldDefinition::new("shift", "Shift", FieldKind::choice(&["day", "night"]))
                .required(),
            text("time", "Time").required(),
            text("address", "Address").required(),
            text("emergencyContact", "Emergency Contact").required(),
            text("aadharNumber", "Aadhar Number").required(),
            text("panNumber", "PAN Number").required(),
            text("note", "Note"),
        ],
    )
}

fn bed_schema() -> FormSchema {
    let location_types = BedLocationType::all()
        .iter()
        .map(BedLocationType::as_str)
        .collect::<Vec<_>>();

    let branches = BedLocationType::all()
        .iter()
        .map(|location| {
            let label = match location {
                BedLocationType::Room => "Room",
                BedLocationType::Ward => "Ward",
            };
            BranchDefinition::new(
                location.as_str(),
                label,
                vec![reference(location.reference_field(), label).required()],
            )
        })
        .collect();

    let candidates = BedLocationType::all()
        .iter()
        .map(|location| {
            (
                location.reference_field().to_owned(),
                location.as_str().to_owned(),
            )
        })
        .collect();

    FormSchema::new(
        EntityKind::Bed,
        vec![
            text("bedNumber", "Bed Number").required(),
            text("bedType", "Bed Type").required(),
            reference("floor", "Floor").required(),
            FieldDefinition::new(
                "bedLocationType",
                "Location Type",
                FieldKind::choice(&location_types),
            )
            .required(),
            flag("isOccupied", "Occupied", false).required(),
            active_flag().required(),
            text("notes", "Notes"),
        ],
    )
    .with_discriminant(DiscriminantDefinition::new("bedLocationType", branches))
    .with_derived(DerivedRule::BranchFromPresence { candidates })
}

fn text(path: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(path, label, FieldKind::Text)
}

fn number(path: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(path, label, FieldKind::Number)
}

fn date(path: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(path, label, FieldKind::Date)
}

fn reference(path: &str, label: &str) -> FieldDefinition {
    FieldDefinition::new(path, label, FieldKind::Reference)
}

fn flag(path: &str, label: &str, default: bool) -> FieldDefinition {
    FieldDefinition::new(path, label, FieldKind::Boolean).with_default(FieldValue::Bool(default))
}

fn active_flag() -> FieldDefinition {
    flag("isActive", "Active", true)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{BedLocationType, PatientCaseType};
    use crate::{EntityKind, FieldKind, FormSchema};

    #[test]
    fn every_entity_has_a_form() {
        for entity in EntityKind::all() {
            let schema = FormSchema::for_entity(*entity);
            assert_eq!(schema.entity(), *entity);
            assert!(schema.base_fields().iter().any(|field| field.is_required()));
        }
    }

    #[test]
    fn patient_branches_follow_case_types() {
        let schema = FormSchema::for_entity(EntityKind::Patient);
        let Some(discriminant) = schema.discriminant() else {
            unreachable!();
        };

        let keys = discriminant
            .branches()
            .iter()
            .map(|branch| branch.key())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["opd", "ipd", "emergency"]);

        let required_ipd = schema
            .active_fields(Some("ipd"))
            .filter(|field| field.path().starts_with("ipd.") && field.is_required())
            .map(|field| field.path())
            .collect::<Vec<_>>();
        assert_eq!(required_ipd, vec!["ipd.doctor", "ipd.ward"]);
    }

    #[test]
    fn bed_location_selects_room_or_ward_reference() {
        let schema = FormSchema::for_entity(EntityKind::Bed);
        assert!(schema.is_discriminant("bedLocationType"));
        assert_eq!(
            schema.field("ward").map(|field| field.kind()),
            Some(&FieldKind::Reference)
        );
        assert!(schema.active_fields(Some("ROOM")).all(|field| field.path() != "ward"));
    }

    #[test]
    fn typed_discriminants_parse_case_insensitively() {
        assert_eq!(PatientCaseType::from_str("IPD").ok(), Some(PatientCaseType::Ipd));
        assert_eq!(BedLocationType::from_str("ward").ok(), Some(BedLocationType::Ward));
        assert!(BedLocationType::from_str("corridor").is_err());
    }
}

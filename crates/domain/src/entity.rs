use std::fmt::{Display, Formatter};
use std::str::FromStr;

use frontdesk_core::{AppError, UserRole};
use serde::{Deserialize, Serialize};

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];
const ADMIN_OR_ACCOUNTANT: &[UserRole] = &[UserRole::Admin, UserRole::Accountant];

/// Record collections administered from the front desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Doctor onboarding records.
    Doctor,
    /// Registered patients.
    Patient,
    /// Front-desk staff.
    Recipient,
    /// Hospital floors.
    Floor,
    /// Wards on a floor.
    Ward,
    /// Rooms on a floor.
    Room,
    /// Beds placed in a room or a ward.
    Bed,
    /// Laboratory test catalogue.
    LabTest,
    /// Billing charge codes.
    ChargeMaster,
    /// Patient appointments.
    Appointment,
    /// Billable hospital services.
    Service,
}

/// Query parameter convention a list endpoint understands for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortParamStyle {
    /// `orderBy=<field>&order=ASC|DESC`.
    OrderBy,
    /// `sortBy=<field>&sortOrder=asc|desc`.
    SortBy,
    /// `ordering=<field>` or `ordering=-<field>` for descending.
    Ordering,
}

/// Body encoding a collection expects for create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// JSON object body unless a file is attached.
    Json,
    /// Always `multipart/form-data`.
    Multipart,
}

/// Relative backend paths of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityEndpoints {
    /// Paginated list endpoint.
    pub list: &'static str,
    /// Item base path; the record id is appended for read and update.
    pub item: &'static str,
    /// Create endpoint.
    pub create: &'static str,
    /// Delete base path when it differs from `item`.
    pub delete: Option<&'static str>,
}

impl EntityEndpoints {
    /// Returns the path for reading or updating one record.
    #[must_use]
    pub fn item_path(&self, record_id: &str) -> String {
        format!("{}/{record_id}", self.item)
    }

    /// Returns the path for deleting one record.
    #[must_use]
    pub fn delete_path(&self, record_id: &str) -> String {
        format!("{}/{record_id}", self.delete.unwrap_or(self.item))
    }
}

impl EntityKind {
    /// Returns every entity kind.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EntityKind] = &[
            EntityKind::Doctor,
            EntityKind::Patient,
            EntityKind::Recipient,
            EntityKind::Floor,
            EntityKind::Ward,
            EntityKind::Room,
            EntityKind::Bed,
            EntityKind::LabTest,
            EntityKind::ChargeMaster,
            EntityKind::Appointment,
            EntityKind::Service,
        ];

        ALL
    }

    /// Returns the stable logical name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
            Self::Recipient => "recipient",
            Self::Floor => "floor",
            Self::Ward => "ward",
            Self::Room => "room",
            Self::Bed => "bed",
            Self::LabTest => "lab_test",
            Self::ChargeMaster => "charge_master",
            Self::Appointment => "appointment",
            Self::Service => "service",
        }
    }

    /// Returns the label used in messages and confirmations.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Doctor => "Doctor",
            Self::Patient => "Patient",
            Self::Recipient => "Recipient",
            Self::Floor => "Floor",
            Self::Ward => "Ward",
            Self::Room => "Room",
            Self::Bed => "Bed",
            Self::LabTest => "Lab Test",
            Self::ChargeMaster => "Charge Master",
            Self::Appointment => "Appointment",
            Self::Service => "Service",
        }
    }

    /// Returns the backend paths of this collection.
    #[must_use]
    pub fn endpoints(&self) -> EntityEndpoints {
        let (list, item, create, delete) = match self {
            Self::Doctor => (
                "api/doctors/doctors",
                "api/doctors/doctors",
                "api/doctors/create-doctor",
                None,
            ),
            Self::Patient => (
                "api/patients/patients",
                "api/patients/patients",
                "api/patients/patients",
                None,
            ),
            Self::Recipient => (
                "api/recipients/recipients",
                "api/recipients/recipients",
                "api/recipients/create-recipient",
                None,
            ),
            Self::Floor => ("api/floors", "api/floors", "api/create-floors", None),
            Self::Ward => ("api/wards", "api/wards", "api/create-ward", None),
            Self::Room => ("api/rooms", "api/rooms", "api/create-room", None),
            Self::Bed => (
                "api/all-bed",
                "api/beds",
                "api/create-bed",
                Some("api/delete-bed"),
            ),
            Self::LabTest => ("api/lab-tests", "api/lab-tests", "api/lab-tests", None),
            Self::ChargeMaster => (
                "api/charge-masters",
                "api/charge-masters",
                "api/charge-masters",
                None,
            ),
            Self::Appointment => (
                "api/appointments",
                "api/appointments",
                "api/appointments",
                None,
            ),
            Self::Service => ("api/services", "api/services", "api/services", None),
        };

        EntityEndpoints {
            list,
            item,
            create,
            delete,
        }
    }

    /// Returns the key the list endpoint nests its items under.
    #[must_use]
    pub fn list_key(&self) -> &'static str {
        match self {
            Self::Doctor => "doctors",
            Self::Patient => "patients",
            Self::Recipient => "recipients",
            Self::Floor => "floors",
            Self::Ward => "wards",
            Self::Room => "rooms",
            Self::Bed => "data",
            Self::LabTest => "labTests",
            Self::ChargeMaster => "charges",
            Self::Appointment => "appointments",
            Self::Service => "services",
        }
    }

    /// Returns the key single-record responses nest the record under.
    #[must_use]
    pub fn record_key(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Patient => "patient",
            Self::Recipient => "recipient",
            Self::Floor => "floor",
            Self::Ward => "ward",
            Self::Room => "room",
            Self::Bed => "bed",
            Self::LabTest => "labTest",
            Self::ChargeMaster => "charge",
            Self::Appointment => "appointment",
            Self::Service => "service",
        }
    }

    /// Returns the sort parameter convention of the list endpoint.
    #[must_use]
    pub fn sort_param_style(&self) -> SortParamStyle {
        match self {
            Self::Bed => SortParamStyle::SortBy,
            Self::LabTest | Self::ChargeMaster => SortParamStyle::Ordering,
            _ => SortParamStyle::OrderBy,
        }
    }

    /// Returns the page size a list screen starts with.
    #[must_use]
    pub fn default_page_size(&self) -> u32 {
        match self {
            Self::Doctor | Self::Recipient => 12,
            Self::LabTest | Self::ChargeMaster => 20,
            _ => 10,
        }
    }

    /// Returns the body encoding for create and update.
    #[must_use]
    pub fn body_encoding(&self) -> BodyEncoding {
        match self {
            Self::Doctor | Self::Patient => BodyEncoding::Multipart,
            _ => BodyEncoding::Json,
        }
    }

    /// Returns the roles allowed to create or update records.
    #[must_use]
    pub fn write_roles(&self) -> &'static [UserRole] {
        match self {
            Self::ChargeMaster => ADMIN_OR_ACCOUNTANT,
            _ => ADMIN_ONLY,
        }
    }

    /// Returns the roles allowed to delete records.
    #[must_use]
    pub fn delete_roles(&self) -> &'static [UserRole] {
        ADMIN_ONLY
    }

    /// Returns whether mutations carry `createdBy` / `updatedBy` user stamps.
    #[must_use]
    pub fn stamps_actor(&self) -> bool {
        matches!(self, Self::LabTest | Self::ChargeMaster)
    }
}

impl Display for EntityKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "doctor" | "doctors" => Ok(Self::Doctor),
            "patient" | "patients" => Ok(Self::Patient),
            "recipient" | "recipients" => Ok(Self::Recipient),
            "floor" | "floors" => Ok(Self::Floor),
            "ward" | "wards" => Ok(Self::Ward),
            "room" | "rooms" => Ok(Self::Room),
            "bed" | "beds" => Ok(Self::Bed),
            "lab_test" | "lab_tests" => Ok(Self::LabTest),
            "charge_master" | "charge_masters" | "charge" | "charges" => Ok(Self::ChargeMaster),
            "appointment" | "appointments" => Ok(Self::Appointment),
            "service" | "services" => Ok(Self::Service),
            _ => Err(AppError::Validation(format!(
                "unknown entity kind '{value}'"
            ))),
        }
    }
}

use super::{Choice, Polygon, SiteSubtype};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChargeType {
    #[default]
    Free,
    FlatRate,
    PerHour,
}

impl Choice for ChargeType {
    const ALL: &'static [Self] = &[ChargeType::Free, ChargeType::FlatRate, ChargeType::PerHour];

    fn label(self) -> &'static str {
        match self {
            ChargeType::Free => "Free",
            ChargeType::FlatRate => "Flat rate",
            ChargeType::PerHour => "Per hour",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermitType {
    #[default]
    NoPermitNeeded,
    ResidentPermit,
    DisabledPermit,
    EmployeePermit,
}

impl Choice for PermitType {
    const ALL: &'static [Self] = &[
        PermitType::NoPermitNeeded,
        PermitType::ResidentPermit,
        PermitType::DisabledPermit,
        PermitType::EmployeePermit,
    ];

    fn label(self) -> &'static str {
        match self {
            PermitType::NoPermitNeeded => "No permit",
            PermitType::ResidentPermit => "Resident",
            PermitType::DisabledPermit => "Disabled",
            PermitType::EmployeePermit => "Employee",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VehicleType {
    #[default]
    Car,
    Motorcycle,
    Van,
    Truck,
    Bicycle,
}

impl Choice for VehicleType {
    const ALL: &'static [Self] = &[
        VehicleType::Car,
        VehicleType::Motorcycle,
        VehicleType::Van,
        VehicleType::Truck,
        VehicleType::Bicycle,
    ];

    fn label(self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Motorcycle => "Motorcycle",
            VehicleType::Van => "Van",
            VehicleType::Truck => "Truck",
            VehicleType::Bicycle => "Bicycle",
        }
    }
}

/// A sub-area of a site sharing billing and permit rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub ref_parking_site: String,
    pub location: Polygon,
    pub category: SiteSubtype,
    #[serde(default)]
    pub charge_type: ChargeType,
    #[serde(default)]
    pub permit_type: PermitType,
    #[serde(default)]
    pub allowed_vehicle_type: VehicleType,
    /// Minutes.
    #[serde(default)]
    pub maximum_parking_duration: Option<u32>,
    /// Metres.
    #[serde(default)]
    pub max_height: Option<f64>,
    #[serde(default)]
    pub max_width: Option<f64>,
    #[serde(default)]
    pub total_spot_number: u32,
    #[serde(default)]
    pub available_spot_number: u32,
}

//! Tag naming scheme: `<base>/<entity>/<field>`.
//!
//! Relative paths are grouped per entity below. [`TagPaths`] prefixes them
//! with the configured base path.

use super::TagValue;

/// Resolves relative tag paths against a base path.
///
/// # Examples
///
/// ```
/// use plant_sim::tags::TagPaths;
///
/// let paths = TagPaths::new("Plant/");
/// assert_eq!(paths.resolve("Shift_Data/Current_Shift"), "Plant/Shift_Data/Current_Shift");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPaths {
    base: String,
}

impl TagPaths {
    /// Creates a resolver. Leading and trailing `/` on `base` are ignored.
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Full path of a single relative tag.
    pub fn resolve(&self, relative: &str) -> String {
        if self.base.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", self.base, relative)
        }
    }

    /// Full paths of a group of relative tags, order preserved.
    pub fn resolve_all(&self, relatives: &[&str]) -> Vec<String> {
        relatives.iter().map(|r| self.resolve(r)).collect()
    }
}

pub mod solar {
    pub const POWER_KW: &str = "Energy_Sources/Solar_Panel/Power_kW";
    pub const VOLTAGE_V: &str = "Energy_Sources/Solar_Panel/Voltage_V";
    pub const CURRENT_A: &str = "Energy_Sources/Solar_Panel/Current_A";
    pub const IRRADIANCE_WM2: &str = "Energy_Sources/Solar_Panel/Irradiance_Wm2";
    pub const PANEL_TEMP_C: &str = "Energy_Sources/Solar_Panel/PanelTemp_C";
    pub const EFFICIENCY_PCT: &str = "Energy_Sources/Solar_Panel/Efficiency_Percent";
    pub const ENERGY_KWH: &str = "Energy_Sources/Solar_Panel/Energy_kWh";
}

pub mod generator {
    pub const POWER_KW: &str = "Energy_Sources/DG_Set/Power_kW";
    pub const VOLTAGE_V: &str = "Energy_Sources/DG_Set/Voltage_V";
    pub const CURRENT_A: &str = "Energy_Sources/DG_Set/Current_A";
    pub const RUNNING: &str = "Energy_Sources/DG_Set/Running_Status";
    pub const FUEL_LEVEL_PCT: &str = "Energy_Sources/DG_Set/FuelLevel_Percent";
    pub const RUN_HOURS: &str = "Energy_Sources/DG_Set/RunHours";
    pub const RPM: &str = "Energy_Sources/DG_Set/RPM";
    pub const ENGINE_TEMP_C: &str = "Energy_Sources/DG_Set/EngineTemp_C";
    pub const ENERGY_KWH: &str = "Energy_Sources/DG_Set/Energy_kWh";
}

pub mod grid {
    pub const POWER_KW: &str = "Energy_Sources/Main_Line/Power_kW";
    pub const VOLTAGE_V: &str = "Energy_Sources/Main_Line/Voltage_V";
    pub const CURRENT_A: &str = "Energy_Sources/Main_Line/Current_A";
    pub const POWER_FACTOR: &str = "Energy_Sources/Main_Line/PowerFactor";
    pub const FREQUENCY_HZ: &str = "Energy_Sources/Main_Line/Frequency_Hz";
    pub const ENERGY_KWH: &str = "Energy_Sources/Main_Line/Energy_kWh";
}

pub mod totals {
    pub const GRID_PLUS_SOLAR_KW: &str = "Energy_Sources/Grid_Plus_Solar_kW";
    pub const TOTAL_POWER_KW: &str = "Energy_Sources/Total_Power_kW";
}

pub mod line_a {
    pub const RUNNING: &str = "Filling_Line/Running_Status";
    pub const POWER_KW: &str = "Filling_Line/Power_kW";
    pub const SPEED_BPM: &str = "Filling_Line/Production_Speed_BPM";
    pub const BOTTLES_PRODUCED: &str = "Filling_Line/Bottles_Produced";
    pub const EFFICIENCY_PCT: &str = "Filling_Line/Efficiency_Percent";
    pub const ENERGY_KWH: &str = "Filling_Line/Energy_kWh";
    pub const ENERGY_PER_BOTTLE_WH: &str = "Filling_Line/Energy_Per_Bottle_Wh";
    pub const ALARM: &str = "Filling_Line/Alarm_Status";
}

pub mod line_b {
    pub const RUNNING: &str = "Packaging_Line/Running_Status";
    pub const POWER_KW: &str = "Packaging_Line/Power_kW";
    pub const SPEED_CPM: &str = "Packaging_Line/Speed_CPM";
    pub const CASES_PACKED: &str = "Packaging_Line/Cases_Packed";
    pub const EFFICIENCY_PCT: &str = "Packaging_Line/Efficiency_Percent";
    pub const ENERGY_KWH: &str = "Packaging_Line/Energy_kWh";
}

pub mod compressor {
    pub const RUNNING: &str = "Utilities/Compressor/Running_Status";
    pub const POWER_KW: &str = "Utilities/Compressor/Power_kW";
    pub const PRESSURE_BAR: &str = "Utilities/Compressor/Pressure_Bar";
    pub const EFFICIENCY_PCT: &str = "Utilities/Compressor/Efficiency_Percent";
    pub const MOTOR_TEMP_C: &str = "Utilities/Compressor/Motor_Temperature_C";
}

pub mod climate {
    pub const RUNNING: &str = "Utilities/Air_Conditioning/Running_Status";
    pub const POWER_KW: &str = "Utilities/Air_Conditioning/Power_kW";
    pub const ROOM_TEMP_C: &str = "Utilities/Air_Conditioning/Room_Temperature_C";
    pub const SETPOINT_C: &str = "Utilities/Air_Conditioning/SetPoint_C";
    pub const EFFICIENCY_PCT: &str = "Utilities/Air_Conditioning/Efficiency_Percent";
    pub const RUNTIME_HOURS: &str = "Utilities/Air_Conditioning/Compressor_Runtime_Hours";
    pub const ENERGY_KWH: &str = "Utilities/Air_Conditioning/Energy_kWh";
}

pub mod cold_storage {
    pub const RUNNING: &str = "Utilities/Refrigeration/Running_Status";
    pub const POWER_KW: &str = "Utilities/Refrigeration/Power_kW";
    pub const TEMP_C: &str = "Utilities/Refrigeration/Cold_Room_Temperature_C";
    pub const SETPOINT_C: &str = "Utilities/Refrigeration/SetPoint_C";
    pub const PRESSURE_BAR: &str = "Utilities/Refrigeration/Compressor_Pressure_Bar";
    pub const EFFICIENCY_PCT: &str = "Utilities/Refrigeration/Efficiency_Percent";
    pub const DEFROST_ACTIVE: &str = "Utilities/Refrigeration/Defrost_Cycle_Active";
    pub const ENERGY_KWH: &str = "Utilities/Refrigeration/Energy_kWh";
}

pub mod shift {
    pub const CURRENT_SHIFT: &str = "Shift_Data/Current_Shift";
    pub const PREVIOUS_SHIFT_ENERGY_KWH: &str = "Shift_Data/Previous_Shift_Energy_kWh";
    pub const SHIFT_ENERGY_KWH: &str = "Shift_Data/Shift_Total_Energy_kWh";
    pub const SHIFT_TARGET_KWH: &str = "Shift_Data/Shift_Target_Energy_kWh";
    pub const SHIFT_START_TIME: &str = "Shift_Data/Shift_Start_Time";
}

/// Value type a tag is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Bool,
    Int,
    Float,
    Timestamp,
}

impl TagKind {
    /// Zero value used when seeding a fresh store.
    pub fn zero(self) -> TagValue {
        match self {
            TagKind::Bool => TagValue::Bool(false),
            TagKind::Int => TagValue::Int(0),
            TagKind::Float => TagValue::Float(0.0),
            TagKind::Timestamp => TagValue::Timestamp(Default::default()),
        }
    }
}

/// Every tag the engine reads or writes, with its value type.
pub const LAYOUT: &[(&str, TagKind)] = &[
    (solar::POWER_KW, TagKind::Float),
    (solar::VOLTAGE_V, TagKind::Float),
    (solar::CURRENT_A, TagKind::Float),
    (solar::IRRADIANCE_WM2, TagKind::Float),
    (solar::PANEL_TEMP_C, TagKind::Float),
    (solar::EFFICIENCY_PCT, TagKind::Float),
    (solar::ENERGY_KWH, TagKind::Float),
    (generator::POWER_KW, TagKind::Float),
    (generator::VOLTAGE_V, TagKind::Float),
    (generator::CURRENT_A, TagKind::Float),
    (generator::RUNNING, TagKind::Bool),
    (generator::FUEL_LEVEL_PCT, TagKind::Float),
    (generator::RUN_HOURS, TagKind::Float),
    (generator::RPM, TagKind::Int),
    (generator::ENGINE_TEMP_C, TagKind::Float),
    (generator::ENERGY_KWH, TagKind::Float),
    (grid::POWER_KW, TagKind::Float),
    (grid::VOLTAGE_V, TagKind::Float),
    (grid::CURRENT_A, TagKind::Float),
    (grid::POWER_FACTOR, TagKind::Float),
    (grid::FREQUENCY_HZ, TagKind::Float),
    (grid::ENERGY_KWH, TagKind::Float),
    (totals::GRID_PLUS_SOLAR_KW, TagKind::Float),
    (totals::TOTAL_POWER_KW, TagKind::Float),
    (line_a::RUNNING, TagKind::Bool),
    (line_a::POWER_KW, TagKind::Float),
    (line_a::SPEED_BPM, TagKind::Int),
    (line_a::BOTTLES_PRODUCED, TagKind::Int),
    (line_a::EFFICIENCY_PCT, TagKind::Float),
    (line_a::ENERGY_KWH, TagKind::Float),
    (line_a::ENERGY_PER_BOTTLE_WH, TagKind::Float),
    (line_a::ALARM, TagKind::Bool),
    (line_b::RUNNING, TagKind::Bool),
    (line_b::POWER_KW, TagKind::Float),
    (line_b::SPEED_CPM, TagKind::Int),
    (line_b::CASES_PACKED, TagKind::Int),
    (line_b::EFFICIENCY_PCT, TagKind::Float),
    (line_b::ENERGY_KWH, TagKind::Float),
    (compressor::RUNNING, TagKind::Bool),
    (compressor::POWER_KW, TagKind::Float),
    (compressor::PRESSURE_BAR, TagKind::Float),
    (compressor::EFFICIENCY_PCT, TagKind::Float),
    (compressor::MOTOR_TEMP_C, TagKind::Float),
    (climate::RUNNING, TagKind::Bool),
    (climate::POWER_KW, TagKind::Float),
    (climate::ROOM_TEMP_C, TagKind::Float),
    (climate::SETPOINT_C, TagKind::Float),
    (climate::EFFICIENCY_PCT, TagKind::Float),
    (climate::RUNTIME_HOURS, TagKind::Float),
    (climate::ENERGY_KWH, TagKind::Float),
    (cold_storage::RUNNING, TagKind::Bool),
    (cold_storage::POWER_KW, TagKind::Float),
    (cold_storage::TEMP_C, TagKind::Float),
    (cold_storage::SETPOINT_C, TagKind::Float),
    (cold_storage::PRESSURE_BAR, TagKind::Float),
    (cold_storage::EFFICIENCY_PCT, TagKind::Float),
    (cold_storage::DEFROST_ACTIVE, TagKind::Bool),
    (cold_storage::ENERGY_KWH, TagKind::Float),
    (shift::CURRENT_SHIFT, TagKind::Int),
    (shift::PREVIOUS_SHIFT_ENERGY_KWH, TagKind::Float),
    (shift::SHIFT_ENERGY_KWH, TagKind::Float),
    (shift::SHIFT_TARGET_KWH, TagKind::Float),
    (shift::SHIFT_START_TIME, TagKind::Timestamp),
];

/// Cumulative tags that may be pre-seeded from configuration.
pub const COUNTERS: &[&str] = &[
    solar::ENERGY_KWH,
    generator::ENERGY_KWH,
    generator::RUN_HOURS,
    grid::ENERGY_KWH,
    line_a::BOTTLES_PRODUCED,
    line_a::ENERGY_KWH,
    line_b::CASES_PACKED,
    line_b::ENERGY_KWH,
    climate::RUNTIME_HOURS,
    climate::ENERGY_KWH,
    cold_storage::ENERGY_KWH,
    shift::SHIFT_ENERGY_KWH,
    shift::PREVIOUS_SHIFT_ENERGY_KWH,
];

/// Looks up the value type of a relative tag path.
pub fn kind_of(relative: &str) -> Option<TagKind> {
    LAYOUT
        .iter()
        .find(|(path, _)| *path == relative)
        .map(|(_, kind)| *kind)
}

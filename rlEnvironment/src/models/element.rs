use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Line,
    Generator,
    Load,
    Bus,
    Substation,
    VoltageLevel,
    Transformer,
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LINE" => Ok(ElementType::Line),
            "GENERATOR" => Ok(ElementType::Generator),
            "LOAD" => Ok(ElementType::Load),
            "BUS" => Ok(ElementType::Bus),
            "SUBSTATION" => Ok(ElementType::Substation),
            "VOLTAGE_LEVEL" => Ok(ElementType::VoltageLevel),
            "TRANSFORMER" => Ok(ElementType::Transformer),
            _ => Err(format!("Unknown element type: {}", s)),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElementType::Line => write!(f, "LINE"),
            ElementType::Generator => write!(f, "GENERATOR"),
            ElementType::Load => write!(f, "LOAD"),
            ElementType::Bus => write!(f, "BUS"),
            ElementType::Substation => write!(f, "SUBSTATION"),
            ElementType::VoltageLevel => write!(f, "VOLTAGE_LEVEL"),
            ElementType::Transformer => write!(f, "TRANSFORMER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementStatus {
    On,
    Off,
    Outage,
    Maintenance,
}

impl ElementStatus {
    // Outage and maintenance both take the element out of service for a fixed duration
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ElementStatus::Outage | ElementStatus::Maintenance)
    }
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ElementStatus::On => write!(f, "ON"),
            ElementStatus::Off => write!(f, "OFF"),
            ElementStatus::Outage => write!(f, "OUTAGE"),
            ElementStatus::Maintenance => write!(f, "MAINTENANCE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchSide {
    One,
    Two,
    Three,
}

impl fmt::Display for BranchSide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BranchSide::One => write!(f, "ONE"),
            BranchSide::Two => write!(f, "TWO"),
            BranchSide::Three => write!(f, "THREE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintType {
    ApparentPower,
    ActivePower,
    Current,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConstraintType::ApparentPower => write!(f, "APPARENT_POWER"),
            ConstraintType::ActivePower => write!(f, "ACTIVE_POWER"),
            ConstraintType::Current => write!(f, "CURRENT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadFlowType {
    Ac,
    Dc,
}

/// A limit attached to one side of a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalConstraint {
    pub element_id: String,
    pub side: BranchSide,
    pub name: String,
    #[serde(rename = "type")]
    pub constraint_type: ConstraintType,
    pub value: f64,
    pub acceptable_duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchStatic {
    pub status: ElementStatus,
    pub voltage_level1_id: String,
    pub voltage_level2_id: String,
    pub bus1_id: String,
    pub bus2_id: String,
    #[serde(default)]
    pub b1: f64,
    #[serde(default)]
    pub b2: f64,
    #[serde(default)]
    pub g1: f64,
    #[serde(default)]
    pub g2: f64,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchSolved {
    pub p1: f64,
    pub q1: f64,
    pub i1: f64,
    pub p2: f64,
    pub q2: f64,
    pub i2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchAttributes {
    #[serde(rename = "static")]
    pub static_attrs: BranchStatic,
    #[serde(default)]
    pub solved: Option<BranchSolved>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorStatic {
    pub status: ElementStatus,
    pub voltage_level_id: String,
    pub bus_id: String,
    pub p_max: f64,
    pub p_min: f64,
    pub is_voltage_regulator: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorDynamic {
    pub target_p: f64,
    pub target_v: f64,
    #[serde(default)]
    pub target_q: Option<f64>,
    #[serde(default)]
    pub rated_s: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSolved {
    pub p: f64,
    pub q: f64,
    #[serde(default)]
    pub i: Option<f64>,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorAttributes {
    #[serde(rename = "static")]
    pub static_attrs: GeneratorStatic,
    #[serde(default)]
    pub dynamic: Option<GeneratorDynamic>,
    #[serde(default)]
    pub solved: Option<GeneratorSolved>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadStatic {
    pub voltage_level_id: String,
    pub bus_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadDynamic {
    pub pd: f64,
    pub qd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSolved {
    pub p: f64,
    pub q: f64,
    #[serde(default)]
    pub i: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadAttributes {
    #[serde(rename = "static")]
    pub static_attrs: LoadStatic,
    #[serde(default)]
    pub dynamic: Option<LoadDynamic>,
    #[serde(default)]
    pub solved: Option<LoadSolved>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusAttributes {
    pub voltage_level_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstationAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub tso: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageLevelAttributes {
    pub substation_id: String,
    pub nominal_v: f64,
    #[serde(default)]
    pub low_voltage_limit: Option<f64>,
    #[serde(default)]
    pub high_voltage_limit: Option<f64>,
}

/// Per-type metadata. The variant doubles as the element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementAttributes {
    Line(BranchAttributes),
    Generator(GeneratorAttributes),
    Load(LoadAttributes),
    Bus(BusAttributes),
    Substation(SubstationAttributes),
    VoltageLevel(VoltageLevelAttributes),
    Transformer(BranchAttributes),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: ElementAttributes,
    #[serde(default)]
    pub operational_constraints: Vec<OperationalConstraint>,
}

impl Element {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, metadata: ElementAttributes) -> Self {
        Self {
            id: id.into(),
            timestamp,
            metadata,
            operational_constraints: Vec::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<OperationalConstraint>) -> Self {
        self.operational_constraints = constraints;
        self
    }

    pub fn element_type(&self) -> ElementType {
        match &self.metadata {
            ElementAttributes::Line(_) => ElementType::Line,
            ElementAttributes::Generator(_) => ElementType::Generator,
            ElementAttributes::Load(_) => ElementType::Load,
            ElementAttributes::Bus(_) => ElementType::Bus,
            ElementAttributes::Substation(_) => ElementType::Substation,
            ElementAttributes::VoltageLevel(_) => ElementType::VoltageLevel,
            ElementAttributes::Transformer(_) => ElementType::Transformer,
        }
    }

    /// Static status of switchable elements. Loads, buses, substations and
    /// voltage levels carry none.
    pub fn status(&self) -> Option<ElementStatus> {
        match &self.metadata {
            ElementAttributes::Line(attrs) | ElementAttributes::Transformer(attrs) => {
                Some(attrs.static_attrs.status)
            },
            ElementAttributes::Generator(attrs) => Some(attrs.static_attrs.status),
            _ => None,
        }
    }

    /// Returns false when the element type has no status to set.
    pub fn set_status(&mut self, status: ElementStatus) -> bool {
        match &mut self.metadata {
            ElementAttributes::Line(attrs) | ElementAttributes::Transformer(attrs) => {
                attrs.static_attrs.status = status;
                true
            },
            ElementAttributes::Generator(attrs) => {
                attrs.static_attrs.status = status;
                true
            },
            _ => false,
        }
    }

    pub fn is_solved(&self) -> bool {
        match &self.metadata {
            ElementAttributes::Line(attrs) | ElementAttributes::Transformer(attrs) => attrs.solved.is_some(),
            ElementAttributes::Generator(attrs) => attrs.solved.is_some(),
            ElementAttributes::Load(attrs) => attrs.solved.is_some(),
            _ => true,
        }
    }

    pub fn clear_solved(&mut self) {
        match &mut self.metadata {
            ElementAttributes::Line(attrs) | ElementAttributes::Transformer(attrs) => attrs.solved = None,
            ElementAttributes::Generator(attrs) => attrs.solved = None,
            ElementAttributes::Load(attrs) => attrs.solved = None,
            _ => {},
        }
    }

    pub fn has_dynamic_attributes(&self) -> bool {
        matches!(self.element_type(), ElementType::Generator | ElementType::Load)
    }

    /// Copies generator/load targets from `source`. Other types are left as they are.
    pub fn copy_dynamic_from(&mut self, source: &Element) {
        match (&mut self.metadata, &source.metadata) {
            (ElementAttributes::Generator(target), ElementAttributes::Generator(src)) => {
                target.dynamic = src.dynamic.clone();
            },
            (ElementAttributes::Load(target), ElementAttributes::Load(src)) => {
                target.dynamic = src.dynamic.clone();
            },
            _ => {},
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GridError;
use crate::models::element::{
    BranchSide, ConstraintType, Element, ElementAttributes, ElementStatus, ElementType,
};
use crate::observation::one_hot_map::OneHotMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintObservation {
    pub affected_element: String,
    pub side: BranchSide,
    pub constraint_type: ConstraintType,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineObservation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub status: ElementStatus,
    pub bus1_id: String,
    pub bus2_id: String,
    pub voltage_level1_id: String,
    pub voltage_level2_id: String,
    pub b1: f64,
    pub b2: f64,
    pub g1: f64,
    pub g2: f64,
    pub r: f64,
    pub x: f64,
    pub p1: f64,
    pub p2: f64,
    pub operational_constraints: Vec<ConstraintObservation>,
    pub outage_probability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadObservation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub bus_id: String,
    pub voltage_level_id: String,
    pub pd: f64,
    pub active_power: f64,
    pub reactive_power: f64,
}

impl LoadObservation {
    /// Demand the network failed to serve.
    pub fn uncovered_load(&self) -> f64 {
        if self.pd > self.active_power {
            self.pd - self.active_power
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorObservation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub status: ElementStatus,
    pub bus_id: String,
    pub voltage_level_id: String,
    pub target_p: f64,
    pub active_power: f64,
    pub reactive_power: f64,
}

/// What the agent sees of a single element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementObservation {
    Line(LineObservation),
    Load(LoadObservation),
    Generator(GeneratorObservation),
}

// Solvers report NaN for disconnected injections
fn finite_or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

impl ElementObservation {
    /// `Ok(None)` for element types the agent does not observe.
    pub fn from_element(element: &Element, outage_probability: Option<f64>) -> Result<Option<Self>, GridError> {
        let observation = match &element.metadata {
            ElementAttributes::Line(attrs) => {
                let s = &attrs.static_attrs;
                // Unsolved lines are observed with zero flow
                let (p1, p2) = attrs.solved.as_ref().map(|v| (v.p1, v.p2)).unwrap_or((0.0, 0.0));
                ElementObservation::Line(LineObservation {
                    id: element.id.clone(),
                    timestamp: element.timestamp,
                    status: s.status,
                    bus1_id: s.bus1_id.clone(),
                    bus2_id: s.bus2_id.clone(),
                    voltage_level1_id: s.voltage_level1_id.clone(),
                    voltage_level2_id: s.voltage_level2_id.clone(),
                    b1: s.b1,
                    b2: s.b2,
                    g1: s.g1,
                    g2: s.g2,
                    r: s.r,
                    x: s.x,
                    p1: finite_or_zero(p1),
                    p2: finite_or_zero(p2),
                    operational_constraints: element
                        .operational_constraints
                        .iter()
                        .map(|c| ConstraintObservation {
                            affected_element: c.element_id.clone(),
                            side: c.side,
                            constraint_type: c.constraint_type,
                            value: c.value,
                        })
                        .collect(),
                    outage_probability,
                })
            },
            ElementAttributes::Load(attrs) => {
                let solved = attrs.solved.as_ref().ok_or_else(|| GridError::UnsolvedElement(element.id.clone()))?;
                ElementObservation::Load(LoadObservation {
                    id: element.id.clone(),
                    timestamp: element.timestamp,
                    bus_id: attrs.static_attrs.bus_id.clone(),
                    voltage_level_id: attrs.static_attrs.voltage_level_id.clone(),
                    pd: attrs.dynamic.as_ref().map(|d| d.pd).unwrap_or(0.0),
                    active_power: finite_or_zero(solved.p),
                    reactive_power: finite_or_zero(solved.q),
                })
            },
            ElementAttributes::Generator(attrs) => {
                let solved = attrs.solved.as_ref().ok_or_else(|| GridError::UnsolvedElement(element.id.clone()))?;
                ElementObservation::Generator(GeneratorObservation {
                    id: element.id.clone(),
                    timestamp: element.timestamp,
                    status: attrs.static_attrs.status,
                    bus_id: attrs.static_attrs.bus_id.clone(),
                    voltage_level_id: attrs.static_attrs.voltage_level_id.clone(),
                    target_p: attrs.dynamic.as_ref().map(|d| d.target_p).unwrap_or(0.0),
                    active_power: finite_or_zero(solved.p),
                    reactive_power: finite_or_zero(solved.q),
                })
            },
            _ => return Ok(None),
        };
        Ok(Some(observation))
    }

    pub fn id(&self) -> &str {
        match self {
            ElementObservation::Line(o) => &o.id,
            ElementObservation::Load(o) => &o.id,
            ElementObservation::Generator(o) => &o.id,
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ElementObservation::Line(_) => ElementType::Line,
            ElementObservation::Load(_) => ElementType::Load,
            ElementObservation::Generator(_) => ElementType::Generator,
        }
    }

    /// Loads have no status of their own and are reported ON.
    pub fn status(&self) -> ElementStatus {
        match self {
            ElementObservation::Line(o) => o.status,
            ElementObservation::Load(_) => ElementStatus::On,
            ElementObservation::Generator(o) => o.status,
        }
    }

    pub fn bus_ids(&self) -> Vec<&str> {
        match self {
            ElementObservation::Line(o) => vec![o.bus1_id.as_str(), o.bus2_id.as_str()],
            ElementObservation::Load(o) => vec![o.bus_id.as_str()],
            ElementObservation::Generator(o) => vec![o.bus_id.as_str()],
        }
    }

    pub fn voltage_level_ids(&self) -> Vec<&str> {
        match self {
            ElementObservation::Line(o) => vec![o.voltage_level1_id.as_str(), o.voltage_level2_id.as_str()],
            ElementObservation::Load(o) => vec![o.voltage_level_id.as_str()],
            ElementObservation::Generator(o) => vec![o.voltage_level_id.as_str()],
        }
    }

    pub fn operational_constraints(&self) -> &[ConstraintObservation] {
        match self {
            ElementObservation::Line(o) => &o.operational_constraints,
            _ => &[],
        }
    }

    /// Flat feature vector: one-hot categoricals followed by numeric values.
    pub fn to_array(&self, map: &OneHotMap) -> Result<Vec<f64>, GridError> {
        let mut out = Vec::new();
        map.types.encode_into(&self.element_type(), &mut out)?;
        match self {
            ElementObservation::Line(o) => {
                map.statuses.encode_into(&o.status, &mut out)?;
                map.buses.encode_into(&o.bus1_id, &mut out)?;
                map.buses.encode_into(&o.bus2_id, &mut out)?;
                map.voltage_levels.encode_into(&o.voltage_level1_id, &mut out)?;
                map.voltage_levels.encode_into(&o.voltage_level2_id, &mut out)?;
                out.extend([o.p1, o.p2]);
                for c in &o.operational_constraints {
                    map.constraint_sides.encode_into(&c.side, &mut out)?;
                }
                for c in &o.operational_constraints {
                    map.constraint_types.encode_into(&c.constraint_type, &mut out)?;
                }
                for c in &o.operational_constraints {
                    map.affected_elements.encode_into(&c.affected_element, &mut out)?;
                }
                out.extend(o.operational_constraints.iter().map(|c| c.value));
            },
            ElementObservation::Load(o) => {
                map.buses.encode_into(&o.bus_id, &mut out)?;
                map.voltage_levels.encode_into(&o.voltage_level_id, &mut out)?;
                map.statuses.encode_into(&ElementStatus::On, &mut out)?;
                out.extend([o.pd, o.active_power, o.reactive_power]);
            },
            ElementObservation::Generator(o) => {
                map.buses.encode_into(&o.bus_id, &mut out)?;
                map.voltage_levels.encode_into(&o.voltage_level_id, &mut out)?;
                map.statuses.encode_into(&o.status, &mut out)?;
                out.extend([o.target_p, o.active_power, o.reactive_power]);
            },
        }
        Ok(out)
    }
}

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use gridrl::config::environment_config::{ElementLifecycleConfig, EnvironmentConfig, LifecycleConfig};
use gridrl::models::element::{
    BranchAttributes, BranchSide, BranchStatic, BusAttributes, ConstraintType, Element, ElementAttributes,
    ElementStatus, GeneratorAttributes, GeneratorDynamic, GeneratorStatic, LoadAttributes, LoadDynamic, LoadStatic,
    OperationalConstraint,
};
use gridrl::models::network::Network;

pub const NETWORK_ID: &str = "two-bus";

pub fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
}

pub fn bus(id: &str, hour: u32) -> Element {
    Element::new(id, ts(hour), ElementAttributes::Bus(BusAttributes { voltage_level_id: "VL1".to_string() }))
}

pub fn line(id: &str, status: ElementStatus, hour: u32) -> Element {
    Element::new(
        id,
        ts(hour),
        ElementAttributes::Line(BranchAttributes {
            static_attrs: BranchStatic {
                status,
                voltage_level1_id: "VL1".to_string(),
                voltage_level2_id: "VL1".to_string(),
                bus1_id: "B1".to_string(),
                bus2_id: "B2".to_string(),
                b1: 0.0,
                b2: 0.0,
                g1: 0.0,
                g2: 0.0,
                r: 0.01,
                x: 0.1,
                name: None,
            },
            solved: None,
        }),
    )
    .with_constraints(vec![OperationalConstraint {
        element_id: id.to_string(),
        side: BranchSide::Two,
        name: "permanent".to_string(),
        constraint_type: ConstraintType::ActivePower,
        value: 100.0,
        acceptable_duration: -1,
    }])
}

pub fn generator(id: &str, target_p: f64, hour: u32) -> Element {
    Element::new(
        id,
        ts(hour),
        ElementAttributes::Generator(GeneratorAttributes {
            static_attrs: GeneratorStatic {
                status: ElementStatus::On,
                voltage_level_id: "VL1".to_string(),
                bus_id: "B1".to_string(),
                p_max: 200.0,
                p_min: 0.0,
                is_voltage_regulator: true,
            },
            dynamic: Some(GeneratorDynamic { target_p, target_v: 1.0, target_q: None, rated_s: None }),
            solved: None,
        }),
    )
}

pub fn load(id: &str, pd: f64, hour: u32) -> Element {
    Element::new(
        id,
        ts(hour),
        ElementAttributes::Load(LoadAttributes {
            static_attrs: LoadStatic { voltage_level_id: "VL1".to_string(), bus_id: "B2".to_string(), name: None },
            dynamic: Some(LoadDynamic { pd, qd: 0.0 }),
            solved: None,
        }),
    )
}

/// Demand at each hour, so snapshots are distinguishable.
pub fn demand(hour: u32) -> f64 {
    40.0 + hour as f64
}

/// Two buses joined by two lines, one generator and one load, repeated
/// over `hours` timestamps.
pub fn network(hours: u32) -> Network {
    let mut elements = Vec::new();
    for hour in 0..hours {
        elements.push(bus("B1", hour));
        elements.push(bus("B2", hour));
        elements.push(line("L1", ElementStatus::On, hour));
        elements.push(line("L2", ElementStatus::On, hour));
        elements.push(generator("G1", 150.0, hour));
        elements.push(load("D1", demand(hour), hour));
    }
    Network::new(NETWORK_ID, elements).unwrap()
}

/// Config whose lines never fail.
pub fn config() -> EnvironmentConfig {
    EnvironmentConfig {
        network_id: NETWORK_ID.to_string(),
        lifecycle: LifecycleConfig {
            defaults: ElementLifecycleConfig { lambda_factor: 0.0, ..ElementLifecycleConfig::default() },
            ..LifecycleConfig::default()
        },
        ..EnvironmentConfig::default()
    }
}

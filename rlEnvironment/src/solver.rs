// Stand-in load-flow solver for demos and tests
use tracing::debug;

use crate::error::GridError;
use crate::models::element::{
    BranchSolved, ElementAttributes, ElementStatus, GeneratorSolved, LoadFlowType, LoadSolved,
};
use crate::models::network::Network;
use crate::utils::logging::{self, OperationCategory};
use crate::utils::traits::LoadFlowSolver;

/// Copper-plate balance: ON generators dispatch their target, demand is
/// curtailed proportionally when generation falls short, and the served
/// power is spread evenly over the ON lines. With no ON line nothing is served.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopperPlateSolver;

impl LoadFlowSolver for CopperPlateSolver {
    fn solve(&self, network: &Network, loadflow_type: LoadFlowType) -> Result<Network, GridError> {
        let _timing = logging::start_timing("CopperPlateSolver::solve", OperationCategory::LoadFlow);

        let mut generation = 0.0;
        let mut demand = 0.0;
        let mut lines_on = 0usize;
        for element in network.elements() {
            match &element.metadata {
                ElementAttributes::Generator(attrs) if attrs.static_attrs.status == ElementStatus::On => {
                    generation += attrs.dynamic.as_ref().map(|d| d.target_p).unwrap_or(0.0);
                },
                ElementAttributes::Load(attrs) => {
                    demand += attrs.dynamic.as_ref().map(|d| d.pd).unwrap_or(0.0);
                },
                ElementAttributes::Line(attrs) if attrs.static_attrs.status == ElementStatus::On => {
                    lines_on += 1;
                },
                _ => {},
            }
        }

        let served_ratio = if lines_on == 0 {
            0.0
        } else if demand <= 0.0 {
            1.0
        } else {
            (generation / demand).min(1.0)
        };
        let served = demand * served_ratio;
        let per_line = if lines_on == 0 { 0.0 } else { served / lines_on as f64 };
        let with_reactive = loadflow_type == LoadFlowType::Ac;

        let mut solved = network.clone();
        for element in solved.elements_mut() {
            match &mut element.metadata {
                ElementAttributes::Generator(attrs) => {
                    let connected = attrs.static_attrs.status == ElementStatus::On;
                    let target = attrs.dynamic.as_ref().map(|d| d.target_p).unwrap_or(0.0);
                    // Dispatch scales down with curtailed demand
                    let p = if connected && generation > 0.0 { target * served / generation } else { 0.0 };
                    let q = if with_reactive && connected {
                        attrs.dynamic.as_ref().and_then(|d| d.target_q).unwrap_or(0.0)
                    } else {
                        0.0
                    };
                    attrs.solved = Some(GeneratorSolved { p, q, i: None, connected });
                },
                ElementAttributes::Load(attrs) => {
                    let (pd, qd) = attrs.dynamic.as_ref().map(|d| (d.pd, d.qd)).unwrap_or((0.0, 0.0));
                    attrs.solved = Some(LoadSolved {
                        p: pd * served_ratio,
                        q: if with_reactive { qd * served_ratio } else { 0.0 },
                        i: None,
                    });
                },
                ElementAttributes::Line(attrs) | ElementAttributes::Transformer(attrs) => {
                    let p = if attrs.static_attrs.status == ElementStatus::On { per_line } else { 0.0 };
                    attrs.solved = Some(BranchSolved { p1: p, q1: 0.0, i1: 0.0, p2: -p, q2: 0.0, i2: 0.0 });
                },
                _ => {},
            }
        }

        debug!(network_id = %network.id, generation, demand, served, lines_on, "copper plate solved");
        Ok(solved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::models::element::{
        BranchAttributes, BranchStatic, Element, GeneratorAttributes, GeneratorDynamic, GeneratorStatic,
        LoadAttributes, LoadDynamic, LoadStatic,
    };

    fn line(id: &str, status: ElementStatus) -> Element {
        Element::new(
            id,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
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
                    r: 0.1,
                    x: 0.1,
                    name: None,
                },
                solved: None,
            }),
        )
    }

    fn generator(target_p: f64) -> Element {
        Element::new(
            "G1",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
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

    fn load(pd: f64) -> Element {
        Element::new(
            "D1",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ElementAttributes::Load(LoadAttributes {
                static_attrs: LoadStatic { voltage_level_id: "VL1".to_string(), bus_id: "B2".to_string(), name: None },
                dynamic: Some(LoadDynamic { pd, qd: 0.0 }),
                solved: None,
            }),
        )
    }

    fn load_p(network: &Network) -> f64 {
        match &network.get_element("D1").unwrap().metadata {
            ElementAttributes::Load(attrs) => attrs.solved.as_ref().unwrap().p,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_curtails_demand_when_generation_short() {
        let network = Network::new("grid", vec![generator(50.0), load(100.0), line("L1", ElementStatus::On)]).unwrap();
        let solved = CopperPlateSolver.solve(&network, LoadFlowType::Dc).unwrap();
        assert_eq!(load_p(&solved), 50.0);
        assert!(solved.elements().iter().all(|e| e.is_solved()));
    }

    #[test]
    fn test_nothing_served_without_lines() {
        let network = Network::new("grid", vec![generator(150.0), load(100.0), line("L1", ElementStatus::Off)]).unwrap();
        let solved = CopperPlateSolver.solve(&network, LoadFlowType::Ac).unwrap();
        assert_eq!(load_p(&solved), 0.0);
    }

    #[test]
    fn test_flow_split_over_on_lines() {
        let network = Network::new(
            "grid",
            vec![generator(150.0), load(100.0), line("L1", ElementStatus::On), line("L2", ElementStatus::On)],
        )
        .unwrap();
        let solved = CopperPlateSolver.solve(&network, LoadFlowType::Ac).unwrap();
        match &solved.get_element("L2").unwrap().metadata {
            ElementAttributes::Line(attrs) => assert_eq!(attrs.solved.as_ref().unwrap().p1, 50.0),
            _ => unreachable!(),
        }
    }
}

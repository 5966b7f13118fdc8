use std::collections::HashMap;
use tracing::debug;

use crate::ai::actions::grid_action::GridAction;
use crate::error::GridError;
use crate::lifecycle::LifecycleRegistry;
use crate::models::element::{Element, ElementStatus};
use crate::models::network::Network;
use crate::utils::logging::{self, OperationCategory};

/// Builds the next-timestamp network from the current network, the chosen
/// action and a template carrying the next timestamp's dynamic values.
///
/// Order is fixed: apply the action, step the registry once, then reconcile
/// managed elements with their handlers. `template` is only read.
pub fn build_next_network(
    current: &Network,
    template: &Network,
    action: &GridAction,
    registry: &mut LifecycleRegistry,
) -> Result<Network, GridError> {
    let _timing = logging::start_timing("build_next_network", OperationCategory::Transition);

    let next_timestamp = template
        .list_timestamps()
        .first()
        .copied()
        .ok_or_else(|| GridError::EmptyNetwork(template.id.clone()))?;

    let previous_status: HashMap<&str, Option<ElementStatus>> =
        current.elements().iter().map(|e| (e.id.as_str(), e.status())).collect();

    let mut candidate = action.execute(current).into_owned();
    candidate.id = template.id.clone();

    for element in candidate.elements_mut() {
        element.timestamp = next_timestamp;
        carry_over_template(element, template)?;
    }

    registry.step();

    for element in candidate.elements_mut() {
        let Some(handler) = registry.get_handler_mut(&element.id) else {
            continue;
        };
        let Some(status) = element.status() else {
            continue;
        };
        let previous = previous_status.get(element.id.as_str()).copied().flatten();

        if status == ElementStatus::Maintenance && previous != Some(ElementStatus::Maintenance) {
            // Maintenance started by this step's action
            handler.send_to_maintenance();
        } else if handler.status().is_unavailable() {
            // Sampled outage or ongoing maintenance wins over the action
        } else if previous != Some(status) {
            handler.sync_operational_status(status);
        }

        if handler.status() != status {
            debug!(
                element_id = %element.id,
                from = %status,
                to = %handler.status(),
                "element status reconciled with lifecycle"
            );
        }
        element.set_status(handler.status());
    }

    Ok(candidate)
}

fn carry_over_template(element: &mut Element, template: &Network) -> Result<(), GridError> {
    element.clear_solved();
    if !element.has_dynamic_attributes() {
        return Ok(());
    }
    let source = template
        .get_element(&element.id)
        .ok_or_else(|| GridError::MissingTemplateElement {
            element_id: element.id.clone(),
            timestamp: element.timestamp,
        })?;
    element.copy_dynamic_from(source);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use crate::config::constants::MAINTENANCE_DURATION;
    use crate::config::environment_config::{ElementLifecycleConfig, LifecycleConfig};
    use crate::lifecycle::Granularity;
    use crate::models::element::{
        BranchAttributes, BranchStatic, BranchSolved, ElementAttributes, LoadAttributes, LoadDynamic, LoadStatic,
    };

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn line(id: &str, status: ElementStatus, hour: u32) -> Element {
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
                    r: 0.1,
                    x: 0.1,
                    name: None,
                },
                solved: Some(BranchSolved { p1: 10.0, q1: 0.0, i1: 0.0, p2: -10.0, q2: 0.0, i2: 0.0 }),
            }),
        )
    }

    fn load(id: &str, pd: f64, hour: u32) -> Element {
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

    fn current() -> Network {
        Network::new("grid", vec![line("L1", ElementStatus::On, 0), line("L2", ElementStatus::On, 0), load("D1", 5.0, 0)])
            .unwrap()
    }

    fn template() -> Network {
        Network::new("grid", vec![line("L1", ElementStatus::On, 1), line("L2", ElementStatus::Off, 1), load("D1", 8.0, 1)])
            .unwrap()
    }

    fn registry(network: &Network, lambda_factor: f64, granularity: Granularity) -> LifecycleRegistry {
        let config = LifecycleConfig {
            defaults: ElementLifecycleConfig { lambda_factor, ..ElementLifecycleConfig::default() },
            ..LifecycleConfig::default()
        };
        LifecycleRegistry::from_network(network, &config, granularity).unwrap()
    }

    #[test]
    fn test_restamps_and_carries_dynamic_values() {
        let current = current();
        let template = template();
        let mut registry = registry(&current, 0.0, Granularity::Hour);
        let next = build_next_network(&current, &template, &GridAction::DoNothing, &mut registry).unwrap();

        assert!(next.elements().iter().all(|e| e.timestamp == ts(1)));
        // Status comes from the current network, not the template
        assert_eq!(next.get_element("L2").unwrap().status(), Some(ElementStatus::On));
        match &next.get_element("D1").unwrap().metadata {
            ElementAttributes::Load(attrs) => assert_eq!(attrs.dynamic.as_ref().map(|d| d.pd), Some(8.0)),
            other => panic!("unexpected metadata {:?}", other),
        }
        assert!(!next.get_element("L1").unwrap().is_solved());
    }

    #[test]
    fn test_template_is_not_mutated() {
        let current = current();
        let template = template();
        let before = template.clone();
        let mut registry = registry(&current, 0.0, Granularity::Hour);
        build_next_network(&current, &template, &GridAction::Switch("L1".to_string()), &mut registry).unwrap();
        assert_eq!(template, before);
    }

    #[test]
    fn test_missing_template_element_is_error() {
        let current = current();
        let template = Network::new("grid", vec![line("L1", ElementStatus::On, 1)]).unwrap();
        let mut registry = registry(&current, 0.0, Granularity::Hour);
        let result = build_next_network(&current, &template, &GridAction::DoNothing, &mut registry);
        assert!(matches!(result, Err(GridError::MissingTemplateElement { element_id, .. }) if element_id == "D1"));
    }

    #[test]
    fn test_maintenance_action_seeds_handler() {
        let current = current();
        let mut registry = registry(&current, 0.0, Granularity::Hour);
        let next = build_next_network(
            &current,
            &template(),
            &GridAction::StartMaintenance("L1".to_string()),
            &mut registry,
        )
        .unwrap();

        let handler = registry.get_handler("L1").unwrap();
        assert_eq!(handler.status(), ElementStatus::Maintenance);
        assert_eq!(handler.remaining_duration(), MAINTENANCE_DURATION);
        assert_eq!(next.get_element("L1").unwrap().status(), Some(ElementStatus::Maintenance));
    }

    #[test]
    fn test_switch_off_syncs_handler() {
        let current = current();
        let mut registry = registry(&current, 0.0, Granularity::Hour);
        let next =
            build_next_network(&current, &template(), &GridAction::Switch("L2".to_string()), &mut registry).unwrap();
        assert_eq!(next.get_element("L2").unwrap().status(), Some(ElementStatus::Off));
        assert_eq!(registry.get_handler("L2").unwrap().status(), ElementStatus::Off);
    }

    #[test]
    fn test_sampled_outage_overrides_switch() {
        let current = current();
        // Certain outage on the first weekly draw
        let mut registry = registry(&current, 1.0, Granularity::Week);
        let next =
            build_next_network(&current, &template(), &GridAction::Switch("L1".to_string()), &mut registry).unwrap();
        assert_eq!(next.get_element("L1").unwrap().status(), Some(ElementStatus::Outage));
        assert_eq!(next.get_element("L2").unwrap().status(), Some(ElementStatus::Outage));
    }

    #[test]
    fn test_sampled_outage_overrides_maintenance() {
        let current = current();
        let mut registry = registry(&current, 1.0, Granularity::Week);
        let action = GridAction::StartMaintenance("L1".to_string());
        let next = build_next_network(&current, &template(), &action, &mut registry).unwrap();

        assert_eq!(next.get_element("L1").unwrap().status(), Some(ElementStatus::Outage));
        let handler = registry.get_handler("L1").unwrap();
        assert_eq!(handler.status(), ElementStatus::Outage);
        assert!(handler.outage_type().is_some());
        assert!(handler.remaining_duration() >= 23);
    }

    #[test]
    fn test_maintenance_elapses_back_to_on() {
        let mut network = current();
        let mut registry = registry(&network, 0.0, Granularity::Hour);
        network = build_next_network(&network, &template(), &GridAction::StartMaintenance("L1".to_string()), &mut registry)
            .unwrap();
        for _ in 0..MAINTENANCE_DURATION {
            assert_eq!(network.get_element("L1").unwrap().status(), Some(ElementStatus::Maintenance));
            network = build_next_network(&network, &template(), &GridAction::DoNothing, &mut registry).unwrap();
        }
        assert_eq!(network.get_element("L1").unwrap().status(), Some(ElementStatus::On));
    }
}

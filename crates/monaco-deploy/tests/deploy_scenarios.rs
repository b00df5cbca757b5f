//! End-to-end deployment scenarios against in-memory tenants.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use monaco_client::settings::SettingsClient as _;

use common::{
    FakeTenant, FixedFactory, PanickingFactory, classic_config, manifest_with, oauth_environment,
    single_project, token_environment,
};
use monaco_core::config::{AutomationResource, Config, ConfigType};
use monaco_core::coordinate::Coordinate;
use monaco_core::parameter::Parameter;
use monaco_deploy::{DeployOutcome, DeploySettings, Error, deploy};

fn deploy_settings() -> DeploySettings {
    DeploySettings::default()
}

#[tokio::test]
async fn single_dependency_deploys_in_order_and_propagates_id() {
    let tenant = FakeTenant::new();
    let dashboard = classic_config("p", "dashboard", "board", "Main board", "dev");
    let mut profile = classic_config("p", "alerting-profile", "alerts", "On call", "dev");
    profile.parameters.insert(
        "dashId".to_string(),
        Parameter::reference(dashboard.coordinate.clone(), "id"),
    );
    profile.template = r#"{"name": "{{ .name }}", "dashboardId": "{{ .dashId }}"}"#.into();

    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![dashboard.clone(), profile.clone()]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;
    assert_eq!(summary.error_count(), 0, "{:?}", summary.reports);

    // Exactly two upserts, dashboard strictly before the profile.
    let mutating = tenant.log.mutating_records();
    assert_eq!(mutating.len(), 2);
    let dashboard_seq = tenant.log.first_sequence_containing("Main board").unwrap();
    let profile_seq = tenant.log.first_sequence_containing("On call").unwrap();
    assert!(dashboard_seq < profile_seq);

    // The profile's payload carries the dashboard's returned id.
    let report = &summary.reports[0];
    let dashboard_id = report.entities[&dashboard.coordinate].id().unwrap().to_string();
    let profile_payload = mutating
        .iter()
        .find(|r| r.target.contains("On call"))
        .and_then(|r| r.payload.clone())
        .expect("profile upsert carries a payload");
    assert!(profile_payload.contains(&dashboard_id));
}

#[tokio::test]
async fn cyclic_references_are_rejected_before_any_call() {
    let tenant = FakeTenant::new();
    let mut a = classic_config("p", "dashboard", "a", "A", "dev");
    let mut b = classic_config("p", "alerting-profile", "b", "B", "dev");
    a.parameters.insert(
        "other".to_string(),
        Parameter::reference(b.coordinate.clone(), "id"),
    );
    b.parameters.insert(
        "other".to_string(),
        Parameter::reference(a.coordinate.clone(), "id"),
    );
    let a_coord = a.coordinate.clone();
    let b_coord = b.coordinate.clone();

    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![a, b]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;

    let errors: Vec<&Error> = summary.errors().collect();
    assert_eq!(errors.len(), 1);
    match errors[0] {
        Error::CyclicDependency { cycle } => {
            assert!(cycle.contains(&a_coord));
            assert!(cycle.contains(&b_coord));
        }
        other => panic!("expected cyclic dependency, got {other:?}"),
    }
    assert!(tenant.log.records().is_empty(), "no HTTP calls expected");
}

#[tokio::test]
async fn failure_blocks_all_transitive_descendants() {
    let tenant = FakeTenant::new();
    tenant.classic.fail_when_payload_contains("Root board", 500);

    let a = classic_config("p", "dashboard", "a", "Root board", "dev");
    let mut b = classic_config("p", "alerting-profile", "b", "Profile", "dev");
    b.parameters.insert(
        "dash".to_string(),
        Parameter::reference(a.coordinate.clone(), "id"),
    );
    let mut c = classic_config("p", "notification", "c", "Notify", "dev");
    c.parameters.insert(
        "profile".to_string(),
        Parameter::reference(b.coordinate.clone(), "id"),
    );
    let (a_coord, b_coord, c_coord) =
        (a.coordinate.clone(), b.coordinate.clone(), c.coordinate.clone());

    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![a, b, c]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;

    let report = &summary.reports[0];
    let remote_errors = report
        .errors
        .iter()
        .filter(|e| matches!(e, Error::Remote { .. }))
        .count();
    let blocked_errors: Vec<&Error> = report
        .errors
        .iter()
        .filter(|e| matches!(e, Error::DescendantBlocked { .. }))
        .collect();
    assert_eq!(remote_errors, 1);
    assert_eq!(blocked_errors.len(), 2);
    for error in blocked_errors {
        let Error::DescendantBlocked { coordinate, failed } = error else {
            unreachable!();
        };
        assert!(*coordinate == b_coord || *coordinate == c_coord);
        assert_eq!(*failed, a_coord);
    }

    // Only the failed root was attempted.
    let mutating = tenant.log.mutating_records();
    assert_eq!(mutating.len(), 1);
    assert!(mutating[0].target.contains("Root board"));
}

#[tokio::test]
async fn missing_oauth_skips_automation_with_warning_not_error() {
    let tenant = FakeTenant::new();
    let dashboard = classic_config("p", "dashboard", "d", "Board", "dev");
    let workflow = Config {
        coordinate: Coordinate::new("p", "workflow", "nightly"),
        config_type: ConfigType::Automation {
            resource: AutomationResource::Workflow,
        },
        parameters: BTreeMap::new(),
        template: r#"{"tasks": []}"#.into(),
        environment: "dev".into(),
        group: "default".into(),
        skip: false,
        original_file: None,
    };
    let workflow_coord = workflow.coordinate.clone();
    let dashboard_coord = dashboard.coordinate.clone();

    // Token-only environment: automation cannot be deployed.
    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![dashboard, workflow]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;
    assert_eq!(summary.error_count(), 0);

    let report = &summary.reports[0];
    assert!(!report.entities[&dashboard_coord].skip);
    assert!(report.entities[&workflow_coord].skip);
    assert_eq!(
        report.event(&workflow_coord).unwrap().outcome,
        DeployOutcome::Skipped
    );
    // Only the dashboard reached the tenant.
    assert_eq!(tenant.log.mutating_records().len(), 1);
}

#[tokio::test]
async fn deploying_twice_updates_instead_of_creating() {
    let tenant = FakeTenant::new();
    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project(
            "p",
            vec![classic_config("p", "dashboard", "d", "Board", "dev")],
        ),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });
    let coordinate = Coordinate::new("p", "dashboard", "d");

    let cancel = CancellationToken::new();
    let first = deploy(&cancel, &manifest, factory.clone(), deploy_settings()).await;
    let second = deploy(&cancel, &manifest, factory, deploy_settings()).await;
    assert_eq!(first.error_count(), 0);
    assert_eq!(second.error_count(), 0);

    let first_id = first.reports[0].entities[&coordinate].id().unwrap().to_string();
    let second_id = second.reports[0].entities[&coordinate].id().unwrap().to_string();
    assert_eq!(first_id, second_id, "second run must not create a new object");

    let mutating = tenant.log.mutating_records();
    assert_eq!(mutating.len(), 2);
    assert_eq!(mutating[0].method, "POST");
    assert_eq!(mutating[1].method, "PUT");
}

#[tokio::test]
async fn duplicate_classic_names_fail_before_any_call() {
    let tenant = FakeTenant::new();
    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project(
            "p",
            vec![
                classic_config("p", "dashboard", "one", "Same name", "dev"),
                classic_config("p", "dashboard", "two", "Same name", "dev"),
            ],
        ),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;

    assert_eq!(summary.error_count(), 1);
    assert!(matches!(
        summary.errors().next().unwrap(),
        Error::DuplicateName { .. }
    ));
    assert!(tenant.log.records().is_empty());
}

#[tokio::test]
async fn dry_run_resolves_everything_but_stays_offline() {
    let dashboard = classic_config("p", "dashboard", "board", "Main board", "dev");
    let mut profile = classic_config("p", "alerting-profile", "alerts", "On call", "dev");
    profile.parameters.insert(
        "dashId".to_string(),
        Parameter::reference(dashboard.coordinate.clone(), "id"),
    );
    profile.template = r#"{"name": "{{ .name }}", "dashboardId": "{{ .dashId }}"}"#.into();
    let profile_coord = profile.coordinate.clone();

    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![dashboard, profile]),
    );

    let cancel = CancellationToken::new();
    let summary = deploy(
        &cancel,
        &manifest,
        Arc::new(PanickingFactory),
        DeploySettings {
            dry_run: true,
            ..DeploySettings::default()
        },
    )
    .await;

    assert_eq!(summary.error_count(), 0, "{:?}", summary.reports);
    // Downstream references resolved against fabricated ids.
    let report = &summary.reports[0];
    assert!(report.entities[&profile_coord].id().is_some());
}

#[tokio::test]
async fn dry_run_surfaces_the_same_validation_errors() {
    let mut broken = classic_config("p", "dashboard", "d", "Board", "dev");
    broken.template = r#"{"name": "{{ .missing }}"}"#.into();
    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![broken]),
    );

    let cancel = CancellationToken::new();
    let summary = deploy(
        &cancel,
        &manifest,
        Arc::new(PanickingFactory),
        DeploySettings {
            dry_run: true,
            ..DeploySettings::default()
        },
    )
    .await;

    assert_eq!(summary.error_count(), 1);
    assert!(matches!(
        summary.errors().next().unwrap(),
        Error::Template { .. }
    ));
}

#[tokio::test]
async fn parent_completion_strictly_precedes_child_start() {
    let tenant = FakeTenant::new();
    // Diamond: zone -> (board, tag) -> profile.
    let zone = classic_config("p", "management-zone", "z", "Zone", "dev");
    let mut board = classic_config("p", "dashboard", "b", "Board", "dev");
    board.parameters.insert(
        "zone".to_string(),
        Parameter::reference(zone.coordinate.clone(), "id"),
    );
    let mut tag = classic_config("p", "auto-tag", "t", "Tag", "dev");
    tag.parameters.insert(
        "zone".to_string(),
        Parameter::reference(zone.coordinate.clone(), "id"),
    );
    let mut profile = classic_config("p", "alerting-profile", "a", "Profile", "dev");
    profile.parameters.insert(
        "board".to_string(),
        Parameter::reference(board.coordinate.clone(), "id"),
    );
    profile.parameters.insert(
        "tag".to_string(),
        Parameter::reference(tag.coordinate.clone(), "id"),
    );

    let edges = vec![
        (zone.coordinate.clone(), board.coordinate.clone()),
        (zone.coordinate.clone(), tag.coordinate.clone()),
        (board.coordinate.clone(), profile.coordinate.clone()),
        (tag.coordinate.clone(), profile.coordinate.clone()),
    ];

    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![zone, board, tag, profile]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;
    assert_eq!(summary.error_count(), 0);

    let report = &summary.reports[0];
    for (parent, child) in edges {
        let parent_event = report.event(&parent).unwrap();
        let child_event = report.event(&child).unwrap();
        assert!(
            parent_event.finished_at <= child_event.started_at,
            "{parent} must complete before {child} starts"
        );
    }
}

#[tokio::test]
async fn skipped_configs_make_dependents_fail_without_calls_for_either() {
    let tenant = FakeTenant::new();
    let mut zone = classic_config("p", "management-zone", "z", "Zone", "dev");
    zone.skip = true;
    let mut board = classic_config("p", "dashboard", "b", "Board", "dev");
    board.parameters.insert(
        "zone".to_string(),
        Parameter::reference(zone.coordinate.clone(), "id"),
    );
    let board_coord = board.coordinate.clone();
    let zone_coord = zone.coordinate.clone();

    let manifest = manifest_with(
        vec![token_environment("dev")],
        single_project("p", vec![zone, board]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set_without_oauth(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;

    let report = &summary.reports[0];
    assert!(report.entities[&zone_coord].skip);
    let errors: Vec<&Error> = report.errors.iter().collect();
    assert_eq!(errors.len(), 1);
    match errors[0] {
        Error::ConfigSkipped {
            coordinate,
            dependency,
        } => {
            assert_eq!(*coordinate, board_coord);
            assert_eq!(*dependency, zone_coord);
        }
        other => panic!("expected config-skipped error, got {other:?}"),
    }
    assert!(tenant.log.mutating_records().is_empty());
}

#[tokio::test]
async fn single_worker_executes_the_linear_order() {
    use monaco_core::api::ApiCatalog;
    use monaco_deploy::executor::{DeployOptions, deploy_environment};
    use monaco_deploy::graph::DependencyGraph;

    let tenant = FakeTenant::new();
    let mut board = classic_config("p", "dashboard", "b", "Board", "dev");
    let zone = classic_config("p", "management-zone", "z", "Zone", "dev");
    board.parameters.insert(
        "zone".to_string(),
        Parameter::reference(zone.coordinate.clone(), "id"),
    );

    let graph = DependencyGraph::build("dev", vec![board, zone]).unwrap();
    let environment = token_environment("dev");
    let catalog = ApiCatalog::standard();
    let cancel = CancellationToken::new();

    // One worker forces the sequential path regardless of feature flags.
    let report = deploy_environment(
        &cancel,
        &environment,
        &catalog,
        &graph,
        Some(tenant.client_set_without_oauth()),
        &DeployOptions { workers: 1 },
    )
    .await;

    assert!(!report.has_errors(), "{:?}", report.errors);
    let zone_seq = tenant.log.first_sequence_containing("Zone").unwrap();
    let board_seq = tenant.log.first_sequence_containing("Board").unwrap();
    assert!(zone_seq < board_seq);
}

#[tokio::test]
async fn cancelled_token_stops_dispatch_entirely() {
    use monaco_core::api::ApiCatalog;
    use monaco_deploy::executor::{DeployOptions, deploy_environment};
    use monaco_deploy::graph::DependencyGraph;

    let tenant = FakeTenant::new();
    let graph = DependencyGraph::build(
        "dev",
        vec![classic_config("p", "dashboard", "d", "Board", "dev")],
    )
    .unwrap();
    let environment = token_environment("dev");
    let catalog = ApiCatalog::standard();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let report = deploy_environment(
        &cancel,
        &environment,
        &catalog,
        &graph,
        Some(tenant.client_set_without_oauth()),
        &DeployOptions::default(),
    )
    .await;

    assert!(report.events.is_empty(), "nothing may be dispatched");
    assert!(tenant.log.records().is_empty());
}

#[tokio::test]
async fn settings_configs_deploy_with_deterministic_external_ids() {
    let tenant = FakeTenant::new();
    let settings = Config {
        coordinate: Coordinate::new("p", "builtin:alerting.profile", "profile"),
        config_type: ConfigType::Settings {
            schema: "builtin:alerting.profile".into(),
            schema_version: None,
        },
        parameters: BTreeMap::new(),
        template: r#"{"title": "Alerts"}"#.into(),
        environment: "dev".into(),
        group: "default".into(),
        skip: false,
        original_file: None,
    };
    let coordinate = settings.coordinate.clone();

    let manifest = manifest_with(
        vec![oauth_environment("dev")],
        single_project("p", vec![settings]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;
    assert_eq!(summary.error_count(), 0, "{:?}", summary.reports);

    let expected = monaco_core::externalid::settings_external_id(
        "p",
        "builtin:alerting.profile",
        "profile",
    );
    let stored = tenant
        .settings
        .list(&cancel, Some("builtin:alerting.profile"))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].external_id.as_deref(), Some(expected.as_str()));

    let entity = &summary.reports[0].entities[&coordinate];
    assert_eq!(
        entity.properties.get("externalId").and_then(|v| v.as_str()),
        Some(expected.as_str())
    );
}

#[tokio::test]
async fn management_zone_references_resolve_numeric_ids_by_default() {
    let tenant = FakeTenant::new();
    let zone = Config {
        coordinate: Coordinate::new("p", "builtin:management-zones", "zone"),
        config_type: ConfigType::Settings {
            schema: "builtin:management-zones".into(),
            schema_version: None,
        },
        parameters: BTreeMap::new(),
        template: r#"{"name": "Zone"}"#.into(),
        environment: "dev".into(),
        group: "default".into(),
        skip: false,
        original_file: None,
    };
    let mut board = classic_config("p", "dashboard", "b", "Board", "dev");
    board.parameters.insert(
        "zoneId".to_string(),
        Parameter::reference(zone.coordinate.clone(), "id"),
    );
    board.template = r#"{"name": "{{ .name }}", "managementZone": "{{ .zoneId }}"}"#.into();
    let zone_coord = zone.coordinate.clone();

    let manifest = manifest_with(
        vec![oauth_environment("dev")],
        single_project("p", vec![zone, board]),
    );
    let factory = Arc::new(FixedFactory {
        clients: tenant.client_set(),
    });

    let cancel = CancellationToken::new();
    let summary = deploy(&cancel, &manifest, factory, deploy_settings()).await;
    assert_eq!(summary.error_count(), 0, "{:?}", summary.reports);

    // MONACO_FEAT_USE_MZ_NUMERIC_ID defaults to on: the referenced id is the
    // numeric legacy id, not the settings object id.
    let report = &summary.reports[0];
    let zone_entity = &report.entities[&zone_coord];
    let stored = tenant
        .settings
        .list(&cancel, Some("builtin:management-zones"))
        .await
        .unwrap();
    assert_eq!(
        zone_entity.id().map(ToString::to_string),
        stored[0].legacy_id.clone()
    );
    assert_ne!(zone_entity.id().unwrap(), stored[0].object_id);
}

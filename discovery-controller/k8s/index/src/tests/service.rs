use super::*;
use crate::linkage::ServicePorts;
use discovery_controller_core::model::ServiceType;
use maplit::btreemap;

fn web(selector: serde_json::Value) -> serde_json::Value {
    mk_service(
        "s1",
        "web",
        selector,
        json!([{ "name": "http", "port": 80, "targetPort": "web", "protocol": "TCP" }]),
    )
}

#[test]
fn resolves_service() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_port("pg1", "web", 8080);

    let mut svc = web(json!({ "app": "x" }));
    svc["spec"]["clusterIP"] = json!("10.0.0.5");
    let bundle = test
        .discover(&services([svc]))
        .expect("discovery must succeed");

    let s1 = svc_lcuuid("s1");
    assert_eq!(bundle.services.len(), 1);
    let service = &bundle.services[0];
    assert_eq!(service.lcuuid, s1);
    assert_eq!(service.name, "web");
    assert_eq!(service.service_type, ServiceType::ClusterIp);
    assert_eq!(service.selector, "app:x");
    assert_eq!(service.cluster_ip.as_deref(), Some("10.0.0.5"));
    assert_eq!(service.pod_namespace_lcuuid, Lcuuid::from("ns-lcuuid"));
    assert_eq!(service.pod_cluster_lcuuid, Lcuuid::from("pod-cluster-0"));

    assert_eq!(bundle.service_ports.len(), 1);
    let svc_port = &bundle.service_ports[0];
    assert_eq!(svc_port.port, 80);
    assert_eq!(svc_port.target_port, port(8080));
    assert_eq!(svc_port.protocol, "TCP");
    assert_eq!(svc_port.node_port, None);
    assert_eq!(svc_port.pod_service_lcuuid, s1);

    assert_eq!(bundle.pod_group_ports.len(), 1);
    let pg_port = &bundle.pod_group_ports[0];
    assert_eq!(pg_port.pod_group_lcuuid, Lcuuid::from("pg1"));
    assert_eq!(pg_port.port, port(8080));
    assert_eq!(pg_port.name, "http");
    assert_eq!(pg_port.pod_service_lcuuid, s1);

    assert_eq!(bundle.subnets.len(), 1);
    assert_eq!(bundle.subnets[0].cidr.to_string(), "10.0.0.5/32");
    assert_eq!(bundle.vinterfaces.len(), 1);
    assert_eq!(bundle.vinterfaces[0].device_lcuuid, s1);
    assert_eq!(bundle.ips.len(), 1);
    assert_eq!(bundle.ips[0].ip, "10.0.0.5".parse::<std::net::IpAddr>().unwrap());
    assert_eq!(bundle.ips[0].vinterface_lcuuid, bundle.vinterfaces[0].lcuuid);
    assert_eq!(bundle.ips[0].subnet_lcuuid, bundle.subnets[0].lcuuid);

    assert_eq!(test.links.pod_group_services.get("pg1"), [s1.clone()]);
    assert_eq!(
        test.links.service_ports.get("ns", "web"),
        Some(&ServicePorts {
            service: s1,
            ports: btreemap! { "http".to_string() => 80 },
        })
    );
}

#[test]
fn idempotent() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_pod_group("pg2", [("app", "x")])
        .with_port("pg1", "web", 8080)
        .with_port("pg2", "web", 8081);

    let mut a = web(json!({ "app": "x" }));
    a["spec"]["clusterIP"] = json!("10.0.0.5");
    let mut b = mk_service(
        "s2",
        "api",
        json!({ "app": "x" }),
        json!([{ "name": "grpc", "port": 90, "targetPort": 9090, "protocol": "TCP" }]),
    );
    b["spec"]["clusterIP"] = json!("10.0.0.4");

    let first = test
        .discover(&services([a.clone(), b.clone()]))
        .expect("discovery must succeed");
    let links = test.links.clone();
    let second = test
        .discover(&services([b, a]))
        .expect("discovery must succeed");
    assert_eq!(first, second);
    assert_eq!(test.links, links);

    // Named ports resolve against the first pod group in identity order.
    assert!(first
        .service_ports
        .iter()
        .any(|p| p.port == 80 && p.target_port == port(8080)));
    assert_eq!(first.pod_group_ports.len(), 4);
}

#[test]
fn empty_selector_is_skipped() {
    let mut test = TestConfig::default().with_pod_group("pg1", [("app", "x")]);

    let mut missing = web(json!({}));
    missing["metadata"]["uid"] = json!("s2");
    missing["spec"]
        .as_object_mut()
        .unwrap()
        .remove("selector");
    let bundle = test
        .discover(&services([web(json!({})), missing]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
    assert!(test.links.pod_group_services.is_empty());
}

#[test]
fn selector_keys_intersect() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x"), ("tier", "web")])
        .with_pod_group("pg2", [("app", "x"), ("tier", "db")])
        .with_port("pg1", "web", 8080)
        .with_port("pg2", "web", 5432);

    let bundle = test
        .discover(&services([web(json!({ "app": "x", "tier": "web" }))]))
        .expect("discovery must succeed");
    assert_eq!(bundle.services.len(), 1);
    let pod_groups = bundle
        .pod_group_ports
        .iter()
        .map(|p| p.pod_group_lcuuid.as_str())
        .collect::<Vec<_>>();
    assert_eq!(pod_groups, ["pg1"]);
    assert!(test.links.pod_group_services.get("pg2").is_empty());

    // Keys that select disjoint pod groups select nothing.
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_pod_group("pg2", [("tier", "web")]);
    let bundle = test
        .discover(&services([web(json!({ "app": "x", "tier": "web" }))]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
}

#[test]
fn unmatched_selector_key_fails_closed() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_port("pg1", "web", 8080);

    let bundle = test
        .discover(&services([web(json!({ "app": "x", "stale": "y" }))]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
    assert!(bundle.pod_group_ports.is_empty());
    assert!(test.links.pod_group_services.get("pg1").is_empty());
}

#[test]
fn target_workloads_annotation() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_workload("pg3", "deployment:ns:web")
        .with_port("pg1", "web", 8080)
        .with_port("pg3", "web", 8080);

    // Workload references rescue a selector that matches nothing.
    let mut svc = web(json!({ "app": "nothing" }));
    svc["metadata"]["annotations"] =
        json!({ "field.cattle.io/targetWorkloadIds": r#"["deployment:ns:web"]"# });
    let bundle = test
        .discover(&services([svc.clone()]))
        .expect("discovery must succeed");
    assert_eq!(bundle.services.len(), 1);
    assert_eq!(
        test.links.pod_group_services.get("pg3"),
        [svc_lcuuid("s1")]
    );

    // And are unioned with the pod groups the selector matches.
    svc["spec"]["selector"] = json!({ "app": "x" });
    let bundle = test
        .discover(&services([svc.clone()]))
        .expect("discovery must succeed");
    let mut pod_groups = bundle
        .pod_group_ports
        .iter()
        .map(|p| p.pod_group_lcuuid.as_str())
        .collect::<Vec<_>>();
    pod_groups.sort_unstable();
    assert_eq!(pod_groups, ["pg1", "pg3"]);

    // An annotation that can't be read skips the service entirely.
    svc["metadata"]["annotations"] =
        json!({ "field.cattle.io/targetWorkloadIds": "[deployment:ns:web" });
    let bundle = test
        .discover(&services([svc]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
    assert!(test.links.service_ports.get("ns", "web").is_none());
}

#[test]
fn opengauss_cluster_bypasses_selector() {
    let mut test = TestConfig::default()
        .with_workload("pg-og", "statefulset:ns:og-0")
        .with_port("pg-og", "web", 5432);

    let bundle = test
        .discover(&services([web(
            json!({ "opengauss.cluster": "og-0", "opengauss.role": "primary" }),
        )]))
        .expect("discovery must succeed");
    assert_eq!(bundle.services.len(), 1);
    assert_eq!(bundle.service_ports[0].target_port, port(5432));
    assert_eq!(
        test.links.pod_group_services.get("pg-og"),
        [svc_lcuuid("s1")]
    );
}

#[test]
fn opengauss_cluster_without_workload() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("opengauss.role", "primary")])
        .with_port("pg1", "web", 5432);

    // The selector would match pg1 on its own, but the cluster name takes precedence.
    let bundle = test
        .discover(&services([web(
            json!({ "opengauss.cluster": "og-missing", "opengauss.role": "primary" }),
        )]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
    assert!(bundle.pod_group_ports.is_empty());
    assert!(test.links.pod_group_services.get("pg1").is_empty());
}

#[test]
fn non_list_target_workloads_fall_back_to_selector() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_workload("pg3", "deployment:ns:web")
        .with_port("pg1", "web", 8080);

    for ids in ["{}", r#""deployment:ns:web""#, "7"] {
        let mut svc = web(json!({ "app": "x" }));
        svc["metadata"]["annotations"] = json!({ "field.cattle.io/targetWorkloadIds": ids });
        let bundle = test
            .discover(&services([svc]))
            .expect("discovery must succeed");
        assert_eq!(bundle.services.len(), 1, "{ids}");
        assert_eq!(bundle.pod_group_ports.len(), 1, "{ids}");
        assert_eq!(bundle.pod_group_ports[0].pod_group_lcuuid, Lcuuid::from("pg1"));
    }
    assert!(test.links.pod_group_services.get("pg3").is_empty());
}

#[test]
fn unresolved_target_ports_keep_named_ports() {
    let mut test = TestConfig::default().with_pod_group("pg1", [("app", "x")]);
    let previous = ServicePorts {
        service: svc_lcuuid("s1"),
        ports: btreemap! { "http".to_string() => 80 },
    };
    test.links.service_ports.set("ns", "web", previous.clone());

    // pg1 is selected, but has no port named `web`.
    let bundle = test
        .discover(&services([web(json!({ "app": "x" }))]))
        .expect("discovery must succeed");
    assert_eq!(bundle.services.len(), 1);
    assert!(bundle.service_ports.is_empty());
    assert!(bundle.pod_group_ports.is_empty());
    assert_eq!(test.links.service_ports.get("ns", "web"), Some(&previous));
    assert!(test.links.pod_group_services.get("pg1").is_empty());
}

#[test]
fn unresolved_service_purges_named_ports() {
    let mut test = TestConfig::default().with_pod_group("pg1", [("app", "x")]);
    test.links.service_ports.set(
        "ns",
        "web",
        ServicePorts {
            service: svc_lcuuid("s1"),
            ports: btreemap! { "http".to_string() => 80 },
        },
    );

    let bundle = test
        .discover(&services([web(json!({ "app": "y" }))]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
    assert!(test.links.service_ports.get("ns", "web").is_none());
}

#[test]
fn headless_service() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_port("pg1", "web", 8080);

    let mut svc = web(json!({ "app": "x" }));
    svc["spec"]["clusterIP"] = json!("None");
    let bundle = test
        .discover(&services([svc]))
        .expect("discovery must succeed");
    assert_eq!(bundle.services.len(), 1);
    assert_eq!(bundle.services[0].cluster_ip, None);
    assert!(bundle.subnets.is_empty());
    assert!(bundle.vinterfaces.is_empty());
    assert!(bundle.ips.is_empty());
}

#[test]
fn target_ports() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_port("pg1", "web", 8080);

    let svc = mk_service(
        "s1",
        "web",
        json!({ "app": "x" }),
        json!([
            { "name": "http", "port": 80, "targetPort": "web", "protocol": "TCP" },
            { "name": "metrics", "port": 9090, "targetPort": "9091", "protocol": "tcp" },
            { "name": "grpc", "port": 90, "targetPort": "grpc", "protocol": "TCP" },
            { "name": "admin", "port": 9990, "protocol": "TCP" },
        ]),
    );
    let bundle = test
        .discover(&services([svc]))
        .expect("discovery must succeed");

    let mut ports = bundle
        .service_ports
        .iter()
        .map(|p| (p.port, p.target_port.get(), p.protocol.as_str()))
        .collect::<Vec<_>>();
    ports.sort_unstable();
    assert_eq!(ports, [(80, 8080, "TCP"), (9090, 9091, "TCP")]);
    assert_eq!(
        test.links.service_ports.get("ns", "web").map(|s| &s.ports),
        Some(&btreemap! {
            "http".to_string() => 80,
            "metrics".to_string() => 9090,
        })
    );
}

#[test]
fn node_port_service() {
    let mut test = TestConfig::default().with_pod_group("pg1", [("app", "x")]);

    let mut svc = mk_service(
        "s1",
        "web",
        json!({ "app": "x" }),
        json!([{ "name": "http", "port": 80, "targetPort": 8080, "nodePort": 30080, "protocol": "TCP" }]),
    );
    svc["spec"]["type"] = json!("NodePort");
    let bundle = test
        .discover(&services([svc.clone()]))
        .expect("discovery must succeed");
    assert_eq!(bundle.services[0].service_type, ServiceType::NodePort);
    assert_eq!(bundle.service_ports[0].node_port, Some(port(30080)));

    svc["spec"]["type"] = json!("LoadBalancer");
    let bundle = test
        .discover(&services([svc]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
}

#[test]
fn skips_incomplete_records() {
    let mut test = TestConfig::default().with_pod_group("pg1", [("app", "x")]);

    let mut other_ns = web(json!({ "app": "x" }));
    other_ns["metadata"]["namespace"] = json!("unknown");
    let mut no_uid = web(json!({ "app": "x" }));
    no_uid["metadata"]["uid"] = json!("");

    let bundle = test
        .discover(&services([other_ns, no_uid, json!([]), json!(7)]))
        .expect("discovery must succeed");
    assert!(bundle.services.is_empty());
}

#[test]
fn service_rules() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_port("pg1", "web", 8080);

    let mut rule = web(json!({ "app": "x" }));
    rule["metadata"]["uid"] = json!("r1");
    rule["metadata"]["labels"] = json!({ "servicerule.resource.name": "rule-0" });
    let snapshot = mk_snapshot([
        (Kind::Service, vec![web(json!({ "app": "x" }))]),
        (Kind::ServiceRule, vec![rule]),
    ]);
    let bundle = test.discover(&snapshot).expect("discovery must succeed");

    let rule = bundle
        .services
        .iter()
        .find(|s| s.lcuuid == svc_lcuuid("r1"))
        .expect("rule must resolve");
    assert_eq!(rule.label, "servicerule.resource.name_servicerule:rule-0");
    assert_eq!(bundle.services.len(), 2);

    let mut expected = vec![svc_lcuuid("s1"), svc_lcuuid("r1")];
    expected.sort();
    assert_eq!(bundle.services.iter().map(|s| s.lcuuid.clone()).collect::<Vec<_>>(), expected);
    assert_eq!(test.links.pod_group_services.get("pg1").len(), 2);
}

#[test]
fn org_scoped_identities() {
    let mut test = TestConfig::with_org(OrgId::new(2)).with_pod_group("pg1", [("app", "x")]);

    let bundle = test
        .discover(&services([mk_service(
            "s1",
            "web",
            json!({ "app": "x" }),
            json!([{ "name": "http", "port": 80, "targetPort": 8080, "protocol": "TCP" }]),
        )]))
        .expect("discovery must succeed");
    assert_eq!(
        bundle.services[0].lcuuid,
        Lcuuid::generate(OrgId::new(2), "s1")
    );
    assert_ne!(bundle.services[0].lcuuid, svc_lcuuid("s1"));
}

#[test]
fn invalid_json_fails_pass() {
    let mut test = TestConfig::default()
        .with_pod_group("pg1", [("app", "x")])
        .with_port("pg1", "web", 8080);
    test.discover(&services([web(json!({ "app": "x" }))]))
        .expect("discovery must succeed");
    let links = test.links.clone();

    let mut snapshot = Snapshot::default();
    snapshot.insert(
        Kind::Service.snapshot_key(),
        vec![web(json!({ "app": "y" })).to_string(), "{\"metadata\":".to_string()],
    );
    match test.discover(&snapshot) {
        Err(Error::InvalidDocument { kind, index, .. }) => {
            assert_eq!(kind, Kind::Service);
            assert_eq!(index, 1);
        }
        res => panic!("unexpected result: {res:?}"),
    }
    assert_eq!(test.links, links, "links must not change");
}

#[test]
fn invalid_cluster_ip_fails_pass() {
    let mut test = TestConfig::default().with_pod_group("pg1", [("app", "x")]);

    let mut svc = mk_service(
        "s1",
        "web",
        json!({ "app": "x" }),
        json!([{ "name": "http", "port": 80, "targetPort": 8080, "protocol": "TCP" }]),
    );
    svc["spec"]["clusterIP"] = json!("10.0.0.300");
    match test.discover(&services([svc])) {
        Err(Error::InvalidAddress { service, addr, .. }) => {
            assert_eq!(service, svc_lcuuid("s1"));
            assert_eq!(addr, "10.0.0.300");
        }
        res => panic!("unexpected result: {res:?}"),
    }
    assert_eq!(test.links, Linkage::default(), "links must not change");
}

//! Integration tests for the networking.istio.io resource definitions
//!
//! These tests verify the descriptor constants, the serde wire shape of the
//! three resource kinds against upstream Istio manifests, and CRD manifest
//! generation.

use istio_mesh_client::crd::{
    destination_rule_resource, gateway_resource, generate_crds, virtual_service_resource,
    DestinationRule, DestinationRuleSpec, Gateway, GatewaySpec, VirtualService,
    VirtualServiceSpec, API_GROUP, API_VERSION,
};
use kube::Resource;

// ============================================================================
// Descriptor Tests
// ============================================================================

#[test]
fn descriptors_carry_the_istio_group_and_version() {
    for resource in [
        gateway_resource(),
        virtual_service_resource(),
        destination_rule_resource(),
    ] {
        assert_eq!(resource.group, API_GROUP);
        assert_eq!(resource.version, API_VERSION);
        assert_eq!(resource.api_version, "networking.istio.io/v1alpha3");
    }
}

#[test]
fn descriptors_use_the_istio_plural_names() {
    assert_eq!(gateway_resource().plural, "gateways");
    assert_eq!(virtual_service_resource().plural, "virtualservices");
    assert_eq!(destination_rule_resource().plural, "destinationrules");
}

#[test]
fn descriptors_match_the_typed_kinds() {
    assert_eq!(gateway_resource().kind, Gateway::kind(&()));
    assert_eq!(virtual_service_resource().kind, VirtualService::kind(&()));
    assert_eq!(destination_rule_resource().kind, DestinationRule::kind(&()));
}

// ============================================================================
// Wire Shape Tests
// ============================================================================

#[test]
fn gateway_deserializes_from_an_istio_manifest() {
    let yaml = r#"
servers:
  - port:
      number: 443
      name: https
      protocol: HTTPS
    hosts:
      - "bookinfo.example.com"
    tls:
      mode: SIMPLE
      credentialName: bookinfo-cert
selector:
  istio: ingressgateway
"#;

    let spec: GatewaySpec = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(spec.servers.len(), 1);
    let server = &spec.servers[0];
    assert_eq!(server.port.number, 443);
    assert_eq!(server.port.protocol, "HTTPS");
    assert_eq!(server.hosts, vec!["bookinfo.example.com"]);
    let tls = server.tls.as_ref().unwrap();
    assert_eq!(tls.mode, "SIMPLE");
    assert_eq!(tls.credential_name.as_deref(), Some("bookinfo-cert"));
    assert_eq!(spec.selector["istio"], "ingressgateway");
}

#[test]
fn gateway_tls_mode_defaults_to_passthrough() {
    let yaml = r#"
servers:
  - port:
      number: 443
      name: tls
      protocol: TLS
    hosts: ["*"]
    tls: {}
"#;

    let spec: GatewaySpec = serde_yaml::from_str(yaml).unwrap();
    let tls = spec.servers[0].tls.as_ref().unwrap();
    assert_eq!(tls.mode, "PASSTHROUGH");
    assert!(!tls.https_redirect);
}

#[test]
fn virtual_service_deserializes_routes_and_matches() {
    let yaml = r#"
hosts:
  - reviews
http:
  - name: v2-for-jason
    match:
      - headers:
          end-user:
            exact: jason
    route:
      - destination:
          host: reviews
          subset: v2
  - route:
      - destination:
          host: reviews
          subset: v1
        weight: 80
      - destination:
          host: reviews
          subset: v3
        weight: 20
    retries:
      attempts: 3
      perTryTimeout: 2s
"#;

    let spec: VirtualServiceSpec = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(spec.hosts, vec!["reviews"]);
    assert_eq!(spec.http.len(), 2);

    let matched = &spec.http[0];
    assert_eq!(matched.name.as_deref(), Some("v2-for-jason"));
    let header = &matched.match_[0].headers["end-user"];
    assert_eq!(header.exact.as_deref(), Some("jason"));
    assert_eq!(matched.route[0].destination.subset.as_deref(), Some("v2"));

    let weighted = &spec.http[1];
    assert_eq!(weighted.route[0].weight, Some(80));
    assert_eq!(weighted.route[1].weight, Some(20));
    let retries = weighted.retries.as_ref().unwrap();
    assert_eq!(retries.attempts, 3);
    assert_eq!(retries.per_try_timeout.as_deref(), Some("2s"));
}

#[test]
fn virtual_service_serializes_match_under_the_reserved_key() {
    let yaml = r#"
hosts: [ratings]
http:
  - match:
      - uri:
          prefix: /ratings
    route:
      - destination:
          host: ratings
"#;

    let spec: VirtualServiceSpec = serde_yaml::from_str(yaml).unwrap();
    let value = serde_json::to_value(&spec).unwrap();

    // the Rust field is match_, the wire key stays `match`
    assert!(value["http"][0]["match"].is_array());
    assert!(value["http"][0].get("match_").is_none());
    assert_eq!(value["http"][0]["match"][0]["uri"]["prefix"], "/ratings");
}

#[test]
fn destination_rule_deserializes_subsets_and_policies() {
    let yaml = r#"
host: reviews.prod.svc.cluster.local
trafficPolicy:
  loadBalancer:
    simple: LEAST_CONN
  connectionPool:
    tcp:
      maxConnections: 100
  outlierDetection:
    consecutiveErrors: 7
    interval: 5m
subsets:
  - name: v1
    labels:
      version: v1
  - name: v2
    labels:
      version: v2
    trafficPolicy:
      loadBalancer:
        simple: ROUND_ROBIN
"#;

    let spec: DestinationRuleSpec = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(spec.host, "reviews.prod.svc.cluster.local");
    let policy = spec.traffic_policy.as_ref().unwrap();
    assert_eq!(
        policy.load_balancer.as_ref().unwrap().simple.as_deref(),
        Some("LEAST_CONN")
    );
    let tcp = policy.connection_pool.as_ref().unwrap().tcp.as_ref().unwrap();
    assert_eq!(tcp.max_connections, Some(100));
    let outliers = policy.outlier_detection.as_ref().unwrap();
    assert_eq!(outliers.consecutive_errors, Some(7));

    assert_eq!(spec.subsets.len(), 2);
    assert_eq!(spec.subsets[0].name, "v1");
    assert_eq!(spec.subsets[0].labels["version"], "v1");
    let v2_policy = spec.subsets[1].traffic_policy.as_ref().unwrap();
    assert_eq!(
        v2_policy.load_balancer.as_ref().unwrap().simple.as_deref(),
        Some("ROUND_ROBIN")
    );
}

#[test]
fn unset_optional_fields_stay_off_the_wire() {
    let spec = DestinationRuleSpec {
        host: "ratings".to_string(),
        traffic_policy: None,
        subsets: Vec::new(),
        export_to: Vec::new(),
    };

    let value = serde_json::to_value(&spec).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 1);
    assert_eq!(object["host"], "ratings");
}

// ============================================================================
// CRD Generation Tests
// ============================================================================

#[test]
fn generate_crds_emits_one_manifest_per_kind() {
    let crds = generate_crds();
    assert_eq!(crds.len(), 3);

    for (crd, plural) in crds
        .iter()
        .zip(["gateways", "virtualservices", "destinationrules"])
    {
        let manifest: serde_yaml::Value = serde_yaml::from_str(crd).unwrap();
        assert_eq!(manifest["kind"], "CustomResourceDefinition");
        assert_eq!(manifest["spec"]["group"], "networking.istio.io");
        assert_eq!(manifest["spec"]["names"]["plural"], plural);
        assert_eq!(manifest["spec"]["scope"], "Namespaced");
        assert_eq!(manifest["spec"]["versions"][0]["name"], "v1alpha3");
    }
}

#[test]
fn generated_crds_enable_the_status_subresource() {
    for crd in generate_crds() {
        let manifest: serde_yaml::Value = serde_yaml::from_str(&crd).unwrap();
        assert!(manifest["spec"]["versions"][0]["subresources"]["status"].is_mapping());
    }
}

//! CRD YAML Generator
//!
//! This binary generates Kubernetes CRD manifests for all custom resources
//! defined by istio-mesh-client.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/all.yaml

use istio_mesh_client::crd::generate_crds;

fn main() {
    for crd in generate_crds() {
        println!("---");
        print!("{}", crd);
    }
}

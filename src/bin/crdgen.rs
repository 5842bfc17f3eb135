//! Prints every CustomResourceDefinition the provider serves as a YAML stream.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/all.yaml
//! ```

use anyhow::Result;
use kube::CustomResourceExt;
use provider_aws::{Bucket, CacheCluster, CacheSubnetGroup, ProviderConfig, ProvisionedProduct, ReplicationGroup};

fn main() -> Result<()> {
    let crds = [
        ProviderConfig::crd(),
        ReplicationGroup::crd(),
        CacheCluster::crd(),
        CacheSubnetGroup::crd(),
        ProvisionedProduct::crd(),
        Bucket::crd(),
    ];
    for crd in &crds {
        print!("---\n{}", serde_yaml::to_string(crd)?);
    }
    Ok(())
}

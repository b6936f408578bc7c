// Copyright Andeya Lee 2024
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use clap::Parser;
use example::init_tracing;
use futures::TryStreamExt;
use meshsupply::client::discover::{FixedDiscover, FixedReactiveDiscover};
use meshsupply::client::supplier::{DiscoveryClientSupplier, ServiceInstanceListSupplier};
use meshsupply::env::{Environment, MapEnvironment, OsEnvironment, PROPERTY_NAME};
use meshsupply::net::Address;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Parser)]
struct Flags {
    /// Service to supply instances for. Falls back to `LOADBALANCER_CLIENT_NAME`.
    #[clap(long)]
    service: Option<String>,
    /// Instance addresses of the service, e.g. `127.0.0.1:8000` or `unix:/tmp/svc.sock`.
    #[clap(long = "instance", num_args = 1..)]
    instances: Vec<Address>,
    /// Use a push-style discovery source.
    #[clap(long)]
    reactive: bool,
    /// Number of fetches.
    #[clap(long, default_value_t = 1)]
    rounds: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let flags = Flags::parse();
    init_tracing("Meshsupply Example Supplier")?;

    let mut builder = DiscoveryClientSupplier::builder();
    let service_id = match flags.service {
        Some(service) => {
            builder.with_environment(MapEnvironment::new().with_property(PROPERTY_NAME, service.clone()));
            service
        },
        None => {
            let environment = OsEnvironment::new();
            let service = environment.property(PROPERTY_NAME).map(|s| s.to_string()).unwrap_or_default();
            builder.with_environment(environment);
            service
        },
    };
    let discover = FixedDiscover::from_address(service_id, flags.instances);
    if flags.reactive {
        builder.with_discovery_source(FixedReactiveDiscover::from(discover));
    } else {
        builder.with_discovery_source(discover);
    }
    let supplier = builder.build()?;

    for round in 0..flags.rounds {
        let lists: Vec<_> = supplier.get().try_collect().await.map_err(|e| anyhow::anyhow!(e))?;
        for instances in lists {
            let addrs: Vec<String> = instances.iter().map(|i| i.address.to_string()).collect();
            tracing::info!(round, service_id = %supplier.service_id(), ?addrs, "supplied instances");
        }
        sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

// cirrus-api: async client for the Cirrus compute control plane.
//
// One client, one region. The client is constructed already
// authenticated -- credentials ride as default headers on every
// request -- and exposes the control plane's fixed call surface:
// regions, instances, tags, key pairs, security groups, VPCs, images.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod images;
mod instances;
mod key_pairs;
mod regions;
mod security_groups;

pub use client::{ComputeClient, Credentials};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

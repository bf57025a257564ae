/// kubectl-backed cluster context management
pub mod client;
pub mod kubectl;

pub use client::KubernetesClient;

/// HPA Console - Kubernetes autoscaling management
///
/// Client-side validation of HPA and node pool edits, and cluster tabs that
/// keep the backend's active cluster context in step with the selected tab.
pub mod api;
pub mod config;
pub mod k8s;
pub mod tabs;
pub mod utils;
pub mod validation;

/// Boundary to whatever performs the actual cluster context switch
use futures::future::BoxFuture;

#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Command(String),
}

/// Selects the cluster context subsequent backend calls target
pub trait ContextSwitcher: Send + Sync {
    fn switch_context<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, Result<(), SwitchError>>;
}

use thiserror::Error;

/// Failures from the remote store or the geocoder, before they are
/// classified into a [`DirectoryError`] kind.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Every failure the directory surfaces to the user.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Store credentials are missing. Fatal to the initial load.
    #[error("Directory store is not configured: {0}")]
    Configuration(String),

    /// Loading the record set failed. The cache has been cleared.
    #[error("Could not load businesses: {0}")]
    Fetch(String),

    /// Required fields are missing. Nothing was sent to the store.
    #[error("Please fill in the required fields: {}.", join_fields(.missing))]
    Validation { missing: Vec<&'static str> },

    /// The insert failed. The form keeps its values.
    #[error("Could not save business: {0}")]
    Write(String),

    #[error("Failed to initialize the directory: {0}")]
    Initialization(String),
}

fn join_fields(fields: &[&'static str]) -> String {
    match fields {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ActivityRequest {
    pub user: Option<String>,
}

/// `year` stays raw text so a non-numeric value can be reported as bad input.
#[derive(Debug, Deserialize, Default)]
pub struct ContributionsRequest {
    pub user: Option<String>,
    pub year: Option<String>,
}

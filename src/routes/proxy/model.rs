use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub target: Option<String>,
}

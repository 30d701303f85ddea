//! Per-request metadata carried into audit entries

use std::net::IpAddr;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: Option<IpAddr>, user_agent: Option<String>) -> Self {
        Self { ip_address, user_agent }
    }
}

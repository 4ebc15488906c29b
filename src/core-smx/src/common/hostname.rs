use std::{net::SocketAddr, num::ParseIntError};

/// Default bind address of the API server.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Gets the host:port from the env vars HOST and PORT.
/// Uses defaults `127.0.0.1:8000` if env vars are unset.
pub fn get_api_base_url() -> Result<SocketAddr, HostPortError> {
    let host = std::env::var("HOST").ok();
    let port = std::env::var("PORT").ok();
    socket_addr(host.as_deref(), port.as_deref())
}

fn socket_addr(host: Option<&str>, port: Option<&str>) -> Result<SocketAddr, HostPortError> {
    let host = host.map(str::trim).filter(|h| !h.is_empty()).unwrap_or(DEFAULT_HOST);
    let port = match port.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => p.parse::<u16>()?,
        None => DEFAULT_PORT,
    };
    let address = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    Ok(address)
}

#[derive(Debug)]
pub enum HostPortError {
    InvalidPort(ParseIntError),
    InvalidHostname(std::net::AddrParseError),
}

impl std::error::Error for HostPortError {}

impl std::fmt::Display for HostPortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostPortError::InvalidPort(err) => write!(f, "Invalid port: {}", err),
            HostPortError::InvalidHostname(err) => write!(f, "Invalid hostname: {}", err),
        }
    }
}

impl From<ParseIntError> for HostPortError {
    fn from(err: ParseIntError) -> Self {
        HostPortError::InvalidPort(err)
    }
}

impl From<std::net::AddrParseError> for HostPortError {
    fn from(err: std::net::AddrParseError) -> Self {
        HostPortError::InvalidHostname(err)
    }
}

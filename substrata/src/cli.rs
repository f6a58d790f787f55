//! Command-line surface (§4.P), grounded in the `clap::Parser` derive style
//! used for connection arguments in networked-client examples.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Substrata client runtime core", long_about = None)]
pub struct Args {
    /// Server host; required unless a sub:// URL is given positionally.
    #[arg(long)]
    pub host: Option<String>,

    /// Server port.
    #[arg(long, default_value_t = 7600)]
    pub port: u16,

    /// World name within the host.
    #[arg(long)]
    pub world: Option<String>,

    /// Proximity-load radius, in metres.
    #[arg(long, default_value_t = 500.0)]
    pub load_distance: f32,

    /// Optional TOML config file; CLI flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Become a controllable screenshot slave. The socket protocol this
    /// implies is out of scope; only the flag and a log line exist.
    #[arg(long)]
    pub screenshotslave: bool,

    /// Run as a screenshot bot. Out of scope beyond logging the flag.
    #[arg(long)]
    pub screenshot: bool,

    /// A `sub://<host>[:port][/worldname][/parcel/<id>]` URL.
    pub sub_url: Option<String>,
}

/// The pieces a `sub://` URL can override, parsed per §6.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubUrl {
    pub host: String,
    pub port: Option<u16>,
    pub world: Option<String>,
    pub parcel_id: Option<u32>,
}

/// Parses `sub://<host>[:port][/worldname][/parcel/<id>]`. Returns `None`
/// for anything not starting with the `sub://` scheme.
pub fn parse_sub_url(raw: &str) -> Option<SubUrl> {
    let rest = raw.strip_prefix("sub://")?;
    let (authority, path) = match rest.split_once('/') {
        Some((a, p)) => (a, p),
        None => (rest, ""),
    };
    let (host, port) = match authority.split_once(':') {
        Some((h, p)) => (h.to_string(), p.parse::<u16>().ok()),
        None => (authority.to_string(), None),
    };
    if host.is_empty() {
        return None;
    }

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let mut world = None;
    let mut parcel_id = None;
    if let Some(first) = segments.next() {
        if first == "parcel" {
            parcel_id = segments.next().and_then(|s| s.parse().ok());
        } else {
            world = Some(first.to_string());
            if let Some(next) = segments.next() {
                if next == "parcel" {
                    parcel_id = segments.next().and_then(|s| s.parse().ok());
                }
            }
        }
    }

    Some(SubUrl { host, port, world, parcel_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_host_and_port() {
        let url = parse_sub_url("sub://substrata.info:7601").unwrap();
        assert_eq!(url.host, "substrata.info");
        assert_eq!(url.port, Some(7601));
        assert!(url.world.is_none());
    }

    #[test]
    fn host_world_and_parcel() {
        let url = parse_sub_url("sub://substrata.info/worldname/parcel/42").unwrap();
        assert_eq!(url.host, "substrata.info");
        assert_eq!(url.world.as_deref(), Some("worldname"));
        assert_eq!(url.parcel_id, Some(42));
    }

    #[test]
    fn host_only_parcel_no_world() {
        let url = parse_sub_url("sub://substrata.info/parcel/7").unwrap();
        assert!(url.world.is_none());
        assert_eq!(url.parcel_id, Some(7));
    }

    #[test]
    fn non_sub_scheme_is_rejected() {
        assert!(parse_sub_url("https://example.com").is_none());
    }
}

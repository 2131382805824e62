//! Telegram share links
//!
//! Builds one `https://t.me/socks?...` link per configured user so the proxy
//! can be added to a Telegram client with a single tap.

use crate::config::Config;
use anyhow::{anyhow, Result};
use url::Url;

const SHARE_BASE: &str = "https://t.me/socks";

/// A share link for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    /// User the link logs in as
    pub username: String,
    /// The link itself
    pub url: Url,
}

/// Build share links for every user
///
/// Returns an empty list when `server.public_host` is not set. The port is
/// taken from the listen address.
pub fn share_links(config: &Config) -> Result<Vec<ShareLink>> {
    let Some(host) = config.server.public_host.as_deref() else {
        return Ok(Vec::new());
    };
    let port = config
        .server
        .listen_addr()
        .map_err(|e| anyhow!(e))?
        .port()
        .to_string();

    config
        .users
        .iter()
        .map(|user| -> Result<ShareLink> {
            let url = Url::parse_with_params(
                SHARE_BASE,
                &[
                    ("server", host),
                    ("port", port.as_str()),
                    ("user", user.username.as_str()),
                    ("pass", user.password.as_str()),
                ],
            )?;
            Ok(ShareLink {
                username: user.username.clone(),
                url,
            })
        })
        .collect()
}

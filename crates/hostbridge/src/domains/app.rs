//! The `app` domain.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString};
use url::Url;

use super::{Outcome, Services, host_failure};
use crate::envelope::{Envelope, required};
use crate::error::BridgeError;

pub(crate) const DOMAIN: &str = "app";

/// URL schemes `openExternal` will hand to the system.
const EXTERNAL_SCHEMES: &[&str] = &["http", "https", "mailto"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub(crate) enum AppAction {
    GetName,
    GetVersion,
    GetPlatform,
    OpenExternal,
    Quit,
}

#[derive(Debug, Default, Deserialize)]
struct AppArgs {
    url: Option<String>,
}

pub(crate) fn handle(services: &mut Services, envelope: &Envelope) -> Result<Outcome, BridgeError> {
    let action = AppAction::from_str(&envelope.action)
        .map_err(|_| BridgeError::unknown_action(DOMAIN, envelope.action.as_str()))?;

    match action {
        AppAction::GetName => Ok(Outcome::ready(Value::String(services.app.name()))),
        AppAction::GetVersion => Ok(Outcome::ready(Value::String(services.app.version()))),
        AppAction::GetPlatform => Ok(Outcome::ready(Value::from(std::env::consts::OS))),
        AppAction::OpenExternal => {
            let args: AppArgs = envelope.arguments()?;
            let raw = required(args.url, "url")?;
            let url = external_url(&raw)?;
            services
                .app
                .open_external(&url)
                .map_err(|error| host_failure(&raw, &error))?;
            Ok(Outcome::ready(Value::Bool(true)))
        }
        AppAction::Quit => {
            services.quit_requested = true;
            Ok(Outcome::ready(Value::Bool(true)))
        }
    }
}

fn external_url(raw: &str) -> Result<Url, BridgeError> {
    let url = Url::parse(raw)
        .map_err(|error| BridgeError::invalid_envelope(format!("invalid url '{raw}': {error}")))?;
    if EXTERNAL_SCHEMES.contains(&url.scheme()) {
        Ok(url)
    } else {
        Err(BridgeError::permission_denied(raw))
    }
}

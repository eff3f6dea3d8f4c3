//! The `tray` domain.
//!
//! Menu clicks travel the other way: the host reports them through
//! [`BridgeContext::tray_menu_clicked`](crate::BridgeContext::tray_menu_clicked)
//! and they reach script code as events.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};
use strum::{Display, EnumString};

use super::{Outcome, Services, host_failure};
use crate::envelope::{Envelope, required};
use crate::error::BridgeError;
use crate::host::{TrayCommand, TrayMenuItem};
use crate::response::HostEvent;

pub(crate) const DOMAIN: &str = "tray";

/// Event target used for tray notifications.
const TRAY_TARGET_ID: &str = "tray";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub(crate) enum TrayAction {
    SetIcon,
    SetTooltip,
    SetMenu,
    Show,
    Hide,
}

#[derive(Debug, Default, Deserialize)]
struct TrayArgs {
    path: Option<PathBuf>,
    text: Option<String>,
    items: Option<Vec<TrayMenuItem>>,
}

pub(crate) fn handle(services: &mut Services, envelope: &Envelope) -> Result<Outcome, BridgeError> {
    let action = TrayAction::from_str(&envelope.action)
        .map_err(|_| BridgeError::unknown_action(DOMAIN, envelope.action.as_str()))?;
    let args: TrayArgs = envelope.arguments()?;

    let command = match action {
        TrayAction::SetIcon => TrayCommand::SetIcon(required(args.path, "path")?),
        TrayAction::SetTooltip => TrayCommand::SetTooltip(required(args.text, "text")?),
        TrayAction::SetMenu => TrayCommand::SetMenu(required(args.items, "items")?),
        TrayAction::Show => TrayCommand::Show,
        TrayAction::Hide => TrayCommand::Hide,
    };
    services
        .tray
        .apply(command)
        .map_err(|error| host_failure(&envelope.action, &error))?;
    Ok(Outcome::ready(Value::Bool(true)))
}

/// Event forwarded when a tray menu entry is clicked.
pub(crate) fn menu_click_event(item_id: &str) -> HostEvent {
    HostEvent::new(
        DOMAIN,
        TRAY_TARGET_ID,
        "menuClick",
        json!({ "id": item_id }),
    )
}

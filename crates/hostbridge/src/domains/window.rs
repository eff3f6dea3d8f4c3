//! The `window` domain.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};
use strum::{Display, EnumString};

use super::{Outcome, Services, host_failure};
use crate::envelope::{Envelope, required};
use crate::error::BridgeError;
use crate::host::{Point, Size, WindowCommand};

pub(crate) const DOMAIN: &str = "window";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub(crate) enum WindowAction {
    Show,
    Hide,
    Close,
    Focus,
    Minimize,
    Maximize,
    Unmaximize,
    Center,
    SetTitle,
    SetSize,
    SetPosition,
    SetAlwaysOnTop,
    SetFullscreen,
    GetSize,
    GetPosition,
    IsVisible,
}

#[derive(Debug, Default, Deserialize)]
struct WindowArgs {
    title: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    x: Option<f64>,
    y: Option<f64>,
    enabled: Option<bool>,
}

pub(crate) fn handle(services: &mut Services, envelope: &Envelope) -> Result<Outcome, BridgeError> {
    let action = WindowAction::from_str(&envelope.action)
        .map_err(|_| BridgeError::unknown_action(DOMAIN, envelope.action.as_str()))?;
    let args: WindowArgs = envelope.arguments()?;
    let window = services.window.as_mut();
    let context = envelope.action.as_str();

    let command = match action {
        WindowAction::Show => WindowCommand::Show,
        WindowAction::Hide => WindowCommand::Hide,
        WindowAction::Close => WindowCommand::Close,
        WindowAction::Focus => WindowCommand::Focus,
        WindowAction::Minimize => WindowCommand::Minimize,
        WindowAction::Maximize => WindowCommand::Maximize,
        WindowAction::Unmaximize => WindowCommand::Unmaximize,
        WindowAction::Center => WindowCommand::Center,
        WindowAction::SetTitle => WindowCommand::SetTitle(required(args.title, "title")?),
        WindowAction::SetSize => WindowCommand::SetSize(Size {
            width: required(args.width, "width")?,
            height: required(args.height, "height")?,
        }),
        WindowAction::SetPosition => WindowCommand::SetPosition(Point {
            x: required(args.x, "x")?,
            y: required(args.y, "y")?,
        }),
        WindowAction::SetAlwaysOnTop => {
            WindowCommand::SetAlwaysOnTop(required(args.enabled, "enabled")?)
        }
        WindowAction::SetFullscreen => {
            WindowCommand::SetFullscreen(required(args.enabled, "enabled")?)
        }
        WindowAction::GetSize => {
            let size = window
                .size()
                .map_err(|error| host_failure(context, &error))?;
            return Ok(Outcome::ready(json!({ "width": size.width, "height": size.height })));
        }
        WindowAction::GetPosition => {
            let position = window
                .position()
                .map_err(|error| host_failure(context, &error))?;
            return Ok(Outcome::ready(json!({ "x": position.x, "y": position.y })));
        }
        WindowAction::IsVisible => {
            let visible = window
                .is_visible()
                .map_err(|error| host_failure(context, &error))?;
            return Ok(Outcome::ready(Value::Bool(visible)));
        }
    };

    window
        .apply(command)
        .map_err(|error| host_failure(context, &error))?;
    Ok(Outcome::ready(Value::Bool(true)))
}

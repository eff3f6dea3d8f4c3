//! The `nativeUI` domain.
//!
//! `create`, `update` and `destroy` cover the whole component lifecycle. The
//! remaining mutating actions are shorthands for an `update` carrying a single
//! mutation, so `{"action":"appendRows","data":{"id":"t","rows":[...]}}` and
//! `{"action":"update","data":{"id":"t","mutations":[{"op":"appendRows","rows":[...]}]}}`
//! behave identically.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Value, json};
use strum::{Display, EnumString};
use tracing::warn;

use super::{Outcome, Services};
use crate::envelope::{Envelope, required};
use crate::error::{BridgeError, OPERATION_FAILED};
use crate::registry::{
    Column, ComponentKind, Interaction, Mutation, REGISTRY_TARGET, RegistryError, Row,
};

pub(crate) const DOMAIN: &str = "nativeUI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub(crate) enum NativeUiAction {
    Create,
    Update,
    Destroy,
    AddSection,
    AppendItems,
    SetColumns,
    AppendRows,
    RemoveRows,
    Clear,
    Select,
    GetSelection,
}

#[derive(Debug, Default, Deserialize)]
struct NativeUiArgs {
    id: Option<String>,
    kind: Option<ComponentKind>,
    #[serde(default)]
    options: Value,
    mutations: Option<Vec<Mutation>>,
    mutation: Option<Mutation>,
    title: Option<String>,
    items: Option<Vec<Value>>,
    section: Option<usize>,
    columns: Option<Vec<Column>>,
    rows: Option<Vec<Row>>,
    start: Option<usize>,
    count: Option<usize>,
    row: Option<usize>,
}

pub(crate) fn handle(services: &mut Services, envelope: &Envelope) -> Result<Outcome, BridgeError> {
    let action = NativeUiAction::from_str(&envelope.action)
        .map_err(|_| BridgeError::unknown_action(DOMAIN, envelope.action.as_str()))?;
    let args: NativeUiArgs = envelope.arguments()?;
    let id = required(args.id.clone(), "id")?;
    let registry = &mut services.registry;

    match action {
        NativeUiAction::Create => {
            let kind = required(args.kind, "kind")?;
            registry
                .create(&id, kind, &args.options)
                .map_err(registry_failure)?;
            Ok(Outcome::ready(json!({ "id": id, "kind": kind })))
        }
        NativeUiAction::Destroy => {
            registry.destroy(&id, args.kind);
            Ok(Outcome::ready(Value::Bool(true)))
        }
        NativeUiAction::Select => {
            let section = args.section.unwrap_or_default();
            let row = required(args.row, "row")?;
            let event = registry
                .interaction(&id, Interaction::Selected { section, row })
                .map_err(registry_failure)?;
            services.events.push(event);
            Ok(Outcome::ready(Value::Bool(true)))
        }
        NativeUiAction::GetSelection => {
            let component = registry.get(&id, args.kind).map_err(registry_failure)?;
            let selection = component
                .selection()
                .map_or(Value::Null, |(section, row)| {
                    json!({ "section": section, "row": row })
                });
            Ok(Outcome::ready(selection))
        }
        NativeUiAction::Update
        | NativeUiAction::AddSection
        | NativeUiAction::AppendItems
        | NativeUiAction::SetColumns
        | NativeUiAction::AppendRows
        | NativeUiAction::RemoveRows
        | NativeUiAction::Clear => {
            let kind = args.kind;
            let mutations = mutations_for(action, args)?;
            let revision = registry
                .update(&id, kind, &mutations)
                .map_err(registry_failure)?;
            Ok(Outcome::ready(json!({ "id": id, "revision": revision })))
        }
    }
}

fn mutations_for(action: NativeUiAction, args: NativeUiArgs) -> Result<Vec<Mutation>, BridgeError> {
    let single = match action {
        NativeUiAction::Update => {
            return match (args.mutations, args.mutation) {
                (Some(mutations), _) => Ok(mutations),
                (None, Some(mutation)) => Ok(vec![mutation]),
                (None, None) => Err(BridgeError::missing("mutations")),
            };
        }
        NativeUiAction::AddSection => Mutation::AddSection {
            title: args.title.unwrap_or_default(),
            items: args.items.unwrap_or_default(),
        },
        NativeUiAction::AppendItems => Mutation::AppendItems {
            section: required(args.section, "section")?,
            items: required(args.items, "items")?,
        },
        NativeUiAction::SetColumns => Mutation::SetColumns {
            columns: required(args.columns, "columns")?,
        },
        NativeUiAction::AppendRows => Mutation::AppendRows {
            rows: required(args.rows, "rows")?,
        },
        NativeUiAction::RemoveRows => Mutation::RemoveRows {
            start: required(args.start, "start")?,
            count: args.count.unwrap_or(1),
        },
        NativeUiAction::Clear => Mutation::Clear,
        NativeUiAction::Create
        | NativeUiAction::Destroy
        | NativeUiAction::Select
        | NativeUiAction::GetSelection => {
            return Err(BridgeError::unknown_action(DOMAIN, action.to_string()));
        }
    };
    Ok(vec![single])
}

fn registry_failure(error: RegistryError) -> BridgeError {
    match error {
        RegistryError::NotFound { id } => BridgeError::component_not_found(id),
        RegistryError::KindMismatch { .. }
        | RegistryError::Mutation { .. }
        | RegistryError::RowOutOfRange { .. } => {
            BridgeError::invalid_envelope(error.to_string())
        }
        RegistryError::Toolkit { id, source } => {
            warn!(target: REGISTRY_TARGET, %id, error = %source, "toolkit failure");
            BridgeError::native(id, OPERATION_FAILED)
        }
    }
}

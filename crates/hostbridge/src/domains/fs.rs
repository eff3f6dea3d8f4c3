//! The `fs` domain.
//!
//! Disk access is packaged into worker jobs so that a slow volume never
//! stalls the UI thread. Watch bookkeeping and directory lookups are answered
//! inline.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use strum::{Display, EnumString};

use super::{Outcome, Services};
use crate::envelope::{Envelope, required};
use crate::error::{BridgeError, DIRECTORY_UNAVAILABLE};
use crate::watch::WatchEntry;

pub(crate) const DOMAIN: &str = "fs";

/// Actions understood by the `fs` domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub(crate) enum FsAction {
    ReadFile,
    WriteFile,
    AppendFile,
    DeleteFile,
    Mkdir,
    Rmdir,
    Copy,
    Move,
    Exists,
    Stat,
    ReadDir,
    Watch,
    Unwatch,
    GetHomeDir,
    GetTempDir,
    GetAppDataDir,
}

#[derive(Debug, Default, Deserialize)]
struct FsArgs {
    path: Option<String>,
    content: Option<String>,
    src: Option<String>,
    dest: Option<String>,
    id: Option<String>,
    #[serde(default)]
    recursive: bool,
}

pub(crate) fn handle(services: &mut Services, envelope: &Envelope) -> Result<Outcome, BridgeError> {
    let action = FsAction::from_str(&envelope.action)
        .map_err(|_| BridgeError::unknown_action(DOMAIN, envelope.action.as_str()))?;
    let args: FsArgs = envelope.arguments()?;
    let fs = Arc::clone(&services.filesystem);

    match action {
        FsAction::ReadFile => {
            let path = required(args.path, "path")?;
            Ok(deferred(move || {
                fs.read(Path::new(&path))
                    .map(Value::String)
                    .map_err(|error| BridgeError::from_io(path.as_str(), &error))
            }))
        }
        FsAction::WriteFile | FsAction::AppendFile => {
            let path = required(args.path, "path")?;
            let content = required(args.content, "content")?;
            let append = action == FsAction::AppendFile;
            Ok(deferred(move || {
                let target = Path::new(&path);
                let written = if append {
                    fs.append(target, &content)
                } else {
                    fs.write(target, &content)
                };
                acknowledge(written, &path)
            }))
        }
        FsAction::DeleteFile => {
            let path = required(args.path, "path")?;
            Ok(deferred(move || {
                acknowledge(fs.remove_file(Path::new(&path)), &path)
            }))
        }
        FsAction::Mkdir | FsAction::Rmdir => {
            let path = required(args.path, "path")?;
            let recursive = args.recursive;
            let create = action == FsAction::Mkdir;
            Ok(deferred(move || {
                let target = Path::new(&path);
                let result = if create {
                    fs.create_dir(target, recursive)
                } else {
                    fs.remove_dir(target, recursive)
                };
                acknowledge(result, &path)
            }))
        }
        FsAction::Copy | FsAction::Move => {
            let src = required(args.src, "src")?;
            let dest = required(args.dest, "dest")?;
            let copy = action == FsAction::Copy;
            Ok(deferred(move || {
                let (from, to) = (Path::new(&src), Path::new(&dest));
                let result = if copy {
                    fs.copy(from, to)
                } else {
                    fs.rename(from, to)
                };
                acknowledge(result, &src)
            }))
        }
        FsAction::Exists => {
            let path = required(args.path, "path")?;
            Ok(deferred(move || Ok(Value::Bool(fs.exists(Path::new(&path))))))
        }
        FsAction::Stat => {
            let path = required(args.path, "path")?;
            Ok(deferred(move || {
                let stat = fs
                    .metadata(Path::new(&path))
                    .map_err(|error| BridgeError::from_io(path.as_str(), &error))?;
                serde_json::to_value(stat).map_err(|error| BridgeError::native(path, error.to_string()))
            }))
        }
        FsAction::ReadDir => {
            let path = required(args.path, "path")?;
            Ok(deferred(move || {
                let entries = fs
                    .list(Path::new(&path))
                    .map_err(|error| BridgeError::from_io(path.as_str(), &error))?;
                serde_json::to_value(entries)
                    .map_err(|error| BridgeError::native(path, error.to_string()))
            }))
        }
        FsAction::Watch => {
            let id = required(args.id, "id")?;
            let path = required(args.path, "path")?;
            services.watches.register(WatchEntry {
                id,
                path,
                callback_id: envelope.callback_id.clone(),
                recursive: args.recursive,
            });
            Ok(Outcome::ready(Value::Bool(true)))
        }
        FsAction::Unwatch => {
            let id = required(args.id, "id")?;
            services.watches.remove(&id);
            Ok(Outcome::ready(Value::Bool(true)))
        }
        FsAction::GetHomeDir => directory(action, services.directories.home_dir()),
        FsAction::GetTempDir => directory(action, services.directories.temp_dir()),
        FsAction::GetAppDataDir => directory(
            action,
            services.directories.app_data_dir(&services.app_name),
        ),
    }
}

fn deferred<F>(job: F) -> Outcome
where
    F: FnOnce() -> Result<Value, BridgeError> + Send + 'static,
{
    Outcome::Deferred(Box::new(job))
}

fn acknowledge(result: std::io::Result<()>, path: &str) -> Result<Value, BridgeError> {
    result
        .map(|()| Value::Bool(true))
        .map_err(|error| BridgeError::from_io(path, &error))
}

fn directory(action: FsAction, resolved: Option<PathBuf>) -> Result<Outcome, BridgeError> {
    resolved
        .map(|path| Outcome::ready(Value::String(path.to_string_lossy().into_owned())))
        .ok_or_else(|| BridgeError::native(action.to_string(), DIRECTORY_UNAVAILABLE))
}

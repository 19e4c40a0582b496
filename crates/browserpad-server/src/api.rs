//! Request routing and action handlers.

use std::fmt;
use std::sync::Arc;

use browserpad_core::{DeleteOutcome, FileVault, VaultError, VaultResult};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response};
use serde_json::json;

use crate::error::ApiError;
use crate::request::{body_action, read_body, required, Params};
use crate::response::Reply;

/// Shared state handed to every request.
pub(crate) struct AppState {
    pub vault: Arc<FileVault>,
    pub allowed_origin: HeaderValue,
    pub max_body_bytes: usize,
}

/// An action of the `/api/files` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Read,
    Write,
    Create,
    Delete,
    Mkdir,
    Rename,
    TrashList,
    Restore,
    EmptyTrash,
    Purge,
}

impl Action {
    /// Every action, in the order they are advertised to clients.
    pub const ALL: [Action; 11] = [
        Self::List,
        Self::Read,
        Self::Write,
        Self::Create,
        Self::Delete,
        Self::Mkdir,
        Self::Rename,
        Self::TrashList,
        Self::Restore,
        Self::EmptyTrash,
        Self::Purge,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Read => "read",
            Self::Write => "write",
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Mkdir => "mkdir",
            Self::Rename => "rename",
            Self::TrashList => "trash_list",
            Self::Restore => "restore",
            Self::EmptyTrash => "empty_trash",
            Self::Purge => "purge",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// The only HTTP method this action accepts.
    pub fn method(self) -> Method {
        match self {
            Self::List | Self::Read | Self::TrashList => Method::GET,
            _ => Method::POST,
        }
    }

    /// Whether the action takes its parameters from a JSON body.
    fn reads_body(self) -> bool {
        !matches!(
            self,
            Self::List | Self::Read | Self::TrashList | Self::EmptyTrash
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn unknown_action() -> ApiError {
    let names: Vec<&str> = Action::ALL.iter().map(|a| a.name()).collect();
    ApiError::bad_request(format!("Invalid action. Supported: {}", names.join(", ")))
}

/// Handle one HTTP request.
pub(crate) async fn handle(state: Arc<AppState>, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let reply = if method == Method::OPTIONS {
        Reply::preflight()
    } else {
        let result = match path.as_str() {
            "/api/files" | "/api/files.php" => files_endpoint(&state, req).await,
            "/api/save" | "/api/save.php" => save_endpoint(&state, req).await,
            _ => Err(ApiError::not_found("Endpoint not found")),
        };
        result.unwrap_or_else(Reply::from)
    };

    tracing::debug!(%method, %path, status = reply.status().as_u16(), "Handled request");
    reply.into_response(&state.allowed_origin)
}

async fn files_endpoint(state: &AppState, req: Request<Incoming>) -> Result<Reply, ApiError> {
    let method = req.method().clone();
    let query = Params::from_query(req.uri().query());
    let body = if method == Method::POST {
        read_body(req.into_body(), state.max_body_bytes).await?
    } else {
        Bytes::new()
    };

    let mut name = query.action.clone().filter(|a| !a.is_empty());
    if name.is_none() && method == Method::POST {
        name = body_action(&body);
    }
    let action = name
        .as_deref()
        .and_then(Action::parse)
        .ok_or_else(unknown_action)?;

    if method != action.method() {
        return Err(ApiError::method_not_allowed(format!(
            "Use {} for {action} action",
            action.method()
        )));
    }

    let params = if action.reads_body() {
        Params::from_json(&body)?
    } else {
        query
    };
    dispatch(&state.vault, action, params).await
}

async fn dispatch(vault: &Arc<FileVault>, action: Action, params: Params) -> Result<Reply, ApiError> {
    match action {
        Action::List => {
            let dir = params.dir.unwrap_or_default();
            let files = run(vault, move |v| v.list(&dir)).await?;
            Ok(Reply::ok("Files listed").with(json!({ "files": files })))
        }
        Action::Read => {
            let file = required(params.file.as_ref())
                .ok_or_else(|| ApiError::bad_request("Missing file parameter"))?
                .to_string();
            let read = {
                let file = file.clone();
                run(vault, move |v| v.read(&file)).await?
            };
            Ok(Reply::ok("File read").with(json!({
                "content": content_text(&file, read.content),
                "filename": read.name,
                "size": read.size,
            })))
        }
        Action::Write => {
            let file = required(params.file.as_ref())
                .ok_or_else(|| ApiError::bad_request("Missing file parameter"))?
                .to_string();
            let content = params.content.unwrap_or_default();
            let written = run(vault, move |v| v.write(&file, content.as_bytes())).await?;
            Ok(Reply::ok("File saved successfully").with(json!({
                "filename": written.name,
                "size": written.size,
                "modified": written.modified,
            })))
        }
        Action::Create => {
            let filename = required(params.filename.as_ref())
                .ok_or_else(|| ApiError::bad_request("Missing filename parameter"))?
                .to_string();
            let dir = params.dir.unwrap_or_default();
            let content = params.content.unwrap_or_default();
            let created = run(vault, move |v| v.create(&dir, &filename, content.as_bytes())).await?;
            Ok(Reply::ok("File created successfully").with(json!({
                "filename": created.name,
                "path": created.path,
                "size": created.size,
                "modified": created.modified,
            })))
        }
        Action::Delete => {
            let file = required(params.file.as_ref())
                .ok_or_else(|| ApiError::bad_request("Missing file parameter"))?
                .to_string();
            let permanent = params.permanent;
            match run(vault, move |v| v.delete(&file, permanent)).await? {
                DeleteOutcome::Trashed { name, trash_path } => Ok(Reply::ok("Moved to trash").with(json!({
                    "name": name,
                    "trash_path": trash_path,
                    "recoverable": true,
                }))),
                DeleteOutcome::Removed { name, kind } if kind.is_dir() => {
                    Ok(Reply::ok("Directory permanently deleted").with(json!({ "dirname": name })))
                }
                DeleteOutcome::Removed { name, .. } => {
                    Ok(Reply::ok("File permanently deleted").with(json!({ "filename": name })))
                }
            }
        }
        Action::Mkdir => {
            let dirname = required(params.dirname.as_ref())
                .ok_or_else(|| ApiError::bad_request("Missing dirname parameter"))?
                .to_string();
            let parent = params.parent.unwrap_or_default();
            let created = match spawn_vault(vault, move |v| v.mkdir(&parent, &dirname)).await? {
                Ok(created) => created,
                Err(VaultError::InvalidDirectory { .. }) => {
                    return Err(ApiError::bad_request("Invalid parent directory path"));
                }
                Err(e) => return Err(e.into()),
            };
            Ok(Reply::ok("Directory created successfully").with(json!({
                "dirname": created.name,
                "path": created.path,
            })))
        }
        Action::Rename => {
            let (Some(file), Some(new_name)) = (
                required(params.file.as_ref()),
                required(params.newname.as_ref()),
            ) else {
                return Err(ApiError::bad_request("Missing file or newname parameter"));
            };
            let (file, new_name) = (file.to_string(), new_name.to_string());
            let renamed = run(vault, move |v| v.rename(&file, &new_name)).await?;
            Ok(Reply::ok("Renamed successfully").with(json!({
                "oldname": renamed.old_name,
                "newname": renamed.new_name,
                "path": renamed.path,
            })))
        }
        Action::TrashList => {
            let files = run(vault, FileVault::trash_list).await?;
            let message = if files.is_empty() { "Trash is empty" } else { "Trash contents" };
            Ok(Reply::ok(message).with(json!({ "files": files })))
        }
        Action::Restore => {
            let file = required(params.file.as_ref())
                .ok_or_else(|| ApiError::bad_request("Missing file parameter"))?
                .to_string();
            let restored = run(vault, move |v| v.restore(&file)).await?;
            Ok(Reply::ok("File restored").with(json!({
                "name": restored.name,
                "path": restored.path,
            })))
        }
        Action::Purge => {
            let file = required(params.file.as_ref())
                .ok_or_else(|| ApiError::bad_request("Missing file parameter"))?
                .to_string();
            let purged = run(vault, move |v| v.purge(&file)).await?;
            Ok(Reply::ok("Deleted from trash").with(json!({ "name": purged.name })))
        }
        Action::EmptyTrash => {
            let outcome = run(vault, FileVault::empty_trash).await?;
            if outcome.existed {
                Ok(Reply::ok("Trash emptied").with(json!({ "removed": outcome.removed })))
            } else {
                Ok(Reply::ok("Trash already empty").with(json!({ "removed": 0 })))
            }
        }
    }
}

async fn save_endpoint(state: &AppState, req: Request<Incoming>) -> Result<Reply, ApiError> {
    if req.method() != Method::POST {
        return Err(ApiError::method_not_allowed("Method not allowed. Use POST."));
    }
    let body = read_body(req.into_body(), state.max_body_bytes).await?;
    let params = Params::from_json(&body)?;

    let (Some(file), Some(content)) = (
        required(params.file.as_ref()),
        required(params.content.as_ref()),
    ) else {
        return Err(ApiError::bad_request("Missing required fields: file and content"));
    };
    let (file, content) = (file.to_string(), content.to_string());

    let saved = run(&state.vault, move |v| v.save(&file, content.as_bytes())).await?;
    let mut data = json!({
        "filename": saved.filename,
        "path": saved.path,
        "size": saved.size,
        "timestamp": saved.timestamp,
    });
    if let Some(backup) = saved.backup {
        data["backup"] = json!(backup);
    }
    Ok(Reply::ok("File saved successfully").with(data))
}

/// File content as a JSON string, replacing bytes that are not UTF-8.
fn content_text(file: &str, content: Vec<u8>) -> String {
    String::from_utf8(content).unwrap_or_else(|e| {
        tracing::warn!(
            file,
            valid_up_to = e.utf8_error().valid_up_to(),
            "File is not valid UTF-8, invalid bytes replaced in response"
        );
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}

/// Run a vault operation on the blocking pool.
async fn run<T, F>(vault: &Arc<FileVault>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&FileVault) -> VaultResult<T> + Send + 'static,
{
    spawn_vault(vault, op).await?.map_err(ApiError::from)
}

/// Like [`run`], but hands back the vault error unconverted.
async fn spawn_vault<T, F>(vault: &Arc<FileVault>, op: F) -> Result<VaultResult<T>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&FileVault) -> VaultResult<T> + Send + 'static,
{
    let vault = Arc::clone(vault);
    tokio::task::spawn_blocking(move || op(&vault))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Vault task failed");
            ApiError::internal("Internal server error")
        })
}

use actix_web::{web, HttpResponse, Responder};
use am_layers::{apply, preview, restore_from_backup, snippet, Shell as HookShell};
use serde::Deserialize;
use std::path::PathBuf;

use crate::state::AppState;

fn parse_shell(raw: &str) -> Option<HookShell> {
    match raw.to_lowercase().as_str() {
        "bash" => Some(HookShell::Bash),
        "zsh" => Some(HookShell::Zsh),
        "powershell" | "pwsh" => Some(HookShell::PowerShell),
        _ => None,
    }
}

/// `POST /api/am/install-hooks` -> generate the installer snippet for the
/// platform default shell and report it without touching the filesystem;
/// returns `{success, path, content}` (§6). The "path" is where `apply`
/// would write it, not a path written by this call.
pub async fn install() -> impl Responder {
    let shell = HookShell::Bash;
    let content = preview(shell);
    let path = dirs::home_dir()
        .map(|home| home.join(".bashrc"))
        .unwrap_or_else(|| PathBuf::from("~/.bashrc"));

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "path": path.display().to_string(),
        "content": content,
    }))
}

#[derive(Deserialize)]
pub struct ApplyHooksRequest {
    pub shell: String,
    #[serde(default)]
    pub preview: bool,
}

/// `POST /api/am/apply-hooks` — `{shell, preview}`; with `preview:true`
/// returns `{snippet}` without touching the filesystem; with
/// `preview:false` backs up the rc file, appends the snippet, and returns
/// `{success, path, backup}` (§6, §4.7).
pub async fn apply_hooks(
    state: web::Data<AppState>,
    req: web::Json<ApplyHooksRequest>,
) -> impl Responder {
    let Some(shell) = parse_shell(&req.shell) else {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "error": format!("unknown shell: {}", req.shell),
        }));
    };

    if req.preview {
        return HttpResponse::Ok().json(serde_json::json!({ "snippet": snippet(shell) }));
    }

    match apply(&state.bus, shell).await {
        Ok(applied) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "path": applied.target_path.display().to_string(),
            "backup": applied.backup_path.display().to_string(),
        })),
        Err(err) => {
            tracing::warn!(error = %err, "apply-hooks failed");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": err.to_string(),
            }))
        }
    }
}

#[derive(Deserialize)]
pub struct RestoreHooksRequest {
    pub backup: PathBuf,
    pub target: PathBuf,
}

/// `POST /api/am/restore-hooks` — `{backup, target}` -> restore a prior rc
/// file byte-for-byte; returns `{success, restored}` (§6, §4.7A).
pub async fn restore_hooks(req: web::Json<RestoreHooksRequest>) -> impl Responder {
    match restore_from_backup(&req.backup, &req.target).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "restored": req.target.display().to_string(),
        })),
        Err(err) => {
            tracing::warn!(error = %err, "restore-hooks failed");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": err.to_string(),
            }))
        }
    }
}

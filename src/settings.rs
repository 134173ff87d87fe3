//! Merges CLI arguments, the optional config file and built-in defaults.
//!
//! Precedence: CLI/env > config file > default.

use anyhow::{Context, Result};
use ecodms_export::app_config::FileConfig;
use ecodms_export::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_ARCHIVE_ID, DEFAULT_HOST, DEFAULT_NAME_TEMPLATE, DEFAULT_PORT,
    READ_TIMEOUT_SECS,
};
use ecodms_export::{
    Credentials, EcoDmsClient, ExportOptions, ExportSettings, FetchFailurePolicy, NameTemplate,
    Timeouts,
};

use crate::cli::Args;

/// Whether debug logging is on.
pub(crate) fn debug_enabled(args: &Args, file: Option<&FileConfig>) -> bool {
    args.debug_flag()
        .or_else(|| file.and_then(|f| f.debug))
        .unwrap_or(false)
}

/// Builds the export settings for this run.
pub(crate) fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Result<ExportSettings> {
    let host = args
        .host
        .clone()
        .or_else(|| file.and_then(|f| f.host.clone()))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = args
        .port
        .or_else(|| file.and_then(|f| f.port))
        .unwrap_or(DEFAULT_PORT);
    let user = args
        .user
        .clone()
        .or_else(|| file.and_then(|f| f.user.clone()))
        .context("missing user: pass --user, set ECODMS_USER, or add `user` to the config file")?;
    let archive_id = args
        .archive_id
        .or_else(|| file.and_then(|f| f.archive_id))
        .unwrap_or(DEFAULT_ARCHIVE_ID);
    let cache_dir = args
        .cache_dir
        .clone()
        .or_else(|| file.and_then(|f| f.cache_dir.clone()));
    let template_text = args
        .name_template
        .clone()
        .or_else(|| file.and_then(|f| f.name_template.clone()))
        .unwrap_or_else(|| DEFAULT_NAME_TEMPLATE.to_string());
    let template = NameTemplate::parse(&template_text).context("invalid name template")?;
    let export_json = args
        .export_json_flag()
        .or_else(|| file.and_then(|f| f.export_json))
        .unwrap_or(false);
    let timeouts = Timeouts {
        connect_secs: args
            .connect_timeout
            .or_else(|| file.and_then(|f| f.connect_timeout_secs))
            .unwrap_or(CONNECT_TIMEOUT_SECS),
        read_secs: args
            .read_timeout
            .or_else(|| file.and_then(|f| f.read_timeout_secs))
            .unwrap_or(READ_TIMEOUT_SECS),
    };
    let export_root = std::path::absolute(&args.export_dir).with_context(|| {
        format!(
            "cannot resolve export directory '{}'",
            args.export_dir.display()
        )
    })?;
    let fetch_failure_policy = if args.strict {
        FetchFailurePolicy::Abort
    } else {
        FetchFailurePolicy::Continue
    };

    Ok(ExportSettings {
        base_url: EcoDmsClient::endpoint_url(&host, port),
        archive_id,
        credentials: Credentials {
            user,
            password: args.password.clone(),
        },
        timeouts,
        cache_dir,
        options: ExportOptions {
            export_root,
            template,
            export_json,
            fetch_failure_policy,
        },
    })
}

//! 🪣 bpk: open a session against an S3-compatible store, load one CSV, print ten rows, leave.
//!
//! 🚰 Session::open → loader::load_csv → previewer::show → Session::stop
//!
//! The stop happens on every exit path: `execute` always stops the session before handing back
//! whatever the load and preview produced, and `Drop` covers the paths that never get that far.

pub mod app_config;
pub mod backends;
pub mod errors;
pub mod frame;
pub mod loader;
pub mod previewer;
pub mod resource;
pub mod session;

use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use crate::app_config::AppConfig;
use crate::frame::Frame;
use crate::loader::CsvReadOptions;
use crate::previewer::ShowOptions;
use crate::resource::ResourcePath;
use crate::session::Session;

pub use crate::errors::PeekError;

/// 🚀 The whole program: open, load, show, stop. Preview goes to stdout.
pub async fn run(app_config: AppConfig) -> Result<()> {
    let the_path = app_config
        .resource
        .resolve()
        .context("💀 The [resource] section does not describe a valid object path")?;

    let the_session = Session::open(&app_config.app_name, app_config.session.clone())
        .await
        .context(format!(
            "💀 Could not open a session against {}. Is the object store up, and are the keys right?",
            app_config.session.endpoint
        ))?;

    let mut the_stdout = std::io::stdout();
    execute(
        the_session,
        &the_path,
        &app_config.load,
        &app_config.preview,
        &mut the_stdout,
    )
    .await
    .map(|_| ())
}

/// 🎬 Load + preview inside an already open session, then stop it no matter how that went.
///
/// 📐 Open question settled: a failed load or preview does a full cleanup (the session is
/// stopped) and then the load or preview error is returned. A failure to stop is only reported when
/// nothing failed before it.
pub async fn execute<W: Write>(
    mut session: Session,
    path: &ResourcePath,
    load: &CsvReadOptions,
    preview: &ShowOptions,
    out: &mut W,
) -> Result<Frame> {
    let the_outcome = async {
        let the_frame = loader::load_csv(&session, path, load)
            .await
            .context(format!("💀 Loading {path} failed"))?;
        previewer::show(&the_frame, preview, out)
            .context("💀 Writing the preview failed. stdout closed on us?")?;
        Ok::<_, anyhow::Error>(the_frame)
    }
    .await;

    let the_stop = session
        .stop()
        .context(format!("💀 Stopping session '{}' failed", session.app_name()));

    let the_frame = the_outcome?;
    the_stop?;
    info!(
        "✅ previewed {} of {} row(s) from {}",
        preview.max_rows.min(the_frame.row_count()),
        the_frame.row_count(),
        path
    );
    Ok(the_frame)
}

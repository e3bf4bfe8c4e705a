//! Version command

use anyhow::Result;

use crate::app::AppContext;
use crate::output::human::HumanRenderer;
use crate::output::json;

/// Run the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(app: &AppContext) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    if app.is_json() {
        println!("{}", json::format_value(&serde_json::json!({ "version": version }))?);
    } else {
        HumanRenderer::new(&app.output).render_version(version);
    }
    Ok(())
}

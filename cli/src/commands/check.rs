//! Check command: validates the inventory without connecting anywhere.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::InventoryStore as _;
use crate::output::human::HumanRenderer;
use crate::output::json;

/// Load and build the inventory, then summarize it.
///
/// # Errors
///
/// Returns the validation error if the inventory is invalid.
pub fn run(app: &AppContext) -> Result<()> {
    let path = app.store.path()?;
    let inventory = app.inventory()?;
    if app.is_json() {
        let summary = serde_json::json!({
            "valid": true,
            "path": path.display().to_string(),
            "agents": inventory.agents.names(),
            "tasks": inventory.tasks.names(),
            "session_timeout_secs": inventory.settings.session_timeout_secs,
        });
        println!("{}", json::format_value(&summary)?);
    } else {
        HumanRenderer::new(&app.output).render_check(&path, &inventory);
    }
    Ok(())
}

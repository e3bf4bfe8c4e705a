//! Agents command

use anyhow::Result;

use crate::app::AppContext;
use crate::output::human::HumanRenderer;
use crate::output::json;

/// List every agent and group in registration order.
///
/// # Errors
///
/// Returns an error if the inventory cannot be loaded.
pub fn run(app: &AppContext) -> Result<()> {
    let inventory = app.inventory()?;
    if app.is_json() {
        println!("{}", json::format_value(&json::agent_views(&inventory.agents))?);
    } else {
        HumanRenderer::new(&app.output).render_agents(&inventory.agents);
    }
    Ok(())
}

//! Tasks command

use anyhow::Result;

use crate::app::AppContext;
use crate::output::human::HumanRenderer;
use crate::output::json;

/// List every task in registration order.
///
/// # Errors
///
/// Returns an error if the inventory cannot be loaded.
pub fn run(app: &AppContext) -> Result<()> {
    let inventory = app.inventory()?;
    if app.is_json() {
        println!("{}", json::format_value(&json::task_views(&inventory.tasks))?);
    } else {
        HumanRenderer::new(&app.output).render_tasks(&inventory.tasks);
    }
    Ok(())
}

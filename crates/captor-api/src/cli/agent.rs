//! Agent listing command.

use anyhow::{Result, anyhow};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use captor_core::repository::user::UserRepository;
use captor_infra::sqlite::user::SqliteUserRepository;
use captor_types::agent::AgentDetail;
use captor_types::page::PageRequest;

use crate::state::AppState;

/// List every agent owned by the user with `email`, newest first.
pub async fn list_agents(state: &AppState, email: &str, json: bool) -> Result<()> {
    let users = SqliteUserRepository::new(state.db_pool.clone());
    let user = users
        .get_by_email(email.trim())
        .await?
        .ok_or_else(|| anyhow!("no user registered with email '{email}'"))?;

    let page = state
        .agent_service
        .list_agents(user.id, PageRequest::default())
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.items.is_empty() {
        println!();
        println!(
            "  {} {} has no agents yet.",
            style("i").blue().bold(),
            style(&user.name).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Schema").fg(Color::White),
        Cell::new("Fields").fg(Color::White),
        Cell::new("Chat URL").fg(Color::White),
        Cell::new("Sessions").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for detail in &page.items {
        table.add_row(agent_row(detail));
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} of {} agent{}",
        style(page.items.len()).bold(),
        page.total,
        if page.total == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn agent_row(detail: &AgentDetail) -> Vec<Cell> {
    let (schema, fields) = match &detail.data_schema {
        Some(schema) => (schema.schema_type.to_string(), schema.fields.len().to_string()),
        None => ("-".to_string(), "0".to_string()),
    };

    let chat_url = match &detail.agent.chat_url {
        Some(url) => Cell::new(url).fg(Color::Green),
        None => Cell::new("unpublished").fg(Color::DarkGrey),
    };

    vec![
        Cell::new(detail.agent.id),
        Cell::new(&detail.agent.name).fg(Color::Cyan),
        Cell::new(schema),
        Cell::new(fields),
        chat_url,
        Cell::new(detail.chat_sessions.len()),
        Cell::new(detail.agent.created_at.format("%Y-%m-%d %H:%M")).fg(Color::DarkGrey),
    ]
}

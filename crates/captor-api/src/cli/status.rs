//! System status dashboard command.

use anyhow::Result;
use console::style;

use captor_core::chat::repository::ChatRepository;
use captor_core::repository::agent::AgentRepository;
use captor_types::page::PageRequest;

use crate::state::AppState;

/// Display system status dashboard.
///
/// Shows user, agent, session, and message counts plus storage info.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let users = state.user_service.list_users(PageRequest::new(0, 1)).await?.total;
    let agents = state.agent_service.agent_repo().count().await?;
    let chat_repo = state.conversation_service.chat_repo();
    let sessions = chat_repo.count_sessions().await?;
    let messages = chat_repo.count_messages().await?;

    if json {
        let status = serde_json::json!({
            "app_name": state.app_name,
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "users": users,
            "agents": agents,
            "sessions": sessions,
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} v{}",
        style("⚡").bold(),
        state.app_name,
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("  {}", style("── Accounts ──").dim());
    println!("  Users:    {}", style(users).bold());
    println!("  Agents:   {}", style(agents).bold());
    println!();

    println!("  {}", style("── Conversations ──").dim());
    println!("  Sessions: {}", style(sessions).green());
    println!("  Messages: {}", style(messages).green());
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir: {}", style(state.data_dir.display()).dim());
    println!("  Database: {}", style("SQLite (WAL mode)").dim());
    println!();

    Ok(())
}

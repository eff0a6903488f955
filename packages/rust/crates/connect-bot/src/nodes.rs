use std::path::{Path, PathBuf};

use anyhow::Result;

use connect_bot::{BotConfig, RuntimeSettings, run_server};

pub(crate) async fn run_serve_mode(
    bind: Option<String>,
    menu: Option<PathBuf>,
    files_dir: Option<PathBuf>,
    runtime_settings: &RuntimeSettings,
) -> Result<()> {
    let mut config = BotConfig::from_settings(runtime_settings)?;
    if let Some(bind) = bind {
        config.bind = bind;
    }
    if let Some(menu) = menu {
        config.menu_path = menu;
    }
    if let Some(files_dir) = files_dir {
        config.files_dir = files_dir;
    }
    run_server(config).await
}

pub(crate) fn run_check_menu(path: &Path) -> Result<()> {
    let menu = connect_menu::load_menu_config(path)?;
    let dangling = menu.dangling_gotos();
    let mut ids: Vec<&String> = menu.menus.keys().collect();
    ids.sort();
    println!("menus: {}", ids.len());
    for id in ids {
        let buttons = menu.menu(id).map_or(0, |m| m.buttons.len());
        println!("  {id} ({buttons} buttons)");
    }
    println!("knowledge base fallback: {}", menu.use_qna.enabled);
    if dangling.is_empty() {
        println!("ok");
        return Ok(());
    }
    for (menu_id, target) in &dangling {
        println!("unknown target: {menu_id} -> {target}");
    }
    anyhow::bail!("{} button(s) point at unknown menus", dangling.len())
}

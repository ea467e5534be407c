use infra_config::ConfigManager;

pub fn save(config: &ConfigManager, name: &str, value: &str) -> anyhow::Result<()> {
    match config.save(name, value)? {
        0 => {
            eprintln!("No remote row named {name}; nothing updated");
            Ok(())
        }
        _ => {
            println!("✓ Saved {name}");
            Ok(())
        }
    }
}

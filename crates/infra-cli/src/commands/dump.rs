use clap::ValueEnum;
use infra_config::ConfigManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

pub fn dump(config: &ConfigManager, prefix: &str, format: Format) -> anyhow::Result<()> {
    let params = config.params_with_prefix(prefix);
    match format {
        Format::Json => {
            let object: serde_json::Map<String, serde_json::Value> = params
                .into_iter()
                .map(|(name, value)| (name, serde_json::Value::String(value)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&object)?);
        }
        Format::Text => {
            for (name, value) in params {
                println!("{name}={value}");
            }
        }
    }
    Ok(())
}

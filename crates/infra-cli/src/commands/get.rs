use clap::ValueEnum;
use infra_config::{ConfigManager, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueKind {
    String,
    Int,
    Long,
    Bool,
    Float,
    Double,
    Byte,
    Short,
}

pub fn get(config: &ConfigManager, name: &str, kind: ValueKind) -> anyhow::Result<()> {
    println!("{}", render(config, name, kind)?);
    Ok(())
}

fn render(config: &ConfigManager, name: &str, kind: ValueKind) -> Result<String, ParseError> {
    Ok(match kind {
        ValueKind::String => config.get_as::<String>(name)?,
        ValueKind::Int => config.get_as::<i32>(name)?.to_string(),
        ValueKind::Long => config.get_as::<i64>(name)?.to_string(),
        ValueKind::Bool => config.get_as::<bool>(name)?.to_string(),
        ValueKind::Float => config.get_as::<f32>(name)?.to_string(),
        ValueKind::Double => config.get_as::<f64>(name)?.to_string(),
        ValueKind::Byte => config.get_as::<i8>(name)?.to_string(),
        ValueKind::Short => config.get_as::<i16>(name)?.to_string(),
    })
}

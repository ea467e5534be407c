use infra_config::ConfigOptions;
use infra_db::redb_driver::DRIVER_NAME;
use infra_db::{Backends, ConnectionManager, DirectStrategy, Statement};

pub fn seed(options: &ConfigOptions, url: &str, name: &str, value: &str) -> anyhow::Result<()> {
    let strategy = DirectStrategy {
        driver: DRIVER_NAME.to_string(),
        url: url.to_string(),
        user: String::new(),
        password: String::new(),
    };
    let connections = ConnectionManager::new(strategy.into(), &Backends::default())?
        .with_connect_timeout(options.connect_timeout());

    let table = options.remote_table.table_ref();
    let statement = Statement::InsertPair {
        table: table.clone(),
        name: name.trim().to_string(),
        value: Some(value.to_string()),
    };

    let mut conn = connections.create_connection()?;
    let result = conn.prepare(statement).and_then(|mut prepared| {
        let affected = prepared.execute_update();
        ConnectionManager::close_resources(None, Some(prepared), None);
        affected
    });
    ConnectionManager::close_resources(Some(conn), None, None);
    result?;

    println!("✓ Seeded {} into {table}", name.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use infra_config::ConfigManager;

    #[test]
    fn seeded_rows_are_visible_to_a_manager() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("redb:{}", dir.path().join("config.redb").display());
        let options = ConfigOptions::default();

        seed(&options, &url, "GREETING", "hello").unwrap();
        assert!(seed(&options, &url, "GREETING", "again").is_err());

        let local = dir.path().join("app.properties");
        std::fs::write(
            &local,
            format!(
                "CONFIG_LOAD_REMOTE=true\n\
                 CONFIG_JDBC_DATABASE_DRIVER=redb\n\
                 CONFIG_JDBC_DATABASE_URL={url}\n\
                 CONFIG_JDBC_DATABASE_USER=ops\n\
                 CONFIG_JDBC_DATABASE_PASS=ops\n"
            ),
        )
        .unwrap();

        let config = ConfigManager::new(
            ConfigOptions::with_local_files(local.display().to_string()),
            Backends::default(),
        );
        config.init().unwrap();
        assert_eq!(config.get("GREETING").as_deref(), Some("hello"));
    }
}

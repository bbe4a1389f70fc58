use estoque_core::config::{AppConfig, LoadOptions};

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => render(&config),
        Err(error) => format!("config: failed to load: {error}"),
    }
}

fn render(config: &AppConfig) -> String {
    let mut lines = Vec::new();

    lines.push("[store]".to_string());
    lines.push(format!("backend = {}", config.store.backend));
    lines.push(format!(
        "base_url = {}",
        config.store.base_url.as_deref().unwrap_or("(unset)")
    ));
    lines.push(format!("access_token = {}", redacted(config.store.access_token.is_some())));
    lines.push(format!("entries_table = {}", config.store.entries_table));
    lines.push(format!("sales_table = {}", config.store.sales_table));
    lines.push(format!("cache_ttl_secs = {}", config.store.cache_ttl_secs));
    lines.push(format!("timeout_secs = {}", config.store.timeout_secs));

    lines.push(String::new());
    lines.push("[auth]".to_string());
    lines.push("password = [redacted]".to_string());

    lines.push(String::new());
    lines.push("[server]".to_string());
    lines.push(format!("bind_address = {}", config.server.bind_address));
    lines.push(format!("port = {}", config.server.port));

    lines.push(String::new());
    lines.push("[logging]".to_string());
    lines.push(format!("level = {}", config.logging.level));
    lines.push(format!("format = {:?}", config.logging.format).to_lowercase());

    lines.join("\n")
}

fn redacted(present: bool) -> &'static str {
    if present {
        "[redacted]"
    } else {
        "(unset)"
    }
}

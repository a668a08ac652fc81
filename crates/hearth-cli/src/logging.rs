use tracing_subscriber::EnvFilter;

pub(crate) const DEFAULT_LEVEL: &str = "info";

/// Accepts a simple level (forgiving about casing and `warning`) or a full
/// `EnvFilter` directive string.
pub(crate) fn normalize_level_directives(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return DEFAULT_LEVEL.to_owned();
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "trace" => "trace".to_owned(),
        "debug" => "debug".to_owned(),
        "info" => "info".to_owned(),
        "warn" | "warning" => "warn".to_owned(),
        "error" => "error".to_owned(),
        "off" => "off".to_owned(),
        _ => trimmed.to_owned(),
    }
}

/// Builds the effective filter for `level`, merged with `RUST_LOG` when set.
pub(crate) fn env_filter(level: &str) -> EnvFilter {
    let config_directives = normalize_level_directives(level);
    let fallback = || {
        EnvFilter::try_new(&config_directives).unwrap_or_else(|_| {
            EnvFilter::default().add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    };

    let env_directives = std::env::var("RUST_LOG")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty());

    match env_directives {
        Some(env_directives) => {
            let combined = format!("{config_directives},{env_directives}");
            EnvFilter::try_new(combined)
                .or_else(|_| EnvFilter::try_new(env_directives))
                .unwrap_or_else(|_| fallback())
        }
        None => fallback(),
    }
}

/// Installs the global stderr subscriber. A second call is a no-op.
pub(crate) fn init(level: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(level));
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_levels_are_normalized() {
        assert_eq!(normalize_level_directives("WARNING"), "warn");
        assert_eq!(normalize_level_directives(" Debug "), "debug");
        assert_eq!(normalize_level_directives(""), DEFAULT_LEVEL);
    }

    #[test]
    fn directive_strings_pass_through() {
        assert_eq!(
            normalize_level_directives("hearth_home=trace,info"),
            "hearth_home=trace,info"
        );
    }
}

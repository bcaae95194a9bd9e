use url::{Host, Url};

/// Reduces user input such as `https://www.Example.com/blog?x=1` to the bare
/// host `example.com`. Internationalized names come back in punycode.
pub fn normalize_domain(input: &str) -> Result<String, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("Domain is required".to_string());
    }

    let invalid = || format!("'{}' is not a valid domain", trimmed);

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };
    let url = Url::parse(&candidate).map_err(|_| invalid())?;

    if !matches!(url.scheme(), "http" | "https")
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return Err(invalid());
    }

    let host = match url.host() {
        Some(Host::Domain(host)) => host,
        _ => return Err(invalid()),
    };
    let host = host.trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);

    let labels_ok = host.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !labels_ok || !host.contains('.') {
        return Err(invalid());
    }

    Ok(host.to_string())
}

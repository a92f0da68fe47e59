use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;

/// Production root of the AQS Data Mart API.
pub const DEFAULT_URL: &str = "https://aqs.epa.gov/data/api";

const RC_FILE: &str = ".aqsrc";

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    email: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
}

pub(crate) fn load_config(
    url: Option<String>,
    email: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    resolve_config(
        url,
        email,
        key,
        verify,
        |name| std::env::var(name).ok(),
        &rc_candidates(),
    )
}

fn resolve_config(
    url: Option<String>,
    email: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
    env: impl Fn(&str) -> Option<String>,
    rc_candidates: &[PathBuf],
) -> Result<ClientConfig> {
    let mut url = url.or_else(|| env("AQS_URL"));
    let mut email = email.or_else(|| env("AQS_EMAIL"));
    let mut key = key.or_else(|| env("AQS_KEY"));
    let mut file_verify: Option<bool> = None;

    if url.is_none() || email.is_none() || key.is_none() || verify.is_none() {
        for rc_path in rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;
                tracing::debug!(path = %rc_path.display(), "loaded AQS configuration file");

                url = url.or(cfg.url);
                email = email.or(cfg.email);
                key = key.or(cfg.key);
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let Some(email) = email else {
        bail!("{}", missing("email", "AQS_EMAIL", rc_candidates));
    };
    let Some(key) = key else {
        bail!("{}", missing("key", "AQS_KEY", rc_candidates));
    };
    let url = url.unwrap_or_else(|| DEFAULT_URL.to_string());
    let verify = verify.or(file_verify).unwrap_or(true);

    Ok(ClientConfig {
        url,
        email,
        key,
        verify,
    })
}

fn missing(field: &str, var: &str, rc_candidates: &[PathBuf]) -> String {
    if rc_candidates.is_empty() {
        return format!(
            "Missing configuration: {} (set {} or create {})",
            field, var, RC_FILE
        );
    }
    format!(
        "Missing configuration: {} (set {} or put `{}:` in one of: {})",
        field,
        var,
        field,
        rc_candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // `key:` may sit alone on a line with the value on the next one.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(pk) = pending_key.take() {
            if !line.contains(':') || (pk == "url" && line.contains("://")) {
                cfg.set(pk, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            match k {
                "url" | "email" | "key" => {
                    if v.is_empty() {
                        pending_key = Some(k);
                    } else {
                        cfg.set(k, v);
                    }
                }
                "verify" => {
                    if !v.is_empty() {
                        cfg.verify = Some(v != "0");
                    }
                }
                _ => {}
            }
        }
    }

    cfg
}

impl RcConfig {
    fn set(&mut self, field: &str, value: &str) {
        let value = Some(value.to_string());
        match field {
            "url" => self.url = value,
            "email" => self.email = value,
            "key" => self.key = value,
            _ => {}
        }
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // 1) AQS_RC (explicit)
    // 2) ./.aqsrc
    // 3) ~/.aqsrc
    if let Ok(p) = std::env::var("AQS_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(RC_FILE));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(RC_FILE));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn rc_file(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parses_values_quotes_and_continuation_lines() {
        let cfg = parse_rc(
            "# AQS account\n\
             email: \"me@example.com\"\n\
             key:\n\
             \x20 tealfox42\n\
             url: https://aqs.example.test/data/api\n\
             verify: 0\n",
        );
        assert_eq!(cfg.email.as_deref(), Some("me@example.com"));
        assert_eq!(cfg.key.as_deref(), Some("tealfox42"));
        assert_eq!(cfg.url.as_deref(), Some("https://aqs.example.test/data/api"));
        assert_eq!(cfg.verify, Some(false));
    }

    #[test]
    fn url_value_on_next_line_keeps_its_scheme() {
        let cfg = parse_rc("url:\nhttps://aqs.example.test/api\n");
        assert_eq!(cfg.url.as_deref(), Some("https://aqs.example.test/api"));
    }

    #[test]
    fn explicit_arguments_beat_environment_and_file() {
        let rc = rc_file("email: file@example.com\nkey: filekey\n");
        let env: HashMap<&str, &str> = [("AQS_EMAIL", "env@example.com")].into();
        let cfg = resolve_config(
            None,
            None,
            Some("argkey".into()),
            None,
            |name| env.get(name).map(|s| s.to_string()),
            &[rc.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(cfg.email, "env@example.com");
        assert_eq!(cfg.key, "argkey");
        assert_eq!(cfg.url, DEFAULT_URL);
        assert!(cfg.verify);
    }

    #[test]
    fn first_existing_rc_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join("nope");
        let rc = rc_file("email: a@b.c\nkey: k\nverify: 0\n");
        let cfg = resolve_config(
            None,
            None,
            None,
            None,
            no_env,
            &[absent, rc.path().to_path_buf()],
        )
        .unwrap();
        assert_eq!(cfg.email, "a@b.c");
        assert!(!cfg.verify);
    }

    #[test]
    fn missing_key_names_searched_files() {
        let dir = tempfile::tempdir().unwrap();
        let absent = dir.path().join(".aqsrc");
        let err = resolve_config(
            None,
            Some("me@example.com".into()),
            None,
            None,
            no_env,
            &[absent.clone()],
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Missing configuration: key"));
        assert!(msg.contains(&absent.display().to_string()));
    }
}

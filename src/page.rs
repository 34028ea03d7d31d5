//! The single HTML page hosting the chat form.

use std::path::PathBuf;

pub const CLIENT_SCRIPT: &str = include_str!("../assets/client.js");
pub const CLIENT_STYLE: &str = include_str!("../assets/client.css");

/// Where the browser loads the client bundle from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetMode {
    /// Bundle compiled into the binary, served under `/assets`.
    Embedded,
    /// Built bundle on disk; `<dir>/client` is served under `/client`.
    Directory(PathBuf),
}

impl AssetMode {
    pub fn script_path(&self) -> &'static str {
        match self {
            AssetMode::Embedded => "/assets/client.js",
            AssetMode::Directory(_) => "/client/client.js",
        }
    }

    pub fn style_path(&self) -> &'static str {
        match self {
            AssetMode::Embedded => "/assets/client.css",
            AssetMode::Directory(_) => "/client/client.css",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPage {
    html: String,
}

impl IndexPage {
    pub fn new(has_paid_key: bool, assets: &AssetMode) -> Self {
        Self {
            html: render(has_paid_key, assets),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

fn render(has_paid_key: bool, assets: &AssetMode) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Does it work?</title>
    <link rel="stylesheet" href="{style}" />
  </head>
  <body>
    <main class="page">
      <h1>Does it work?</h1>
      <div id="root"></div>
    </main>
    <script>window.HAS_PAID_KEY = {has_paid_key};</script>
    <script type="module" src="{script}"></script>
  </body>
</html>
"#,
        style = assets.style_path(),
        script = assets.script_path(),
        has_paid_key = has_paid_key,
    )
}

/// Read the boot-time paid-key flag back out of a served page.
pub fn paid_key_flag(html: &str) -> Option<bool> {
    let rest = &html[html.find("window.HAS_PAID_KEY")?..];
    let value = rest[rest.find('=')? + 1..].trim_start();
    if value.starts_with("true") {
        Some(true)
    } else if value.starts_with("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_embedded_in_page() {
        let page = IndexPage::new(true, &AssetMode::Embedded);
        assert!(page.html().contains("window.HAS_PAID_KEY = true;"));
        assert_eq!(paid_key_flag(page.html()), Some(true));

        let page = IndexPage::new(false, &AssetMode::Embedded);
        assert_eq!(paid_key_flag(page.html()), Some(false));
    }

    #[test]
    fn test_asset_paths_follow_mode() {
        let dev = IndexPage::new(false, &AssetMode::Embedded);
        assert!(dev.html().contains(r#"src="/assets/client.js""#));
        assert!(dev.html().contains(r#"href="/assets/client.css""#));

        let prod = IndexPage::new(false, &AssetMode::Directory(PathBuf::from("./dist")));
        assert!(prod.html().contains(r#"src="/client/client.js""#));
        assert!(prod.html().contains(r#"href="/client/client.css""#));
    }

    #[test]
    fn test_flag_missing_or_garbled() {
        assert_eq!(paid_key_flag("<html></html>"), None);
        assert_eq!(paid_key_flag("window.HAS_PAID_KEY = maybe;"), None);
    }

    #[test]
    fn test_embedded_client_reads_flag() {
        assert!(CLIENT_SCRIPT.contains("HAS_PAID_KEY"));
        assert!(CLIENT_SCRIPT.contains("/api/chat"));
    }
}

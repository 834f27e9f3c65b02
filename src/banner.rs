//! Welcome banner sent before the username prompt
//!
//! The logo is opaque bytes: the built-in penguin or the contents of a file.

use std::path::Path;

const WELCOME: &str = "Welcome to TCP-Chat!\n";

const DEFAULT_LOGO: &str = r#"         _nnnn_
        dGGGGMMb
       @p~qp~~qMb
       M|@||@) M|
       @,----.JM|
      JS^\__/  qKL
     dZP        qKRb
    dZP          qKKb
   fZP            SMMb
   HZM            MMMM
   FqM            MMMM
 __| ".        |\dS"qML
 |    `.       | `' \Zq
_)      \.___.,|     .'
\____   )MMMMMP|   .'
     `-'       `--'"#;

#[derive(Debug, Clone)]
pub struct Banner {
    bytes: Vec<u8>,
}

impl Banner {
    /// Wrap a logo with the welcome line and a trailing newline
    pub fn with_logo(logo: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(WELCOME.len() + logo.len() + 1);
        bytes.extend_from_slice(WELCOME.as_bytes());
        bytes.extend_from_slice(logo);
        bytes.push(b'\n');
        Self { bytes }
    }

    /// Use `bytes` verbatim
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Send nothing before the prompt
    pub fn empty() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Read the logo from a file
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let logo = tokio::fs::read(path).await?;
        Ok(Self::with_logo(&logo))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Banner {
    fn default() -> Self {
        Self::with_logo(DEFAULT_LOGO.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_banner_layout() {
        let banner = Banner::default();
        let text = std::str::from_utf8(banner.as_bytes()).unwrap();

        assert!(text.starts_with("Welcome to TCP-Chat!\n"));
        assert!(text.contains("_nnnn_"));
        assert!(text.ends_with("`--'\n"));
    }

    #[test]
    fn test_from_bytes_is_verbatim() {
        let banner = Banner::from_bytes(b"\x00\xffraw".to_vec());
        assert_eq!(banner.as_bytes(), b"\x00\xffraw");
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let result = Banner::load(Path::new("/definitely/not/a/logo")).await;
        assert!(result.is_err());
    }
}

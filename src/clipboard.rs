use anyhow::{Result, anyhow};
use ::clipboard::{ClipboardContext, ClipboardProvider};

/// Anything that can take a password as its current text contents.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;

    fn get_text(&mut self) -> Result<String>;
}

pub struct SystemClipboard {
    ctx: ClipboardContext,
}

impl SystemClipboard {
    pub fn open() -> Result<Self> {
        let ctx: ClipboardContext =
            ClipboardProvider::new().map_err(|e| anyhow!("Clipboard init error: {}", e))?;
        Ok(Self { ctx })
    }
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.ctx
            .set_contents(text.to_string())
            .map_err(|e| anyhow!("Clipboard set error: {}", e))
    }

    fn get_text(&mut self) -> Result<String> {
        self.ctx
            .get_contents()
            .map_err(|e| anyhow!("Clipboard get error: {}", e))
    }
}

/// Empties the clipboard if it still holds `text`. Returns whether it did.
///
/// On X11 the selection is served by the process that set it, so a
/// short-lived caller has to stay alive until this runs.
pub fn clear_if_unchanged(sink: &mut dyn ClipboardSink, text: &str) -> Result<bool> {
    if sink.get_text()? != text {
        return Ok(false);
    }
    sink.set_text("")?;
    Ok(true)
}

/// In-memory clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }

    fn get_text(&mut self) -> Result<String> {
        Ok(self.contents.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard_replaces_contents() {
        let mut clipboard = MemoryClipboard::default();
        assert!(clipboard.contents.is_none());

        clipboard.set_text("first").unwrap();
        clipboard.set_text("second").unwrap();
        assert_eq!(clipboard.contents.as_deref(), Some("second"));
    }

    #[test]
    fn test_clear_if_unchanged() {
        let mut clipboard = MemoryClipboard::default();
        clipboard.set_text("s3cr3t").unwrap();

        assert!(clear_if_unchanged(&mut clipboard, "s3cr3t").unwrap());
        assert_eq!(clipboard.contents.as_deref(), Some(""));
    }

    #[test]
    fn test_clear_keeps_newer_contents() {
        let mut clipboard = MemoryClipboard::default();
        clipboard.set_text("s3cr3t").unwrap();
        clipboard.set_text("copied later").unwrap();

        assert!(!clear_if_unchanged(&mut clipboard, "s3cr3t").unwrap());
        assert_eq!(clipboard.contents.as_deref(), Some("copied later"));
    }

    #[test]
    fn test_sink_is_object_safe() {
        let mut sink: Box<dyn ClipboardSink> = Box::new(MemoryClipboard::default());
        assert!(sink.set_text("x").is_ok());
    }
}

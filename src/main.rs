use anyhow::{Result, bail};
use clap::Parser;
use log::warn;
use qrpass::clipboard::{ClipboardSink, SystemClipboard, clear_if_unchanged};
use qrpass::menu::{self, Session};
use qrpass::ui::{self, DisplayOptions};
use qrpass::{CharClass, Mode, PasswordPolicy, generate_password, parse_length, qr};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "qrpass",
    version,
    author,
    about = "Secure random password generator with clipboard and QR code output"
)]
struct Cli {
    /// Number of characters in the password
    #[arg(
        short,
        long,
        env = "QRPASS_LENGTH",
        default_value = "12",
        value_parser = parse_length,
        allow_negative_numbers = true
    )]
    length: usize,

    /// Complexity preset
    #[arg(short, long, value_enum, env = "QRPASS_MODE", default_value = "strong")]
    mode: Mode,

    /// Character classes to use instead of the preset
    #[arg(short = 'C', long = "class", value_enum, value_delimiter = ',')]
    classes: Vec<CharClass>,

    /// Include at least one character of every enabled class
    #[arg(short, long)]
    require_each: bool,

    /// Copy the password to the clipboard and wait until it is cleared
    #[arg(short, long)]
    copy: bool,

    /// Seconds to keep a copied password on the clipboard
    #[arg(
        long,
        value_name = "SECS",
        env = "QRPASS_CLEAR_AFTER",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=600)
    )]
    clear_after: u64,

    /// Save the password as a QR code PNG
    #[arg(long, value_name = "FILE")]
    qr: Option<String>,

    /// Print the password as a QR code in the terminal
    #[arg(long)]
    qr_terminal: bool,

    /// Print only the password
    #[arg(short, long)]
    quiet: bool,

    /// Start the interactive menu
    #[arg(short, long)]
    interactive: bool,
}

impl Cli {
    fn policy(&self) -> PasswordPolicy {
        let policy = if self.classes.is_empty() {
            PasswordPolicy::from_mode(self.mode, self.length)
        } else {
            PasswordPolicy::with_classes(self.length, &self.classes)
        };
        policy.require_each_class(self.require_each)
    }
}

fn open_clipboard() -> Option<Box<dyn ClipboardSink>> {
    match SystemClipboard::open() {
        Ok(clipboard) => Some(Box::new(clipboard)),
        Err(e) => {
            warn!("{:#}", e);
            None
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let display = DisplayOptions::detect(cli.quiet);

    if cli.interactive {
        let mut session = Session::new(open_clipboard(), display);
        session.require_each_class = cli.require_each;
        return menu::run(&mut session, io::stdin().lock(), io::stdout().lock());
    }

    let policy = cli.policy();
    let password = generate_password(&policy)?;

    let mut stdout = io::stdout().lock();
    ui::display_output(&mut stdout, &password, &policy, &display)?;

    write_outputs(
        &mut stdout,
        &mut io::stderr().lock(),
        &cli,
        &password,
        &display,
        || -> Result<Box<dyn ClipboardSink>> {
            Ok(Box::new(SystemClipboard::open()?))
        },
        thread::sleep,
    )
}

/// Runs every requested output for `password`. A failing output is reported
/// on `err` and does not stop the others; the call fails if any did.
fn write_outputs<W, E, O, S>(
    out: &mut W,
    err: &mut E,
    cli: &Cli,
    password: &str,
    display: &DisplayOptions,
    open_clipboard: O,
    wait: S,
) -> Result<()>
where
    W: Write,
    E: Write,
    O: FnOnce() -> Result<Box<dyn ClipboardSink>>,
    S: FnOnce(Duration),
{
    let mut failures = 0;

    if cli.qr_terminal {
        match qr::render_terminal(password) {
            Ok(code) => writeln!(out, "\n{}", code)?,
            Err(e) => {
                ui::status_warn(err, display, &format!("QR creation error: {:#}", e))?;
                failures += 1;
            }
        }
    }

    if let Some(name) = cli.qr.as_deref() {
        match qr::save_png(password, &qr::png_path(name)) {
            Ok(path) => {
                if !cli.quiet {
                    ui::status_ok(
                        out,
                        display,
                        &format!("QR code saved as '{}'.", path.display()),
                    )?;
                }
            }
            Err(e) => {
                ui::status_warn(err, display, &format!("QR creation error: {:#}", e))?;
                failures += 1;
            }
        }
    }

    if cli.copy {
        if let Err(e) = copy_and_hold(out, cli, password, display, open_clipboard, wait) {
            ui::status_warn(err, display, &format!("Clipboard error: {:#}", e))?;
            failures += 1;
        }
    }

    if failures > 0 {
        bail!(
            "{} requested {} failed",
            failures,
            if failures == 1 { "output" } else { "outputs" }
        );
    }
    Ok(())
}

/// Copies `password` and keeps the process alive for `--clear-after`
/// seconds so the clipboard owner can serve it, then clears it unless
/// something else was copied meanwhile.
fn copy_and_hold<W, O, S>(
    out: &mut W,
    cli: &Cli,
    password: &str,
    display: &DisplayOptions,
    open_clipboard: O,
    wait: S,
) -> Result<()>
where
    W: Write,
    O: FnOnce() -> Result<Box<dyn ClipboardSink>>,
    S: FnOnce(Duration),
{
    let mut clipboard = open_clipboard()?;
    clipboard.set_text(password)?;

    if !cli.quiet {
        ui::status_ok(
            out,
            display,
            &format!(
                "Password copied to clipboard. Clearing it in {}s.",
                cli.clear_after
            ),
        )?;
    }
    out.flush()?;

    wait(Duration::from_secs(cli.clear_after));

    let cleared = clear_if_unchanged(clipboard.as_mut(), password)?;
    if !cli.quiet {
        if cleared {
            ui::status_ok(out, display, "Clipboard cleared.")?;
        } else {
            writeln!(out, "Clipboard changed since the copy; left as is.")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use tempfile::tempdir;

    /// Records every value written to it.
    #[derive(Clone, Default)]
    struct RecordingClipboard(Rc<RefCell<Vec<String>>>);

    impl ClipboardSink for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<()> {
            self.0.borrow_mut().push(text.to_string());
            Ok(())
        }

        fn get_text(&mut self) -> Result<String> {
            Ok(self.0.borrow().last().cloned().unwrap_or_default())
        }
    }

    struct Outputs {
        result: Result<()>,
        out: String,
        err: String,
    }

    fn run_outputs(
        args: &[&str],
        clipboard: RecordingClipboard,
        wait: impl FnOnce(Duration),
    ) -> Outputs {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = write_outputs(
            &mut out,
            &mut err,
            &cli,
            "s3cr3t!",
            &DisplayOptions::plain(),
            move || -> Result<Box<dyn ClipboardSink>> { Ok(Box::new(clipboard)) },
            wait,
        );
        Outputs {
            result,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    #[test]
    fn test_copy_holds_then_clears() {
        let clipboard = RecordingClipboard::default();
        let waited = Cell::new(None);

        let outputs = run_outputs(
            &["qrpass", "--copy", "--clear-after", "3"],
            clipboard.clone(),
            |d| waited.set(Some(d)),
        );

        assert!(outputs.result.is_ok());
        assert_eq!(waited.get(), Some(Duration::from_secs(3)));
        assert_eq!(
            *clipboard.0.borrow(),
            vec!["s3cr3t!".to_string(), String::new()]
        );
        assert!(
            outputs
                .out
                .contains("[+] Password copied to clipboard. Clearing it in 3s.\n")
        );
        assert!(outputs.out.contains("[+] Clipboard cleared.\n"));
    }

    #[test]
    fn test_copy_leaves_newer_clipboard_contents() {
        let clipboard = RecordingClipboard::default();
        let other = clipboard.clone();

        let outputs = run_outputs(&["qrpass", "-c"], clipboard.clone(), move |_| {
            other.0.borrow_mut().push("copied later".to_string())
        });

        assert!(outputs.result.is_ok());
        assert_eq!(
            clipboard.0.borrow().last().map(String::as_str),
            Some("copied later")
        );
        assert!(outputs.out.contains("Clipboard changed since the copy; left as is."));
    }

    #[test]
    fn test_clipboard_unavailable_fails() {
        let cli = Cli::try_parse_from(["qrpass", "--copy"]).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();

        let result = write_outputs(
            &mut out,
            &mut err,
            &cli,
            "s3cr3t!",
            &DisplayOptions::plain(),
            || -> Result<Box<dyn ClipboardSink>> { Err(anyhow!("no display")) },
            |_| panic!("must not wait without a clipboard"),
        );

        assert!(result.is_err());
        assert!(out.is_empty());
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "[!] Clipboard error: no display\n"
        );
    }

    #[test]
    fn test_qr_failure_still_copies() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("missing").join("code");
        let bad = bad.to_str().unwrap();
        let clipboard = RecordingClipboard::default();

        let outputs = run_outputs(
            &["qrpass", "--qr", bad, "--copy"],
            clipboard.clone(),
            |_| {},
        );

        let err = outputs.result.unwrap_err();
        assert_eq!(err.to_string(), "1 requested output failed");
        assert!(outputs.err.contains("[!] QR creation error: Failed to save QR code"));
        assert_eq!(
            clipboard.0.borrow().first().map(String::as_str),
            Some("s3cr3t!")
        );
        assert!(outputs.out.contains("Password copied to clipboard."));
    }

    #[test]
    fn test_qr_saved() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("code");
        let base = base.to_str().unwrap();

        let outputs = run_outputs(&["qrpass", "--qr", base], RecordingClipboard::default(), |_| {
            panic!("must not wait without --copy")
        });

        assert!(outputs.result.is_ok());
        assert!(dir.path().join("code.png").exists());
        assert!(outputs.out.contains("QR code saved as"));
        assert!(outputs.err.is_empty());
    }

    #[test]
    fn test_clear_after_bounds() {
        assert!(Cli::try_parse_from(["qrpass", "--clear-after", "0"]).is_err());
        assert!(Cli::try_parse_from(["qrpass", "--clear-after", "601"]).is_err());
        assert_eq!(Cli::try_parse_from(["qrpass"]).unwrap().clear_after, 10);
    }

    #[test]
    fn test_oversized_length_rejected() {
        let err = Cli::try_parse_from(["qrpass", "-l", "18446744073709551615"])
            .err()
            .unwrap();
        assert!(
            err.to_string()
                .contains("password length must be at most 4096"),
            "{}",
            err
        );
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["qrpass"]).unwrap();
        let policy = cli.policy();
        assert_eq!(policy, PasswordPolicy::from_mode(Mode::Strong, 12));
    }

    #[test]
    fn test_classes_override_mode() {
        let cli =
            Cli::try_parse_from(["qrpass", "-m", "digits", "-C", "lowercase,symbols", "-l", "30"])
                .unwrap();
        let policy = cli.policy();
        assert_eq!(policy.length, 30);
        assert_eq!(
            policy.enabled_classes(),
            vec![CharClass::Lowercase, CharClass::Symbols]
        );
    }

    #[test]
    fn test_require_each() {
        let cli = Cli::try_parse_from(["qrpass", "--mode", "letters", "-r"]).unwrap();
        let policy = cli.policy();
        assert!(policy.require_each_class);
        assert_eq!(
            policy.enabled_classes(),
            vec![CharClass::Lowercase, CharClass::Uppercase]
        );
    }

    #[test]
    fn test_non_positive_length_rejected() {
        for length in ["0", "-5"] {
            let err = Cli::try_parse_from(["qrpass", "--length", length])
                .err()
                .unwrap();
            assert!(
                err.to_string().contains("password length must be a positive number"),
                "{}",
                err
            );
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["qrpass", "--mode", "pin"]).is_err());
    }
}

//! Interactive numbered menu.
//!
//! All state lives in [`Session`], which the entry point owns and lends to
//! [`run`]. Input and output are injected so the loop can be driven by a
//! script.

use crate::clipboard::ClipboardSink;
use crate::error::LengthInputError;
use crate::generator::generate_password;
use crate::policy::{self, Mode, PasswordPolicy, QUICK_LENGTH};
use crate::qr;
use crate::ui::{self, DisplayOptions};
use anyhow::Result;
use std::io::{BufRead, Write};
use zeroize::Zeroizing;

pub struct Session {
    pub last_password: Option<Zeroizing<String>>,
    pub clipboard: Option<Box<dyn ClipboardSink>>,
    pub display: DisplayOptions,
    pub require_each_class: bool,
}

impl Session {
    pub fn new(clipboard: Option<Box<dyn ClipboardSink>>, display: DisplayOptions) -> Self {
        Self {
            last_password: None,
            clipboard,
            display,
            require_each_class: false,
        }
    }
}

enum Choice {
    Generate,
    Quick,
    SaveQr,
    Copy,
    Exit,
    Invalid,
}

impl Choice {
    fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => Choice::Generate,
            "2" => Choice::Quick,
            "3" => Choice::SaveQr,
            "4" => Choice::Copy,
            "5" => Choice::Exit,
            _ => Choice::Invalid,
        }
    }
}

/// Reads one trimmed line. `None` at end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    message: &str,
) -> Result<Option<String>> {
    write!(out, "{}", message)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_menu<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let rule = "-".repeat(40);
    writeln!(out, "{}", rule)?;
    writeln!(out, "   Password + QR Generator")?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "1) Generate password")?;
    writeln!(out, "2) Generate example strong password (quick)")?;
    writeln!(out, "3) Save last password as QR code (PNG)")?;
    writeln!(out, "4) Copy last password to clipboard")?;
    writeln!(out, "5) Exit")?;
    writeln!(out)?;
    if session.clipboard.is_none() {
        writeln!(out, "[Note] Clipboard is not available. Copy is disabled.\n")?;
    }
    Ok(())
}

pub fn run<R: BufRead, W: Write>(session: &mut Session, mut input: R, mut out: W) -> Result<()> {
    loop {
        print_menu(session, &mut out)?;

        let Some(choice) = prompt(&mut input, &mut out, "Your choice (1-5): ")? else {
            break;
        };

        let keep_going = match Choice::parse(&choice) {
            Choice::Generate => generate(session, &mut input, &mut out)?,
            Choice::Quick => quick(session, &mut out)?,
            Choice::SaveQr => save_qr(session, &mut input, &mut out)?,
            Choice::Copy => {
                copy(session, &mut out)?;
                true
            }
            Choice::Exit => false,
            Choice::Invalid => {
                writeln!(out, "Invalid choice. Please try again.")?;
                true
            }
        };

        if !keep_going {
            break;
        }
    }

    writeln!(out, "Exiting. Stay safe!")?;
    Ok(())
}

fn generate<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    let Some(length) = prompt(input, out, "Password length (e.g., 12): ")? else {
        return Ok(false);
    };

    let length = match policy::parse_length(&length) {
        Ok(length) => length,
        Err(LengthInputError::NotAnInteger(_)) => {
            writeln!(out, "Please enter a valid integer.")?;
            return Ok(true);
        }
        Err(LengthInputError::Invalid(e)) => {
            writeln!(out, "Error: {}", e)?;
            return Ok(true);
        }
    };

    writeln!(out, "Modes: {}", Mode::NAMES.join(" / "))?;
    let Some(mode) = prompt(input, out, "Mode (default: strong): ")? else {
        return Ok(false);
    };

    let policy = PasswordPolicy::from_mode(Mode::from_input(&mode), length)
        .require_each_class(session.require_each_class);

    match generate_password(&policy) {
        Ok(password) => {
            writeln!(out)?;
            ui::display_output(out, &password, &policy, &session.display)?;
            writeln!(out)?;
            session.last_password = Some(password);
        }
        Err(e) => writeln!(out, "Error: {}", e)?,
    }

    Ok(true)
}

fn quick<W: Write>(session: &mut Session, out: &mut W) -> Result<bool> {
    let policy = PasswordPolicy::from_mode(Mode::Strong, QUICK_LENGTH)
        .require_each_class(session.require_each_class);
    let password = generate_password(&policy)?;

    writeln!(
        out,
        "\nExample Strong Password ({} chars):\n{}\n",
        QUICK_LENGTH, &*password
    )?;
    session.last_password = Some(password);

    Ok(true)
}

fn save_qr<R: BufRead, W: Write>(
    session: &mut Session,
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    let Some(password) = session.last_password.as_ref() else {
        writeln!(out, "Generate a password first (option 1 or 2).")?;
        return Ok(true);
    };

    let message = format!("Save file name (default: {}): ", qr::DEFAULT_QR_FILE);
    let Some(name) = prompt(input, out, &message)? else {
        return Ok(false);
    };

    let path = qr::png_path(&name);
    match qr::save_png(password, &path) {
        Ok(path) => ui::status_ok(
            out,
            &session.display,
            &format!("QR code saved as '{}'.", path.display()),
        )?,
        Err(e) => ui::status_warn(
            out,
            &session.display,
            &format!("QR creation error: {:#}", e),
        )?,
    }

    Ok(true)
}

fn copy<W: Write>(session: &mut Session, out: &mut W) -> Result<()> {
    let Some(clipboard) = session.clipboard.as_mut() else {
        ui::status_warn(out, &session.display, "Clipboard copy unavailable.")?;
        return Ok(());
    };

    let Some(password) = session.last_password.as_ref() else {
        writeln!(out, "Generate a password first.")?;
        return Ok(());
    };

    match clipboard.set_text(password) {
        Ok(()) => ui::status_ok(
            out,
            &session.display,
            "Password copied to clipboard until the menu exits.",
        )?,
        Err(e) => ui::status_warn(out, &session.display, &format!("Clipboard error: {:#}", e))?,
    }

    Ok(())
}

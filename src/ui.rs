use crate::policy::PasswordPolicy;
use console::Style;
use std::io::{self, Write};

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

impl DisplayOptions {
    pub fn detect(quiet: bool) -> Self {
        Self {
            unicode_support: detect_unicode_support(),
            color_support: detect_color_support(),
            quiet,
        }
    }

    pub fn plain() -> Self {
        Self {
            unicode_support: false,
            color_support: false,
            quiet: false,
        }
    }
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn get_tree_glyphs(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("├─", "└─")
    } else {
        ("|-", "`-")
    }
}

fn plural(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 { one } else { many }
}

pub fn display_output<W: Write>(
    out: &mut W,
    password: &str,
    policy: &PasswordPolicy,
    options: &DisplayOptions,
) -> io::Result<()> {
    if options.quiet {
        writeln!(out, "{}", password)
    } else {
        writeln!(out, "Password:\n{}\n", password)?;
        display_settings(out, policy, options)
    }
}

fn display_settings<W: Write>(
    out: &mut W,
    policy: &PasswordPolicy,
    options: &DisplayOptions,
) -> io::Result<()> {
    let (branch, last) = get_tree_glyphs(options.unicode_support);

    let classes = policy
        .enabled_classes()
        .iter()
        .map(|class| class.name())
        .collect::<Vec<_>>()
        .join(", ");
    let charset_size = policy.pool().len();

    writeln!(out, "Settings:")?;
    writeln!(out, "  {} Classes    {}", branch, classes)?;
    writeln!(
        out,
        "  {} Charset    {} {}",
        branch,
        charset_size,
        plural(charset_size, "char", "chars")
    )?;
    writeln!(
        out,
        "  {} Length     {} {}",
        branch,
        policy.length,
        plural(policy.length, "char", "chars")
    )?;
    writeln!(out, "  {} Source     OS entropy, ChaCha20 (256-bit)", branch)?;
    writeln!(out, "  {} Sampling   Unbiased rejection", branch)?;
    writeln!(
        out,
        "  {} Coverage   {}",
        last,
        if policy.require_each_class {
            "At least one of each class"
        } else {
            "Independent"
        }
    )?;

    Ok(())
}

pub fn status_ok<W: Write>(out: &mut W, options: &DisplayOptions, message: &str) -> io::Result<()> {
    let (check_ok, _) = get_status_symbols(options.unicode_support);
    let style = if options.color_support {
        Style::new().green()
    } else {
        Style::new()
    };
    writeln!(
        out,
        "{} {}",
        style.apply_to(format!("[{}]", check_ok)),
        style.apply_to(message)
    )
}

pub fn status_warn<W: Write>(
    out: &mut W,
    options: &DisplayOptions,
    message: &str,
) -> io::Result<()> {
    let (_, check_warn) = get_status_symbols(options.unicode_support);
    let style = if options.color_support {
        Style::new().yellow()
    } else {
        Style::new()
    };
    writeln!(
        out,
        "{} {}",
        style.apply_to(format!("[{}]", check_warn)),
        style.apply_to(message)
    )
}

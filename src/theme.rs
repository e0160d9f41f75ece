use crate::{LYRICLABEL_LOGLEVEL, LYRICLABEL_STYLE};
use dialoguer::console::{style, Style, StyledObject};
use dialoguer::theme::Theme;
use env_logger::{fmt::Color, Builder, Env};
use log::{Level, LevelFilter};
use std::fmt;
use std::io::Write;

/// Quiet runs only surface warnings and errors, which is where the final
/// summary is logged.
pub fn init_logger(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let env = Env::default()
        .filter_or(LYRICLABEL_LOGLEVEL, default_level)
        .write_style(LYRICLABEL_STYLE);

    Builder::from_env(env)
        .filter(Some("reqwest"), LevelFilter::Warn)
        .filter(Some("hyper"), LevelFilter::Warn)
        .filter(Some("rustls"), LevelFilter::Warn)
        .format(|buf, record| {
            let mut style = buf.style();
            let level = match record.level() {
                Level::Warn => style.set_color(Color::Yellow).value("   warn"),
                Level::Info => style.set_color(Color::Green).value("   info"),
                Level::Error => style.set_color(Color::Red).value("  error"),
                Level::Debug => style.set_color(Color::Blue).value("  debug"),
                Level::Trace => style
                    .set_color(Color::Blue)
                    .set_bold(true)
                    .value("  trace"),
            };

            writeln!(buf, "{} {}", level, record.args())
        })
        .init();
}

/// Prompt styling aligned with the log labels above.
pub struct DialoguerTheme {
    pub prompt_style: Style,
    pub prompt_prefix: StyledObject<String>,
    pub success_prefix: StyledObject<String>,
    pub error_prefix: StyledObject<String>,
    pub hint_style: Style,
    pub values_style: Style,
}

impl Default for DialoguerTheme {
    fn default() -> Self {
        Self {
            prompt_style: Style::new().for_stderr().bold(),
            prompt_prefix: style("      ?".to_string()).for_stderr().yellow(),
            success_prefix: style(" answer".to_string()).for_stderr().green(),
            error_prefix: style("  error".to_string()).for_stderr().red(),
            hint_style: Style::new().for_stderr().black().bright(),
            values_style: Style::new().for_stderr().green(),
        }
    }
}

impl Theme for DialoguerTheme {
    fn format_prompt(&self, f: &mut dyn fmt::Write, prompt: &str) -> fmt::Result {
        write!(
            f,
            "{} {} ",
            &self.prompt_prefix,
            self.prompt_style.apply_to(prompt)
        )
    }

    fn format_error(&self, f: &mut dyn fmt::Write, err: &str) -> fmt::Result {
        write!(f, "{} {}", &self.error_prefix, err)
    }

    fn format_input_prompt(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        default: Option<&str>,
    ) -> fmt::Result {
        if !prompt.is_empty() {
            self.format_prompt(f, prompt)?;
        }
        match default {
            Some(default) => write!(f, "{} ", self.hint_style.apply_to(format!("({})", default))),
            None => Ok(()),
        }
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        sel: &str,
    ) -> fmt::Result {
        if !prompt.is_empty() {
            write!(
                f,
                "{} {} ",
                &self.success_prefix,
                self.prompt_style.apply_to(prompt)
            )?;
        }
        write!(f, "{}", self.values_style.apply_to(sel))
    }
}

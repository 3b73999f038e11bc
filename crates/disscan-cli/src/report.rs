//! Console output: banner and one line per finished invite.

use colored::Colorize;
use disscan_core::ports::Observer;
use disscan_core::{Record, Summary};

const BANNER: &str = r"
    ________   __
    \______ \ |__| ______ ______ ____ _____    ____   ____   ____ _______
     |    |  \|  |/  ___//  ___// ___\\__  \  /    \ /    \_/ __ \\_  __ \
     |    |   \  |\___ \ \___ \\  \___ / __ \_   |  \   |  \  ___/_|  | \/
    /_______  /__|____  \____  \\___  /____  /___|  /___|  /\___  /|__|
            \/        \/     \/     \/     \/     \/     \/     \/
";

pub fn print_banner() {
    println!("{}", BANNER.bright_blue());
    println!(
        "{}",
        format!(
            "            The Ultimate Discord Invite Scanner     {}",
            env!("CARGO_PKG_VERSION")
        )
        .bright_blue()
    );
    println!();
}

pub fn invite_url(code: &str) -> String {
    format!("https://discord.gg/{code}")
}

/// Render one finished record the way the scanner prints it.
pub fn render(record: &Record) -> String {
    let url = invite_url(record.identifier().as_str());
    match record.payload() {
        Some(payload) => format!(
            "{}+{} {}",
            "[".green(),
            "]".green(),
            format!(
                "{url}    Servername: {}   Verification Level: {}    Population: {}",
                payload.name, payload.level, payload.population
            )
            .green()
        ),
        None => format!(
            "{}-{} {}",
            "[".red(),
            "]".red(),
            format!("{url} does not exist...").red()
        ),
    }
}

/// Prints every finished record to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Observer for ConsoleReporter {
    fn observe(&self, record: &Record) {
        println!("{}", render(record));
    }
}

pub fn print_summary(summary: &Summary) {
    let counts = &summary.counts;
    eprintln!(
        "{} found {}, missing {} (timed out {}), written {}",
        "done:".bold(),
        counts.succeeded.to_string().green(),
        counts.failed.to_string().red(),
        counts.timed_out,
        summary.sink_writes,
    );
}

#[cfg(test)]
mod tests {
    use disscan_core::{Identifier, Payload, Resolution, VerificationLevel};

    use super::*;

    fn record(code: &str, resolution: Resolution) -> Record {
        Record::pending(Identifier::new(code).unwrap())
            .resolve(resolution)
            .unwrap()
    }

    #[test]
    fn success_line_shows_guild_details() {
        let line = render(&record(
            "GeometryDash",
            Resolution::success(Payload::new(
                "Geometry Dash",
                VerificationLevel::FiveMinuteWait,
                812345,
            )),
        ));
        assert!(line.contains("+"));
        assert!(line.contains("https://discord.gg/GeometryDash"));
        assert!(line.contains("Servername: Geometry Dash"));
        assert!(line.contains("Verification Level: 2"));
        assert!(line.contains("Population: 812345"));
    }

    #[test]
    fn failure_line_says_missing() {
        let line = render(&record("gone", Resolution::rejected("HTTP 404 Not Found")));
        assert!(line.contains("-"));
        assert!(line.contains("https://discord.gg/gone does not exist..."));
    }
}

//! The `athena countdown` command.

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, NaiveDate, Utc};

use athena_core::schedule::{quote_of_the_day, Countdown, RepeatingTask};

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
fn parse_target(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
            bail!("invalid date: {input}");
        };
        return Ok(midnight.and_utc());
    }
    let parsed = DateTime::parse_from_rfc3339(input)
        .with_context(|| format!("invalid date '{input}' (expected YYYY-MM-DD or RFC 3339)"))?;
    Ok(parsed.with_timezone(&Utc))
}

pub async fn execute(until: String, watch: bool) -> Result<()> {
    let target = parse_target(&until)?;
    let quote = quote_of_the_day(Utc::now().date_naive());
    println!("\"{}\" - {}", quote.text, quote.author);

    let countdown = Countdown::until(target, Utc::now());
    if !watch || countdown.is_over() {
        println!("{countdown}");
        return Ok(());
    }

    let _ticker = RepeatingTask::spawn(Duration::from_secs(1), move || async move {
        let countdown = Countdown::until(target, Utc::now());
        let mut stdout = std::io::stdout();
        // best effort: a closed stdout just stops the display
        let _ = write!(stdout, "\r{countdown}   ");
        let _ = stdout.flush();
    });
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for interrupt")?;
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_dates_and_timestamps() {
        assert_eq!(
            parse_target("2024-04-11").unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 11, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_target("2024-04-11T08:30:00+08:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 11, 0, 30, 0).unwrap()
        );
        assert!(parse_target("next friday").is_err());
    }
}

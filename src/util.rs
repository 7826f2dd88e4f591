use crate::ledger::HighScoreRecord;

pub const PASS_MESSAGE: &str = "YOU WON!!";
pub const FAIL_MESSAGE: &str = "Time's Up! You Lost!";
pub const NO_RECORD: &str = "—";

/// `12.34 seconds` below a minute, `m:ss minutes` from there on
pub fn format_time(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{seconds:.2} seconds");
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02} minutes", whole / 60, whole % 60)
}

/// Whole seconds as `m:ss`
pub fn clock_text(seconds: f64) -> String {
    let t = seconds.max(0.0).floor() as u64;
    format!("{}:{:02}", t / 60, t % 60)
}

/// Running clock, e.g. `Time 0:07 / 1:00`
pub fn timer_text(elapsed_secs: f64, time_limit_secs: u32) -> String {
    format!(
        "Time {} / {}",
        clock_text(elapsed_secs),
        clock_text(time_limit_secs as f64)
    )
}

/// The question currently being worked on, 1-based and capped at the total
pub fn progress_text(solved: u32, total: u32) -> String {
    format!("Question: {}/{}", (solved + 1).min(total), total)
}

pub fn result_message(passed: bool) -> &'static str {
    if passed {
        PASS_MESSAGE
    } else {
        FAIL_MESSAGE
    }
}

pub fn best_time_text(record: &HighScoreRecord) -> String {
    record
        .fastest_time_secs
        .map_or_else(|| NO_RECORD.to_string(), format_time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_under_a_minute() {
        assert_eq!(format_time(0.0), "0.00 seconds");
        assert_eq!(format_time(45.0), "45.00 seconds");
        assert_eq!(format_time(59.994), "59.99 seconds");
    }

    #[test]
    fn test_format_time_minutes() {
        assert_eq!(format_time(60.0), "1:00 minutes");
        assert_eq!(format_time(125.7), "2:05 minutes");
    }

    #[test]
    fn test_clock_text() {
        assert_eq!(clock_text(0.0), "0:00");
        assert_eq!(clock_text(59.9), "0:59");
        assert_eq!(clock_text(600.0), "10:00");
    }

    #[test]
    fn test_timer_text() {
        assert_eq!(timer_text(7.9, 60), "Time 0:07 / 1:00");
        assert_eq!(timer_text(185.0, 600), "Time 3:05 / 10:00");
        assert_eq!(timer_text(3.0, 90), "Time 0:03 / 1:30");
    }

    #[test]
    fn test_progress_text_caps_at_total() {
        assert_eq!(progress_text(0, 5), "Question: 1/5");
        assert_eq!(progress_text(4, 5), "Question: 5/5");
        assert_eq!(progress_text(5, 5), "Question: 5/5");
    }

    #[test]
    fn test_result_message() {
        assert_eq!(result_message(true), "YOU WON!!");
        assert_eq!(result_message(false), "Time's Up! You Lost!");
    }

    #[test]
    fn test_best_time_text() {
        assert_eq!(best_time_text(&HighScoreRecord::default()), "—");
        let record = HighScoreRecord {
            fastest_time_secs: Some(20.0),
            most_solved: 5,
        };
        assert_eq!(best_time_text(&record), "20.00 seconds");
    }
}

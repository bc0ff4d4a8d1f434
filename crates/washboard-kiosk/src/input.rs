//! Stdin intent parsing.
//!
//! One command per line:
//!
//! ```text
//! start <id> [course]    start a course on an idle machine
//! notify <id>            toggle the completion notification
//! room                   toggle the room-wide alert
//! ```

use washboard_app::AppEvent;

/// Command summary shown for unrecognized input.
pub const HELP: &str = "commands: start <id> [course] | notify <id> | room";

const DEFAULT_COURSE: &str = "standard";

/// Parse one input line into a user intent. `None` for unrecognized input.
pub fn parse_intent(line: &str) -> Option<AppEvent> {
    let mut words = line.split_whitespace();
    match words.next()? {
        "start" => {
            let id = words.next()?.parse().ok()?;
            let course = words.next().unwrap_or(DEFAULT_COURSE).to_owned();
            Some(AppEvent::StartCycle { id, course })
        }
        "notify" => {
            let id = words.next()?.parse().ok()?;
            Some(AppEvent::ToggleSubscription { id })
        }
        "room" => Some(AppEvent::ToggleRoom),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_defaults_the_course() {
        let Some(AppEvent::StartCycle { id, course }) = parse_intent("start 3") else {
            panic!("expected start intent");
        };
        assert_eq!(id, 3);
        assert_eq!(course, "standard");
    }

    #[test]
    fn start_takes_an_explicit_course() {
        let Some(AppEvent::StartCycle { course, .. }) = parse_intent("start 3 quick") else {
            panic!("expected start intent");
        };
        assert_eq!(course, "quick");
    }

    #[test]
    fn notify_parses_the_machine_id() {
        assert!(matches!(parse_intent("notify 7"), Some(AppEvent::ToggleSubscription { id: 7 })));
    }

    #[test]
    fn room_has_no_arguments() {
        assert!(matches!(parse_intent("room"), Some(AppEvent::ToggleRoom)));
    }

    #[test]
    fn junk_is_rejected() {
        assert!(parse_intent("").is_none());
        assert!(parse_intent("start").is_none());
        assert!(parse_intent("start washer").is_none());
        assert!(parse_intent("reboot 1").is_none());
    }
}

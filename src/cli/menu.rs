use crate::models::Session;

pub const MENU_PROMPT: &str = "\nSelect (0-5): ";
pub const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

const WIDTH: usize = 50;

pub fn header(title: &str) -> String {
    let rule = "=".repeat(WIDTH);
    format!("{rule}\n{title}\n{rule}")
}

pub fn section(title: &str) -> String {
    format!("\n{title}\n{}", "-".repeat(WIDTH))
}

/// Main menu, with the running status line when a session is active.
pub fn render_menu(status_line: Option<&str>) -> String {
    let mut menu = header("Pomodoro Timer");
    if let Some(line) = status_line {
        menu.push_str(&format!("\n\n{line}\n{}", "-".repeat(WIDTH)));
    }
    menu.push_str(
        "\n\n1. Create session\
         \n2. Run session\
         \n3. List sessions\
         \n4. Delete session\
         \n5. Cancel running session\
         \n0. Exit\n",
    );
    menu.push_str(&"=".repeat(WIDTH));
    menu
}

pub fn session_lines(sessions: &[Session]) -> Vec<String> {
    if sessions.is_empty() {
        return vec!["No sessions yet.".to_string()];
    }

    let mut lines: Vec<String> = sessions.iter().map(ToString::to_string).collect();
    lines.push(format!("\nTotal: {} session(s)", sessions.len()));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStatus;

    #[test]
    fn menu_shows_status_line_only_when_running() {
        let idle = render_menu(None);
        assert!(!idle.contains("[Running]"));
        assert!(idle.contains("5. Cancel running session"));

        let busy = render_menu(Some("[Running] Session 1"));
        assert!(busy.contains("[Running] Session 1"));
        assert!(busy.find("[Running]") < busy.find("1. Create session"));
    }

    #[test]
    fn session_lines_include_total() {
        assert_eq!(session_lines(&[]), vec!["No sessions yet."]);

        let session = Session {
            id: 1,
            title: "a".into(),
            focus_minutes: 1,
            break_minutes: 1,
            rounds: 1,
            status: SessionStatus::Pending,
        };
        let lines = session_lines(&[session.clone(), Session { id: 2, ..session }]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "\nTotal: 2 session(s)");
    }
}

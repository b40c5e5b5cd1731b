use crate::runtime::player::Command;

/// Interactive control line, parsed
pub enum Control<P> {
    Command(Command<P>),
    Status,
    Quit,
}

/// Parse one line of interactive input
///
/// Returns `None` for blank or unrecognised lines. A line holding only
/// spaces toggles pause, like the space bar.
pub fn parse_control<P>(line: &str) -> Option<Control<P>> {
    if !line.is_empty() && line.chars().all(|c| c == ' ') {
        return Some(Control::Command(Command::TogglePause));
    }

    let mut words = line.split_whitespace();
    let word = words.next()?.to_ascii_lowercase();
    let command = match word.as_str() {
        "p" | "pause" => Command::Pause,
        "r" | "resume" => Command::Resume,
        "t" | "toggle" | "space" => Command::TogglePause,
        "+" | "faster" => Command::IncreaseSpeed,
        "-" | "slower" => Command::DecreaseSpeed,
        "n" | "next" => Command::NextFrame,
        "b" | "back" => Command::PrevFrame,
        "start" => Command::Start,
        "stop" => Command::Stop,
        "s" | "seek" => Command::SetPosition(words.next()?.parse().ok()?),
        "status" | "?" => return Some(Control::Status),
        "q" | "quit" | "exit" => return Some(Control::Quit),
        _ => return None,
    };
    Some(Control::Command(command))
}

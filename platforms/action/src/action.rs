use keymap::KeyMap;
use quint::Event;

#[derive(KeyMap, Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Advance the machine by one step
    #[key("space", "enter")]
    Step,
    /// Toggle the step, head move and state path summary
    #[key("i")]
    ToggleVerbose,
    /// Stop the run
    #[key("q", "ctrl-c")]
    Quit,
}

impl From<Action> for Event {
    fn from(action: Action) -> Self {
        match action {
            Action::Step => Event::Step,
            Action::ToggleVerbose => Event::ToggleVerbose,
            Action::Quit => Event::Quit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_map_to_events() {
        assert_eq!(Event::from(Action::Step), Event::Step);
        assert_eq!(Event::from(Action::ToggleVerbose), Event::ToggleVerbose);
        assert_eq!(Event::from(Action::Quit), Event::Quit);
    }
}

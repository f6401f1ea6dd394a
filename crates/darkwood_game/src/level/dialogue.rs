//! The dialogue panel.

use tracing::debug;

use crate::events::GameEvent;
use crate::world::GameWorld;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogueManager {
    lines: Vec<String>,
    index: usize,
    open: bool,
}

impl DialogueManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The line on the panel while it is open.
    #[must_use]
    pub fn current_line(&self) -> Option<&str> {
        if self.open {
            self.lines.get(self.index).map(String::as_str)
        } else {
            None
        }
    }

    /// Open the panel at the first line, replacing any running dialogue.
    /// Returns the line shown, if there is one.
    pub fn start(&mut self, lines: Vec<String>) -> Option<(usize, String)> {
        self.lines = lines;
        self.index = 0;
        self.open = true;
        self.shown()
    }

    fn shown(&self) -> Option<(usize, String)> {
        self.lines.get(self.index).map(|line| (self.index, line.clone()))
    }

    /// Move to the next line. `None` once the panel has closed.
    pub fn next_line(&mut self) -> Option<(usize, String)> {
        self.index += 1;
        if self.index >= self.lines.len() {
            self.open = false;
            return None;
        }
        self.shown()
    }
}

/// Open a dialogue and announce its first line.
pub fn start_dialogue(world: &mut GameWorld, lines: Vec<String>) {
    debug!(lines = lines.len(), "dialogue started");
    if let Some((index, line)) = world.dialogue.start(lines) {
        world.emit(GameEvent::DialogueLine { index, line });
    }
}

/// Advance the open dialogue on the continue key.
pub fn update_dialogue(world: &mut GameWorld) {
    if !world.dialogue.is_open() || !world.input.continue_dialogue {
        return;
    }
    match world.dialogue.next_line() {
        Some((index, line)) => world.emit(GameEvent::DialogueLine { index, line }),
        None => world.emit(GameEvent::DialogueEnded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<String> {
        vec!["Hello.".to_string(), "Watch out for ghosts.".to_string()]
    }

    #[test]
    fn test_lines_advance_then_close() {
        let mut dialogue = DialogueManager::new();
        assert_eq!(dialogue.start(lines()), Some((0, "Hello.".to_string())));
        assert_eq!(dialogue.current_line(), Some("Hello."));
        assert_eq!(dialogue.next_line(), Some((1, "Watch out for ghosts.".to_string())));
        assert_eq!(dialogue.next_line(), None);
        assert!(!dialogue.is_open());
        assert_eq!(dialogue.current_line(), None);
    }

    #[test]
    fn test_continue_key_drives_events() {
        let mut world = GameWorld::default();
        start_dialogue(&mut world, lines());
        world.input.continue_dialogue = true;
        update_dialogue(&mut world);
        update_dialogue(&mut world);
        update_dialogue(&mut world);
        let events = world.drain_events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2], GameEvent::DialogueEnded);
    }

    #[test]
    fn test_empty_dialogue_closes_on_continue() {
        let mut dialogue = DialogueManager::new();
        assert_eq!(dialogue.start(Vec::new()), None);
        assert!(dialogue.is_open());
        assert_eq!(dialogue.next_line(), None);
        assert!(!dialogue.is_open());
    }
}

use super::KidneyEngine;
use crate::input::InputEvent;

impl KidneyEngine {
    /// Feed a raw pointer event. Returns whether it produced a command.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        match self.input.handle_event(event) {
            Some(command) => {
                let _ = self.execute(command);
                true
            }
            None => false,
        }
    }

    /// Feed a key press (`winit::keyboard::KeyCode` debug string). Returns
    /// whether the key is bound.
    pub fn handle_key(&mut self, key: &str) -> bool {
        match self.input.handle_key_press(key) {
            Some(command) => {
                let _ = self.execute(command);
                true
            }
            None => false,
        }
    }
}

//! Cancellable per-frame task.
//!
//! Each tick advances the orbit damping, turns the organ one fixed step if
//! rotation is on, then draws. The viewer keeps requesting redraws while
//! ticks report [`Reschedule::Next`]; once cancelled every tick is a no-op
//! that reports [`Reschedule::Stop`].

use crate::controller::ViewController;

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reschedule {
    /// Schedule another frame.
    Next,
    /// The loop was cancelled; stop requesting frames.
    Stop,
}

/// The frame loop state.
#[derive(Debug, Default)]
pub struct FrameLoop {
    cancelled: bool,
    frames: u64,
}

impl FrameLoop {
    /// A running loop.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame: camera damping, organ rotation, then `draw`.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `draw`. The frame still counts.
    pub fn tick<E>(
        &mut self,
        view: &mut ViewController,
        draw: impl FnOnce(&ViewController) -> Result<(), E>,
    ) -> Result<Reschedule, E> {
        if self.cancelled {
            return Ok(Reschedule::Stop);
        }
        view.composer_mut().camera_mut().update();
        view.advance_rotation();
        self.frames += 1;
        draw(view)?;
        Ok(Reschedule::Next)
    }

    /// Stop the loop. Later ticks do nothing.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            log::debug!("frame loop cancelled after {} frames", self.frames);
        }
        self.cancelled = true;
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Frames run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::loader::{AssetLoader, LoadError};
    use crate::options::Options;
    use crate::scene::SceneNode;

    struct MissingLoader;

    impl AssetLoader for MissingLoader {
        fn load(&self, url: &str) -> Result<SceneNode, LoadError> {
            Err(LoadError::NotFound(url.to_owned()))
        }
    }

    fn mounted() -> ViewController {
        let mut view = ViewController::new(
            &Options::default(),
            Arc::new(MissingLoader),
            (800, 600),
        )
        .unwrap();
        assert!(view.wait_for_load(Duration::from_secs(5)));
        view
    }

    fn run(frame_loop: &mut FrameLoop, view: &mut ViewController, n: usize) {
        for _ in 0..n {
            let _ = frame_loop
                .tick(view, |_| Ok::<(), Infallible>(()))
                .unwrap();
        }
    }

    fn yaw(view: &ViewController) -> f32 {
        view.composer().organ().unwrap().yaw()
    }

    #[test]
    fn rotation_freezes_and_resumes_at_fixed_step() {
        let step = Options::default().display.rotation_step;
        let mut view = mounted();
        let mut frame_loop = FrameLoop::new();

        run(&mut frame_loop, &mut view, 10);
        assert!((yaw(&view) - 10.0 * step).abs() < 1e-5);

        let _ = view.toggle_rotation();
        let frozen = yaw(&view);
        run(&mut frame_loop, &mut view, 25);
        assert_eq!(yaw(&view), frozen);

        let _ = view.toggle_rotation();
        run(&mut frame_loop, &mut view, 4);
        assert!((yaw(&view) - (frozen + 4.0 * step)).abs() < 1e-5);
        assert_eq!(frame_loop.frames(), 39);
    }

    #[test]
    fn draw_runs_after_rotation() {
        let step = Options::default().display.rotation_step;
        let mut view = mounted();
        let mut frame_loop = FrameLoop::new();
        let mut seen = None;
        let next = frame_loop
            .tick(&mut view, |v| {
                seen = Some(v.composer().organ().unwrap().yaw());
                Ok::<(), Infallible>(())
            })
            .unwrap();
        assert_eq!(next, Reschedule::Next);
        assert!((seen.unwrap() - step).abs() < 1e-6);
    }

    #[test]
    fn cancelled_loop_stops() {
        let mut view = mounted();
        let mut frame_loop = FrameLoop::new();
        frame_loop.cancel();
        let mut drawn = false;
        let next = frame_loop
            .tick(&mut view, |_| {
                drawn = true;
                Ok::<(), Infallible>(())
            })
            .unwrap();
        assert_eq!(next, Reschedule::Stop);
        assert!(!drawn);
        assert_eq!(yaw(&view), 0.0);
        assert!(frame_loop.is_cancelled());
    }

    #[test]
    fn draw_errors_propagate() {
        let mut view = mounted();
        let mut frame_loop = FrameLoop::new();
        let err = frame_loop.tick(&mut view, |_| Err("lost surface"));
        assert_eq!(err, Err("lost surface"));
    }
}

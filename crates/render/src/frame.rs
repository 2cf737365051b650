use crate::clock::TimeSource;
use crate::renderer::Renderer;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Zero-based frame counter.
    pub index: u64,
    /// Seconds since the clock started.
    pub elapsed: f32,
}

/// Drives one frame at a time: time uniforms, then controls, then draw.
#[derive(Debug)]
pub struct FrameLoop<C> {
    clock: C,
    frames: u64,
}

impl<C: TimeSource> FrameLoop<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, frames: 0 }
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn tick<R: Renderer>(
        &mut self,
        stage: &mut Stage,
        renderer: &mut R,
        frame: &R::Frame,
    ) -> FrameInfo {
        let elapsed = self.clock.elapsed();
        stage.scene.params.set_time(elapsed);
        stage.controls.update(&mut stage.camera);
        renderer.render(&stage.scene, &stage.camera, frame);

        let info = FrameInfo {
            index: self.frames,
            elapsed,
        };
        self.frames += 1;
        tracing::trace!("frame {} at {:.3}s", info.index, info.elapsed);
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::renderer::HeadlessRenderer;
    use crate::stage::Viewport;
    use glam::Vec2;
    use portal_input::NavAction;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn stage() -> Stage {
        Stage::new(Viewport::new(800, 600, 1.0), &mut StdRng::seed_from_u64(5))
    }

    #[test]
    fn time_uniforms_are_written_before_the_draw() {
        let mut stage = stage();
        let mut renderer = HeadlessRenderer::new();
        let mut frames = FrameLoop::new(ManualClock::new());

        frames.tick(&mut stage, &mut renderer, &());
        frames.clock_mut().advance(2.0);
        let info = frames.tick(&mut stage, &mut renderer, &());

        assert_eq!(info, FrameInfo { index: 1, elapsed: 2.0 });
        let draw = renderer.last_draw().unwrap();
        assert_eq!(draw.portal_time, 2.0);
        assert_eq!(draw.fireflies_time, 2.0);
        assert_eq!(renderer.draws.len(), 2);
    }

    #[test]
    fn one_draw_per_tick() {
        let mut stage = stage();
        let mut renderer = HeadlessRenderer::new();
        let mut frames = FrameLoop::new(ManualClock::new());
        for _ in 0..10 {
            frames.clock_mut().advance(1.0 / 60.0);
            frames.tick(&mut stage, &mut renderer, &());
        }
        assert_eq!(frames.frames(), 10);
        assert_eq!(renderer.draws.len(), 10);
    }

    #[test]
    fn controls_update_before_the_draw() {
        let mut stage = stage();
        let mut renderer = HeadlessRenderer::new();
        let mut frames = FrameLoop::new(ManualClock::new());
        let start = stage.camera.position;

        stage.navigate(NavAction::Rotate(Vec2::new(100.0, 0.0)));
        frames.tick(&mut stage, &mut renderer, &());

        assert_ne!(renderer.last_draw().unwrap().camera_position, start);
    }
}

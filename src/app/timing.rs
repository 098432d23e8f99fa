use std::time::{Duration, Instant};
use winit::window::Window;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Instant,
    frame_count: u32,
    pub frame_dt: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: Instant::now(),
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            base_title,
        }
    }

    /// Measures the delta since the previous frame. The title is refreshed
    /// twice a second with fps and the current sample count.
    pub fn update(&mut self, window: Option<&Window>, now: Instant, samples: u32) {
        let dt_duration = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().max(0.0);

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            if let Some(window) = window {
                window.set_title(&format!(
                    "{} - {:.1} fps - {} samples",
                    self.base_title, fps, samples
                ));
            }
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_assumes_sixty_hz_then_measures() {
        let mut timing = FrameTiming::new("pathview".to_string());
        let start = Instant::now();
        timing.update(None, start, 0);
        assert!((timing.frame_dt - 0.016).abs() < 1e-6);

        timing.update(None, start + Duration::from_millis(40), 1);
        assert!((timing.frame_dt - 0.040).abs() < 1e-4);
    }

    #[test]
    fn clock_going_backwards_yields_zero_delta() {
        let mut timing = FrameTiming::new("pathview".to_string());
        let start = Instant::now() + Duration::from_secs(1);
        timing.update(None, start, 0);
        timing.update(None, start - Duration::from_millis(5), 0);
        assert_eq!(timing.frame_dt, 0.0);
    }
}

use std::collections::VecDeque;

const FPS_SAMPLE_WINDOW: usize = 180;

/// Rolling frame-rate readout for the header.
#[derive(Debug)]
pub(in crate::app) struct FpsCounter {
    current: f32,
    samples: VecDeque<f32>,
    pub show_average: bool,
    pub show_low: bool,
    pub show_frame_time: bool,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self {
            current: 0.0,
            samples: VecDeque::with_capacity(FPS_SAMPLE_WINDOW),
            show_average: true,
            show_low: false,
            show_frame_time: true,
        }
    }
}

impl FpsCounter {
    pub fn record(&mut self, dt: f32) {
        if dt <= f32::EPSILON {
            return;
        }

        self.current = (1.0 / dt).clamp(0.0, 1000.0);
        self.samples.push_back(self.current);
        while self.samples.len() > FPS_SAMPLE_WINDOW {
            self.samples.pop_front();
        }
    }

    pub fn display_text(&self) -> Option<String> {
        if self.samples.is_empty() {
            return None;
        }

        let mut parts = vec![format!("FPS {:.0}", self.current)];

        if self.show_average {
            let avg = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
            parts.push(format!("avg {avg:.1}"));
        }

        if self.show_low
            && let Some(low) = self.samples.iter().copied().reduce(f32::min)
        {
            parts.push(format!("low {low:.0}"));
        }

        if self.show_frame_time && self.current > f32::EPSILON {
            parts.push(format!("{:.1} ms", 1000.0 / self.current));
        }

        Some(parts.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readout_tracks_window_and_toggles() {
        let mut fps = FpsCounter::default();
        assert_eq!(fps.display_text(), None);

        fps.record(0.0);
        assert_eq!(fps.display_text(), None);

        fps.record(1.0 / 50.0);
        fps.record(1.0 / 100.0);
        assert_eq!(
            fps.display_text().as_deref(),
            Some("FPS 100 | avg 75.0 | 10.0 ms")
        );

        fps.show_average = false;
        fps.show_frame_time = false;
        fps.show_low = true;
        assert_eq!(fps.display_text().as_deref(), Some("FPS 100 | low 50"));

        for _ in 0..FPS_SAMPLE_WINDOW {
            fps.record(1.0 / 60.0);
        }
        assert_eq!(fps.samples.len(), FPS_SAMPLE_WINDOW);
        assert_eq!(fps.display_text().as_deref(), Some("FPS 60 | low 60"));
    }
}

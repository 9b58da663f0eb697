//! Speedrun timer: total run time with per-level splits.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedrunTimer {
    elapsed: f64,
    running: bool,
    splits: Vec<f64>,
}

impl SpeedrunTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.splits.clear();
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn resume(&mut self) {
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance by one simulation step. Ignored while paused.
    pub fn tick(&mut self, dt: f64) {
        if self.running {
            self.elapsed += dt;
        }
    }

    /// Record the current time as the end of a level.
    pub fn split(&mut self) {
        self.splits.push(self.elapsed);
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn splits(&self) -> &[f64] {
        &self.splits
    }

    /// Time spent in the level currently being played.
    pub fn current_segment(&self) -> f64 {
        self.elapsed - self.splits.last().copied().unwrap_or(0.0)
    }
}

/// `MM:SS.mmm`, minutes keep counting past an hour.
pub fn format_run_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let minutes = total_ms / 60_000;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{minutes:02}:{secs:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_timer_does_not_advance() {
        let mut timer = SpeedrunTimer::new();
        timer.start();
        timer.tick(1.0);
        timer.pause();
        timer.tick(5.0);
        timer.resume();
        timer.tick(0.5);
        assert!((timer.elapsed() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn splits_track_segments() {
        let mut timer = SpeedrunTimer::new();
        timer.start();
        timer.tick(10.0);
        timer.split();
        timer.tick(4.0);
        assert_eq!(timer.splits(), &[10.0]);
        assert!((timer.current_segment() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn start_resets_previous_run() {
        let mut timer = SpeedrunTimer::new();
        timer.start();
        timer.tick(3.0);
        timer.split();
        timer.start();
        assert_eq!(timer.elapsed(), 0.0);
        assert!(timer.splits().is_empty());
    }

    #[test]
    fn formats_minutes_seconds_millis() {
        assert_eq!(format_run_time(0.0), "00:00.000");
        assert_eq!(format_run_time(61.25), "01:01.250");
        assert_eq!(format_run_time(3725.0), "62:05.000");
    }
}

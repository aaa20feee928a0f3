/// Virtual clock that drives an offline run.
///
/// Time is derived from the frame counter instead of being accumulated, so a
/// run with horizon `H` renders exactly `floor(H * fps)` frames regardless of
/// float rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualClock {
    fps: u32,
    horizon: f64,
    frame: u64,
}

impl VirtualClock {
    pub fn new(fps: u32, horizon: f64) -> Self {
        Self {
            fps: fps.max(1),
            horizon: horizon.max(0.0),
            frame: 0,
        }
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }

    /// Moves the clock forward by one fixed step.
    pub fn advance(&mut self) {
        self.frame += 1;
    }

    /// Number of the frame the clock currently points at.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current virtual time.
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.fps as f64
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Number of frames a completed run produces.
    pub fn total_frames(&self) -> u64 {
        (self.horizon * self.fps as f64).floor() as u64
    }

    pub fn reached_horizon(&self) -> bool {
        self.frame >= self.total_frames()
    }
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new(60, 20.0)
    }
}

/// One rendered and encoded frame on its way to the capture server.
#[derive(Debug, Clone)]
pub struct Frame {
    pub number: u64,
    pub time: f64,
    pub payload: Vec<u8>,
}

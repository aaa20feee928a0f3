use crate::{
    config::RenderConfig,
    encode::encode_png,
    raster::{ComputePass, FixedSurface, RasterBuffer, Surface, Viewport},
    timeline::{Frame, VirtualClock},
    upload::UploadClient,
    CaptureError, Result,
};

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Rendering,
    AwaitingAck,
    /// Every frame up to the horizon was acknowledged.
    Stopped,
    /// An encode or upload failed; the run does not continue.
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub final_time: f64,
}

/// Advances the virtual clock one frame at a time, rendering, encoding and
/// uploading each frame before the next one is started.
pub struct RenderDriver<U> {
    clock: VirtualClock,
    state: RunState,
    target: RasterBuffer,
    pass: Box<dyn ComputePass>,
    surface: Box<dyn Surface>,
    uploader: U,
}

impl<U: UploadClient> RenderDriver<U> {
    pub fn new(
        clock: VirtualClock,
        pass: Box<dyn ComputePass>,
        surface: Box<dyn Surface>,
        uploader: U,
    ) -> Self {
        let target = RasterBuffer::new(surface.viewport());
        Self {
            clock,
            state: RunState::Idle,
            target,
            pass,
            surface,
            uploader,
        }
    }

    /// Builds a headless driver from render settings.
    pub fn from_config(config: &RenderConfig, uploader: U) -> Self {
        Self::new(
            VirtualClock::new(config.fps, config.horizon),
            config.scene.build(),
            Box::new(FixedSurface(Viewport::new(config.width, config.height))),
            uploader,
        )
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Begins a fresh run at frame zero.
    pub fn start(&mut self) {
        self.clock.reset();
        self.state = if self.clock.reached_horizon() {
            RunState::Stopped
        } else {
            RunState::Rendering
        };
        tracing::info!(
            frames = self.clock.total_frames(),
            horizon = self.clock.horizon(),
            "starting run"
        );
    }

    /// Renders, encodes and uploads the current frame, then advances the clock
    /// if the upload was acknowledged.
    pub async fn step(&mut self) -> Result<RunState> {
        if self.state != RunState::Rendering {
            return Err(CaptureError::msg(format!(
                "cannot step a run in state {:?}",
                self.state
            )));
        }

        let frame = match self.render_frame() {
            Ok(frame) => frame,
            Err(err) => return Err(self.fail(err)),
        };

        self.state = RunState::AwaitingAck;
        match self.uploader.send(frame.number, &frame.payload).await {
            Ok(ack) => {
                tracing::debug!(
                    frame = frame.number,
                    time = frame.time,
                    ack = ack.as_str(),
                    "frame acknowledged"
                );
                self.clock.advance();
                self.state = if self.clock.reached_horizon() {
                    RunState::Stopped
                } else {
                    RunState::Rendering
                };
                Ok(self.state)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Starts the run if idle and steps until it stops or fails.
    pub async fn run(&mut self) -> Result<RunSummary> {
        if self.state == RunState::Idle {
            self.start();
        }

        while !self.state.is_terminal() {
            self.step().await?;
        }

        if self.state != RunState::Stopped {
            return Err(CaptureError::msg(format!(
                "run ended in state {:?}",
                self.state
            )));
        }

        tracing::info!(frames = self.clock.frame(), "finished rendering all frames");
        Ok(RunSummary {
            frames: self.clock.frame(),
            final_time: self.clock.time(),
        })
    }

    fn render_frame(&mut self) -> Result<Frame> {
        let viewport = self.surface.viewport();
        let previous = self.target.viewport();
        if self.target.resize(viewport) {
            tracing::warn!(?previous, ?viewport, "surface resized, resizing render target");
        }

        let time = self.clock.time();
        self.pass.shade(time, &mut self.target);

        Ok(Frame {
            number: self.clock.frame(),
            time,
            payload: encode_png(&self.target)?,
        })
    }

    fn fail(&mut self, err: CaptureError) -> CaptureError {
        tracing::error!(
            frame = self.clock.frame(),
            time = self.clock.time(),
            error = %err,
            "error sending frame, halting run"
        );
        self.state = RunState::Failed;
        err
    }
}

impl<U> std::fmt::Debug for RenderDriver<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDriver")
            .field("clock", &self.clock)
            .field("state", &self.state)
            .field("viewport", &self.target.viewport())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    };

    use super::*;
    use crate::{scene::Gradient, upload::Ack};

    /// Records every call and fails on a chosen frame.
    #[derive(Default)]
    struct ScriptedUploader {
        sent: Mutex<Vec<(u64, (u32, u32))>>,
        fail_on: Option<u64>,
    }

    impl UploadClient for ScriptedUploader {
        async fn send(&self, frame_number: u64, payload: &[u8]) -> Result<Ack> {
            if self.fail_on == Some(frame_number) {
                return Err(CaptureError::Transport("connection reset".to_string()));
            }
            let image = image::load_from_memory(payload)
                .map_err(|err| CaptureError::msg(err.to_string()))?;
            self.sent
                .lock()
                .unwrap()
                .push((frame_number, (image.width(), image.height())));
            Ok(Ack("Frame saved successfully".to_string()))
        }
    }

    fn driver(uploader: ScriptedUploader, horizon: f64) -> RenderDriver<ScriptedUploader> {
        RenderDriver::new(
            VirtualClock::new(60, horizon),
            Box::new(Gradient),
            Box::new(FixedSurface(Viewport::new(4, 2))),
            uploader,
        )
    }

    #[tokio::test]
    async fn runs_to_horizon_in_frame_order() {
        let mut driver = driver(ScriptedUploader::default(), 0.5);
        let summary = driver.run().await.unwrap();

        assert_eq!(summary.frames, 30);
        assert_eq!(summary.final_time, 0.5);
        assert_eq!(driver.state(), RunState::Stopped);

        let sent = driver.uploader().sent.lock().unwrap();
        let numbers: Vec<u64> = sent.iter().map(|(number, _)| *number).collect();
        assert_eq!(numbers, (0..30).collect::<Vec<_>>());
        assert!(sent.iter().all(|(_, size)| *size == (4, 2)));
    }

    #[tokio::test]
    async fn upload_failure_halts_the_run() {
        let uploader = ScriptedUploader {
            fail_on: Some(3),
            ..Default::default()
        };
        let mut driver = driver(uploader, 1.0);

        let err = driver.run().await.unwrap_err();

        assert!(matches!(err, CaptureError::Transport(_)));
        assert_eq!(driver.state(), RunState::Failed);
        assert_eq!(driver.clock().frame(), 3);
        assert_eq!(driver.uploader().sent.lock().unwrap().len(), 3);
        assert!(driver.step().await.is_err());
    }

    #[tokio::test]
    async fn step_requires_a_started_run() {
        let mut driver = driver(ScriptedUploader::default(), 1.0);
        assert!(driver.step().await.is_err());

        driver.start();
        assert_eq!(driver.step().await.unwrap(), RunState::Rendering);
        assert_eq!(driver.clock().frame(), 1);
    }

    #[tokio::test]
    async fn zero_horizon_stops_immediately() {
        let mut driver = driver(ScriptedUploader::default(), 0.0);
        let summary = driver.run().await.unwrap();

        assert_eq!(summary.frames, 0);
        assert!(driver.uploader().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn encode_failure_halts_the_run() {
        let mut driver = RenderDriver::new(
            VirtualClock::new(60, 1.0),
            Box::new(Gradient),
            Box::new(FixedSurface(Viewport::new(0, 0))),
            ScriptedUploader::default(),
        );

        let err = driver.run().await.unwrap_err();

        assert!(matches!(err, CaptureError::Encode(_)));
        assert_eq!(driver.state(), RunState::Failed);
        assert!(driver.uploader().sent.lock().unwrap().is_empty());
    }

    /// Surface whose width grows by one pixel every time it is sampled.
    struct GrowingSurface(Arc<AtomicU32>);

    impl Surface for GrowingSurface {
        fn viewport(&self) -> Viewport {
            Viewport::new(self.0.fetch_add(1, Ordering::SeqCst), 3)
        }
    }

    #[tokio::test]
    async fn resamples_viewport_every_step() {
        let mut driver = RenderDriver::new(
            VirtualClock::new(60, 3.0 / 60.0),
            Box::new(Gradient),
            Box::new(GrowingSurface(Arc::new(AtomicU32::new(2)))),
            ScriptedUploader::default(),
        );

        driver.run().await.unwrap();

        let sent = driver.uploader().sent.lock().unwrap();
        let sizes: Vec<(u32, u32)> = sent.iter().map(|(_, size)| *size).collect();
        assert_eq!(sizes, vec![(3, 3), (4, 3), (5, 3)]);
    }
}

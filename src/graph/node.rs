/// Context passed to graph nodes during rendering
///
/// - sample_rate: Audio sample rate (e.g., 48000.0)
/// - time: audio clock position of the first sample in the block, in seconds
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx {
    pub sample_rate: f32,
    pub time: f64,
}

impl RenderCtx {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self { sample_rate, time }
    }

    /// Audio clock time of sample `index` within the block.
    #[inline]
    pub fn sample_time(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }

    /// Audio clock time just after a block of `frames` samples.
    #[inline]
    pub fn end_time(&self, frames: usize) -> f64 {
        self.sample_time(frames)
    }
}

/// Core trait for mono audio sources in the voice graph
pub trait GraphNode: Send {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx);

    /// Check if this node can still produce sound at or after `time`
    ///
    /// Voices check their layers with this before being retired.
    fn is_active(&self, _time: f64) -> bool {
        true
    }
}

//! The ripple engine: height field, colour buffers, and the step loop.
//!
//! # Lifecycle
//!
//! ```text
//! Unsized ──establish_size──▶ Sized ──dispose──▶ Disposed
//! ```
//!
//! Sizing happens exactly once, either explicitly or from the first image
//! the supplier produces. Touches and steps require a sized engine; every
//! operation on a disposed engine fails with [`RippleError::IllegalState`].
//!
//! # Step
//!
//! 1. Refresh the source image. Suppliers that may change are fetched every
//!    step; static ones only until the first image arrives. Images of the
//!    wrong size are resampled (nearest-neighbour).
//! 2. Diffuse and damp the heights into the sink grid and refract the
//!    source image through them into the output buffer.
//! 3. Swap source and sink roles.

use std::time::Instant;

use ripple_core::{
    BarrierSet, BlockPurpose, ImageSize, PixelBuffer, RippleError, SourceImageSupplier, Touch,
};

use crate::config::{ConfigError, RippleConfig};
use crate::height::HeightField;
use crate::metrics::StepMetrics;
use crate::refract;

/// Buffers allocated when the size is established.
struct Buffers {
    heights: HeightField,
    source_image: PixelBuffer,
    /// Whether `source_image` holds a fetched image (not the zero fill).
    loaded: bool,
    output: PixelBuffer,
}

impl Buffers {
    fn new(size: ImageSize) -> Self {
        Self {
            heights: HeightField::new(size),
            source_image: PixelBuffer::filled(size, 0),
            loaded: false,
            output: PixelBuffer::filled(size, 0),
        }
    }
}

enum EngineState {
    Unsized,
    Sized(Buffers),
    Disposed,
}

/// Double-buffered ripple simulation over a pixel source.
pub struct RippleEngine {
    supplier: Box<dyn SourceImageSupplier>,
    dynamic_source: bool,
    barriers: BarrierSet,
    active: bool,
    state: EngineState,
    metrics: StepMetrics,
    steps: u64,
    fetch_misses: u64,
    pending_applied: u32,
    pending_blocked: u32,
    rescale_warned: bool,
}

// Compile-time assertion: the engine can move into a tick thread.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<RippleEngine>();
    }
};

impl RippleEngine {
    /// Create an engine pulling images from `supplier`.
    ///
    /// `may_change_over_time` is read once, here. If the config carries
    /// an explicit `image_size` the engine is sized immediately.
    pub fn new(
        config: &RippleConfig,
        supplier: impl SourceImageSupplier + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let supplier: Box<dyn SourceImageSupplier> = Box::new(supplier);
        let dynamic_source = supplier.may_change_over_time();
        let mut engine = Self {
            supplier,
            dynamic_source,
            barriers: config.barriers.clone(),
            active: config.initially_active,
            state: EngineState::Unsized,
            metrics: StepMetrics::default(),
            steps: 0,
            fetch_misses: 0,
            pending_applied: 0,
            pending_blocked: 0,
            rescale_warned: false,
        };
        if let Some(size) = config.image_size {
            engine.establish_size(size.width, size.height)?;
        }
        Ok(engine)
    }

    /// Allocate zero-filled height grids and colour buffers.
    ///
    /// # Errors
    ///
    /// [`RippleError::InvalidArgument`] for a zero dimension;
    /// [`RippleError::IllegalState`] if already sized or disposed.
    pub fn establish_size(&mut self, width: u32, height: u32) -> Result<(), RippleError> {
        self.ensure_unsized()?;
        let size = ImageSize::new(width, height)?;
        self.state = EngineState::Sized(Buffers::new(size));
        log::info!("ripple engine sized to {width}x{height}");
        Ok(())
    }

    /// Establish the size from the supplier's first image, which becomes
    /// the source image.
    ///
    /// # Errors
    ///
    /// [`RippleError::SupplierUnavailable`] if the supplier has nothing
    /// yet (the engine stays unsized and the call may be retried);
    /// [`RippleError::IllegalState`] if already sized or disposed.
    pub fn establish_size_from_supplier(&mut self) -> Result<ImageSize, RippleError> {
        self.ensure_unsized()?;
        let image = self
            .supplier
            .fetch()
            .ok_or(RippleError::SupplierUnavailable)?;
        let size = image.size();
        let mut buffers = Buffers::new(size);
        buffers.source_image = image;
        buffers.loaded = true;
        self.state = EngineState::Sized(buffers);
        log::info!(
            "ripple engine sized to {}x{} from supplier",
            size.width,
            size.height
        );
        Ok(size)
    }

    /// Add every point of `touch` to the source grid.
    ///
    /// Points inside an active touch-blocking barrier are skipped. Returns
    /// the number of points applied; always 0 while inactive.
    ///
    /// # Errors
    ///
    /// [`RippleError::IllegalState`] before sizing or after disposal;
    /// [`RippleError::InvalidArgument`] if any point lies outside the
    /// image, in which case none are applied.
    pub fn apply_touch(&mut self, touch: &Touch) -> Result<usize, RippleError> {
        let buffers = match &mut self.state {
            EngineState::Sized(b) => b,
            EngineState::Unsized => {
                return Err(RippleError::illegal_state(
                    "touch applied before size established",
                ))
            }
            EngineState::Disposed => return Err(disposed_error()),
        };
        if !self.active {
            return Ok(0);
        }
        let size = buffers.heights.size();
        if let Some(p) = touch.iter().find(|p| !size.contains(p.x(), p.y())) {
            return Err(RippleError::invalid_argument(format!(
                "touch point ({}, {}) outside {}x{} image",
                p.x(),
                p.y(),
                size.width,
                size.height
            )));
        }

        let check_barriers = self.barriers.any_active(BlockPurpose::Touch);
        let mut applied = 0usize;
        for p in touch {
            if check_barriers
                && self
                    .barriers
                    .blocks(BlockPurpose::Touch, p.x(), p.y(), size.width, size.height)
            {
                self.pending_blocked = self.pending_blocked.saturating_add(1);
                continue;
            }
            buffers
                .heights
                .add_to_source(size.index(p.x(), p.y()), p.added_height());
            applied += 1;
        }
        self.pending_applied = self
            .pending_applied
            .saturating_add(u32::try_from(applied).unwrap_or(u32::MAX));
        Ok(applied)
    }

    /// Advance one frame and return the rendered output.
    ///
    /// # Errors
    ///
    /// [`RippleError::IllegalState`] before sizing or after disposal;
    /// [`RippleError::SupplierUnavailable`] if no image has ever been
    /// fetched.
    pub fn step(&mut self) -> Result<&PixelBuffer, RippleError> {
        let start = Instant::now();
        let buffers = match &mut self.state {
            EngineState::Sized(b) => b,
            EngineState::Unsized => {
                return Err(RippleError::illegal_state("step before size established"))
            }
            EngineState::Disposed => return Err(disposed_error()),
        };
        let size = buffers.heights.size();

        // 1. Refresh the source image.
        let mut refreshed = false;
        let mut rescaled = false;
        if self.dynamic_source || !buffers.loaded {
            match self.supplier.fetch() {
                Some(image) => {
                    let image = if image.size() == size {
                        image
                    } else {
                        if self.rescale_warned {
                            log::debug!(
                                "rescaling {}x{} source image to {}x{}",
                                image.width(),
                                image.height(),
                                size.width,
                                size.height
                            );
                        } else {
                            log::warn!(
                                "source image is {}x{} but engine is {}x{}; resampling every frame",
                                image.width(),
                                image.height(),
                                size.width,
                                size.height
                            );
                            self.rescale_warned = true;
                        }
                        rescaled = true;
                        image.resized_nearest(size)
                    };
                    buffers.source_image = image;
                    buffers.loaded = true;
                    refreshed = true;
                }
                None if buffers.loaded => {
                    self.fetch_misses += 1;
                    log::debug!("image supplier missed a frame; reusing previous image");
                }
                None => {}
            }
        }
        if !buffers.loaded {
            return Err(RippleError::SupplierUnavailable);
        }

        // 2. Diffuse, damp, refract.
        let blocked_pixels = refract::run_pass(
            &mut buffers.heights,
            buffers.source_image.pixels(),
            buffers.output.pixels_mut(),
            &self.barriers,
        );

        // 3. Swap roles.
        buffers.heights.swap();

        self.steps += 1;
        self.metrics = StepMetrics {
            total_us: start.elapsed().as_micros() as u64,
            touches_applied: std::mem::take(&mut self.pending_applied),
            touches_blocked: std::mem::take(&mut self.pending_blocked),
            blocked_pixels,
            source_refreshed: refreshed,
            fetch_misses: self.fetch_misses,
            rescaled,
        };
        log::trace!("ripple step {}: {:?}", self.steps, self.metrics);
        Ok(&buffers.output)
    }

    /// Release the buffers. The engine is unusable afterwards.
    ///
    /// # Errors
    ///
    /// [`RippleError::IllegalState`] before sizing or if already disposed.
    pub fn dispose(&mut self) -> Result<(), RippleError> {
        match self.state {
            EngineState::Sized(_) => {
                self.state = EngineState::Disposed;
                log::info!("ripple engine disposed after {} steps", self.steps);
                Ok(())
            }
            EngineState::Unsized => Err(RippleError::illegal_state(
                "dispose before size established",
            )),
            EngineState::Disposed => Err(disposed_error()),
        }
    }

    /// Enable or disable touch application.
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            log::debug!("ripple engine active: {active}");
        }
        self.active = active;
    }

    /// Whether touches are currently applied.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The barrier set consulted by touches and steps.
    pub fn barriers(&self) -> &BarrierSet {
        &self.barriers
    }

    /// Mutable access to the barrier set, e.g. to toggle a barrier.
    pub fn barriers_mut(&mut self) -> &mut BarrierSet {
        &mut self.barriers
    }

    /// Established size, if any.
    pub fn size(&self) -> Option<ImageSize> {
        match &self.state {
            EngineState::Sized(b) => Some(b.heights.size()),
            _ => None,
        }
    }

    /// Whether the size has been established and the engine not disposed.
    pub fn is_sized(&self) -> bool {
        matches!(self.state, EngineState::Sized(_))
    }

    /// Whether [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        matches!(self.state, EngineState::Disposed)
    }

    /// The height field, while sized.
    pub fn heights(&self) -> Option<&HeightField> {
        match &self.state {
            EngineState::Sized(b) => Some(&b.heights),
            _ => None,
        }
    }

    /// The most recent output frame, once at least one step has run.
    pub fn output(&self) -> Option<&PixelBuffer> {
        match &self.state {
            EngineState::Sized(b) if self.steps > 0 => Some(&b.output),
            _ => None,
        }
    }

    /// The current source image, once one has been fetched.
    pub fn source_image(&self) -> Option<&PixelBuffer> {
        match &self.state {
            EngineState::Sized(b) if b.loaded => Some(&b.source_image),
            _ => None,
        }
    }

    /// Whether the supplier declared that its images may change.
    pub fn may_change_over_time(&self) -> bool {
        self.dynamic_source
    }

    /// Metrics from the most recent step.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.metrics
    }

    /// Number of completed steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn ensure_unsized(&self) -> Result<(), RippleError> {
        match self.state {
            EngineState::Unsized => Ok(()),
            EngineState::Sized(_) => Err(RippleError::illegal_state(
                "engine size already established",
            )),
            EngineState::Disposed => Err(disposed_error()),
        }
    }
}

impl std::fmt::Debug for RippleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RippleEngine")
            .field("size", &self.size())
            .field("disposed", &self.is_disposed())
            .field("active", &self.active)
            .field("steps", &self.steps)
            .field("dynamic_source", &self.dynamic_source)
            .field("barriers", &self.barriers.len())
            .finish()
    }
}

fn disposed_error() -> RippleError {
    RippleError::illegal_state("ripple engine is disposed")
}

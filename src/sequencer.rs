//! Staircase sequence controller with phase management and timing control.
//!
//! Provides [`SequenceController`], which walks the steps of a staircase one
//! at a time, fading each in, holding, then fading each out again. Per-step
//! fades and the pacing of the walk are both timed by a [`ChannelPool`];
//! channel 0 of the pool acts as the driver for the whole sequence.

use heapless::Deque;

use crate::channel::{ChannelError, ChannelId, ChannelKind, ChannelPool};
use crate::color::Rgbw;
use crate::command::StairAction;
use crate::sink::{PixelSink, StatusReport};
use crate::step::StepUnit;
use crate::time::{TimeDuration, TimeInstant, TimeSource};
use crate::types::{Direction, Fade, SequenceConfig, TriggerOutcome};

/// The current phase of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencePhase {
    /// No sequence running. All steps are off.
    Idle,
    /// Steps are being started one after another, fading in or out.
    Walking(Fade),
    /// All steps lit, waiting for the hold duration to pass.
    Holding,
}

/// Timing information returned by [`SequenceController::tick`].
///
/// Indicates when the controller needs to be ticked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceTiming<D> {
    /// At least one step is fading. Tick again at your desired frame rate.
    Continuous,

    /// Nothing is animating. Tick again after the specified delay.
    Delay(D),

    /// Sequence is idle. No ticks are needed until the next trigger.
    Complete,
}

/// Errors that can occur during controller operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError {
    /// Operation called from an invalid phase.
    InvalidState {
        /// Human-readable description of the expected phase(s)
        expected: &'static str,
        /// The actual current phase
        actual: SequencePhase,
    },

    /// Step index outside the configured staircase.
    InvalidStep { index: usize, count: usize },
}

impl core::fmt::Display for SequencerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SequencerError::InvalidState { expected, actual } => {
                write!(
                    f,
                    "invalid state: expected {}, but sequence is in {:?}",
                    expected, actual
                )
            }
            SequencerError::InvalidStep { index, count } => {
                write!(f, "step {} does not exist on a staircase of {}", index, count)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SequencerError {}

/// Drives a staircase through ascend, hold and dim phases.
///
/// Exactly one sequence runs at a time. The controller owns the step layout,
/// the channel pool and the pixel sink; call [`tick`](Self::tick) once per
/// iteration of the outer loop. Every call completes in bounded time and
/// never blocks.
///
/// # Type Parameters
/// * `I` - Time instant type
/// * `P` - Pixel sink implementation type
/// * `R` - Status report sink, `()` to discard messages
/// * `STEPS` - Maximum number of physical steps
/// * `CHANNELS` - Number of animation channels, normally `STEPS + 1`
pub struct SequenceController<
    I: TimeInstant,
    P: PixelSink,
    R: StatusReport,
    const STEPS: usize,
    const CHANNELS: usize,
> {
    sink: P,
    reporter: R,
    config: SequenceConfig,
    steps: [StepUnit; STEPS],
    pool: ChannelPool<I, CHANNELS>,
    pending: Deque<usize, STEPS>,
    phase: SequencePhase,
    direction: Direction,
    cursor: usize,
    walk_finished: bool,
    driver: Option<ChannelId>,
    phase_entered: Option<I>,
    last_fade_end: Option<I>,
}

impl<I, P, R, const STEPS: usize, const CHANNELS: usize> SequenceController<I, P, R, STEPS, CHANNELS>
where
    I: TimeInstant,
    P: PixelSink,
    R: StatusReport,
{
    const CAPACITY_CHECK: () = {
        assert!(STEPS > 0, "a staircase needs at least one step");
        assert!(CHANNELS >= 2, "need a driver channel and at least one fade channel");
    };

    /// Creates an idle controller and writes every step off.
    ///
    /// `config` is clamped with [`SequenceConfig::sanitized`].
    pub fn new(sink: P, reporter: R, config: SequenceConfig) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;

        let config = config.sanitized(STEPS);
        let mut controller = Self {
            sink,
            reporter,
            config,
            steps: Self::layout(&config),
            pool: ChannelPool::new(),
            pending: Deque::new(),
            phase: SequencePhase::Idle,
            direction: Direction::Ascending,
            cursor: 0,
            walk_finished: false,
            driver: None,
            phase_entered: None,
            last_fade_end: None,
        };
        controller.blank();
        controller
    }

    fn layout(config: &SequenceConfig) -> [StepUnit; STEPS] {
        let leds = usize::from(config.leds_per_step);
        core::array::from_fn(|index| StepUnit::new(index, leds))
    }

    /// Handles a remote action by dispatching to the matching method.
    ///
    /// A start request while a sequence runs is ignored, not an error.
    pub fn handle_action(&mut self, action: StairAction, now: I) -> Result<(), SequencerError> {
        match action {
            StairAction::Start(direction) => {
                self.start_sequence(direction, now);
                Ok(())
            }
            StairAction::Stop => {
                self.stop();
                Ok(())
            }
            StairAction::Configure(config) => self.reconfigure(config),
        }
    }

    /// Starts a sequence walking in `direction`.
    ///
    /// Lights the first step in that direction immediately and arms the
    /// driver channel with the step interval. Ignored unless idle.
    pub fn start_sequence(&mut self, direction: Direction, now: I) -> TriggerOutcome {
        if self.phase != SequencePhase::Idle {
            debug!("trigger ignored, sequence already running");
            return TriggerOutcome::Ignored;
        }

        let Some(driver) = self.pool.acquire() else {
            warn!("no channel free for the sequence driver");
            return TriggerOutcome::Ignored;
        };

        if self
            .pool
            .start(
                driver,
                ChannelKind::Driver,
                self.interval(),
                Rgbw::OFF,
                Rgbw::OFF,
                now,
            )
            .is_err()
        {
            held(self.pool.release(driver));
            return TriggerOutcome::Ignored;
        }

        self.driver = Some(driver);
        self.direction = direction;
        self.cursor = direction.first_step(self.step_count());
        self.walk_finished = false;
        self.pending.clear();
        self.enter(SequencePhase::Walking(Fade::In), now);

        info!("sequence started: {}", direction);
        self.reporter.report("Lighting the steps...");
        self.request_fade(self.cursor, Fade::In, now);
        TriggerOutcome::Started
    }

    /// Aborts any running sequence, turns every step off and returns to idle.
    pub fn stop(&mut self) {
        let was_running = self.phase != SequencePhase::Idle;

        self.pool.reset();
        self.pending.clear();
        self.driver = None;
        self.walk_finished = false;
        self.phase = SequencePhase::Idle;
        self.phase_entered = None;
        self.last_fade_end = None;
        self.blank();

        if was_running {
            info!("sequence stopped");
            self.reporter.report("Sequence stopped.");
        }
    }

    /// Replaces the configuration. Only allowed while idle.
    ///
    /// Rebuilds the step layout and frees every channel. Pixels of the old
    /// layout are turned off before the new one is written.
    pub fn reconfigure(&mut self, config: SequenceConfig) -> Result<(), SequencerError> {
        if self.phase != SequencePhase::Idle {
            return Err(SequencerError::InvalidState {
                expected: "Idle",
                actual: self.phase,
            });
        }

        let old_pixels = self.config.pixel_count();
        self.sink.set_pixel_range(0, old_pixels, Rgbw::OFF);

        self.config = config.sanitized(STEPS);
        self.steps = Self::layout(&self.config);
        self.pool.reset();
        self.pending.clear();
        self.blank();
        debug!("reconfigured: {} steps", self.config.step_count);
        Ok(())
    }

    /// Advances all animations to `now`, reacts to completed timers and
    /// pushes the new frame to the pixel sink.
    pub fn tick(&mut self, now: I) -> ServiceTiming<I::Duration> {
        if self.phase == SequencePhase::Idle {
            return ServiceTiming::Complete;
        }

        // A late tick may cover several driver periods; catch up on each.
        loop {
            self.pool.advance(now);

            let Some(driver) = self.driver else {
                break;
            };
            if !self.pool.take_completion(driver) {
                break;
            }

            let at = self
                .pool
                .channel(driver)
                .and_then(|channel| channel.deadline())
                .unwrap_or(now);
            self.on_driver_completed(driver, at);
        }

        self.retry_pending(now);
        self.render_fades(now);
        self.settle_walk(now);

        self.sink.flush();
        self.timing(now)
    }

    /// Ticks using the current instant of `clock`.
    pub fn service<T: TimeSource<I>>(&mut self, clock: &T) -> ServiceTiming<I::Duration> {
        self.tick(clock.now())
    }

    fn on_driver_completed(&mut self, driver: ChannelId, at: I) {
        match self.phase {
            SequencePhase::Walking(fade) => {
                if self.walk_finished {
                    return;
                }

                match self.direction.next_step(self.cursor, self.step_count()) {
                    Some(next) => {
                        self.cursor = next;
                        held(self.pool.restart(driver, at));
                        trace!("walk cursor at step {}", next);
                        self.request_fade(next, fade, at);
                    }
                    None => {
                        self.walk_finished = true;
                        debug!("walk finished, waiting for fades to settle");
                    }
                }
            }
            SequencePhase::Holding => {
                held(self.pool.rearm(driver, self.interval(), at));
                self.cursor = self.direction.first_step(self.step_count());
                self.walk_finished = false;
                self.enter(SequencePhase::Walking(Fade::Out), at);

                info!("hold elapsed, dimming");
                self.reporter.report("Dimming the steps...");
                self.request_fade(self.cursor, Fade::Out, at);
            }
            SequencePhase::Idle => {}
        }
    }

    /// Starts a fade for `step`, or queues it when the pool is exhausted.
    fn request_fade(&mut self, step: usize, fade: Fade, at: I) {
        if self.pending.is_empty() && self.start_fade(step, fade, at) {
            return;
        }

        warn!("no free channel, deferring fade of step {}", step);
        if self.pending.push_back(step).is_err() {
            warn!("retry queue full, dropping fade of step {}", step);
        }
    }

    fn start_fade(&mut self, step: usize, fade: Fade, at: I) -> bool {
        let Some(id) = self.pool.acquire() else {
            return false;
        };

        let lit = self.config.lit_color();
        let (from, to) = match fade {
            Fade::In => (Rgbw::OFF, lit),
            Fade::Out => (lit, Rgbw::OFF),
        };

        if self
            .pool
            .start(id, ChannelKind::StepFade { step }, self.fade_duration(), from, to, at)
            .is_err()
        {
            held(self.pool.release(id));
            return false;
        }

        match fade {
            Fade::In => self.steps[step].begin_fade_in(),
            Fade::Out => self.steps[step].begin_fade_out(),
        }
        trace!("step {} fading on channel {}", step, id.0);
        true
    }

    fn retry_pending(&mut self, now: I) {
        let SequencePhase::Walking(fade) = self.phase else {
            return;
        };

        while let Some(&step) = self.pending.front() {
            if !self.start_fade(step, fade, now) {
                break;
            }
            self.pending.pop_front();
            debug!("deferred fade of step {} started", step);
        }
    }

    fn render_fades(&mut self, now: I) {
        let max = self.config.max_brightness;

        for idx in 0..CHANNELS {
            let id = ChannelId(idx);
            let Some(channel) = self.pool.channel(id) else {
                continue;
            };
            let ChannelKind::StepFade { step } = channel.kind() else {
                continue;
            };

            let color = channel.color();
            let deadline = channel.deadline();
            let unit = &mut self.steps[step];
            let range = unit.range();
            self.sink.set_pixel_range(range.offset, range.length, color);

            if self.pool.take_completion(id) {
                unit.finish_fade(color.level(), max);
                held(self.pool.release(id));
                self.note_fade_end(deadline.unwrap_or(now));
                trace!("step {} settled", step);
            } else {
                unit.set_level(color.level(), max);
            }
        }
    }

    /// Keeps the latest fade deadline of the walk. Deadlines are compared by
    /// their offset from the phase entry so the comparison survives a timer
    /// wrap.
    fn note_fade_end(&mut self, end: I) {
        let later = match (self.last_fade_end, self.phase_entered) {
            (Some(current), Some(entered)) => {
                end.duration_since(entered).as_millis()
                    > current.duration_since(entered).as_millis()
            }
            _ => true,
        };
        if later {
            self.last_fade_end = Some(end);
        }
    }

    fn settle_walk(&mut self, now: I) {
        let SequencePhase::Walking(fade) = self.phase else {
            return;
        };

        if !self.walk_finished || !self.pending.is_empty() || self.pool.has_step_fades() {
            return;
        }

        let at = self.last_fade_end.unwrap_or(now);

        match fade {
            Fade::In => {
                if let Some(driver) = self.driver {
                    held(self.pool.rearm(driver, self.hold_duration(), at));
                }
                self.enter(SequencePhase::Holding, at);
                info!("all steps lit, holding");
                self.reporter.report("Lit all the steps. Holding...");
            }
            Fade::Out => {
                if let Some(driver) = self.driver.take() {
                    held(self.pool.release(driver));
                }
                self.walk_finished = false;
                self.enter(SequencePhase::Idle, at);
                info!("all steps dimmed, sequence done");
                self.reporter.report("Dimmed all the steps. Done!");
            }
        }
    }

    fn timing(&self, now: I) -> ServiceTiming<I::Duration> {
        if self.phase == SequencePhase::Idle {
            return ServiceTiming::Complete;
        }

        if self.pool.has_step_fades() || !self.pending.is_empty() {
            return ServiceTiming::Continuous;
        }

        let Some(driver) = self.driver else {
            return ServiceTiming::Continuous;
        };

        match self.pool.channel(driver) {
            Some(channel) if !channel.is_complete() => self
                .pool
                .remaining(driver, now)
                .map_or(ServiceTiming::Continuous, ServiceTiming::Delay),
            _ => ServiceTiming::Continuous,
        }
    }

    fn enter(&mut self, phase: SequencePhase, at: I) {
        self.phase = phase;
        self.phase_entered = Some(at);
        self.last_fade_end = None;
    }

    fn blank(&mut self) {
        for step in &mut self.steps {
            step.reset();
        }
        self.sink
            .set_pixel_range(0, self.config.pixel_count(), Rgbw::OFF);
        self.sink.flush();
    }

    fn interval(&self) -> I::Duration {
        I::Duration::from_millis(u64::from(self.config.step_interval_ms))
    }

    fn fade_duration(&self) -> I::Duration {
        I::Duration::from_millis(u64::from(self.config.fade_duration_ms))
    }

    fn hold_duration(&self) -> I::Duration {
        I::Duration::from_millis(u64::from(self.config.hold_duration_ms))
    }

    /// Returns the current phase.
    pub fn phase(&self) -> SequencePhase {
        self.phase
    }

    /// Returns true if no sequence is running.
    pub fn is_idle(&self) -> bool {
        self.phase == SequencePhase::Idle
    }

    /// Instant the current phase was entered, if a sequence has run.
    pub fn phase_entered(&self) -> Option<I> {
        self.phase_entered
    }

    /// Direction of the current (or last) sequence.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Step most recently started by the walk.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Active configuration.
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Number of configured steps.
    pub fn step_count(&self) -> usize {
        usize::from(self.config.step_count)
    }

    /// Returns the step at `index`.
    pub fn step(&self, index: usize) -> Result<&StepUnit, SequencerError> {
        self.steps()
            .get(index)
            .ok_or(SequencerError::InvalidStep {
                index,
                count: self.step_count(),
            })
    }

    /// All configured steps.
    pub fn steps(&self) -> &[StepUnit] {
        &self.steps[..self.step_count()]
    }

    /// Steps waiting for a free channel.
    pub fn pending_fades(&self) -> usize {
        self.pending.len()
    }

    /// The channel pool, for inspection.
    pub fn pool(&self) -> &ChannelPool<I, CHANNELS> {
        &self.pool
    }

    /// The pixel sink.
    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// The pixel sink, mutably.
    pub fn sink_mut(&mut self) -> &mut P {
        &mut self.sink
    }

    /// The status reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }
}

/// Checks a pool call on a channel the controller itself holds.
fn held(result: Result<(), ChannelError>) {
    debug_assert!(result.is_ok(), "controller lost track of a channel: {:?}", result);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepState;
    use crate::time::{Millis, MillisDuration};

    struct NullSink;

    impl PixelSink for NullSink {
        fn set_pixel_range(&mut self, _offset: usize, _length: usize, _color: Rgbw) {}
        fn flush(&mut self) {}
    }

    type Controller = SequenceController<Millis, NullSink, (), 4, 5>;

    fn config() -> SequenceConfig {
        SequenceConfig {
            step_interval_ms: 100,
            fade_duration_ms: 200,
            hold_duration_ms: 1000,
            max_brightness: 255,
            step_count: 4,
            leds_per_step: 2,
            on_color: Rgbw::white(255),
        }
    }

    #[test]
    fn new_controller_is_idle() {
        let mut controller = Controller::new(NullSink, (), config());
        assert_eq!(controller.phase(), SequencePhase::Idle);
        assert_eq!(controller.tick(Millis(10)), ServiceTiming::Complete);
    }

    #[test]
    fn start_lights_first_step_and_takes_driver_channel() {
        let mut controller = Controller::new(NullSink, (), config());
        assert_eq!(
            controller.start_sequence(Direction::Ascending, Millis(0)),
            TriggerOutcome::Started
        );
        assert_eq!(controller.phase(), SequencePhase::Walking(Fade::In));
        assert_eq!(controller.pool().kind(ChannelId(0)), Some(ChannelKind::Driver));
        assert_eq!(
            controller.pool().kind(ChannelId(1)),
            Some(ChannelKind::StepFade { step: 0 })
        );
        assert_eq!(controller.step(0).unwrap().state(), StepState::FadingIn);
    }

    #[test]
    fn descending_starts_from_top_step() {
        let mut controller = Controller::new(NullSink, (), config());
        controller.start_sequence(Direction::Descending, Millis(0));
        assert_eq!(controller.cursor(), 3);

        controller.tick(Millis(100));
        assert_eq!(controller.cursor(), 2);
    }

    #[test]
    fn reconfigure_rejected_while_running() {
        let mut controller = Controller::new(NullSink, (), config());
        controller.start_sequence(Direction::Ascending, Millis(0));
        let result = controller.reconfigure(config());
        assert!(matches!(result, Err(SequencerError::InvalidState { .. })));
    }

    #[test]
    fn timing_reports_delay_while_holding() {
        let mut controller = Controller::new(NullSink, (), config());
        controller.start_sequence(Direction::Ascending, Millis(0));

        let mut now = 0;
        while controller.phase() != SequencePhase::Holding {
            now += 10;
            controller.tick(Millis(now));
        }

        // Last step starts at 300 and finishes fading at 500.
        assert_eq!(now, 500);
        assert_eq!(
            controller.tick(Millis(600)),
            ServiceTiming::Delay(MillisDuration(900))
        );
    }

    #[test]
    fn holding_waits_for_latest_fade_when_several_finish_together() {
        let config = SequenceConfig {
            fade_duration_ms: 250,
            ..config()
        };
        let mut controller = Controller::new(NullSink, (), config);
        controller.start_sequence(Direction::Ascending, Millis(0));

        let mut now = 0;
        while now < 300 {
            now += 10;
            controller.tick(Millis(now));
        }
        // Step 3 reuses the channel step 0 freed, below step 2's channel.
        assert_eq!(
            controller.pool().kind(ChannelId(1)),
            Some(ChannelKind::StepFade { step: 3 })
        );

        controller.tick(Millis(600));
        assert_eq!(controller.phase(), SequencePhase::Holding);
        assert_eq!(controller.phase_entered(), Some(Millis(550)));
    }

    #[test]
    fn late_tick_starts_every_step_that_fell_due() {
        let mut controller = Controller::new(NullSink, (), config());
        controller.start_sequence(Direction::Ascending, Millis(0));

        controller.tick(Millis(250));
        assert_eq!(controller.cursor(), 2);
        assert_eq!(
            controller.pool().channel(ChannelId(3)).map(|c| c.start()),
            Some(Millis(200))
        );
        assert_eq!(controller.step(3).unwrap().state(), StepState::Off);
    }

    #[test]
    fn step_lookup_outside_staircase_fails() {
        let controller = Controller::new(NullSink, (), config());
        assert_eq!(
            controller.step(4).err(),
            Some(SequencerError::InvalidStep { index: 4, count: 4 })
        );
    }
}
